pub mod functional;
mod init;
mod numeric;
mod raw_tensor;
mod rc_tensor;
mod types;

pub use init::*;
pub use numeric::*;
pub use raw_tensor::*;
pub use rc_tensor::*;
pub use types::*;
