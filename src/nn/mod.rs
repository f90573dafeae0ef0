mod activation;
mod dropout;
mod linear;
mod module;
mod sequential;

pub use activation::*;
pub use dropout::*;
pub use linear::*;
pub use module::*;
pub use sequential::*;
