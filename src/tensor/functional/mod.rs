mod element_wise_ops;
mod misc;

pub use element_wise_ops::*;
pub use misc::*;
