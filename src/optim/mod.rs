mod config;
mod momentum;
mod sgd;

pub use config::*;
pub use momentum::*;
pub use sgd::*;

use crate::error::{Error, Result};
use crate::nn::Layer;
use crate::tensor::{Numeric, RcTensor};

/// Updates the parameters of a layer in place, using the gradients the layer
/// holds after `backward` and whatever state the optimizer keeps itself.
pub trait Optimizer<T: Numeric> {
    fn step(&mut self, layer: &dyn Layer<T>) -> Result<()>;
}

/// Pairs every parameter of `layer` with its gradient.
pub(crate) fn aligned_params<T: Numeric>(
    layer: &dyn Layer<T>,
) -> Result<Vec<(RcTensor<T>, RcTensor<T>)>> {
    let params = layer.params();
    let grads = layer.grads();
    if params.len() != grads.len() {
        return Err(Error::ParamGradMismatch {
            params: params.len(),
            grads: grads.len(),
        });
    }
    Ok(params.into_iter().zip(grads).collect())
}
