use crate::error::Result;
use crate::tensor::{Numeric, RawTensor, TensorList};

/// A unit of computation that knows how to run forwards on its input and how
/// to propagate gradients backwards.
///
/// `backward` consumes whatever the most recent `forward` cached, so the two
/// must alternate: one `backward` per `forward`.
pub trait Layer<T: Numeric> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>>;

    /// Takes the gradient of the loss with respect to this layer's output and
    /// returns the gradient with respect to its input.
    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>>;

    /// Handles to the parameters of this layer. Layers without parameters
    /// return nothing.
    fn params(&self) -> TensorList<T> {
        Vec::new()
    }

    /// Gradients, in the same order as `params()`.
    fn grads(&self) -> TensorList<T> {
        Vec::new()
    }

    /// Switch between training and evaluation behaviour.
    fn set_training(&mut self, _training: bool) {}
}
