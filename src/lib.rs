//! A small neural network toolkit with hand-written backpropagation.
//!
//! Networks are built from [`nn::Layer`]s, each of which caches what it needs
//! during `forward` and turns an output gradient into an input gradient during
//! `backward`. A [`loss::Loss`] scores predictions and provides the first
//! gradient, and an [`optim::Optimizer`] updates every parameter in place from
//! the layer's `params()`/`grads()` pairs.
//!
//! ```
//! use light_nn::loss::{Loss, Sse};
//! use light_nn::nn::{Layer, Linear, Sequential, Sigmoid};
//! use light_nn::optim::{GradientDescent, Optimizer};
//! use light_nn::tensor::{Init, RawTensor};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let mut net = Sequential::<f64>::default()
//!     .with(Linear::new(2, 2, Init::Xavier, &mut rng))
//!     .with(Sigmoid::new())
//!     .with(Linear::new(2, 1, Init::Xavier, &mut rng));
//! let mut optimizer = GradientDescent::<f64>::new(0.1);
//!
//! let (x, y) = (RawTensor::from(vec![0.0, 1.0]), RawTensor::from(vec![1.0]));
//! let predicted = net.forward(x).unwrap();
//! let gradient = Sse.gradient(&predicted, &y).unwrap();
//! net.backward(gradient).unwrap();
//! optimizer.step(&net).unwrap();
//! ```

pub mod error;
pub mod loss;
pub mod nn;
pub mod optim;
pub mod persistence;
pub mod tensor;
mod train;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use tensor::functional::argmax;
pub use train::train_epoch;
