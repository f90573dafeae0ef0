use itertools::izip;

use crate::error::{Error, Result};
use crate::nn::Layer;
use crate::optim::{aligned_params, Optimizer};
use crate::tensor::{Numeric, RawTensor};

/// Gradient descent on an exponential moving average of the gradients.
#[derive(Debug, Clone)]
pub struct Momentum<T: Numeric> {
    learning_rate: T,
    momentum: T,
    // running average, one per parameter
    updates: Vec<RawTensor<T>>,
}

impl<T: Numeric> Momentum<T> {
    pub fn new(learning_rate: T, momentum: T) -> Self {
        Momentum {
            learning_rate,
            momentum,
            updates: Vec::new(),
        }
    }

    /// The running averages, empty until the first step.
    pub fn updates(&self) -> &[RawTensor<T>] {
        &self.updates
    }
}

impl<T: Numeric> Optimizer<T> for Momentum<T> {
    fn step(&mut self, layer: &dyn Layer<T>) -> Result<()> {
        let (params, grads): (Vec<_>, Vec<_>) = aligned_params(layer)?.into_iter().unzip();

        // If we have no previous updates, start with all zeros.
        if self.updates.is_empty() {
            self.updates = grads.iter().map(|grad| grad.borrow().zeros_like()).collect();
        }
        if self.updates.len() != params.len() {
            return Err(Error::OptimizerStateMismatch {
                state: self.updates.len(),
                params: params.len(),
            });
        }

        let (lr, mo) = (self.learning_rate, self.momentum);
        for (update, param, grad) in izip!(self.updates.iter_mut(), &params, &grads) {
            *update = update.zip_map(&grad.borrow(), |u, g| mo * u + (T::one() - mo) * g)?;
            let stepped = param.borrow().zip_map(update, |p, u| p - lr * u)?;
            param.assign(stepped)?;
        }
        Ok(())
    }
}
