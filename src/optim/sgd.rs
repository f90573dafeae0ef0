use crate::error::Result;
use crate::nn::Layer;
use crate::optim::{aligned_params, Optimizer};
use crate::tensor::Numeric;

/// Plain gradient descent: `param -= learning_rate * grad`.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent<T: Numeric> {
    learning_rate: T,
}

impl<T: Numeric> GradientDescent<T> {
    pub fn new(learning_rate: T) -> Self {
        GradientDescent { learning_rate }
    }

    pub fn learning_rate(&self) -> T {
        self.learning_rate
    }
}

impl<T: Numeric> Default for GradientDescent<T> {
    fn default() -> Self {
        GradientDescent::new(T::constant(0.1))
    }
}

impl<T: Numeric> Optimizer<T> for GradientDescent<T> {
    fn step(&mut self, layer: &dyn Layer<T>) -> Result<()> {
        let lr = self.learning_rate;
        for (param, grad) in aligned_params(layer)? {
            let updated = param
                .borrow()
                .zip_map(&grad.borrow(), |p, g| p - g * lr)?;
            param.assign(updated)?;
        }
        Ok(())
    }
}

#[test]
fn test_sgd_step() {
    use crate::nn::Linear;
    use crate::tensor::RawTensor;

    let mut layer = Linear::from_params(
        RawTensor::from_rows(vec![vec![1.0, -1.0]]).unwrap(),
        RawTensor::from(vec![0.5]),
    )
    .unwrap();
    layer.forward(RawTensor::from(vec![2.0, 3.0])).unwrap();
    layer.backward(RawTensor::from(vec![1.0])).unwrap();

    let weights = layer.weights.clone();
    GradientDescent::<f64>::new(0.5).step(&layer).unwrap();

    // w - 0.5 * x * g
    assert_eq!(weights.deep_clone(), RawTensor::from_rows(vec![vec![0.0, -2.5]]).unwrap());
    assert_eq!(layer.bias.deep_clone(), RawTensor::from(vec![0.0]));
}
