use crate::error::{Error, Result};
use crate::nn::Layer;
use crate::tensor::functional;
use crate::tensor::{Numeric, RawTensor};

/// Elementwise logistic sigmoid.
#[derive(Debug, Default, Clone)]
pub struct Sigmoid<T: Numeric> {
    sigmoids: Option<RawTensor<T>>,
}

impl<T: Numeric> Sigmoid<T> {
    pub fn new() -> Self {
        Sigmoid { sigmoids: None }
    }
}

impl<T: Numeric> Layer<T> for Sigmoid<T> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>> {
        let sigmoids = functional::sigmoid_tensor(&input);
        self.sigmoids = Some(sigmoids.clone());
        Ok(sigmoids)
    }

    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>> {
        let sigmoids = self
            .sigmoids
            .take()
            .ok_or(Error::BackwardBeforeForward { layer: "Sigmoid" })?;
        sigmoids.zip_map(&gradient, |sig, grad| sig * (T::one() - sig) * grad)
    }
}

/// Elementwise hyperbolic tangent, saturating to ±1 for very large inputs.
#[derive(Debug, Default, Clone)]
pub struct Tanh<T: Numeric> {
    tanh: Option<RawTensor<T>>,
}

impl<T: Numeric> Tanh<T> {
    pub fn new() -> Self {
        Tanh { tanh: None }
    }
}

impl<T: Numeric> Layer<T> for Tanh<T> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>> {
        let tanh = functional::tanh_tensor(&input);
        self.tanh = Some(tanh.clone());
        Ok(tanh)
    }

    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>> {
        let tanh = self
            .tanh
            .take()
            .ok_or(Error::BackwardBeforeForward { layer: "Tanh" })?;
        tanh.zip_map(&gradient, |t, grad| (T::one() - t * t) * grad)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Relu<T: Numeric> {
    input: Option<RawTensor<T>>,
}

impl<T: Numeric> Relu<T> {
    pub fn new() -> Self {
        Relu { input: None }
    }
}

impl<T: Numeric> Layer<T> for Relu<T> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>> {
        let output = functional::relu_tensor(&input);
        self.input = Some(input);
        Ok(output)
    }

    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>> {
        let input = self
            .input
            .take()
            .ok_or(Error::BackwardBeforeForward { layer: "Relu" })?;
        input.zip_map(&gradient, |x, grad| if x > T::zero() { grad } else { T::zero() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones_like(t: &RawTensor<f64>) -> RawTensor<f64> {
        RawTensor::new_with_filler(t.shape().clone(), 1.0)
    }

    fn check_gradient_shape(layer: &mut dyn Layer<f64>, x: RawTensor<f64>) {
        let shape = x.shape().clone();
        let out = layer.forward(x).unwrap();
        let grad = layer.backward(ones_like(&out)).unwrap();
        assert_eq!(grad.shape(), &shape);
    }

    #[test]
    fn test_gradient_shape_matches_input() {
        let inputs = vec![
            RawTensor::from(vec![0.5, -1.0, 2.0]),
            RawTensor::new((0..12).map(|i| i as f64 - 6.0).collect(), vec![3, 4]),
            RawTensor::new((0..8).map(|i| i as f64 * 0.1).collect(), vec![2, 2, 2]),
        ];
        for x in inputs {
            check_gradient_shape(&mut Sigmoid::<f64>::new(), x.clone());
            check_gradient_shape(&mut Tanh::<f64>::new(), x.clone());
            check_gradient_shape(&mut Relu::<f64>::new(), x);
        }
    }

    #[test]
    fn test_sigmoid_backward() {
        let mut layer = Sigmoid::<f64>::new();
        let s = layer.forward(RawTensor::from(vec![-1.0, 0.0, 3.0])).unwrap();
        let grad = RawTensor::from(vec![0.5, 2.0, -1.0]);
        let back = layer.backward(grad.clone()).unwrap();
        for ((&b, &s), &g) in back.as_slice().iter().zip(s.as_slice()).zip(grad.as_slice()) {
            assert_eq!(b, s * (1.0 - s) * g);
        }
    }

    #[test]
    fn test_tanh_backward() {
        let mut layer = Tanh::<f64>::new();
        let t = layer.forward(RawTensor::from(vec![-0.3, 0.0, 1.2])).unwrap();
        let grad = RawTensor::from(vec![1.0, -2.0, 0.25]);
        let back = layer.backward(grad.clone()).unwrap();
        for ((&b, &t), &g) in back.as_slice().iter().zip(t.as_slice()).zip(grad.as_slice()) {
            assert_eq!(b, (1.0 - t * t) * g);
        }
    }

    #[test]
    fn test_tanh_layer_saturates() {
        let mut layer = Tanh::<f64>::new();
        let out = layer.forward(RawTensor::from(vec![1000.0, -1000.0])).unwrap();
        assert_eq!(out, RawTensor::from(vec![1.0, -1.0]));
        let back = layer.backward(RawTensor::from(vec![1.0, 1.0])).unwrap();
        assert_eq!(back, RawTensor::from(vec![0.0, 0.0]));
    }

    #[test]
    fn test_relu_blocks_non_positive_inputs() {
        let mut layer = Relu::<f64>::new();
        let out = layer.forward(RawTensor::from(vec![-2.0, 0.0, 3.0, 1e-9])).unwrap();
        assert_eq!(out, RawTensor::from(vec![0.0, 0.0, 3.0, 1e-9]));
        let back = layer.backward(RawTensor::from(vec![5.0, 6.0, 7.0, 8.0])).unwrap();
        assert_eq!(back, RawTensor::from(vec![0.0, 0.0, 7.0, 8.0]));
    }

    #[test]
    fn test_backward_needs_forward() {
        let mut sigmoid = Sigmoid::<f64>::new();
        assert!(matches!(
            sigmoid.backward(RawTensor::from(vec![1.0])),
            Err(Error::BackwardBeforeForward { layer: "Sigmoid" })
        ));

        let mut relu = Relu::<f64>::new();
        relu.forward(RawTensor::from(vec![1.0])).unwrap();
        relu.backward(RawTensor::from(vec![1.0])).unwrap();
        assert!(relu.backward(RawTensor::from(vec![1.0])).is_err());
    }

    #[test]
    fn test_backward_rejects_mismatched_gradient() {
        let mut tanh = Tanh::<f64>::new();
        tanh.forward(RawTensor::from(vec![1.0, 2.0])).unwrap();
        assert!(matches!(
            tanh.backward(RawTensor::from(vec![1.0])),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
