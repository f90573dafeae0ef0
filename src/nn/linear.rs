use rand::Rng;

use crate::error::{Error, Result};
use crate::nn::Layer;
use crate::tensor::{dot_slices, Init, Numeric, RawTensor, RcTensor, TensorList};

/// A layer of `output_dim` neurons, each with `input_dim` weights and a bias.
#[derive(Debug)]
pub struct Linear<T>
where
    T: Numeric,
{
    input_dim: usize,
    output_dim: usize,
    /// `weights[o]` holds the weights of the o-th neuron.
    pub weights: RcTensor<T>,
    pub bias: RcTensor<T>,
    weights_grad: RcTensor<T>,
    bias_grad: RcTensor<T>,
    input: Option<RawTensor<T>>,
}

impl<T> Linear<T>
where
    T: Numeric,
{
    pub fn new<R: Rng + ?Sized>(input_dim: usize, output_dim: usize, init: Init, rng: &mut R) -> Self {
        let weights = RawTensor::random(vec![output_dim, input_dim], init, rng);
        let bias = RawTensor::random(vec![output_dim], init, rng);
        Linear::with_dims(input_dim, output_dim, weights, bias)
    }

    /// Build a layer from explicit `[output_dim][input_dim]` weights and
    /// `[output_dim]` bias.
    pub fn from_params(weights: RawTensor<T>, bias: RawTensor<T>) -> Result<Self> {
        let (output_dim, input_dim) = match weights.shape()[..] {
            [o, i] => (o, i),
            _ => {
                return Err(Error::ShapeMismatch {
                    expected: vec![bias.count(), weights.count() / bias.count().max(1)],
                    actual: weights.shape().clone(),
                })
            }
        };
        bias.ensure_shape(&[output_dim])?;
        Ok(Linear::with_dims(input_dim, output_dim, weights, bias))
    }

    fn with_dims(input_dim: usize, output_dim: usize, weights: RawTensor<T>, bias: RawTensor<T>) -> Self {
        Linear {
            input_dim,
            output_dim,
            weights_grad: RcTensor::zeros(weights.shape().clone()),
            bias_grad: RcTensor::zeros(bias.shape().clone()),
            weights: weights.into(),
            bias: bias.into(),
            input: None,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }
}

impl<T: Numeric> Layer<T> for Linear<T> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>> {
        input.ensure_shape(&[self.input_dim])?;
        let output: Vec<T> = {
            let weights = self.weights.borrow();
            let bias = self.bias.borrow();
            weights
                .rows()
                .zip(bias.as_slice())
                .map(|(row, &b)| dot_slices(input.as_slice(), row) + b)
                .collect()
        };
        // Save the input to use in the backward pass.
        self.input = Some(input);
        Ok(RawTensor::from(output))
    }

    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>> {
        gradient.ensure_shape(&[self.output_dim])?;
        let input = self
            .input
            .take()
            .ok_or(Error::BackwardBeforeForward { layer: "Linear" })?;
        let (x, g) = (input.as_slice(), gradient.as_slice());

        // w[o][i] multiplies input[i] and feeds output[o].
        let weights_grad = g
            .iter()
            .flat_map(|&g_o| x.iter().map(move |&x_i| x_i * g_o))
            .collect();

        // input[i] feeds every output[o] through w[o][i].
        let mut input_grad = vec![T::zero(); self.input_dim];
        for (row, &g_o) in self.weights.borrow().rows().zip(g) {
            for (acc, &w) in input_grad.iter_mut().zip(row) {
                *acc += w * g_o;
            }
        }

        self.weights_grad
            .replace(RawTensor::new(weights_grad, vec![self.output_dim, self.input_dim]));
        // b[o] is added straight to output[o].
        self.bias_grad.replace(gradient);
        Ok(RawTensor::from(input_grad))
    }

    fn params(&self) -> TensorList<T> {
        vec![self.weights.clone(), self.bias.clone()]
    }

    fn grads(&self) -> TensorList<T> {
        vec![self.weights_grad.clone(), self.bias_grad.clone()]
    }
}

#[cfg(test)]
fn fixed_layer() -> Linear<f64> {
    let weights = RawTensor::from_rows(vec![vec![1.0, -2.0], vec![-1.1, 0.7], vec![0.5, 0.5]]).unwrap();
    let bias = RawTensor::from(vec![1.0, 0.0, -1.0]);
    Linear::from_params(weights, bias).unwrap()
}

#[test]
fn test_layer_forward() {
    let mut layer = fixed_layer();
    let res = layer.forward(RawTensor::from(vec![1.0, 2.0])).unwrap();
    let expected = [1.0 - 4.0 + 1.0, -1.1 + 1.4, 0.5 + 1.0 - 1.0];
    for (r, e) in res.as_slice().iter().zip(expected) {
        assert!((r - e).abs() < 1e-12);
    }
}

#[test]
fn test_layer_backward() {
    let mut layer = fixed_layer();
    layer.forward(RawTensor::from(vec![1.0, 2.0])).unwrap();
    let input_grad = layer.backward(RawTensor::from(vec![1.0, -1.0, 2.0])).unwrap();

    // sum_o w[o][i] * g[o]
    assert_eq!(input_grad, RawTensor::from(vec![1.0 + 1.1 + 1.0, -2.0 - 0.7 + 1.0]));

    let grads = layer.grads();
    assert_eq!(grads.len(), 2);
    assert_eq!(
        grads[0].deep_clone(),
        RawTensor::from_rows(vec![vec![1.0, 2.0], vec![-1.0, -2.0], vec![2.0, 4.0]]).unwrap()
    );
    assert_eq!(grads[1].deep_clone(), RawTensor::from(vec![1.0, -1.0, 2.0]));
}

#[test]
fn test_params_and_grads_are_aligned() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let layer: Linear<f64> = Linear::new(10, 25, Init::Uniform, &mut rng);
    let params = layer.params();
    let grads = layer.grads();
    assert_eq!(params[0].shape(), vec![25, 10]);
    assert_eq!(params[1].shape(), vec![25]);
    for (p, g) in params.iter().zip(grads.iter()) {
        assert_eq!(p.shape(), g.shape());
    }
    assert!(params[0].ptr_eq(&layer.weights));
}

#[test]
fn test_layer_checks_dims() {
    let mut layer = fixed_layer();
    assert!(layer.forward(RawTensor::from(vec![1.0, 2.0, 3.0])).is_err());
    assert!(matches!(
        layer.backward(RawTensor::from(vec![1.0, 1.0, 1.0])),
        Err(Error::BackwardBeforeForward { layer: "Linear" })
    ));
    layer.forward(RawTensor::from(vec![1.0, 2.0])).unwrap();
    assert!(layer.backward(RawTensor::from(vec![1.0])).is_err());

    let bad_bias = Linear::<f64>::from_params(RawTensor::zeros(vec![3, 2]), RawTensor::zeros(vec![2]));
    assert!(bad_bias.is_err());
}

#[test]
fn test_layer_without_inputs_outputs_bias() {
    let mut layer = Linear::<f64>::from_params(RawTensor::zeros(vec![3, 0]), RawTensor::from(vec![1.0, 2.0, 3.0])).unwrap();
    let out = layer.forward(RawTensor::from(Vec::new())).unwrap();
    assert_eq!(out, RawTensor::from(vec![1.0, 2.0, 3.0]));
    let input_grad = layer.backward(RawTensor::from(vec![1.0, 1.0, 1.0])).unwrap();
    assert_eq!(input_grad.count(), 0);
    assert_eq!(layer.grads()[0].shape(), vec![3, 0]);
}
