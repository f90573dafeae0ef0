use crate::error::Result;
use crate::nn::Layer;
use crate::tensor::{Numeric, RawTensor, TensorList};

/// A layer made of a sequence of other layers.
///
/// It's up to the caller to make sure the output of each layer makes sense as
/// the input to the next one.
pub struct Sequential<T: Numeric> {
    layers: Vec<Box<dyn Layer<T>>>,
}

impl<T: Numeric> Sequential<T> {
    pub fn new(layers: Vec<Box<dyn Layer<T>>>) -> Sequential<T> {
        Sequential { layers }
    }

    /// Append a layer, builder style.
    pub fn with<L: Layer<T> + 'static>(mut self, layer: L) -> Sequential<T> {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<T: Numeric> Default for Sequential<T> {
    fn default() -> Self {
        Sequential::new(Vec::new())
    }
}

impl<T: Numeric> Layer<T> for Sequential<T> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>> {
        self.layers
            .iter_mut()
            .try_fold(input, |prev, layer| layer.forward(prev))
    }

    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>> {
        self.layers
            .iter_mut()
            .rev()
            .try_fold(gradient, |grad, layer| layer.backward(grad))
    }

    fn params(&self) -> TensorList<T> {
        self.layers
            .iter()
            .flat_map(|layer| layer.params())
            .collect()
    }

    fn grads(&self) -> TensorList<T> {
        self.layers
            .iter()
            .flat_map(|layer| layer.grads())
            .collect()
    }

    fn set_training(&mut self, training: bool) {
        self.layers
            .iter_mut()
            .for_each(|layer| layer.set_training(training));
    }
}

#[test]
fn test_sequential_creation() {
    use crate::nn::{Linear, Relu, Sigmoid};
    use crate::tensor::Init;
    use rand::SeedableRng;

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let net = Sequential::<f64>::default()
        .with(Linear::new(2, 3, Init::Xavier, &mut rng))
        .with(Sigmoid::new())
        .with(Linear::new(3, 4, Init::Xavier, &mut rng))
        .with(Relu::new())
        .with(Linear::new(4, 1, Init::Xavier, &mut rng));
    assert_eq!(net.len(), 5);

    let shapes: Vec<_> = net.params().iter().map(|p| p.shape()).collect();
    assert_eq!(
        shapes,
        vec![vec![3, 2], vec![3], vec![4, 3], vec![4], vec![1, 4], vec![1]]
    );
    let grad_shapes: Vec<_> = net.grads().iter().map(|g| g.shape()).collect();
    assert_eq!(shapes, grad_shapes);
}

#[test]
fn test_sequential_forward_backward() {
    use crate::nn::{Linear, Sigmoid};

    let mut first = Linear::from_params(
        RawTensor::from_rows(vec![vec![1.0, -1.0], vec![0.5, 2.0]]).unwrap(),
        RawTensor::from(vec![0.0, -1.0]),
    )
    .unwrap();
    let mut second = Linear::from_params(
        RawTensor::from_rows(vec![vec![2.0, -3.0]]).unwrap(),
        RawTensor::from(vec![0.5]),
    )
    .unwrap();
    let mut sigmoid = Sigmoid::<f64>::new();
    let input = RawTensor::from(vec![0.3, -0.7]);
    let out_grad = RawTensor::from(vec![1.5]);

    // run the layers by hand
    let h = first.forward(input.clone()).unwrap();
    let s = sigmoid.forward(h).unwrap();
    let expected_out = second.forward(s).unwrap();
    let g = second.backward(out_grad.clone()).unwrap();
    let g = sigmoid.backward(g).unwrap();
    let expected_grad = first.backward(g).unwrap();

    let mut net = Sequential::new(vec![
        Box::new(first) as Box<dyn Layer<f64>>,
        Box::new(Sigmoid::<f64>::new()),
        Box::new(second),
    ]);
    let out = net.forward(input).unwrap();
    let grad = net.backward(out_grad).unwrap();
    assert_eq!(out, expected_out);
    assert_eq!(grad, expected_grad);
}

#[test]
fn test_sequential_toggles_dropout() {
    use crate::nn::Dropout;

    let mut net = Sequential::<f64>::default().with(Dropout::<f64>::with_seed(0.5, 9).unwrap());
    net.set_training(false);
    let out = net.forward(RawTensor::from(vec![2.0, 4.0])).unwrap();
    assert_eq!(out, RawTensor::from(vec![1.0, 2.0]));
    assert!(net.backward(RawTensor::from(vec![1.0, 1.0])).is_err());

    net.set_training(true);
    net.forward(RawTensor::from(vec![2.0, 4.0])).unwrap();
    assert!(net.backward(RawTensor::from(vec![1.0, 1.0])).is_ok());
    assert!(net.params().is_empty());
}
