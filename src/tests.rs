use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::loss::{Loss, Sse, SoftmaxCrossEntropy};
use crate::nn::{Layer, Linear, Relu, Sequential, Sigmoid, Tanh};
use crate::tensor::functional::softmax;
use crate::tensor::{Init, RawTensor};

const EPS: f64 = 1e-5;
const TOLERANCE: f64 = 1e-4;

fn random_tensor(rng: &mut StdRng, len: usize) -> RawTensor<f64> {
    RawTensor::from((0..len).map(|_| rng.gen_range(-1.0..1.0)).collect::<Vec<_>>())
}

/// `sum(layer(x) * weights)`, a scalar whose gradient w.r.t. the output is `weights`.
fn weighted_output(layer: &mut dyn Layer<f64>, x: &RawTensor<f64>, weights: &RawTensor<f64>) -> f64 {
    let out = layer.forward(x.clone()).unwrap();
    out.dot(weights).unwrap()
}

fn assert_close(analytic: f64, numeric: f64, what: &str) {
    assert!(
        (analytic - numeric).abs() < TOLERANCE,
        "{what}: analytic={analytic}, numeric={numeric}"
    );
}

/// Compares `backward` against centred finite differences, both for the input
/// and for every parameter of `layer`.
fn check_gradients(layer: &mut dyn Layer<f64>, x: RawTensor<f64>, rng: &mut StdRng) {
    let out = layer.forward(x.clone()).unwrap();
    let weights = random_tensor(rng, out.count());
    let input_grad = layer.backward(weights.clone()).unwrap();
    let param_grads: Vec<_> = layer.grads().iter().map(|g| g.deep_clone()).collect();

    for i in 0..x.count() {
        let mut plus = x.clone().into_vec();
        let mut minus = plus.clone();
        plus[i] += EPS;
        minus[i] -= EPS;
        let numeric = (weighted_output(layer, &RawTensor::from(plus), &weights)
            - weighted_output(layer, &RawTensor::from(minus), &weights))
            / (2.0 * EPS);
        assert_close(input_grad.as_slice()[i], numeric, &format!("input {i}"));
    }

    for (p, (param, analytic)) in layer.params().iter().zip(&param_grads).enumerate() {
        let original = param.deep_clone();
        for j in 0..original.count() {
            let nudged = |delta: f64| {
                let mut values = original.clone().into_vec();
                values[j] += delta;
                RawTensor::new(values, original.shape().clone())
            };
            param.assign(nudged(EPS)).unwrap();
            let up = weighted_output(layer, &x, &weights);
            param.assign(nudged(-EPS)).unwrap();
            let down = weighted_output(layer, &x, &weights);
            param.assign(original.clone()).unwrap();
            let numeric = (up - down) / (2.0 * EPS);
            assert_close(analytic.as_slice()[j], numeric, &format!("param {p}, element {j}"));
        }
    }
}

#[test]
fn test_linear_gradients() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut layer = Linear::new(3, 4, Init::Xavier, &mut rng);
    let x = random_tensor(&mut rng, 3);
    check_gradients(&mut layer, x, &mut rng);
}

#[test]
fn test_activation_gradients() {
    let mut rng = StdRng::seed_from_u64(1);
    let x = random_tensor(&mut rng, 6);
    check_gradients(&mut Sigmoid::<f64>::new(), x.clone(), &mut rng);
    check_gradients(&mut Tanh::<f64>::new(), x, &mut rng);

    // keep clear of the kink at zero
    let x = RawTensor::from(vec![-0.9, -0.3, 0.2, 0.7, -0.05, 1.3]);
    check_gradients(&mut Relu::<f64>::new(), x, &mut rng);
}

#[test]
fn test_composed_gradients() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut net = Sequential::<f64>::default()
        .with(Linear::new(4, 5, Init::Xavier, &mut rng))
        .with(Tanh::new())
        .with(Linear::new(5, 3, Init::Normal, &mut rng))
        .with(Sigmoid::new())
        .with(Linear::new(3, 2, Init::Uniform, &mut rng));
    let x = random_tensor(&mut rng, 4);
    check_gradients(&mut net, x, &mut rng);
}

#[test]
fn test_relu_layer_in_network_gradients() {
    // Inputs and weights fixed so no pre-activation lands near zero.
    let first = Linear::from_params(
        RawTensor::from_rows(vec![vec![1.0, -0.5], vec![-0.8, 0.3], vec![0.6, 0.9]]).unwrap(),
        RawTensor::from(vec![0.1, -0.2, 0.05]),
    )
    .unwrap();
    let second = Linear::from_params(
        RawTensor::from_rows(vec![vec![0.7, -1.1, 0.4]]).unwrap(),
        RawTensor::from(vec![0.0]),
    )
    .unwrap();
    let mut net = Sequential::new(vec![
        Box::new(first) as Box<dyn Layer<f64>>,
        Box::new(Relu::<f64>::new()),
        Box::new(second),
    ]);
    let mut rng = StdRng::seed_from_u64(5);
    check_gradients(&mut net, RawTensor::from(vec![0.4, -0.6]), &mut rng);
}

#[test]
fn test_loss_gradients_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(11);
    let predicted = random_tensor(&mut rng, 5);
    let actual = RawTensor::from(vec![0.0, 0.0, 1.0, 0.0, 0.0]);
    let losses: [&dyn Loss<f64>; 2] = [&Sse, &SoftmaxCrossEntropy];
    for loss in losses {
        let gradient = loss.gradient(&predicted, &actual).unwrap();
        for i in 0..predicted.count() {
            let mut plus = predicted.clone().into_vec();
            let mut minus = plus.clone();
            plus[i] += EPS;
            minus[i] -= EPS;
            let numeric = (loss.loss(&RawTensor::from(plus), &actual).unwrap()
                - loss.loss(&RawTensor::from(minus), &actual).unwrap())
                / (2.0 * EPS);
            assert_close(gradient.as_slice()[i], numeric, &format!("loss element {i}"));
        }
    }
}

#[test]
fn test_softmax_translation_invariance() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..10 {
        let x = random_tensor(&mut rng, 7).map(|v| v * 20.0);
        let shift: f64 = rng.gen_range(-50.0..50.0);
        let p = softmax(&x);
        let shifted = softmax(&x.map(|v| v + shift));
        assert!((p.sum() - 1.0).abs() < 1e-12);
        for (a, b) in p.as_slice().iter().zip(shifted.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
