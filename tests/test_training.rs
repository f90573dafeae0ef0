use light_nn::loss::{Loss, SoftmaxCrossEntropy, Sse};
use light_nn::nn::{Dropout, Layer, Linear, Sequential, Sigmoid, Tanh};
use light_nn::optim::{GradientDescent, Momentum, Optimizer, OptimizerConfig};
use light_nn::persistence::{load_weights, read_weights, save_weights, write_weights};
use light_nn::tensor::{Init, RawTensor};
use light_nn::{argmax, train_epoch, Error};

use rand::prelude::*;

fn xor_data() -> (Vec<RawTensor<f64>>, Vec<RawTensor<f64>>) {
    let xs = vec![
        RawTensor::from(vec![0.0, 0.0]),
        RawTensor::from(vec![0.0, 1.0]),
        RawTensor::from(vec![1.0, 0.0]),
        RawTensor::from(vec![1.0, 1.0]),
    ];
    let ys = vec![
        RawTensor::from(vec![0.0]),
        RawTensor::from(vec![1.0]),
        RawTensor::from(vec![1.0]),
        RawTensor::from(vec![0.0]),
    ];
    (xs, ys)
}

fn xor_net() -> Sequential<f64> {
    let hidden = Linear::from_params(
        RawTensor::from_rows(vec![vec![0.5, 0.4], vec![-0.6, 0.8]]).unwrap(),
        RawTensor::from(vec![0.0, 0.0]),
    )
    .unwrap();
    let output = Linear::from_params(
        RawTensor::from_rows(vec![vec![0.3, -0.5]]).unwrap(),
        RawTensor::from(vec![0.0]),
    )
    .unwrap();
    Sequential::<f64>::default()
        .with(hidden)
        .with(Sigmoid::new())
        .with(output)
}

fn snapshot(net: &dyn Layer<f64>) -> Vec<RawTensor<f64>> {
    net.params().iter().map(|p| p.deep_clone()).collect()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("light_nn_{}_{}.json", name, std::process::id()))
}

#[test]
fn test_xor_training() {
    let (xs, ys) = xor_data();
    let mut net = xor_net();
    let mut optimizer = GradientDescent::<f64>::new(0.1);
    let loss = Sse;

    let mut epoch_loss = f64::INFINITY;
    for _ in 0..3000 {
        epoch_loss = 0.0;
        for (x, y) in xs.iter().zip(&ys) {
            let predicted = net.forward(x.clone()).unwrap();
            epoch_loss += loss.loss(&predicted, y).unwrap();
            let gradient = loss.gradient(&predicted, y).unwrap();
            net.backward(gradient).unwrap();
            optimizer.step(&net).unwrap();
        }
    }
    assert!(epoch_loss < 0.01, "epoch_loss={epoch_loss}");

    for (x, y) in xs.iter().zip(&ys) {
        let predicted = net.forward(x.clone()).unwrap();
        let error = (predicted.as_slice()[0] - y.as_slice()[0]).abs();
        assert!(error < 0.1, "x={x:?}, predicted={predicted:?}");
    }
}

#[test]
fn test_xor_training_from_xavier_init() {
    let (xs, ys) = xor_data();
    let mut rng = StdRng::seed_from_u64(0);
    let mut net = Sequential::<f64>::default()
        .with(Linear::new(2, 2, Init::Xavier, &mut rng))
        .with(Sigmoid::new())
        .with(Linear::new(2, 1, Init::Xavier, &mut rng));
    let mut optimizer = GradientDescent::<f64>::new(0.1);

    let mut epoch_loss = f64::INFINITY;
    for _ in 0..3000 {
        epoch_loss = train_epoch(&mut net, &Sse, &mut optimizer, xs.iter().zip(&ys)).unwrap();
    }
    assert!(epoch_loss < 0.01, "epoch_loss={epoch_loss}");

    for (x, y) in xs.iter().zip(&ys) {
        let predicted = net.forward(x.clone()).unwrap();
        assert!((predicted.as_slice()[0] - y.as_slice()[0]).abs() < 0.1, "x={x:?}, predicted={predicted:?}");
    }
}

#[test]
fn test_save_then_load_keeps_params() {
    let mut rng = StdRng::seed_from_u64(42);
    let net = Sequential::<f64>::default()
        .with(Linear::new(10, 25, Init::Uniform, &mut rng))
        .with(Tanh::new())
        .with(Linear::new(25, 4, Init::Xavier, &mut rng));
    let before = snapshot(&net);

    let path = temp_path("roundtrip");
    save_weights(&net, &path).unwrap();
    load_weights(&net, &path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(snapshot(&net), before);
}

#[test]
fn test_load_into_fresh_model() {
    let (xs, ys) = xor_data();
    let mut trained = xor_net();
    let mut optimizer = GradientDescent::<f64>::new(0.1);
    for _ in 0..200 {
        train_epoch(&mut trained, &Sse, &mut optimizer, xs.iter().zip(&ys)).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(1);
    let mut fresh = Sequential::<f64>::default()
        .with(Linear::new(2, 2, Init::Normal, &mut rng))
        .with(Sigmoid::new())
        .with(Linear::new(2, 1, Init::Normal, &mut rng));
    let held = fresh.params();

    let mut buffer = Vec::new();
    write_weights(&trained, &mut buffer).unwrap();
    read_weights(&fresh, buffer.as_slice()).unwrap();

    // the handles held before loading see the new values
    for (handle, expected) in held.iter().zip(snapshot(&trained)) {
        assert_eq!(handle.deep_clone(), expected);
    }
    for x in xs.iter() {
        assert_eq!(
            fresh.forward(x.clone()).unwrap(),
            trained.forward(x.clone()).unwrap()
        );
    }
}

#[test]
fn test_load_with_wrong_shapes_leaves_model_unchanged() {
    let mut rng = StdRng::seed_from_u64(7);
    let small = Sequential::<f64>::default()
        .with(Linear::new(2, 3, Init::Xavier, &mut rng))
        .with(Linear::new(3, 1, Init::Xavier, &mut rng));
    let other = Sequential::<f64>::default()
        .with(Linear::new(2, 3, Init::Xavier, &mut rng))
        .with(Linear::new(3, 2, Init::Xavier, &mut rng));
    let before = snapshot(&small);

    let path = temp_path("mismatch");
    save_weights(&other, &path).unwrap();
    let result = load_weights(&small, &path);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(Error::ShapeMismatch { .. })), "{result:?}");
    assert_eq!(snapshot(&small), before);
}

#[test]
fn test_load_with_wrong_count_is_rejected() {
    let mut rng = StdRng::seed_from_u64(8);
    let one = Linear::<f64>::new(2, 2, Init::Xavier, &mut rng);
    let two = Sequential::<f64>::default()
        .with(Linear::new(2, 2, Init::Xavier, &mut rng))
        .with(Linear::new(2, 2, Init::Xavier, &mut rng));
    let before = snapshot(&two);

    let mut buffer = Vec::new();
    write_weights(&one, &mut buffer).unwrap();
    let result = read_weights(&two, buffer.as_slice());
    assert!(matches!(
        result,
        Err(Error::ParamCountMismatch { stored: 2, expected: 4 })
    ));
    assert_eq!(snapshot(&two), before);

    assert!(matches!(
        read_weights(&two, "not json".as_bytes()),
        Err(Error::Json(_))
    ));
    assert!(matches!(
        load_weights(&two, temp_path("does_not_exist")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_softmax_classifier_with_momentum_and_dropout() {
    // Four well separated clusters, one per class.
    let centres = [[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]];
    let mut rng = StdRng::seed_from_u64(2024);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for _ in 0..20 {
        for (class, centre) in centres.iter().enumerate() {
            let x = centre
                .iter()
                .map(|c| {
                    let noise: f64 = rng.gen_range(-0.3..0.3);
                    c + noise
                })
                .collect::<Vec<f64>>();
            let mut y = vec![0.0; 4];
            y[class] = 1.0;
            xs.push(RawTensor::from(x));
            ys.push(RawTensor::from(y));
        }
    }

    let mut net = Sequential::<f64>::default()
        .with(Linear::new(2, 16, Init::Xavier, &mut rng))
        .with(Tanh::new())
        .with(Dropout::<f64>::with_seed(0.1, 99).unwrap())
        .with(Linear::new(16, 4, Init::Xavier, &mut rng));
    let mut optimizer = Momentum::<f64>::new(0.01, 0.9);

    let first = train_epoch(&mut net, &SoftmaxCrossEntropy, &mut optimizer, xs.iter().zip(&ys)).unwrap();
    let mut last = first;
    for _ in 0..60 {
        last = train_epoch(&mut net, &SoftmaxCrossEntropy, &mut optimizer, xs.iter().zip(&ys)).unwrap();
    }
    assert!(last < first, "first={first}, last={last}");

    net.set_training(false);
    let correct = xs
        .iter()
        .zip(&ys)
        .filter(|(x, y)| {
            let predicted = net.forward((*x).clone()).unwrap();
            argmax(predicted.as_slice()) == argmax(y.as_slice())
        })
        .count();
    assert!(correct as f64 / xs.len() as f64 > 0.9, "correct={correct}");
    assert!(matches!(
        net.backward(RawTensor::from(vec![0.0; 4])),
        Err(Error::BackwardInEvalMode)
    ));
}

#[test]
fn test_optimizer_from_config_trains() {
    let (xs, ys) = xor_data();
    let mut net = xor_net();
    let config: OptimizerConfig =
        serde_json::from_str(r#"{"kind": "momentum", "learning_rate": 0.1, "momentum": 0.5}"#).unwrap();
    let mut optimizer = config.build::<f64>();
    let first = train_epoch(&mut net, &Sse, &mut *optimizer, xs.iter().zip(&ys)).unwrap();
    let mut last = first;
    for _ in 0..500 {
        last = train_epoch(&mut net, &Sse, &mut *optimizer, xs.iter().zip(&ys)).unwrap();
    }
    assert!(last < first);
}
