use serde::{Deserialize, Serialize};

use crate::optim::{GradientDescent, Momentum, Optimizer};
use crate::tensor::Numeric;

fn default_learning_rate() -> f64 {
    0.1
}

fn default_momentum() -> f64 {
    0.9
}

/// Optimizer hyperparameters, e.g. `{"kind": "momentum", "learning_rate": 0.1}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    GradientDescent {
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
    },
    Momentum {
        learning_rate: f64,
        #[serde(default = "default_momentum")]
        momentum: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::GradientDescent {
            learning_rate: default_learning_rate(),
        }
    }
}

impl OptimizerConfig {
    pub fn build<T: Numeric>(&self) -> Box<dyn Optimizer<T>> {
        match *self {
            OptimizerConfig::GradientDescent { learning_rate } => {
                Box::new(GradientDescent::new(T::constant(learning_rate)))
            }
            OptimizerConfig::Momentum {
                learning_rate,
                momentum,
            } => Box::new(Momentum::new(
                T::constant(learning_rate),
                T::constant(momentum),
            )),
        }
    }
}

#[test]
fn test_optimizer_config_from_json() {
    let config: OptimizerConfig =
        serde_json::from_str(r#"{"kind": "momentum", "learning_rate": 0.05}"#).unwrap();
    assert_eq!(
        config,
        OptimizerConfig::Momentum {
            learning_rate: 0.05,
            momentum: 0.9
        }
    );

    let config: OptimizerConfig = serde_json::from_str(r#"{"kind": "gradient_descent"}"#).unwrap();
    assert_eq!(config, OptimizerConfig::default());

    assert!(serde_json::from_str::<OptimizerConfig>(r#"{"kind": "adam"}"#).is_err());
}

#[test]
fn test_built_optimizer_steps() {
    use crate::nn::{Layer, Linear};
    use crate::tensor::RawTensor;

    let mut layer = Linear::from_params(
        RawTensor::from_rows(vec![vec![1.0]]).unwrap(),
        RawTensor::from(vec![0.0]),
    )
    .unwrap();
    layer.forward(RawTensor::from(vec![1.0])).unwrap();
    layer.backward(RawTensor::from(vec![1.0])).unwrap();

    let mut optimizer = OptimizerConfig::GradientDescent { learning_rate: 0.5 }.build::<f64>();
    optimizer.step(&layer).unwrap();
    assert_eq!(layer.weights.deep_clone(), RawTensor::from_rows(vec![vec![0.5]]).unwrap());
}
