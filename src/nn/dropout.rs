use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution};

use crate::error::{Error, Result};
use crate::nn::Layer;
use crate::tensor::{Numeric, RawTensor};

/// Randomly zeroes inputs while training; scales them by `1 - p` when
/// evaluating.
#[derive(Debug, Clone)]
pub struct Dropout<T: Numeric> {
    p: f64,
    train: bool,
    drop: Bernoulli,
    rng: StdRng,
    mask: Option<RawTensor<T>>,
}

impl<T: Numeric> Dropout<T> {
    /// A dropout layer in train mode, seeded from system entropy.
    pub fn new(p: f64) -> Result<Self> {
        Dropout::with_rng(p, StdRng::from_entropy())
    }

    /// A dropout layer whose masks are reproducible from `seed`.
    pub fn with_seed(p: f64, seed: u64) -> Result<Self> {
        Dropout::with_rng(p, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(p: f64, rng: StdRng) -> Result<Self> {
        let drop = Bernoulli::new(p).map_err(|_| Error::InvalidProbability(p))?;
        Ok(Dropout {
            p,
            train: true,
            drop,
            rng,
            mask: None,
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn is_training(&self) -> bool {
        self.train
    }
}

impl<T: Numeric> Layer<T> for Dropout<T> {
    fn forward(&mut self, input: RawTensor<T>) -> Result<RawTensor<T>> {
        if !self.train {
            // During evaluation just scale down the outputs uniformly.
            let keep = T::constant(1.0 - self.p);
            return Ok(input.map(|x| x * keep));
        }
        let (bernoulli, rng) = (&self.drop, &mut self.rng);
        let mask_values = (0..input.count())
            .map(|_| if bernoulli.sample(rng) { T::zero() } else { T::one() })
            .collect();
        let mask = RawTensor::new(mask_values, input.shape().clone());
        let output = input.zip_map(&mask, |x, m| x * m)?;
        self.mask = Some(mask);
        Ok(output)
    }

    fn backward(&mut self, gradient: RawTensor<T>) -> Result<RawTensor<T>> {
        if !self.train {
            return Err(Error::BackwardInEvalMode);
        }
        let mask = self
            .mask
            .take()
            .ok_or(Error::BackwardBeforeForward { layer: "Dropout" })?;
        // Only propagate the gradients where mask == 1
        gradient.zip_map(&mask, |g, m| g * m)
    }

    fn set_training(&mut self, training: bool) {
        self.train = training;
        if !training {
            self.mask = None;
        }
    }
}

#[test]
fn test_dropout_backward_reuses_mask() {
    let mut dropout = Dropout::<f64>::with_seed(0.5, 42).unwrap();
    let input = RawTensor::new_with_filler(vec![4, 8], 3.0);
    let out = dropout.forward(input).unwrap();
    let back = dropout.backward(RawTensor::new_with_filler(vec![4, 8], 1.0)).unwrap();
    for (&o, &b) in out.as_slice().iter().zip(back.as_slice()) {
        assert!(o == 0.0 || o == 3.0);
        assert_eq!(o, 3.0 * b);
    }
    let dropped = out.as_slice().iter().filter(|&&o| o == 0.0).count();
    assert!(dropped > 0 && dropped < 32, "dropped={dropped}");
}

#[test]
fn test_dropout_is_reproducible() {
    let input = RawTensor::from((0..64).map(|i| i as f64 + 1.0).collect::<Vec<_>>());
    let mut first = Dropout::<f64>::with_seed(0.3, 7).unwrap();
    let mut second = Dropout::<f64>::with_seed(0.3, 7).unwrap();
    assert_eq!(first.forward(input.clone()).unwrap(), second.forward(input).unwrap());
}

#[test]
fn test_dropout_extreme_probabilities() {
    let input = RawTensor::from(vec![1.0, -2.0, 3.0]);
    let mut keep_all = Dropout::<f64>::with_seed(0.0, 1).unwrap();
    assert_eq!(keep_all.forward(input.clone()).unwrap(), input);
    let mut drop_all = Dropout::<f64>::with_seed(1.0, 1).unwrap();
    assert_eq!(drop_all.forward(input).unwrap(), RawTensor::zeros(vec![3]));
    assert!(matches!(
        Dropout::<f64>::new(1.5),
        Err(Error::InvalidProbability(p)) if p == 1.5
    ));
}

#[test]
fn test_dropout_eval_mode() {
    let mut dropout = Dropout::<f64>::with_seed(0.25, 3).unwrap();
    dropout.set_training(false);
    assert!(!dropout.is_training());
    let out = dropout.forward(RawTensor::from(vec![4.0, -8.0])).unwrap();
    assert_eq!(out, RawTensor::from(vec![3.0, -6.0]));
    assert!(matches!(
        dropout.backward(RawTensor::from(vec![1.0, 1.0])),
        Err(Error::BackwardInEvalMode)
    ));
}
