use crate::error::Result;
use crate::tensor::functional::softmax;
use crate::tensor::{Numeric, RawTensor};

pub trait Loss<T: Numeric> {
    /// How good are the predictions? Larger numbers are worse.
    fn loss(&self, predicted: &RawTensor<T>, actual: &RawTensor<T>) -> Result<T>;

    /// How does the loss change as the predictions change?
    fn gradient(&self, predicted: &RawTensor<T>, actual: &RawTensor<T>) -> Result<RawTensor<T>>;
}

/// Sum of the squared errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sse;

impl<T: Numeric> Loss<T> for Sse {
    fn loss(&self, predicted: &RawTensor<T>, actual: &RawTensor<T>) -> Result<T> {
        let squared_errors = predicted.zip_map(actual, |p, a| (p - a) * (p - a))?;
        Ok(squared_errors.sum())
    }

    fn gradient(&self, predicted: &RawTensor<T>, actual: &RawTensor<T>) -> Result<RawTensor<T>> {
        predicted.zip_map(actual, |p, a| T::constant(2.0) * (p - a))
    }
}

/// Negative log-likelihood of `actual` under the softmax of `predicted`.
///
/// Minimising it maximises the likelihood of the observed data. `predicted`
/// holds raw scores, not probabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftmaxCrossEntropy;

impl SoftmaxCrossEntropy {
    /// Added to each probability before taking the log so masked-out classes
    /// do not produce `log(0)`.
    pub const EPSILON: f64 = 1e-30;
}

impl<T: Numeric> Loss<T> for SoftmaxCrossEntropy {
    fn loss(&self, predicted: &RawTensor<T>, actual: &RawTensor<T>) -> Result<T> {
        let probabilities = softmax(predicted);
        let eps = T::constant(Self::EPSILON);
        let likelihoods = probabilities.zip_map(actual, |p, act| (p + eps).ln() * act)?;
        Ok(-likelihoods.sum())
    }

    fn gradient(&self, predicted: &RawTensor<T>, actual: &RawTensor<T>) -> Result<RawTensor<T>> {
        // d/dx of softmax followed by cross-entropy collapses to p - actual.
        softmax(predicted).zip_map(actual, |p, act| p - act)
    }
}

#[test]
fn test_sse() {
    let predicted = RawTensor::from(vec![1.0, 2.0, 3.0]);
    let actual = RawTensor::from(vec![1.5, 2.0, 1.0]);
    assert_eq!(Sse.loss(&predicted, &actual).unwrap(), 0.25 + 0.0 + 4.0);
    assert_eq!(
        Sse.gradient(&predicted, &actual).unwrap(),
        RawTensor::from(vec![-1.0, 0.0, 4.0])
    );
    assert!(Sse.loss(&predicted, &RawTensor::from(vec![1.0])).is_err());
}

#[test]
fn test_softmax_cross_entropy_gradient() {
    let predicted = RawTensor::from(vec![2.0, -1.0, 0.5, 0.0]);
    let actual = RawTensor::from(vec![0.0, 0.0, 1.0, 0.0]);
    let gradient = SoftmaxCrossEntropy.gradient(&predicted, &actual).unwrap();
    let probabilities = softmax(&predicted);
    for ((&g, &p), &a) in gradient
        .as_slice()
        .iter()
        .zip(probabilities.as_slice())
        .zip(actual.as_slice())
    {
        assert_eq!(g, p - a);
    }

    let loss: f64 = SoftmaxCrossEntropy.loss(&predicted, &actual).unwrap();
    assert!((loss + probabilities.as_slice()[2].ln()).abs() < 1e-12);
}

#[test]
fn test_softmax_cross_entropy_never_takes_log_zero() {
    // The softmax of the first entry underflows to exactly zero.
    let predicted = RawTensor::from(vec![-1000.0, 1000.0]);
    let actual = RawTensor::from(vec![1.0, 0.0]);
    let loss: f64 = SoftmaxCrossEntropy.loss(&predicted, &actual).unwrap();
    assert!(loss.is_finite());
    assert!((loss - (-(1e-30_f64).ln())).abs() < 1e-9);
}
