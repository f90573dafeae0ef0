use crate::tensor::numeric::*;
use crate::tensor::RawTensor;

pub fn sigmoid<T: Numeric>(x: T) -> T {
    T::one() / (T::one() + (-x).exp())
}

/// `tanh` that saturates to exactly ±1 outside `[-100, 100]` instead of
/// overflowing in `exp`.
pub fn tanh<T: Numeric>(x: T) -> T {
    let limit = T::constant(100.0);
    if x < -limit {
        return -T::one();
    } else if x > limit {
        return T::one();
    }
    let em2x = (T::constant(-2.0) * x).exp();
    (T::one() - em2x) / (T::one() + em2x)
}

pub fn relu<T: Numeric>(x: T) -> T {
    x.max(T::zero())
}

pub fn sigmoid_tensor<T: Numeric>(tensor: &RawTensor<T>) -> RawTensor<T> {
    tensor.map(sigmoid)
}

pub fn tanh_tensor<T: Numeric>(tensor: &RawTensor<T>) -> RawTensor<T> {
    tensor.map(tanh)
}

pub fn relu_tensor<T: Numeric>(tensor: &RawTensor<T>) -> RawTensor<T> {
    tensor.map(relu)
}

#[test]
fn test_tanh_saturates() {
    assert_eq!(tanh(1000.0_f64), 1.0);
    assert_eq!(tanh(-1000.0_f64), -1.0);
    assert_eq!(tanh(1e30_f32), 1.0);
    assert_eq!(tanh(0.0_f64), 0.0);
}

#[test]
fn test_tanh_matches_std() {
    for x in [-20.0, -3.0, -0.5, 0.25, 1.0, 4.0, 99.0] {
        let expected = f64::tanh(x);
        assert!((tanh(x) - expected).abs() < 1e-12, "x={x}");
    }
}

#[test]
fn test_sigmoid_and_relu() {
    assert_eq!(sigmoid(0.0_f64), 0.5);
    assert!(sigmoid(40.0_f64) > 0.999_999);
    assert_eq!(relu(-2.0_f64), 0.0);
    assert_eq!(relu(3.5_f64), 3.5);
    let t = RawTensor::from(vec![-1.0, 0.0, 2.0]);
    assert_eq!(relu_tensor(&t), RawTensor::from(vec![0.0, 0.0, 2.0]));
}
