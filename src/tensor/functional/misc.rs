use crate::tensor::numeric::*;
use crate::tensor::RawTensor;

/// Softmax along the last dimension.
pub fn softmax<T: Numeric>(tensor: &RawTensor<T>) -> RawTensor<T> {
    let mut array = Vec::with_capacity(tensor.count());
    softmax_nested(tensor.as_slice(), tensor.shape(), &mut array);
    RawTensor::new(array, tensor.shape().clone())
}

fn softmax_nested<T: Numeric>(array: &[T], shape: &[usize], out: &mut Vec<T>) {
    match shape {
        [] => out.push(T::one()),
        [_] => softmax_1d(array, out),
        [outer, inner @ ..] => {
            let stride = inner.iter().product::<usize>();
            if stride == 0 {
                return;
            }
            debug_assert_eq!(array.len(), outer * stride);
            for sub in array.chunks(stride) {
                softmax_nested(sub, inner, out);
            }
        }
    }
}

fn softmax_1d<T: Numeric>(array: &[T], out: &mut Vec<T>) {
    // Subtract the largest value for numerical stability.
    let largest = array.iter().copied().fold(T::neg_infinity(), T::max);
    let start = out.len();
    out.extend(array.iter().map(|&x| (x - largest).exp()));
    let sum_of_exps: T = out[start..].iter().copied().sum();
    for p in out[start..].iter_mut() {
        *p = *p / sum_of_exps;
    }
}

/// Index of the largest element, first one wins on ties.
pub fn argmax<T: Numeric>(values: &[T]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, T)>, (i, &x)| match best {
            Some((_, b)) if b >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
}

#[test]
fn test_softmax_sums_to_one() {
    let t = RawTensor::from(vec![1.0, 2.0, 3.0, -4.0]);
    let p = softmax(&t);
    assert!((p.sum() - 1.0_f64).abs() < 1e-12);
    assert!(p.as_slice().windows(2).take(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_softmax_large_inputs_do_not_overflow() {
    let t = RawTensor::from(vec![1000.0, 1000.0]);
    assert_eq!(softmax(&t), RawTensor::from(vec![0.5, 0.5]));
}

#[test]
fn test_softmax_is_per_last_dim() {
    let t = RawTensor::new(vec![0.0, 0.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0], vec![2, 2, 2]);
    let p = softmax(&t);
    assert_eq!(p.shape(), &vec![2, 2, 2]);
    for row in p.rows() {
        assert_eq!(row, &[0.5, 0.5]);
    }
}

#[test]
fn test_argmax() {
    assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    assert_eq!(argmax(&[0.5, 0.5]), Some(0));
    assert_eq!(argmax::<f64>(&[]), None);
}
