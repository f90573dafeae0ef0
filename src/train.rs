use crate::error::Result;
use crate::loss::Loss;
use crate::nn::Layer;
use crate::optim::Optimizer;
use crate::tensor::{Numeric, RawTensor};

/// One pass over `samples`: forward, loss, backward, then an optimizer step
/// per sample. Returns the summed loss of the epoch.
pub fn train_epoch<'a, T, N, L, O, I>(net: &mut N, loss: &L, optimizer: &mut O, samples: I) -> Result<T>
where
    T: Numeric,
    N: Layer<T>,
    L: Loss<T> + ?Sized,
    O: Optimizer<T> + ?Sized,
    I: IntoIterator<Item = (&'a RawTensor<T>, &'a RawTensor<T>)>,
{
    let mut epoch_loss = T::zero();
    for (x, y) in samples {
        let predicted = net.forward(x.clone())?;
        epoch_loss += loss.loss(&predicted, y)?;
        let gradient = loss.gradient(&predicted, y)?;
        net.backward(gradient)?;
        optimizer.step(&*net)?;
    }
    Ok(epoch_loss)
}

#[test]
fn test_train_epoch_reduces_loss() {
    use crate::loss::Sse;
    use crate::nn::Linear;
    use crate::optim::GradientDescent;

    let mut net = Linear::<f64>::from_params(RawTensor::zeros(vec![1, 1]), RawTensor::zeros(vec![1])).unwrap();
    let xs: Vec<RawTensor<f64>> = (0..5).map(|i| RawTensor::from(vec![i as f64 * 0.25])).collect();
    let ys: Vec<RawTensor<f64>> = xs.iter().map(|x| x.map(|v| 3.0 * v - 1.0)).collect();
    let mut optimizer = GradientDescent::<f64>::new(0.1);

    let first = train_epoch(&mut net, &Sse, &mut optimizer, xs.iter().zip(&ys)).unwrap();
    let mut last = first;
    for _ in 0..500 {
        last = train_epoch(&mut net, &Sse, &mut optimizer, xs.iter().zip(&ys)).unwrap();
    }
    assert!(last < first * 1e-3, "first={first}, last={last}");
    assert!((net.weights.deep_clone().as_slice()[0] - 3.0).abs() < 1e-2);
    assert!((net.bias.deep_clone().as_slice()[0] + 1.0).abs() < 1e-2);
}
