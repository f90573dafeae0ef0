//! Saving and loading model parameters as JSON.
//!
//! The file is a JSON array with one entry per parameter, in `params()` order.
//! Each entry is the tensor written as nested arrays, so a `Linear(2, 3)` layer
//! contributes `[[w00, w01], [w10, w11], [w20, w21]]` followed by `[b0, b1, b2]`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::nn::Layer;
use crate::tensor::{Numeric, RawTensor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum NestedTensor {
    Scalar(f64),
    List(Vec<NestedTensor>),
}

impl NestedTensor {
    fn from_raw<T: Numeric>(tensor: &RawTensor<T>) -> NestedTensor {
        Self::from_slice(tensor.as_slice(), tensor.shape())
    }

    fn from_slice<T: Numeric>(array: &[T], shape: &[usize]) -> NestedTensor {
        match shape {
            [] => NestedTensor::Scalar(array.first().map_or(0.0, |x| x.as_f64())),
            [_] => NestedTensor::List(
                array
                    .iter()
                    .map(|x| NestedTensor::Scalar(x.as_f64()))
                    .collect(),
            ),
            [outer, inner @ ..] => {
                let stride = inner.iter().product::<usize>();
                NestedTensor::List(
                    (0..*outer)
                        .map(|i| Self::from_slice(&array[i * stride..(i + 1) * stride], inner))
                        .collect(),
                )
            }
        }
    }

    /// The shape implied by the nesting; errors if siblings disagree.
    fn shape(&self) -> Result<Vec<usize>> {
        match self {
            NestedTensor::Scalar(_) => Ok(Vec::new()),
            NestedTensor::List(items) => {
                let shapes = items
                    .iter()
                    .map(NestedTensor::shape)
                    .collect::<Result<Vec<_>>>()?;
                if !shapes.iter().all_equal() {
                    return Err(Error::RaggedTensor);
                }
                let mut shape = vec![items.len()];
                if let Some(first) = shapes.into_iter().next() {
                    shape.extend(first);
                }
                Ok(shape)
            }
        }
    }

    fn flatten_into<T: Numeric>(&self, out: &mut Vec<T>) {
        match self {
            NestedTensor::Scalar(x) => out.push(T::constant(*x)),
            NestedTensor::List(items) => items.iter().for_each(|item| item.flatten_into(out)),
        }
    }

    fn into_raw<T: Numeric>(self) -> Result<RawTensor<T>> {
        let shape = self.shape()?;
        let mut array = Vec::with_capacity(shape.iter().product());
        self.flatten_into(&mut array);
        Ok(RawTensor::new(array, shape))
    }
}

/// Write the parameters of `model` as JSON to `writer`.
///
/// JSON has no NaN or infinity, so a model holding either is rejected before
/// anything is written.
pub fn write_weights<T, L, W>(model: &L, writer: W) -> Result<()>
where
    T: Numeric,
    L: Layer<T> + ?Sized,
    W: Write,
{
    let params = model.params();
    if let Some(param) = params
        .iter()
        .position(|p| p.borrow().as_slice().iter().any(|x| !x.is_finite()))
    {
        return Err(Error::NonFiniteParam { param });
    }
    let weights: Vec<NestedTensor> = params
        .iter()
        .map(|param| NestedTensor::from_raw(&param.borrow()))
        .collect();
    serde_json::to_writer(writer, &weights)?;
    Ok(())
}

/// Read parameters written by [`write_weights`] into `model`.
///
/// Every stored tensor is checked against the corresponding live parameter
/// before anything is written, so on error the model is left untouched.
pub fn read_weights<T, L, R>(model: &L, reader: R) -> Result<()>
where
    T: Numeric,
    L: Layer<T> + ?Sized,
    R: Read,
{
    let stored: Vec<NestedTensor> = serde_json::from_reader(reader)?;
    let params = model.params();
    if stored.len() != params.len() {
        return Err(Error::ParamCountMismatch {
            stored: stored.len(),
            expected: params.len(),
        });
    }

    let weights = stored
        .into_iter()
        .zip(&params)
        .map(|(nested, param)| -> Result<RawTensor<T>> {
            let weight: RawTensor<T> = nested.into_raw()?;
            let live = param.borrow();
            // `[]` cannot tell `[0]` from `[0, n]`, so an empty entry takes
            // the shape of an empty parameter.
            if weight.count() == 0 && live.count() == 0 {
                return Ok(live.zeros_like());
            }
            weight.ensure_shape(live.shape())?;
            Ok(weight)
        })
        .collect::<Result<Vec<RawTensor<T>>>>()?;

    for (param, weight) in params.iter().zip(weights) {
        param.assign(weight)?;
    }
    Ok(())
}

pub fn save_weights<T, L, P>(model: &L, path: P) -> Result<()>
where
    T: Numeric,
    L: Layer<T> + ?Sized,
    P: AsRef<Path>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write_weights(model, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_weights<T, L, P>(model: &L, path: P) -> Result<()>
where
    T: Numeric,
    L: Layer<T> + ?Sized,
    P: AsRef<Path>,
{
    let reader = BufReader::new(File::open(path)?);
    read_weights(model, reader)
}

#[test]
fn test_nested_layout() {
    let tensor = RawTensor::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
    let json = serde_json::to_string(&NestedTensor::from_raw(&tensor)).unwrap();
    assert_eq!(json, "[[1.0,2.0],[3.0,4.0],[5.0,6.0]]");

    let parsed: NestedTensor = serde_json::from_str("[[1, 2.5], [3, 4]]").unwrap();
    assert_eq!(parsed.shape().unwrap(), vec![2, 2]);
    let raw: RawTensor<f64> = parsed.into_raw().unwrap();
    assert_eq!(raw, RawTensor::new(vec![1.0, 2.5, 3.0, 4.0], vec![2, 2]));
}

#[test]
fn test_ragged_nesting_is_rejected() {
    let parsed: NestedTensor = serde_json::from_str("[[1, 2], [3]]").unwrap();
    assert!(matches!(parsed.into_raw::<f64>(), Err(Error::RaggedTensor)));
    let parsed: NestedTensor = serde_json::from_str("[[1, 2], 3]").unwrap();
    assert!(matches!(parsed.shape(), Err(Error::RaggedTensor)));
}

#[test]
fn test_write_then_read_in_memory() {
    use crate::nn::Linear;

    let source = Linear::from_params(
        RawTensor::from_rows(vec![vec![0.25, -1.5], vec![3.0, 0.125]]).unwrap(),
        RawTensor::from(vec![-0.5, 2.0]),
    )
    .unwrap();
    let target = Linear::<f64>::from_params(RawTensor::zeros(vec![2, 2]), RawTensor::zeros(vec![2])).unwrap();

    let mut buffer = Vec::new();
    write_weights(&source, &mut buffer).unwrap();
    read_weights(&target, buffer.as_slice()).unwrap();
    assert_eq!(target.weights.deep_clone(), source.weights.deep_clone());
    assert_eq!(target.bias.deep_clone(), source.bias.deep_clone());
}

#[test]
fn test_non_finite_params_are_not_written() {
    use crate::nn::Linear;

    let model = Linear::<f64>::from_params(RawTensor::from_rows(vec![vec![1.0]]).unwrap(), RawTensor::from(vec![f64::NAN])).unwrap();
    let mut buffer = Vec::new();
    assert!(matches!(
        write_weights(&model, &mut buffer),
        Err(Error::NonFiniteParam { param: 1 })
    ));
    assert!(buffer.is_empty());

    model.bias.assign(RawTensor::from(vec![0.0])).unwrap();
    model.weights.assign(RawTensor::from_rows(vec![vec![f64::INFINITY]]).unwrap()).unwrap();
    assert!(matches!(
        write_weights(&model, &mut buffer),
        Err(Error::NonFiniteParam { param: 0 })
    ));
}

#[test]
fn test_empty_params_survive_write_then_read() {
    use crate::nn::Linear;
    use rand::SeedableRng;

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let model = Linear::<f64>::new(3, 0, crate::tensor::Init::Xavier, &mut rng);
    let mut buffer = Vec::new();
    write_weights(&model, &mut buffer).unwrap();
    read_weights(&model, buffer.as_slice()).unwrap();
    assert_eq!(model.weights.shape(), vec![0, 3]);
    assert_eq!(model.bias.shape(), vec![0]);

    // an empty entry still cannot fill a non-empty param
    let other = Linear::<f64>::new(3, 1, crate::tensor::Init::Xavier, &mut rng);
    assert!(matches!(
        read_weights(&other, buffer.as_slice()),
        Err(Error::ShapeMismatch { .. })
    ));
}
