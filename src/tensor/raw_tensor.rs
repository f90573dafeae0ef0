use itertools::Itertools;
use rand::Rng;

use super::init::Init;
use super::numeric::*;
use crate::error::{Error, Result};

/// The core `struct` in this library: an n-dimensional tensor stored as a flat,
/// row-major array together with its shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTensor<T>
where
    T: Numeric,
{
    pub(in crate::tensor) array: Vec<T>,
    pub(in crate::tensor) shape: Vec<usize>,
}

impl<T> From<Vec<T>> for RawTensor<T>
where
    T: Numeric,
{
    fn from(array: Vec<T>) -> RawTensor<T> {
        let shape = vec![array.len()];
        RawTensor { array, shape }
    }
}

impl<T> RawTensor<T>
where
    T: Numeric,
{
    pub fn new(array: Vec<T>, shape: Vec<usize>) -> RawTensor<T> {
        assert_eq!(shape.iter().product::<usize>(), array.len());
        RawTensor { array, shape }
    }

    pub fn new_with_filler(shape: Vec<usize>, filler: T) -> RawTensor<T> {
        let total = shape.iter().product();
        RawTensor {
            array: vec![filler; total],
            shape,
        }
    }

    pub fn zeros(shape: Vec<usize>) -> RawTensor<T> {
        RawTensor::new_with_filler(shape, T::zero())
    }

    pub fn zeros_like(&self) -> RawTensor<T> {
        RawTensor::zeros(self.shape.clone())
    }

    /// Builds a matrix from its rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<RawTensor<T>> {
        if !rows.iter().map(Vec::len).all_equal() {
            return Err(Error::RaggedTensor);
        }
        let cols = rows.first().map_or(0, Vec::len);
        let shape = vec![rows.len(), cols];
        let array = rows.into_iter().flatten().collect();
        Ok(RawTensor { array, shape })
    }

    /// A tensor of the given shape filled by sampling according to `init`.
    pub fn random<R: Rng + ?Sized>(shape: Vec<usize>, init: Init, rng: &mut R) -> RawTensor<T> {
        let array = init.sample(&shape, rng);
        RawTensor::new(array, shape)
    }

    pub fn shape(&self) -> &Vec<usize> {
        &self.shape
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.array.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.array
    }

    pub fn into_vec(self) -> Vec<T> {
        self.array
    }

    pub(in crate::tensor) fn global_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, d)| i >= d) {
            return Err(Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(index
            .iter()
            .zip(&self.shape)
            .fold(0, |acc, (&idx, &dim)| acc * dim + idx))
    }

    pub fn get(&self, index: &[usize]) -> Result<&T> {
        let global_idx = self.global_index(index)?;
        Ok(&self.array[global_idx])
    }

    pub fn ensure_shape(&self, expected: &[usize]) -> Result<()> {
        if self.shape != expected {
            return Err(Error::ShapeMismatch {
                expected: expected.to_vec(),
                actual: self.shape.clone(),
            });
        }
        Ok(())
    }

    /// Apply `f` to every element.
    pub fn map<F>(&self, f: F) -> RawTensor<T>
    where
        F: Fn(T) -> T,
    {
        RawTensor {
            array: self.array.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Combine two tensors of identical shape element by element.
    pub fn zip_map<F>(&self, other: &RawTensor<T>, f: F) -> Result<RawTensor<T>>
    where
        F: Fn(T, T) -> T,
    {
        other.ensure_shape(&self.shape)?;
        Ok(RawTensor {
            array: self
                .array
                .iter()
                .zip(other.array.iter())
                .map(|(&x, &y)| f(x, y))
                .collect(),
            shape: self.shape.clone(),
        })
    }

    pub fn sum(&self) -> T {
        self.array.iter().copied().sum()
    }

    /// generalised dot product: returns to acculumulated sum of the elementwise product.
    pub fn dot(&self, other: &RawTensor<T>) -> Result<T> {
        other.ensure_shape(&self.shape)?;
        Ok(dot_slices(&self.array, &other.array))
    }

    /// Contiguous slices along the last dimension, one per index of the
    /// leading dimensions. A zero-length last dimension gives empty rows.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        let (last, leading) = match self.shape.split_last() {
            Some((&last, leading)) => (last, leading.iter().product::<usize>()),
            None => (1, 1),
        };
        (0..leading).map(move |r| &self.array[r * last..(r + 1) * last])
    }
}

pub(crate) fn dot_slices<T: Numeric>(left: &[T], right: &[T]) -> T {
    left.iter().zip(right).map(|(&x, &y)| x * y).sum()
}

#[test]
fn test_new_with_filler() {
    let vec = RawTensor::new_with_filler(vec![4], 4.0);
    assert_eq!(vec.shape(), &vec![4]);
    assert_eq!(vec.get(&[2]).unwrap(), &4.0);
}

#[test]
fn test_get_2x2x2() {
    let matrix = RawTensor::new((0..8).map(|i| i as f64).collect(), vec![2, 2, 2]);
    assert_eq!(*matrix.get(&[0, 0, 0]).unwrap(), 0.0);
    assert_eq!(*matrix.get(&[0, 1, 0]).unwrap(), 2.0);
    assert_eq!(*matrix.get(&[1, 1, 1]).unwrap(), 7.0);
    assert!(matrix.get(&[2, 0, 0]).is_err());
    assert!(matrix.get(&[0, 0]).is_err());
}

#[test]
fn test_zip_map_requires_same_shape() {
    let left = RawTensor::from(vec![1.0, 2.0, 3.0]);
    let right = RawTensor::from(vec![1.0, 2.0]);
    match left.zip_map(&right, |x, y| x + y) {
        Err(Error::ShapeMismatch { expected, actual }) => {
            assert_eq!(expected, vec![3]);
            assert_eq!(actual, vec![2]);
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
}

#[test]
fn test_rows_of_empty_last_dim() {
    let tensor = RawTensor::<f64>::zeros(vec![3, 0]);
    let rows: Vec<&[f64]> = tensor.rows().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.is_empty()));

    let tensor = RawTensor::new((0..6).map(|i| i as f64).collect(), vec![3, 2]);
    let rows: Vec<&[f64]> = tensor.rows().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], &[0.0, 1.0]);
    assert_eq!(rows[2], &[4.0, 5.0]);
}

#[test]
fn test_from_rows_rejects_ragged() {
    let rows = vec![vec![1.0, 2.0], vec![3.0]];
    assert!(matches!(RawTensor::from_rows(rows), Err(Error::RaggedTensor)));
}
