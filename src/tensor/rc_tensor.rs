use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::numeric::*;
use super::raw_tensor::*;
use crate::error::Result;

/// A shared handle to a parameter tensor.
///
/// The layer owning a parameter and anything that updates it (optimizers,
/// weight loading) hold clones of the same handle, so writes through one handle
/// are seen by all of them.
#[derive(Debug, PartialEq, Clone)]
pub struct RcTensor<T: Numeric>(Rc<RefCell<RawTensor<T>>>);

impl<T: Numeric> From<RawTensor<T>> for RcTensor<T> {
    fn from(raw_tensor: RawTensor<T>) -> Self {
        RcTensor(Rc::new(RefCell::new(raw_tensor)))
    }
}

impl<T: Numeric> RcTensor<T> {
    pub fn new(array: Vec<T>, shape: Vec<usize>) -> RcTensor<T> {
        RawTensor::new(array, shape).into()
    }

    pub fn zeros(shape: Vec<usize>) -> RcTensor<T> {
        RawTensor::zeros(shape).into()
    }

    pub fn borrow(&self) -> Ref<'_, RawTensor<T>> {
        self.0.borrow()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.0.borrow().shape().clone()
    }

    /// Copy out the current contents, detached from this handle.
    pub fn deep_clone(&self) -> RawTensor<T> {
        self.0.borrow().clone()
    }

    /// Overwrite the contents in place. The new value must have the same shape.
    pub fn assign(&self, value: RawTensor<T>) -> Result<()> {
        value.ensure_shape(self.borrow().shape())?;
        *self.0.borrow_mut() = value;
        Ok(())
    }

    /// Replace the contents wholesale, shape included. Used for gradient
    /// buffers, which are rewritten on every backward pass.
    pub(crate) fn replace(&self, value: RawTensor<T>) {
        *self.0.borrow_mut() = value;
    }

    /// True when both handles refer to the same underlying tensor.
    pub fn ptr_eq(&self, other: &RcTensor<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[test]
fn test_assign_is_seen_through_every_handle() {
    let param = RcTensor::new(vec![1.0, 2.0], vec![2]);
    let alias = param.clone();
    assert!(alias.ptr_eq(&param));

    param.assign(RawTensor::from(vec![3.0, 4.0])).unwrap();
    assert_eq!(alias.deep_clone(), RawTensor::from(vec![3.0, 4.0]));
}

#[test]
fn test_assign_rejects_other_shapes() {
    let param = RcTensor::new(vec![1.0, 2.0], vec![2]);
    assert!(param.assign(RawTensor::from(vec![1.0, 2.0, 3.0])).is_err());
    assert_eq!(param.deep_clone(), RawTensor::from(vec![1.0, 2.0]));

    let snapshot = param.deep_clone();
    param.assign(RawTensor::from(vec![9.0, 9.0])).unwrap();
    assert_eq!(snapshot, RawTensor::from(vec![1.0, 2.0]));
}
