use crate::tensor::RcTensor;

// Aliases kept for readability in layer and optimizer signatures.
pub type TensorList<T> = Vec<RcTensor<T>>;
