use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("index {index:?} is out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },
    #[error("nested tensor is ragged: every entry at a level must have the same shape")]
    RaggedTensor,
    #[error("{layer}: backward called without a preceding forward")]
    BackwardBeforeForward { layer: &'static str },
    #[error("don't call backward when not in train mode")]
    BackwardInEvalMode,
    #[error("probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("unknown init scheme {0:?}, expected one of \"xavier\", \"uniform\", \"normal\"")]
    UnknownInit(String),
    #[error("layer returned {params} params but {grads} grads")]
    ParamGradMismatch { params: usize, grads: usize },
    #[error("optimizer holds state for {state} params but the layer has {params}")]
    OptimizerStateMismatch { state: usize, params: usize },
    #[error("param {param} holds a non-finite value, which JSON cannot store")]
    NonFiniteParam { param: usize },
    #[error("weights file holds {stored} tensors but the model has {expected} params")]
    ParamCountMismatch { stored: usize, expected: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
