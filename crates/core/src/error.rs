use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("missing required input `{0}`")]
    MissingInput(String),
    #[error("input `{name}` must be {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("input `{name}` = {value} is outside {min}..={max}")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("input `{name}` = `{value}` is not one of the allowed options")]
    InvalidChoice { name: String, value: String },
    #[error("cannot parse `{value}` for input `{name}`: expected {expected}")]
    Parse {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("{0}")]
    Failed(String),
}

/// Provider-agnostic failure crossing the model trait seams.
#[derive(Debug)]
pub struct ProviderError {
    inner: Box<dyn StdError + Send + Sync>,
}

impl ProviderError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(error),
        }
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.inner
    }

    pub fn as_inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl StdError for ProviderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}
