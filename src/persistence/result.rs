//! Façade results: a value on success, or a numeric code and message.

use crate::error::{StorageError, TreeError};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultCode {
    Success,
    NodeLinkNotFound,
    NameAlreadyExists,
    WrongChildrenCount,
    /// Malformed quadkey or resolution
    InvalidArgument,
    StorageFailure,
}

impl ResultCode {
    pub fn code(&self) -> u32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::NodeLinkNotFound => 1001,
            ResultCode::NameAlreadyExists => 1002,
            ResultCode::WrongChildrenCount => 1003,
            ResultCode::InvalidArgument => 1004,
            ResultCode::StorageFailure => 1005,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ResultCode::Success
    }
}

/// A failed façade call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub code: ResultCode,
    pub message: String,
}

impl Failure {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Failure {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(link: impl fmt::Display) -> Self {
        Failure::new(ResultCode::NodeLinkNotFound, format!("{} not found", link))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for Failure {}

impl From<TreeError> for Failure {
    fn from(err: TreeError) -> Self {
        let code = match &err {
            TreeError::NodeNotFound(_)
            | TreeError::InvalidLink(_)
            | TreeError::UnknownOperator(_) => ResultCode::NodeLinkNotFound,
            TreeError::CreationFailed(_) => ResultCode::WrongChildrenCount,
            TreeError::InvalidQuadKey(_)
            | TreeError::ZoomOutOfRange { .. }
            | TreeError::InvalidResolution(_)
            | TreeError::CanvasMismatch { .. } => ResultCode::InvalidArgument,
            TreeError::Storage(StorageError::AlreadyExists(_)) => ResultCode::NameAlreadyExists,
            TreeError::Storage(_) => ResultCode::StorageFailure,
        };
        Failure::new(code, err.to_string())
    }
}

pub type GraphResult<T> = Result<T, Failure>;
