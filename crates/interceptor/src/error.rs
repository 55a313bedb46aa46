//! Error module

use thiserror::Error;
use tonic::{Code, Status};

/// Failures introduced by the interceptor itself.
///
/// Handler failures never pass through this type; they are returned to the
/// caller exactly as the handler produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptorError {
    #[error("Correlation ID generation failed: {0}")]
    IdGeneration(String),

    #[error("Correlation ID generator produced an empty identifier")]
    EmptyCorrelationId,
}

impl From<InterceptorError> for Status {
    fn from(err: InterceptorError) -> Self {
        Status::new(Code::Internal, err.to_string())
    }
}

/// Maps a handler failure onto the gRPC status code recorded for the call.
pub trait ClassifyStatus {
    fn status_code(&self) -> Code;
}

impl ClassifyStatus for Status {
    fn status_code(&self) -> Code {
        self.code()
    }
}

impl ClassifyStatus for InterceptorError {
    fn status_code(&self) -> Code {
        Code::Internal
    }
}

impl ClassifyStatus for anyhow::Error {
    fn status_code(&self) -> Code {
        self.downcast_ref::<Status>()
            .map(Status::code)
            .unwrap_or(Code::Unknown)
    }
}

impl ClassifyStatus for Box<dyn std::error::Error + Send + Sync> {
    fn status_code(&self) -> Code {
        self.downcast_ref::<Status>()
            .map(Status::code)
            .unwrap_or(Code::Unknown)
    }
}

pub type InterceptorResult<T> = Result<T, InterceptorError>;
