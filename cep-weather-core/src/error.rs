use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::Stage;

/// Failure of a single outbound resolver call.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {service} was cancelled by the caller")]
    Cancelled { service: &'static str },

    #[error("request to {service} exceeded the caller deadline")]
    DeadlineExceeded { service: &'static str },

    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode {service} response: {reason}")]
    Decode { service: &'static str, reason: String },

    #[error("postal code {postal_code} does not match any known locality")]
    NotFound { postal_code: String },
}

impl ResolveError {
    /// Network, cancellation and deadline failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Cancelled { .. } | Self::DeadlineExceeded { .. }
        )
    }
}

/// Caller-visible classification of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Unprocessable,
    NotFound,
    UpstreamFailure,
    DecodeFailure,
}

impl ErrorClass {
    /// HTTP status a host should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::Unprocessable => 422,
            ErrorClass::NotFound => 404,
            ErrorClass::UpstreamFailure => 500,
            ErrorClass::DecodeFailure => 502,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid zipcode")]
    Unprocessable { input: String },

    #[error("can not find zipcode")]
    NotFound { postal_code: String },

    #[error("{stage} failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: ResolveError,
    },
}

impl LookupError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LookupError::Unprocessable { .. } => ErrorClass::Unprocessable,
            LookupError::NotFound { .. } => ErrorClass::NotFound,
            LookupError::Upstream { source: ResolveError::Decode { .. }, .. } => {
                ErrorClass::DecodeFailure
            }
            LookupError::Upstream { .. } => ErrorClass::UpstreamFailure,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, LookupError::Upstream { source, .. } if source.is_transport())
    }

    /// Stage the pipeline was trying to reach when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            LookupError::Unprocessable { .. } => Stage::Validated,
            LookupError::NotFound { .. } => Stage::LocationResolved,
            LookupError::Upstream { stage, .. } => *stage,
        }
    }
}

/// Serializable error payload for hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub class: ErrorClass,
    pub message: String,
}

impl From<&LookupError> for ErrorBody {
    fn from(err: &LookupError) -> Self {
        let class = err.class();
        Self { status: class.status_code(), class, message: err.to_string() }
    }
}
