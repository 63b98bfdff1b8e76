use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("analysis service returned {status}: {body}")]
    ServiceStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("upload failed: {reason}")]
    UploadFailure { reason: String },
}

impl DashboardError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        DashboardError::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn upload(reason: impl Into<String>) -> Self {
        DashboardError::UploadFailure {
            reason: reason.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DashboardError::Transport(_) | DashboardError::ServiceStatus { .. }
        )
    }
}
