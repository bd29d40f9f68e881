use std::path::PathBuf;

use thiserror::Error;

/// Every failure the pipeline can surface to its caller.
///
/// Library code never exits the process; the binary maps these to an exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing {var} in environment (.env).")]
    MissingCredential { var: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{provider} request failed: {message}")]
    UpstreamRequest {
        provider: &'static str,
        message: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} transport error after {attempts} attempt(s): {source}")]
    Transport {
        provider: &'static str,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to render chart '{}': {message}", path.display())]
    Render { path: PathBuf, message: String },

    #[error("CSV export error for '{}': {message}", path.display())]
    Export { path: PathBuf, message: String },
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::MissingCredential { .. } | AppError::Config(_) => 2,
            AppError::Render { .. } | AppError::Export { .. } => 3,
            AppError::UpstreamRequest { .. }
            | AppError::InvalidResponse { .. }
            | AppError::Transport { .. } => 4,
        }
    }

    pub(crate) fn render(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        AppError::Render {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn export(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        AppError::Export {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_stage() {
        assert_eq!(AppError::MissingCredential { var: "BLS_API_KEY" }.exit_code(), 2);
        assert_eq!(AppError::Config("bad".into()).exit_code(), 2);
        assert_eq!(AppError::render("static/x.png", "boom").exit_code(), 3);
        assert_eq!(
            AppError::UpstreamRequest {
                provider: "BLS",
                message: "nope".into()
            }
            .exit_code(),
            4
        );
    }

    #[test]
    fn upstream_message_is_displayed() {
        let err = AppError::UpstreamRequest {
            provider: "BLS",
            message: "Invalid registration key".into(),
        };
        assert_eq!(err.to_string(), "BLS request failed: Invalid registration key");
    }
}
