use thiserror::Error;

#[derive(Error, Debug)]
pub enum SonarError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed search result: {0}")]
    FieldMissing(String),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Remote error{}: {message}", status_suffix(.status))]
    Remote { status: Option<u16>, message: String },

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SonarError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SonarError {
    /// Transport failures are network errors; anything reqwest reports about
    /// the response itself (status, body decoding) belongs to the remote side.
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_status() {
            let status = err.status().map(|s| s.as_u16());
            Self::Remote {
                status,
                message: err.to_string(),
            }
        } else {
            Self::Network(err)
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SonarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display_includes_status() {
        let err = SonarError::remote(Some(503), "unavailable");
        assert_eq!(err.to_string(), "Remote error (503): unavailable");
    }

    #[test]
    fn test_remote_error_display_without_status() {
        let err = SonarError::remote(None, "expected value at line 1 column 1");
        assert_eq!(
            err.to_string(),
            "Remote error: expected value at line 1 column 1"
        );
    }
}
