// Error types shared by the configuration and render paths
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config kind '{0}' is already registered")]
    DuplicateKind(String),

    #[error("config kind '{0}' is not registered")]
    UnknownKind(String),

    #[error("{entity} is missing required field(s): {}", fields.join(", "))]
    MissingFields { entity: String, fields: Vec<String> },

    #[error("{entity} has an invalid '{field}': {reason}")]
    InvalidField {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("{entity}: name '{name}' is already taken")]
    DuplicateName { entity: String, name: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    pub fn missing(entity: impl Into<String>, fields: Vec<&str>) -> Self {
        ConfigError::MissingFields {
            entity: entity.into(),
            fields: fields.into_iter().map(String::from).collect(),
        }
    }

    pub fn invalid(
        entity: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidField {
            entity: entity.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("metrics backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("metrics backend did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("metrics backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("metrics backend returned a malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}
