use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassGenError {
    #[error("Malformed template at node {node_id}: {message}")]
    MalformedTemplate { node_id: String, message: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClassGenError>;

impl ClassGenError {
    pub fn malformed_template<S: Into<String>, M: Into<String>>(node_id: S, message: M) -> Self {
        Self::MalformedTemplate {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    pub fn invalid_path<S: Into<String>>(path: S) -> Self {
        Self::InvalidPath(path.into())
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Node identifier carried by a fatal template error, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::MalformedTemplate { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    pub fn is_malformed_template(&self) -> bool {
        matches!(self, Self::MalformedTemplate { .. })
    }
}
