//! Error types shared by the core crate.

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The document could not be decoded, named an unknown node variant, or
    /// violated the node schema.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// The rendering engine lacks an optional subsystem (e.g. filters).
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(&'static str),

    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid raster: {0}")]
    InvalidRaster(String),
}

impl CoreError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedSnapshot(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn invalid_color(msg: impl Into<String>) -> Self {
        Self::InvalidColor(msg.into())
    }
}

impl From<rmp_serde::decode::Error> for CoreError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for CoreError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::encode(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CoreError::malformed("x")
                .to_string()
                .starts_with("malformed snapshot:")
        );
        assert!(
            CoreError::UnsupportedCapability("filters")
                .to_string()
                .contains("filters")
        );
        assert!(
            CoreError::invalid_color("#zz")
                .to_string()
                .starts_with("invalid color:")
        );
    }

    #[test]
    fn json_errors_are_malformed_snapshots() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(CoreError::from(err), CoreError::MalformedSnapshot(_)));
    }
}
