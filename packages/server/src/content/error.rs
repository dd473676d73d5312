use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("section '{section}' has unsupported schema version {version}")]
    UnsupportedVersion { section: &'static str, version: i32 },

    #[error("section '{section}' is malformed: {source}")]
    Malformed {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode section '{section}': {source}")]
    Encode {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
