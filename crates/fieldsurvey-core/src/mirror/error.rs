use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("I/O error on mirror collection {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode or decode mirror collection {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Mirror collection {name} has schema version {found}, newest supported is {supported}")]
    UnsupportedSchema {
        name: String,
        found: u32,
        supported: u32,
    },

    #[error("Mirror write rejected: {0}")]
    WriteRejected(String),
}

impl MirrorError {
    pub(crate) fn io(name: &str, source: std::io::Error) -> Self {
        MirrorError::Io {
            name: name.to_string(),
            source,
        }
    }

    pub(crate) fn json(name: &str, source: serde_json::Error) -> Self {
        MirrorError::Json {
            name: name.to_string(),
            source,
        }
    }
}
