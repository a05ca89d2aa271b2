use jotter_doc_core::{ChainError, ViewError};

#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    #[error("command edit was rejected: {0}")]
    Edit(#[from] ChainError),
    #[error("invalid palette config: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<PaletteError> for ViewError {
    fn from(err: PaletteError) -> Self {
        match err {
            PaletteError::Edit(err) => ViewError::Chain(err),
            other => ViewError::Plugin {
                plugin: crate::palette::PLUGIN_ID,
                source: Box::new(other),
            },
        }
    }
}
