use common::thiserror::Error;

/// Fatal init errors (spec's error-handling design): the host gets one of these back
/// from `initialize` and the runtime never starts ticking.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to load asset catalog: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("no rendering backend tier is available, including software fallback")]
    NoRenderBackend,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
