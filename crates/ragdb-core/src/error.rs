use thiserror::Error;

/// Engine error taxonomy.
///
/// `Validation` is raised before any collaborator call and is never
/// retried. `Collaborator` wraps a failed external call and is propagated
/// to the caller unmodified; retry policy, if any, belongs to the
/// collaborator. `Config` covers factory wiring and settings problems.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{collaborator} call failed: {source}")]
    Collaborator {
        collaborator: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn collaborator(name: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Error::Collaborator { collaborator: name, source: source.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
