/// Centralized error types for git-time-machine using thiserror
///
/// Module internals return `anyhow::Result` with context; these enums name the
/// failure classes that callers and the CLI care about.
use thiserror::Error;

/// Main error type for the loader
#[derive(Error, Debug)]
pub enum TimeMachineError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector database error: {0}")]
    VectorDb(#[from] VectorDbError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    InitializationFailed(String),

    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),

    #[error("Embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding response contained no vectors")]
    EmptyResponse,

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model lock was poisoned: {0}")]
    LockPoisoned(String),
}

/// Errors related to vector database operations
#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Failed to connect to vector database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create table '{table}': {reason}")]
    TableCreationFailed { table: String, reason: String },

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Failed to upsert rows into '{table}': {reason}")]
    UpsertFailed { table: String, reason: String },

    #[error("Failed to search table '{table}': {reason}")]
    SearchFailed { table: String, reason: String },

    #[error("Row batch is inconsistent: {0}")]
    InvalidBatch(String),
}

/// Errors related to git operations
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepoNotFound(String),

    #[error("Failed to clone '{url}' (branch '{branch}'): {reason}")]
    CloneFailed {
        url: String,
        branch: String,
        reason: String,
    },

    #[error("Failed to prepare scratch directory '{path}': {reason}")]
    ScratchDirFailed { path: String, reason: String },
}

/// Errors related to the relational catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to open catalog at '{path}': {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Catalog query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    #[error("No catalog entry for '{repo_url}' with tool chain '{tool_chain}'")]
    EntryNotFound {
        repo_url: String,
        tool_chain: String,
    },

    #[error("Catalog connection lock was poisoned")]
    LockPoisoned,
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unknown tool chain '{0}' (expected 'langchain' or 'llamaindex')")]
    UnknownToolChain(String),

    #[error("No tool chains requested")]
    NoToolChains,

    #[error("Invalid date '{0}': expected RFC 3339, YYYY-MM-DD or Unix seconds")]
    InvalidDate(String),

    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Empty {0}")]
    Empty(String),

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<anyhow::Error> for TimeMachineError {
    fn from(err: anyhow::Error) -> Self {
        TimeMachineError::Other(format!("{:#}", err))
    }
}

impl TimeMachineError {
    /// Check if this is a user error (bad input) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TimeMachineError::Validation(_)
                | TimeMachineError::Config(ConfigError::InvalidValue { .. })
                | TimeMachineError::Config(ConfigError::MissingRequired(_))
                | TimeMachineError::Catalog(CatalogError::EntryNotFound { .. })
        )
    }

    /// Check if this error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TimeMachineError::VectorDb(VectorDbError::ConnectionFailed(_))
                | TimeMachineError::Embedding(EmbeddingError::Status { .. })
                | TimeMachineError::Embedding(EmbeddingError::GenerationFailed(_))
                | TimeMachineError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimeMachineError::Validation(ValidationError::UnknownToolChain("haystack".into()));
        assert_eq!(
            err.to_string(),
            "Validation error: Unknown tool chain 'haystack' (expected 'langchain' or 'llamaindex')"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TimeMachineError = io_err.into();
        assert!(matches!(err, TimeMachineError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: TimeMachineError = anyhow::anyhow!("outer").into();
        assert!(matches!(err, TimeMachineError::Other(_)));
        assert_eq!(err.to_string(), "outer");
    }

    #[test]
    fn test_is_user_error() {
        let user_err = TimeMachineError::Validation(ValidationError::NoToolChains);
        assert!(user_err.is_user_error());

        let missing_key: TimeMachineError =
            ConfigError::MissingRequired("OPENAI_API_KEY".into()).into();
        assert!(missing_key.is_user_error());

        let system_err =
            TimeMachineError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_is_retryable() {
        let retryable: TimeMachineError = EmbeddingError::Status {
            status: 503,
            body: "overloaded".into(),
        }
        .into();
        assert!(retryable.is_retryable());

        let not_retryable: TimeMachineError = ValidationError::NoToolChains.into();
        assert!(!not_retryable.is_retryable());
    }

    #[test]
    fn test_embedding_error_dimension_mismatch() {
        let err = EmbeddingError::DimensionMismatch {
            expected: 1536,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "Invalid embedding dimension: expected 1536, got 384"
        );
    }

    #[test]
    fn test_git_clone_failed_display() {
        let err = GitError::CloneFailed {
            url: "https://github.com/acme/widgets.git".into(),
            branch: "main".into(),
            reason: "reference not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to clone 'https://github.com/acme/widgets.git' (branch 'main'): reference not found"
        );
    }

    #[test]
    fn test_catalog_entry_not_found_display() {
        let err = CatalogError::EntryNotFound {
            repo_url: "https://github.com/acme/widgets".into(),
            tool_chain: "llamaindex".into(),
        };
        assert_eq!(
            err.to_string(),
            "No catalog entry for 'https://github.com/acme/widgets' with tool chain 'llamaindex'"
        );
    }

    #[test]
    fn test_error_chain() {
        let err: TimeMachineError = VectorDbError::TableNotFound("langchain_acme_widgets".into()).into();
        assert_eq!(
            err.to_string(),
            "Vector database error: Table 'langchain_acme_widgets' not found"
        );
    }
}
