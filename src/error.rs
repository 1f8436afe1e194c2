use thiserror::Error;

/// Errors raised at the engine's boundaries.
///
/// Scoring itself never fails: missing input simply contributes no evidence.
/// Only loading the knowledge base or configuration, and calling out to the
/// candidate retrieval collaborator, can produce an `EngineError`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Knowledge base load failed ({0}): {1}")]
    KnowledgeBaseLoad(String, String),

    #[error("Knowledge base parse failed ({0}): {1}")]
    KnowledgeBaseParse(String, String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Candidate retrieval failed: {0}")]
    Retrieval(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
