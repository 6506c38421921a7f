//! Error and result types for the query crate.

use cypherlite_api::{BackendError, NodeId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query text was rejected by the lexer or parser.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// The AST has a shape the engine cannot execute. Indicates a bug in
    /// whatever produced the AST, not in the user's data.
    #[error("grammar contract violation: {0}")]
    GrammarContract(String),

    #[error("unresolved designation `{0}`")]
    UnresolvedDesignation(String),

    #[error("asked for non-existent attribute `{attribute}` in node {node}")]
    MissingAttribute { attribute: String, node: NodeId },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("query limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("{0}")]
    WrongQueryKind(&'static str),
}
