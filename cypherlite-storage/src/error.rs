use cypherlite_api::{BackendError, NodeId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("edge endpoint {0} does not exist")]
    UnknownEndpoint(NodeId),
}

impl From<Error> for BackendError {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownEndpoint(id) => BackendError::NodeNotFound(id),
            other => BackendError::Other(other.to_string()),
        }
    }
}
