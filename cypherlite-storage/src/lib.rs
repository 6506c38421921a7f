mod error;
pub mod fixture;
pub mod memgraph;

pub use crate::error::{Error, Result};
pub use crate::fixture::{EdgeFixture, GraphFixture, NodeFixture};
pub use crate::memgraph::{EdgeRecord, MemGraph, NodeRecord, generate_id};
