//! Cypher-subset query engine over any [`GraphBackend`](cypherlite_api::GraphBackend).
//!
//! A query is parsed into an AST, flattened into atomic facts, and answered
//! by exhaustive search over assignments of graph nodes to the query's
//! designations. Matching is lazy: rows are produced as the consumer pulls.

pub mod ast;
pub mod create;
pub mod error;
pub mod evaluator;
pub mod facts;
pub mod lexer;
pub mod matcher;
pub mod options;
pub mod parser;
pub mod projector;
pub mod query_api;
pub mod value;

pub use error::{Error, Result};
pub use facts::{AtomicFact, Extraction, NodeLiteral, extract};
pub use matcher::{Assignment, MatchIter};
pub use options::ExecutionOptions;
pub use query_api::{PreparedQuery, prepare, run_create, run_match, run_match_with};
pub use value::{Row, Value};

pub fn parse(cypher: &str) -> Result<ast::Query> {
    parser::Parser::parse(cypher)
}
