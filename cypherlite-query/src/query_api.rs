use crate::ast::{CreateQuery, MatchQuery, Query, ReturnItem};
use crate::create::create;
use crate::error::{Error, Result};
use crate::facts::{AtomicFact, Extraction, extract, extract_create, extract_match};
use crate::matcher::{Assignment, MatchIter};
use crate::options::ExecutionOptions;
use crate::projector::project;
use crate::value::{Row, Value};
use cypherlite_api::GraphBackend;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use tracing::debug;

/// A parsed query ready for execution.
///
/// Created by [`prepare()`]. Parsing happens once; the query can then be run
/// any number of times against any backend.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    query: Query,
    explain: Option<String>,
}

impl PreparedQuery {
    pub fn ast(&self) -> &Query {
        &self.query
    }

    /// `true` for CREATE.
    pub fn is_write(&self) -> bool {
        self.explain.is_none() && matches!(self.query, Query::Create(_))
    }

    pub fn is_explain(&self) -> bool {
        self.explain.is_some()
    }

    /// Result column names, in RETURN order.
    pub fn columns(&self) -> Vec<String> {
        if self.explain.is_some() {
            return vec!["plan".to_string()];
        }
        let items: &[ReturnItem] = match &self.query {
            Query::Match(q) => &q.return_clause.items,
            Query::Create(q) => q
                .return_clause
                .as_ref()
                .map_or(&[][..], |rc| &rc.items[..]),
        };
        items.iter().map(ReturnItem::column_name).collect()
    }

    /// Runs a MATCH query, yielding rows lazily in enumeration order.
    ///
    /// Errors found before enumeration (unbound designations, limits) arrive
    /// as the only item. A `MissingAttribute` during projection fails that
    /// row alone; the search continues if the caller keeps pulling.
    ///
    /// ```ignore
    /// let query = prepare("MATCH (n:Person) RETURN n.name")?;
    /// let rows: Vec<_> = query.execute_streaming(&graph).collect::<Result<_>>()?;
    /// ```
    pub fn execute_streaming<'a, B: GraphBackend>(
        &'a self,
        backend: &'a B,
    ) -> Box<dyn Iterator<Item = Result<Row>> + 'a> {
        self.execute_streaming_with(backend, ExecutionOptions::default())
    }

    pub fn execute_streaming_with<'a, B: GraphBackend>(
        &'a self,
        backend: &'a B,
        options: ExecutionOptions,
    ) -> Box<dyn Iterator<Item = Result<Row>> + 'a> {
        if let Some(plan) = &self.explain {
            let mut row = Row::default();
            row.push("plan", Value::String(plan.clone()));
            return Box::new(std::iter::once(Ok(row)));
        }
        let Query::Match(query) = &self.query else {
            return Box::new(std::iter::once(Err(Error::WrongQueryKind(
                "CREATE must be run with execute_write",
            ))));
        };
        match run_match_with(backend, query, &options) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    /// Runs a CREATE query and returns its single result row (empty when the
    /// query has no RETURN clause).
    pub fn execute_write<B: GraphBackend>(&self, backend: &mut B) -> Result<Row> {
        if self.explain.is_some() {
            return Err(Error::WrongQueryKind(
                "EXPLAIN cannot be executed as a write query",
            ));
        }
        match &self.query {
            Query::Create(query) => run_create(backend, query),
            Query::Match(_) => Err(Error::WrongQueryKind(
                "MATCH must be run with execute_streaming",
            )),
        }
    }
}

/// Parses a query for execution.
///
/// Supported:
///
/// - `MATCH (a:Class {k: v})-[:LABEL]->(b), (c) WHERE a.k.j = 1 OR NOT c.x = "y" RETURN a, b.k`
/// - `CREATE (a:Class {k: v})<-[:LABEL]-(b) RETURN a`
/// - `EXPLAIN <query>`: yields one `plan` row listing the atomic facts instead of running
pub fn prepare(text: &str) -> Result<PreparedQuery> {
    if let Some(inner) = strip_explain_prefix(text) {
        if inner.is_empty() {
            return Err(Error::Parse {
                message: "EXPLAIN requires a query".into(),
                line: 1,
                column: 1,
            });
        }
        let query = crate::parser::Parser::parse(inner)?;
        let extraction = extract(&query)?;
        let explain = Some(render_facts(&extraction));
        return Ok(PreparedQuery { query, explain });
    }

    let query = crate::parser::Parser::parse(text)?;
    debug!(
        kind = match query {
            Query::Match(_) => "match",
            Query::Create(_) => "create",
        },
        "prepared query"
    );
    Ok(PreparedQuery {
        query,
        explain: None,
    })
}

/// Runs a MATCH query without limits.
pub fn run_match<'a, B: GraphBackend>(
    backend: &'a B,
    query: &'a MatchQuery,
) -> Result<MatchIter<'a, B>> {
    run_match_with(backend, query, &ExecutionOptions::default())
}

pub fn run_match_with<'a, B: GraphBackend>(
    backend: &'a B,
    query: &'a MatchQuery,
    options: &ExecutionOptions,
) -> Result<MatchIter<'a, B>> {
    let extraction = extract_match(query)?;
    MatchIter::new(backend, extraction, &query.return_clause.items, options)
}

/// Creates the pattern's nodes and edges, then projects RETURN over the
/// fresh ids. RETURN designations are checked before anything is created.
pub fn run_create<B: GraphBackend>(backend: &mut B, query: &CreateQuery) -> Result<Row> {
    let extraction = extract_create(query)?;

    if let Some(return_clause) = &query.return_clause {
        let declared: BTreeSet<&str> = extraction
            .nodes
            .iter()
            .map(|n| n.designation.as_str())
            .collect();
        for item in &return_clause.items {
            if !declared.contains(item.designation()) {
                return Err(Error::UnresolvedDesignation(item.designation().to_string()));
            }
        }
    }

    let created = create(backend, &extraction.nodes, &extraction.facts)?;
    match &query.return_clause {
        None => Ok(Row::default()),
        Some(return_clause) => project(&Assignment::from(created), &return_clause.items, &*backend),
    }
}

fn strip_explain_prefix(input: &str) -> Option<&str> {
    let trimmed = input.trim_start();
    if trimmed.len() < "EXPLAIN".len() || !trimmed.is_char_boundary("EXPLAIN".len()) {
        return None;
    }
    let (head, tail) = trimmed.split_at("EXPLAIN".len());
    if !head.eq_ignore_ascii_case("EXPLAIN") {
        return None;
    }
    if let Some(next) = tail.chars().next()
        && !next.is_whitespace()
    {
        // `EXPLAINED` is an identifier, not the prefix.
        return None;
    }
    Some(tail.trim())
}

fn render_facts(extraction: &Extraction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Variables({})", extraction.designations().join(", "));
    for fact in &extraction.facts {
        match fact {
            AtomicFact::ClassIs { designation, class } => {
                let _ = writeln!(out, "  ClassIs({designation}, {class:?})");
            }
            AtomicFact::EdgeExists {
                node_1,
                node_2,
                label,
            } => {
                let _ = writeln!(out, "  EdgeExists({node_1} -> {node_2}, {label:?})");
            }
            AtomicFact::NodeHasDocument {
                designation,
                document,
            } => {
                let keys = document
                    .as_ref()
                    .map(|doc| doc.keys().cloned().collect::<Vec<_>>().join(", "))
                    .unwrap_or_default();
                let _ = writeln!(out, "  NodeHasDocument({designation}, {{{keys}}})");
            }
            AtomicFact::FilterClause(condition) => {
                let _ = writeln!(out, "  FilterClause({condition:?})");
            }
        }
    }
    out
}
