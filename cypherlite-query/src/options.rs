use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Bounds on the exhaustive search.
///
/// Matching enumerates `|domain| ^ |variables|` candidates, so callers that
/// need bounded latency cap one or both. Both default to unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    pub max_variables: Option<usize>,
    pub max_domain_size: Option<usize>,
}

impl ExecutionOptions {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_variables(mut self, max: usize) -> Self {
        self.max_variables = Some(max);
        self
    }

    pub fn with_max_domain_size(mut self, max: usize) -> Self {
        self.max_domain_size = Some(max);
        self
    }

    pub(crate) fn check(&self, variables: usize, domain_size: usize) -> Result<()> {
        if let Some(max) = self.max_variables {
            if variables > max {
                return Err(Error::LimitExceeded(format!(
                    "query binds {variables} variables, limit is {max}"
                )));
            }
        }
        if let Some(max) = self.max_domain_size {
            if domain_size > max {
                return Err(Error::LimitExceeded(format!(
                    "graph has {domain_size} nodes, limit is {max}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_accepts_anything() {
        assert!(ExecutionOptions::unbounded().check(50, 1_000_000).is_ok());
    }

    #[test]
    fn limits_are_inclusive() {
        let options = ExecutionOptions::unbounded()
            .with_max_variables(2)
            .with_max_domain_size(10);
        assert!(options.check(2, 10).is_ok());
        assert!(matches!(options.check(3, 10), Err(Error::LimitExceeded(_))));
        assert!(matches!(options.check(2, 11), Err(Error::LimitExceeded(_))));
    }
}
