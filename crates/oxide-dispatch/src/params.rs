//! Resolved routing parameters.

use std::collections::HashMap;

use serde::Serialize;

/// Parameters produced by matching a path against the route table.
///
/// Positional and named arguments live in separate collections so that
/// action arguments never mix with keyed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params {
    /// Controller name, canonicalized to `PascalCase`.
    pub controller: String,
    /// Action name.
    pub action: Option<String>,
    /// Plugin the controller belongs to.
    pub plugin: Option<String>,
    /// Positional arguments passed to the action, in order.
    pub args: Vec<String>,
    /// Named arguments from `key:value` tokens, captures and route extras.
    pub named: HashMap<String, String>,
    /// The template of the route that matched.
    pub route: String,
}

impl Params {
    /// Returns the action name, or an empty string if the route set none.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }

    /// Gets a named argument.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    /// Parses a named argument as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Gets a positional argument.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}
