//! URL descriptors and the encoding helpers used by reverse routing.

use convert_case::{Case, Casing};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters escaped in named argument values. Matches form encoding:
/// alphanumerics and `-_.` pass through, space is handled separately.
const NAMED_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Encodes a value for use in a `key:value` path token.
#[must_use]
pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, NAMED_VALUE)
        .to_string()
        .replace("%20", "+")
}

/// Decodes a `key:value` token value (`+` is a space).
#[must_use]
pub fn decode_value(value: &str) -> String {
    percent_decode_str(&value.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// `user_profiles` -> `UserProfiles`.
#[must_use]
pub fn camelize(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// `UserProfiles` -> `user_profiles`.
#[must_use]
pub fn underscore(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Describes a URL to build from routing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlDescriptor {
    pub controller: Option<String>,
    pub action: Option<String>,
    pub plugin: Option<String>,
    pub args: Vec<String>,
    pub named: Vec<(String, String)>,
    pub query: Option<Vec<(String, String)>>,
    pub fragment: Option<String>,
}

impl UrlDescriptor {
    /// Creates an empty descriptor, which builds `/`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the controller.
    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Sets the action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the plugin.
    #[must_use]
    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a named argument.
    #[must_use]
    pub fn named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.push((key.into(), value.into()));
        self
    }

    /// Adds a query string parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Sets the fragment.
    #[must_use]
    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Returns true if nothing at all was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// What to build a URL from: a literal string or a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlTarget {
    /// Returned unchanged.
    Literal(String),
    /// Built from routing parameters.
    Route(UrlDescriptor),
}

impl From<&str> for UrlTarget {
    fn from(url: &str) -> Self {
        Self::Literal(url.to_string())
    }
}

impl From<String> for UrlTarget {
    fn from(url: String) -> Self {
        Self::Literal(url)
    }
}

impl From<UrlDescriptor> for UrlTarget {
    fn from(descriptor: UrlDescriptor) -> Self {
        Self::Route(descriptor)
    }
}

impl From<&crate::params::Params> for UrlDescriptor {
    fn from(params: &crate::params::Params) -> Self {
        let mut named: Vec<(String, String)> = params
            .named
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        named.sort();
        Self {
            controller: Some(params.controller.clone()),
            action: params.action.clone(),
            plugin: params.plugin.clone(),
            args: params.args.clone(),
            named,
            query: None,
            fragment: None,
        }
    }
}
