//! Route templates and their compiled matchers.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, RouterError};
use crate::params::Params;
use crate::url::{camelize, decode_value};

/// Name of the capture group holding the wildcard remainder.
const GREEDY: &str = "greedy";

/// Default and static parameters attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteDefaults {
    /// Default controller.
    pub controller: Option<String>,
    /// Default action.
    pub action: Option<String>,
    /// Default plugin.
    pub plugin: Option<String>,
    /// Positional arguments used when the path supplies none.
    pub args: Vec<String>,
    /// Static values exposed as named parameters.
    pub extras: HashMap<String, String>,
}

impl RouteDefaults {
    /// Creates empty defaults.
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

    /// Appends a default positional argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds a static extra parameter.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// A registered route: template, compiled matcher and defaults.
#[derive(Debug, Clone)]
pub struct Route {
    template: String,
    matcher: Regex,
    defaults: RouteDefaults,
}

impl Route {
    /// Compiles a route template.
    ///
    /// Template syntax:
    /// - `contacts/view` - literal path
    /// - `:controller/:action` - named parameters (lowercase letters only)
    /// - `:controller/:action/*` - trailing wildcard, split into positional
    ///   and named arguments on match
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if a wildcard appears anywhere
    /// but at the end, or if the resulting matcher does not compile.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_dispatch::{Route, RouteDefaults};
    ///
    /// let route = Route::new("/:controller/:action/*", RouteDefaults::new()).unwrap();
    /// let params = route.resolve("user_profiles/view/7/tab:info").unwrap();
    /// assert_eq!(params.controller, "UserProfiles");
    /// assert_eq!(params.args, vec!["7".to_string()]);
    /// assert_eq!(params.get("tab"), Some("info"));
    /// ```
    pub fn new(template: &str, defaults: RouteDefaults) -> Result<Self> {
        let matcher = compile(template)?;
        Ok(Self {
            template: template.to_string(),
            matcher,
            defaults,
        })
    }

    /// Returns the original template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the compiled matcher source.
    #[must_use]
    pub fn matcher(&self) -> &str {
        self.matcher.as_str()
    }

    /// Returns the route defaults.
    #[must_use]
    pub const fn defaults(&self) -> &RouteDefaults {
        &self.defaults
    }

    pub(crate) fn set_defaults(&mut self, defaults: RouteDefaults) {
        self.defaults = defaults;
    }

    /// Matches a path (without leading separator) and builds its parameters.
    ///
    /// Captured groups take precedence over defaults of the same name.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;

        let mut params = Params {
            controller: self.defaults.controller.clone().unwrap_or_default(),
            action: self.defaults.action.clone(),
            plugin: self.defaults.plugin.clone(),
            args: self.defaults.args.clone(),
            named: self.defaults.extras.clone(),
            route: self.template.clone(),
        };
        let mut greedy = None;

        for name in self.matcher.capture_names().flatten() {
            let Some(value) = caps.name(name) else {
                continue;
            };
            let value = value.as_str().to_string();
            match name {
                "controller" => params.controller = value,
                "action" => params.action = Some(value),
                "plugin" => params.plugin = Some(value),
                GREEDY => greedy = Some(value),
                _ => {
                    params.named.insert(name.to_string(), value);
                }
            }
        }

        params.controller = camelize(&params.controller);

        if let Some(greedy) = greedy.filter(|g| !g.is_empty()) {
            let mut args = Vec::new();
            for token in greedy.split('/').filter(|t| !t.is_empty()) {
                match token.split_once(':') {
                    Some((key, value)) if !key.is_empty() => {
                        params.named.insert(key.to_string(), decode_value(value));
                    }
                    _ => args.push(token.to_string()),
                }
            }
            params.args = args;
        }

        Some(params)
    }
}

/// Translates a template into an anchored, case-insensitive regex.
fn compile(template: &str) -> Result<Regex> {
    let invalid = |reason: String| RouterError::InvalidPattern {
        template: template.to_string(),
        reason,
    };

    let trimmed = template.trim().trim_matches('/');
    let mut source = String::from("(?i)^");
    let mut chars = trimmed.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            ':' if chars.peek().is_some_and(|(_, n)| n.is_ascii_lowercase()) => {
                let mut name = String::new();
                while let Some((_, n)) = chars.next_if(|(_, n)| n.is_ascii_lowercase()) {
                    name.push(n);
                }
                source.push_str(&format!("(?P<{name}>[^./]+)"));
            }
            '*' => {
                if pos + 1 != trimmed.len() {
                    return Err(invalid("wildcard is only allowed at the end".to_string()));
                }
                if source.ends_with('/') {
                    source.push('?');
                }
                source.push_str(&format!("(?P<{GREEDY}>.*)"));
            }
            _ => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    source.push('$');
    Regex::new(&source).map_err(|e| invalid(e.to_string()))
}
