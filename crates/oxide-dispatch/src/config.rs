//! Application configuration: namespace, routes and middleware.
//!
//! Configuration is read once at startup, typically from a JSON file:
//!
//! ```json
//! {
//!   "namespace": "App",
//!   "routes": [
//!     { "template": "/", "controller": "pages", "action": "display", "args": ["home"] },
//!     { "template": "/:controller/:action/*" }
//!   ],
//!   "middleware": [
//!     { "name": "logging" },
//!     { "name": "auth", "config": { "login_url": "/users/login", "exclude": ["/pages"] } }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::middleware::{
    AuthMiddleware, ConfiguredMiddleware, CorsMiddleware, LoggingMiddleware, MiddlewareChain,
    MiddlewareConfig,
};
use crate::route::RouteDefaults;
use crate::router::Router;

/// Namespace used for controllers outside any plugin.
pub const DEFAULT_NAMESPACE: &str = "App";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

type UnitBuilder = fn(MiddlewareChain, &MiddlewareConfig) -> MiddlewareChain;

/// Units a configuration file may name.
const BUILT_IN_UNITS: [(&str, UnitBuilder); 3] = [
    (
        LoggingMiddleware::NAME,
        MiddlewareChain::with_configured::<LoggingMiddleware>,
    ),
    (
        AuthMiddleware::NAME,
        MiddlewareChain::with_configured::<AuthMiddleware>,
    ),
    (
        CorsMiddleware::NAME,
        MiddlewareChain::with_configured::<CorsMiddleware>,
    ),
];

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatcherConfig {
    /// Base namespace of application controllers.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

/// One route in a configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub template: String,
    #[serde(flatten)]
    pub defaults: RouteDefaults,
}

/// One middleware unit in a configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct MiddlewareEntry {
    pub name: String,
    #[serde(default)]
    pub config: MiddlewareConfig,
}

/// Full application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub middleware: Vec<MiddlewareEntry>,
}

impl AppConfig {
    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if it is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            routes = config.routes.len(),
            middleware = config.middleware.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Builds the route table, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Router`] for a malformed template.
    pub fn router(&self) -> Result<Router, ConfigError> {
        let mut router = Router::new();
        for entry in &self.routes {
            router.add(&entry.template, entry.defaults.clone())?;
        }
        Ok(router)
    }

    /// Builds the middleware chain, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMiddleware`] for an unsupported name.
    pub fn middleware_chain(&self) -> Result<MiddlewareChain, ConfigError> {
        self.middleware
            .iter()
            .try_fold(MiddlewareChain::new(), |chain, entry| -> Result<_, ConfigError> {
                let (_, build) = BUILT_IN_UNITS
                    .iter()
                    .find(|(name, _)| *name == entry.name)
                    .ok_or_else(|| ConfigError::UnknownMiddleware(entry.name.clone()))?;
                Ok(build(chain, &entry.config))
            })
    }
}
