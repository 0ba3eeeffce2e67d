//! Error types for routing and dispatch.

use thiserror::Error;

use crate::response::Response;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Invalid route template.
    #[error("invalid route template '{template}': {reason}")]
    InvalidPattern { template: String, reason: String },

    /// A URL could not be built because a component had no value to fall back on.
    #[error("cannot build url: no {0} given and no active request")]
    IncompleteUrl(&'static str),

    /// Query string serialization failed.
    #[error("query encoding failed: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),
}

/// Errors raised while dispatching a request to a controller action.
///
/// None of these are retried: dispatch is deterministic for a given request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route matched the request path.
    #[error("no route found for '{path}'")]
    Routing { path: String },

    /// No controller is registered for the resolved identity.
    #[error("controller {identity} not found")]
    MissingHandler {
        /// Canonical controller name from the route.
        controller: String,
        /// Full handler identity derived from namespace and controller.
        identity: String,
    },

    /// The controller exists but has no such action.
    #[error("{controller}::{action} does not exist")]
    MissingOperation { controller: String, action: String },

    /// The action exists but cannot be called from a route.
    #[error("{controller}::{action} is not accessible")]
    ForbiddenOperation { controller: String, action: String },

    /// Reverse routing or route compilation failed.
    #[error(transparent)]
    Router(#[from] RouterError),
}

impl DispatchError {
    /// Returns the HTTP status this error maps to at the transport boundary.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Routing { .. } | Self::MissingHandler { .. } | Self::MissingOperation { .. } => {
                404
            }
            Self::ForbiddenOperation { .. } => 403,
            Self::Router(_) => 500,
        }
    }

    /// Converts the error into a plain response.
    #[must_use]
    pub fn into_response(self) -> Response {
        Response::new(self.status()).body(self.to_string())
    }
}

/// Errors raised while loading application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for the expected shape.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured route template is malformed.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// A configured middleware name is unknown.
    #[error("unknown middleware: {0}")]
    UnknownMiddleware(String),
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Result type alias for dispatch operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = DispatchError::Routing {
            path: "/nope".to_string(),
        };
        assert_eq!(err.status(), 404);

        let err = DispatchError::ForbiddenOperation {
            controller: "Users".to_string(),
            action: "initialize".to_string(),
        };
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn test_into_response() {
        let res = DispatchError::Routing {
            path: "/nope".to_string(),
        }
        .into_response();
        assert_eq!(res.status, 404);
        assert_eq!(
            res.body_string(),
            Some("no route found for '/nope'".to_string())
        );
    }
}
