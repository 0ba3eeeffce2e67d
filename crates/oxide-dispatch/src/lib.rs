//! # oxide-dispatch
//!
//! URL routing and controller dispatch with an onion-style middleware chain.
//!
//! This crate provides:
//! - Route templates compiled to case-insensitive matchers
//! - First-match path resolution into controller, action and arguments
//! - Reverse routing from parameters back to URLs
//! - A dispatcher running the controller lifecycle around an action
//! - Middleware with before/after hooks nested around the action
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use oxide_dispatch::{ControllerRegistry, Dispatcher, RouteDefaults, Router};
//!
//! let router = Router::new()
//!     .route("/", RouteDefaults::new().controller("pages").action("display").arg("home"))?
//!     .route("/:controller/:action/*", RouteDefaults::new())?;
//!
//! let registry = ControllerRegistry::new()
//!     .with(None, "pages", |req| Box::new(PagesController::new(req)));
//!
//! let dispatcher = Dispatcher::new(Arc::new(router), registry);
//! let response = dispatcher.start("/pages/display/about")?;
//! ```
//!
//! ## Route Templates
//!
//! - `:name` captures one path segment (no `/` or `.`) under `name`
//! - `*` at the end captures the remainder, which is split into positional
//!   arguments and `key:value` named arguments
//!
//! ```ignore
//! let params = router.parse("/posts/index/2/sort:title").unwrap();
//! assert_eq!(params.controller, "Posts");
//! assert_eq!(params.args, vec!["2"]);
//! assert_eq!(params.get("sort"), Some("title"));
//! ```
//!
//! ## Reverse Routing
//!
//! ```ignore
//! let url = router.url(
//!     UrlDescriptor::new().controller("Posts").action("index").named("sort", "title"),
//!     None,
//! )?;
//! assert_eq!(url, "/posts/index/sort:title");
//! ```
//!
//! ## Middleware
//!
//! ```ignore
//! use oxide_dispatch::{AuthMiddleware, LoggingMiddleware, MiddlewareChain};
//!
//! let chain = MiddlewareChain::new()
//!     .with(LoggingMiddleware)
//!     .with(AuthMiddleware::new("/login").exclude(&["/pages"]));
//! let dispatcher = Dispatcher::new(Arc::new(router), registry).with_middleware(chain);
//! ```

mod config;
mod controller;
mod dispatcher;
mod error;
mod middleware;
mod params;
mod request;
mod response;
mod route;
mod router;
mod url;

pub use config::{
    AppConfig, DEFAULT_NAMESPACE, DispatcherConfig, MiddlewareEntry, RouteEntry,
};
pub use controller::{
    ActionFn, ActionTable, Context, Controller, ControllerFactory, ControllerRegistry,
    HandlerKey, LIFECYCLE_HOOKS, Visibility, is_lifecycle_hook,
};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, DispatchError, DispatchResult, Result, RouterError};
pub use middleware::{
    AuthMiddleware, ConfiguredMiddleware, CorsMiddleware, Endpoint, LoggingMiddleware, Middleware,
    MiddlewareChain, MiddlewareConfig, MiddlewareResult, Next,
};
pub use params::Params;
pub use request::Request;
pub use response::Response;
pub use route::{Route, RouteDefaults};
pub use router::Router;
pub use url::{UrlDescriptor, UrlTarget, camelize, decode_value, encode_value, underscore};
