//! Route table, path resolution and reverse routing.

use tracing::{debug, trace};

use crate::error::{Result, RouterError};
use crate::params::Params;
use crate::route::{Route, RouteDefaults};
use crate::url::{UrlDescriptor, UrlTarget, encode_value, underscore};

/// An ordered route table.
///
/// Routes are tried in registration order and the first match wins, so
/// register specific routes before catch-all ones. The router is built
/// once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// A template that compiles to the same matcher as an existing route
    /// replaces that route's defaults and keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if the template is malformed.
    pub fn add(&mut self, template: &str, defaults: RouteDefaults) -> Result<&mut Self> {
        let route = Route::new(template, defaults)?;

        if let Some(existing) = self
            .routes
            .iter_mut()
            .find(|r| r.matcher() == route.matcher())
        {
            debug!(template, "replacing defaults of existing route");
            existing.set_defaults(route.defaults().clone());
        } else {
            debug!(template, matcher = route.matcher(), "route added");
            self.routes.push(route);
        }

        Ok(self)
    }

    /// Adds a route, builder style.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if the template is malformed.
    pub fn route(mut self, template: &str, defaults: RouteDefaults) -> Result<Self> {
        self.add(template, defaults)?;
        Ok(self)
    }

    /// Returns the registered routes in priority order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolves a path to routing parameters.
    ///
    /// Returns `None` when no route matches.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_dispatch::{RouteDefaults, Router};
    ///
    /// let router = Router::new()
    ///     .route("/", RouteDefaults::new().controller("pages").action("display").arg("home"))
    ///     .unwrap()
    ///     .route("/:controller/:action/*", RouteDefaults::new())
    ///     .unwrap();
    ///
    /// let params = router.parse("/pages/display").unwrap();
    /// assert_eq!(params.controller, "Pages");
    /// assert!(router.parse("/no.such/route").is_none());
    /// ```
    #[must_use]
    pub fn parse(&self, url: &str) -> Option<Params> {
        let url = url.strip_prefix('/').unwrap_or(url);
        let path = url.split_once('?').map_or(url, |(path, _)| path);

        let found = self.routes.iter().find_map(|route| route.resolve(path));
        match &found {
            Some(params) => trace!(path, route = %params.route, "route matched"),
            None => trace!(path, "no route matched"),
        }
        found
    }

    /// Builds a URL.
    ///
    /// Literal targets are returned unchanged. Descriptors without a
    /// controller or action borrow them from `current`, the parameters of
    /// the request being handled.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IncompleteUrl`] if a controller or action is
    /// needed but unavailable, or [`RouterError::QueryEncoding`] if the query
    /// cannot be serialized.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_dispatch::{Router, UrlDescriptor};
    ///
    /// let url = Router::new()
    ///     .url(
    ///         UrlDescriptor::new()
    ///             .controller("UserProfiles")
    ///             .action("view")
    ///             .arg("7")
    ///             .named("tab", "recent posts"),
    ///         None,
    ///     )
    ///     .unwrap();
    /// assert_eq!(url, "/user_profiles/view/7/tab:recent+posts");
    /// ```
    pub fn url(&self, target: impl Into<UrlTarget>, current: Option<&Params>) -> Result<String> {
        let url = match target.into() {
            UrlTarget::Literal(url) => return Ok(url),
            UrlTarget::Route(descriptor) if descriptor.is_empty() => return Ok("/".to_string()),
            UrlTarget::Route(descriptor) => descriptor,
        };
        build(url, current)
    }
}

fn build(url: UrlDescriptor, current: Option<&Params>) -> Result<String> {
    let controller = url
        .controller
        .filter(|c| !c.is_empty())
        .or_else(|| current.map(|p| p.controller.clone()))
        .ok_or(RouterError::IncompleteUrl("controller"))?;
    let action = url
        .action
        .filter(|a| !a.is_empty())
        .or_else(|| current.and_then(|p| p.action.clone()))
        .ok_or(RouterError::IncompleteUrl("action"))?;

    let mut output = String::new();
    if let Some(plugin) = url.plugin.filter(|p| !p.is_empty()) {
        output.push('/');
        output.push_str(&underscore(&plugin));
    }
    output.push('/');
    output.push_str(&underscore(&controller));
    output.push('/');
    output.push_str(&action);

    for arg in &url.args {
        output.push('/');
        output.push_str(arg);
    }
    for (key, value) in &url.named {
        output.push('/');
        output.push_str(key);
        output.push(':');
        output.push_str(&encode_value(value));
    }

    if let Some(query) = url.query {
        output.push('?');
        output.push_str(&serde_urlencoded::to_string(query)?);
    }
    if let Some(fragment) = url.fragment {
        output.push('#');
        output.push_str(&fragment);
    }

    Ok(output)
}
