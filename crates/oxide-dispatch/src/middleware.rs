//! Middleware units and the chain that nests them around an action.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::DispatchResult;
use crate::request::Request;
use crate::response::Response;

/// Outcome of a unit's `handle` hook.
pub enum MiddlewareResult {
    /// Continue to the next unit or the action.
    Continue,
    /// Stop here and return this response.
    Response(Response),
}

/// The innermost action wrapped by a chain.
pub type Endpoint<'a> = dyn FnMut(&mut Request, Response) -> DispatchResult<Response> + 'a;

/// Read-only configuration handed to a middleware unit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MiddlewareConfig {
    values: HashMap<String, Value>,
}

impl MiddlewareConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Gets a value deserialized into `T`, or `None` if missing or mistyped.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }
}

/// A before/after hook pair around the rest of the chain.
///
/// Implement either `startup`/`shutdown` or `handle`/`process`; every hook
/// defaults to a no-op so units of both styles mix freely in one chain.
///
/// # Example
///
/// ```
/// use oxide_dispatch::{Middleware, Request, Response};
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn process(&self, _req: &Request, res: &mut Response) {
///         res.headers.insert("X-Powered-By".to_string(), "oxide".to_string());
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Called first when the unit is entered.
    fn startup(&self) {}

    /// Called last, after the rest of the chain returned.
    fn shutdown(&self) {}

    /// Inspects or modifies the request on the way in.
    ///
    /// Returning [`MiddlewareResult::Response`] stops the chain: neither the
    /// remaining units, the action, nor any later hook of this unit runs.
    fn handle(&self, _request: &mut Request) -> MiddlewareResult {
        MiddlewareResult::Continue
    }

    /// Inspects or modifies the response on the way out.
    fn process(&self, _request: &Request, _response: &mut Response) {}

    /// Runs this unit around `next`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the wrapped action unchanged; the remaining
    /// after-hooks are skipped.
    fn call(
        &self,
        request: &mut Request,
        response: Response,
        next: Next<'_, '_>,
    ) -> DispatchResult<Response> {
        self.startup();
        if let MiddlewareResult::Response(response) = self.handle(request) {
            return Ok(response);
        }
        let mut response = next.run(request, response)?;
        self.process(request, &mut response);
        self.shutdown();
        Ok(response)
    }
}

/// A unit built from its configuration entry.
///
/// Configuration files refer to the unit by [`NAME`](Self::NAME).
pub trait ConfiguredMiddleware: Middleware + Sized + 'static {
    /// Name used in configuration files.
    const NAME: &'static str;

    /// Builds the unit from its read-only configuration.
    fn from_config(config: &MiddlewareConfig) -> Self;
}

/// Continuation over the rest of a chain.
pub struct Next<'a, 'e> {
    remaining: &'a [Arc<dyn Middleware>],
    endpoint: Option<&'a mut Endpoint<'e>>,
}

impl Next<'_, '_> {
    /// A continuation with nothing left to run; it returns the response as is.
    #[must_use]
    pub const fn end() -> Self {
        Self {
            remaining: &[],
            endpoint: None,
        }
    }

    /// Runs the next unit, or the endpoint once the units are exhausted.
    ///
    /// # Errors
    ///
    /// Returns whatever error the endpoint produced.
    pub fn run(self, request: &mut Request, response: Response) -> DispatchResult<Response> {
        match self.remaining.split_first() {
            Some((unit, rest)) => unit.call(
                request,
                response,
                Next {
                    remaining: rest,
                    endpoint: self.endpoint,
                },
            ),
            None => match self.endpoint {
                Some(endpoint) => endpoint(request, response),
                None => Ok(response),
            },
        }
    }
}

/// An ordered list of units, built at startup and shared between requests.
///
/// Before-hooks run in registration order and after-hooks in reverse.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    units: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit.
    #[must_use]
    pub fn with(mut self, unit: impl Middleware + 'static) -> Self {
        self.units.push(Arc::new(unit));
        self
    }

    /// Appends a unit built from `config`.
    #[must_use]
    pub fn with_configured<M: ConfiguredMiddleware>(self, config: &MiddlewareConfig) -> Self {
        self.with(M::from_config(config))
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the chain has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Runs the chain around `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the endpoint's error, if it fails.
    pub fn run(
        &self,
        request: &mut Request,
        response: Response,
        endpoint: &mut Endpoint<'_>,
    ) -> DispatchResult<Response> {
        Next {
            remaining: &self.units,
            endpoint: Some(endpoint),
        }
        .run(request, response)
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("units", &self.units.len())
            .finish()
    }
}

/// Redirects unauthenticated requests to a login page.
pub struct AuthMiddleware {
    /// Path prefixes that skip authentication.
    pub exclude: Vec<String>,
    /// The login redirect URL.
    pub login_url: String,
}

impl AuthMiddleware {
    /// Creates new auth middleware.
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            exclude: Vec::new(),
            login_url: login_url.into(),
        }
    }

    /// Adds paths to exclude from authentication.
    #[must_use]
    pub fn exclude(mut self, paths: &[&str]) -> Self {
        self.exclude = paths.iter().map(|s| (*s).to_string()).collect();
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        path == self.login_url || self.exclude.iter().any(|p| path.starts_with(p))
    }
}

impl ConfiguredMiddleware for AuthMiddleware {
    const NAME: &'static str = "auth";

    /// Reads the `login_url` and `exclude` keys.
    fn from_config(config: &MiddlewareConfig) -> Self {
        Self {
            exclude: config.get("exclude").unwrap_or_default(),
            login_url: config.get_str("login_url").unwrap_or("/login").to_string(),
        }
    }
}

fn has_session_cookie(cookies: &str) -> bool {
    cookies
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .any(|(name, value)| name.trim() == "session" && !value.trim().is_empty())
}

impl Middleware for AuthMiddleware {
    fn handle(&self, request: &mut Request) -> MiddlewareResult {
        if self.is_excluded(&request.path) {
            return MiddlewareResult::Continue;
        }

        let authenticated = request.get_header("Authorization").is_some()
            || request
                .get_header("Cookie")
                .is_some_and(has_session_cookie);
        if authenticated {
            MiddlewareResult::Continue
        } else {
            debug!(path = %request.path, "unauthenticated, redirecting");
            MiddlewareResult::Response(Response::redirect(&self.login_url))
        }
    }
}

/// Logs each request and its final status.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle(&self, request: &mut Request) -> MiddlewareResult {
        info!(path = %request.path, "-->");
        MiddlewareResult::Continue
    }

    fn process(&self, request: &Request, response: &mut Response) {
        info!(path = %request.path, status = response.status, "<--");
    }
}

impl ConfiguredMiddleware for LoggingMiddleware {
    const NAME: &'static str = "logging";

    fn from_config(_config: &MiddlewareConfig) -> Self {
        Self
    }
}

/// Adds CORS headers to every response.
pub struct CorsMiddleware {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
}

impl CorsMiddleware {
    /// Creates CORS middleware that allows all origins.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl ConfiguredMiddleware for CorsMiddleware {
    const NAME: &'static str = "cors";

    /// Reads the `origins` key, defaulting to `*`.
    fn from_config(config: &MiddlewareConfig) -> Self {
        config
            .get("origins")
            .map_or_else(Self::permissive, |allowed_origins| Self { allowed_origins })
    }
}

impl Middleware for CorsMiddleware {
    fn process(&self, _request: &Request, response: &mut Response) {
        response.headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            self.allowed_origins.join(", "),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn log(&self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_string());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Halting;

    impl Middleware for Halting {
        fn handle(&self, _request: &mut Request) -> MiddlewareResult {
            MiddlewareResult::Response(Response::new(503))
        }
    }

    struct Tagger(Arc<Journal>, &'static str);

    impl Middleware for Tagger {
        fn startup(&self) {
            self.0.log(&format!("{}.startup", self.1));
        }

        fn shutdown(&self) {
            self.0.log(&format!("{}.shutdown", self.1));
        }
    }

    #[test]
    fn test_empty_chain_runs_endpoint() {
        let chain = MiddlewareChain::new();
        let mut request = Request::new("/");
        let response = chain
            .run(&mut request, Response::ok(), &mut |_: &mut Request, res: Response| {
                Ok(res.body("done"))
            })
            .unwrap();
        assert_eq!(response.body_string(), Some("done".to_string()));
    }

    #[test]
    fn test_call_without_next_returns_response() {
        let journal = Arc::new(Journal::default());
        let unit = Tagger(journal.clone(), "m");
        let mut request = Request::new("/");
        let response = unit
            .call(&mut request, Response::new(204), Next::end())
            .unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(journal.entries(), vec!["m.startup", "m.shutdown"]);
    }

    #[test]
    fn test_halting_skips_endpoint() {
        let journal = Arc::new(Journal::default());
        let chain = MiddlewareChain::new()
            .with(Halting)
            .with(Tagger(journal.clone(), "inner"));
        let mut request = Request::new("/");
        let mut reached = false;
        let response = chain
            .run(&mut request, Response::ok(), &mut |_: &mut Request, res: Response| {
                reached = true;
                Ok(res)
            })
            .unwrap();
        assert_eq!(response.status, 503);
        assert!(!reached);
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_auth_middleware_exclude() {
        let mw = AuthMiddleware::new("/login").exclude(&["/public", "/api/health"]);
        assert!(mw.is_excluded("/public/file.txt"));
        assert!(mw.is_excluded("/api/health"));
        assert!(mw.is_excluded("/login"));
        assert!(!mw.is_excluded("/admin"));
    }

    #[test]
    fn test_auth_middleware_redirects() {
        let mw = AuthMiddleware::new("/login");
        let mut anonymous = Request::new("/admin");
        match mw.handle(&mut anonymous) {
            MiddlewareResult::Response(res) => assert_eq!(res.location(), Some("/login")),
            MiddlewareResult::Continue => panic!("expected redirect"),
        }

        let mut signed_in = Request::new("/admin").header("Cookie", "session=abc");
        assert!(matches!(
            mw.handle(&mut signed_in),
            MiddlewareResult::Continue
        ));
    }

    #[test]
    fn test_session_cookie_matches_name_exactly() {
        assert!(has_session_cookie("session=abc"));
        assert!(has_session_cookie("theme=dark; session=abc"));
        assert!(!has_session_cookie("nosession=1"));
        assert!(!has_session_cookie("session_id=1; theme=dark"));
        assert!(!has_session_cookie("session="));

        let mw = AuthMiddleware::new("/login");
        let mut spoofed = Request::new("/admin").header("Cookie", "nosession=1");
        assert!(matches!(
            mw.handle(&mut spoofed),
            MiddlewareResult::Response(_)
        ));
    }

    #[test]
    fn test_configured_names() {
        assert_eq!(LoggingMiddleware::NAME, "logging");
        assert_eq!(AuthMiddleware::NAME, "auth");
        assert_eq!(CorsMiddleware::NAME, "cors");

        let chain = MiddlewareChain::new()
            .with_configured::<LoggingMiddleware>(&MiddlewareConfig::new())
            .with_configured::<CorsMiddleware>(&MiddlewareConfig::new());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_from_config() {
        let config = MiddlewareConfig::new()
            .set("login_url", "/users/login")
            .set("exclude", serde_json::json!(["/pages"]))
            .set("origins", serde_json::json!(["https://a.test", "https://b.test"]));

        let auth = AuthMiddleware::from_config(&config);
        assert_eq!(auth.login_url, "/users/login");
        assert_eq!(auth.exclude, vec!["/pages".to_string()]);

        let cors = CorsMiddleware::from_config(&config);
        let mut res = Response::ok();
        cors.process(&Request::new("/"), &mut res);
        assert_eq!(
            res.headers.get("Access-Control-Allow-Origin"),
            Some(&"https://a.test, https://b.test".to_string())
        );
    }

    #[test]
    fn test_cors_defaults_to_any_origin() {
        let cors = CorsMiddleware::from_config(&MiddlewareConfig::new());
        assert_eq!(cors.allowed_origins, vec!["*".to_string()]);
    }
}
