//! Request dispatch: route, resolve the controller, run the action.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::DispatcherConfig;
use crate::controller::{Context, Controller, ControllerRegistry, HandlerKey};
use crate::error::{DispatchError, DispatchResult};
use crate::middleware::MiddlewareChain;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Turns requests into controller action invocations.
///
/// The router, registry and middleware chain are built at startup and only
/// read while dispatching, so one dispatcher can serve every request.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use oxide_dispatch::{
///     ActionTable, Context, Controller, ControllerRegistry, Dispatcher, RouteDefaults,
///     Router, Visibility,
/// };
///
/// struct Pages(ActionTable<Self>);
///
/// impl Pages {
///     fn display(&mut self, ctx: &mut Context<'_>, args: &[String]) {
///         ctx.response.set_body(format!("page {}", args.join("/")));
///     }
/// }
///
/// impl Controller for Pages {
///     fn name(&self) -> &str { "Pages" }
///     fn visibility(&self, action: &str) -> Option<Visibility> { self.0.visibility(action) }
///     fn invoke(&mut self, action: &str, ctx: &mut Context<'_>, args: &[String]) {
///         if let Some(action) = self.0.get(action) {
///             action(self, ctx, args);
///         }
///     }
/// }
///
/// let router = Router::new().route("/:controller/:action/*", RouteDefaults::new()).unwrap();
/// let registry = ControllerRegistry::new().with(None, "pages", |_| {
///     Box::new(Pages(ActionTable::new().public("display", Pages::display)))
/// });
///
/// let dispatcher = Dispatcher::new(Arc::new(router), registry);
/// let response = dispatcher.start("/pages/display/about").unwrap();
/// assert_eq!(response.body_string(), Some("page about".to_string()));
/// ```
#[derive(Debug)]
pub struct Dispatcher {
    router: Arc<Router>,
    registry: ControllerRegistry,
    middleware: MiddlewareChain,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with no middleware and the default namespace.
    #[must_use]
    pub fn new(router: Arc<Router>, registry: ControllerRegistry) -> Self {
        Self {
            router,
            registry,
            middleware: MiddlewareChain::new(),
            config: DispatcherConfig::default(),
        }
    }

    /// Sets the middleware chain wrapped around every action.
    #[must_use]
    pub fn with_middleware(mut self, middleware: MiddlewareChain) -> Self {
        self.middleware = middleware;
        self
    }

    /// Sets the dispatcher configuration.
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the full identity of the controller behind `key`.
    ///
    /// Plugin controllers live under the plugin's namespace, all others
    /// under the configured one.
    #[must_use]
    pub fn handler_identity(&self, key: &HandlerKey) -> String {
        let namespace = key.plugin.as_deref().unwrap_or(&self.config.namespace);
        format!("{namespace}::controller::{}Controller", key.controller)
    }

    /// Builds a request from a raw URL and dispatches it.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn start(&self, url: &str) -> DispatchResult<Response> {
        self.dispatch(Request::new(url))
    }

    /// Dispatches a request and returns the sent response.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Routing`] if no route matches the path
    /// - [`DispatchError::MissingHandler`] if no controller is registered
    /// - [`DispatchError::MissingOperation`] if the action does not exist
    /// - [`DispatchError::ForbiddenOperation`] if the action is not routable
    pub fn dispatch(&self, mut request: Request) -> DispatchResult<Response> {
        let Some(params) = self.router.parse(&request.path) else {
            debug!(path = %request.path, "no route found");
            return Err(DispatchError::Routing { path: request.path });
        };

        let key = HandlerKey::new(params.plugin.as_deref(), &params.controller);
        let identity = self.handler_identity(&key);
        let factory = self
            .registry
            .get(&key)
            .ok_or_else(|| DispatchError::MissingHandler {
                controller: params.controller.clone(),
                identity: identity.clone(),
            })?;

        let action = params.action().to_string();
        let args = params.args.clone();
        request.set_params(params);

        let mut controller = factory(&request);
        validate(controller.as_ref(), &action)?;
        debug!(%identity, %action, args = args.len(), "dispatching");

        let mut response = self.middleware.run(
            &mut request,
            Response::ok(),
            &mut |request: &mut Request, response: Response| {
                Ok(invoke(controller.as_mut(), &action, &args, request, response))
            },
        )?;

        response.send();
        Ok(response)
    }
}

fn validate(controller: &dyn Controller, action: &str) -> DispatchResult<()> {
    if controller.visibility(action).is_none() {
        return Err(DispatchError::MissingOperation {
            controller: controller.name().to_string(),
            action: action.to_string(),
        });
    }
    if !controller.is_accessible(action) {
        return Err(DispatchError::ForbiddenOperation {
            controller: controller.name().to_string(),
            action: action.to_string(),
        });
    }
    Ok(())
}

/// Runs the controller lifecycle around the action.
fn invoke(
    controller: &mut dyn Controller,
    action: &str,
    args: &[String],
    request: &Request,
    mut response: Response,
) -> Response {
    let mut ctx = Context {
        request,
        response: &mut response,
    };

    let early = controller.startup_process(&mut ctx);
    let short_circuit = early.is_some() || ctx.response.location().is_some();
    if let Some(early) = early {
        *ctx.response = early;
    }

    if short_circuit {
        trace!(action, "startup short-circuited the action");
    } else {
        controller.invoke(action, &mut ctx, args);
        if controller.auto_render() && !ctx.response.is_finalized() {
            controller.render(&mut ctx);
        }
    }

    if let Some(last) = controller.shutdown_process(&mut ctx) {
        *ctx.response = last;
    }

    response
}
