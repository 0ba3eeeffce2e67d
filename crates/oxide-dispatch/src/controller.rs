//! Controllers, their action tables and the registry they are resolved from.

use std::collections::HashMap;
use std::fmt;

use crate::request::Request;
use crate::response::Response;
use crate::url::camelize;

/// Operations that belong to the controller lifecycle. They are never
/// callable from a route, whatever their visibility.
pub const LIFECYCLE_HOOKS: &[&str] = &[
    "initialize",
    "startup_process",
    "shutdown_process",
    "before_filter",
    "after_filter",
    "before_render",
    "before_redirect",
    "render",
    "redirect",
];

/// Returns true if `action` names a lifecycle operation.
#[must_use]
pub fn is_lifecycle_hook(action: &str) -> bool {
    LIFECYCLE_HOOKS
        .iter()
        .any(|hook| hook.eq_ignore_ascii_case(action))
}

/// Whether an action may be invoked through routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// The request being handled and the response being built.
#[derive(Debug)]
pub struct Context<'a> {
    pub request: &'a Request,
    pub response: &'a mut Response,
}

/// A per-request handler whose actions implement the application.
///
/// A fresh instance is built by a [`ControllerFactory`] for every dispatch.
pub trait Controller: Send {
    /// Controller name, used in error messages.
    fn name(&self) -> &str;

    /// Returns the visibility of an action, or `None` if it does not exist.
    fn visibility(&self, action: &str) -> Option<Visibility>;

    /// Returns true if the action can be invoked through routing.
    fn is_accessible(&self, action: &str) -> bool {
        !is_lifecycle_hook(action) && self.visibility(action) == Some(Visibility::Public)
    }

    /// Invokes an action with its positional arguments.
    fn invoke(&mut self, action: &str, ctx: &mut Context<'_>, args: &[String]);

    /// Runs before the action. A returned response short-circuits it.
    fn startup_process(&mut self, _ctx: &mut Context<'_>) -> Option<Response> {
        None
    }

    /// Runs after the action. A returned response replaces the current one.
    fn shutdown_process(&mut self, _ctx: &mut Context<'_>) -> Option<Response> {
        None
    }

    /// Whether the view should be rendered after the action.
    fn auto_render(&self) -> bool {
        true
    }

    /// Renders the view for the current action into the response.
    fn render(&mut self, _ctx: &mut Context<'_>) {}
}

/// Signature of an action in an [`ActionTable`].
pub type ActionFn<C> = fn(&mut C, &mut Context<'_>, &[String]);

/// Name-indexed actions of a controller type.
///
/// # Example
///
/// ```
/// use oxide_dispatch::{ActionTable, Context, Visibility};
///
/// struct Posts;
///
/// impl Posts {
///     fn index(&mut self, ctx: &mut Context<'_>, _args: &[String]) {
///         ctx.response.set_body("all posts");
///     }
///     fn purge(&mut self, _ctx: &mut Context<'_>, _args: &[String]) {}
/// }
///
/// let table = ActionTable::new()
///     .public("index", Posts::index)
///     .private("purge", Posts::purge);
/// assert_eq!(table.visibility("index"), Some(Visibility::Public));
/// assert_eq!(table.visibility("purge"), Some(Visibility::Private));
/// assert_eq!(table.visibility("missing"), None);
/// ```
pub struct ActionTable<C> {
    entries: Vec<(&'static str, Visibility, ActionFn<C>)>,
}

impl<C> ActionTable<C> {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a routable action.
    #[must_use]
    pub fn public(mut self, name: &'static str, action: ActionFn<C>) -> Self {
        self.entries.push((name, Visibility::Public, action));
        self
    }

    /// Registers an action that exists but cannot be routed to.
    #[must_use]
    pub fn private(mut self, name: &'static str, action: ActionFn<C>) -> Self {
        self.entries.push((name, Visibility::Private, action));
        self
    }

    /// Returns the visibility of an action. Lookup ignores ASCII case.
    #[must_use]
    pub fn visibility(&self, name: &str) -> Option<Visibility> {
        self.find(name).map(|(_, visibility, _)| *visibility)
    }

    /// Returns the action function.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ActionFn<C>> {
        self.find(name).map(|(_, _, action)| *action)
    }

    fn find(&self, name: &str) -> Option<&(&'static str, Visibility, ActionFn<C>)> {
        self.entries
            .iter()
            .find(|(entry, _, _)| entry.eq_ignore_ascii_case(name))
    }
}

impl<C> Default for ActionTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a controller for one request.
pub type ControllerFactory = Box<dyn Fn(&Request) -> Box<dyn Controller> + Send + Sync>;

/// Registry key: plugin plus canonical controller name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub plugin: Option<String>,
    pub controller: String,
}

impl HandlerKey {
    /// Creates a key, canonicalizing both names.
    #[must_use]
    pub fn new(plugin: Option<&str>, controller: &str) -> Self {
        Self {
            plugin: plugin.filter(|p| !p.is_empty()).map(camelize),
            controller: camelize(controller),
        }
    }
}

/// Maps `(plugin, controller)` pairs to controller factories.
///
/// Populated once at startup.
#[derive(Default)]
pub struct ControllerRegistry {
    factories: HashMap<HandlerKey, ControllerFactory>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller factory.
    pub fn register<F>(&mut self, plugin: Option<&str>, controller: &str, factory: F)
    where
        F: Fn(&Request) -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.factories
            .insert(HandlerKey::new(plugin, controller), Box::new(factory));
    }

    /// Registers a controller factory, builder style.
    #[must_use]
    pub fn with<F>(mut self, plugin: Option<&str>, controller: &str, factory: F) -> Self
    where
        F: Fn(&Request) -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.register(plugin, controller, factory);
        self
    }

    /// Looks up a factory.
    #[must_use]
    pub fn get(&self, key: &HandlerKey) -> Option<&ControllerFactory> {
        self.factories.get(key)
    }

    /// Returns the number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pages {
        table: ActionTable<Self>,
    }

    impl Pages {
        fn new() -> Self {
            Self {
                table: ActionTable::new()
                    .public("display", Self::display)
                    .public("initialize", Self::display)
                    .private("secret", Self::display),
            }
        }

        fn display(&mut self, ctx: &mut Context<'_>, args: &[String]) {
            ctx.response.set_body(args.join("/"));
        }
    }

    impl Controller for Pages {
        fn name(&self) -> &str {
            "Pages"
        }

        fn visibility(&self, action: &str) -> Option<Visibility> {
            self.table.visibility(action)
        }

        fn invoke(&mut self, action: &str, ctx: &mut Context<'_>, args: &[String]) {
            if let Some(action) = self.table.get(action) {
                action(self, ctx, args);
            }
        }
    }

    #[test]
    fn test_accessibility() {
        let pages = Pages::new();
        assert!(pages.is_accessible("display"));
        assert!(pages.is_accessible("DISPLAY"));
        assert!(!pages.is_accessible("secret"));
        assert!(!pages.is_accessible("initialize"));
        assert!(!pages.is_accessible("missing"));
    }

    #[test]
    fn test_invoke_through_table() {
        let mut pages = Pages::new();
        let request = Request::new("/pages/display/about/team");
        let mut response = Response::ok();
        let mut ctx = Context {
            request: &request,
            response: &mut response,
        };
        pages.invoke("display", &mut ctx, &["about".to_string(), "team".to_string()]);
        assert_eq!(response.body_string(), Some("about/team".to_string()));
    }

    #[test]
    fn test_registry_keys_are_canonical() {
        let registry =
            ControllerRegistry::new().with(None, "pages", |_| Box::new(Pages::new()));
        assert!(registry.get(&HandlerKey::new(None, "Pages")).is_some());
        assert!(registry.get(&HandlerKey::new(Some(""), "pages")).is_some());
        assert!(registry.get(&HandlerKey::new(Some("Blog"), "Pages")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lifecycle_names() {
        assert!(is_lifecycle_hook("startup_process"));
        assert!(is_lifecycle_hook("Initialize"));
        assert!(!is_lifecycle_hook("index"));
    }
}
