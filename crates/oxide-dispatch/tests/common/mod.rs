#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_dispatch::{
    ActionTable, Context, Controller, ControllerRegistry, Dispatcher, MiddlewareChain, Response,
    RouteDefaults, Router, Visibility,
};

/// Shared, ordered record of observed calls.
#[derive(Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn log(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub fn default_router() -> Router {
    Router::new()
        .route(
            "/",
            RouteDefaults::new()
                .controller("pages")
                .action("display")
                .arg("home"),
        )
        .unwrap()
        .route(
            "/blog/:controller/:action/*",
            RouteDefaults::new().plugin("blog"),
        )
        .unwrap()
        .route("/:controller/:action/*", RouteDefaults::new())
        .unwrap()
}

/// A controller recording its lifecycle into a journal.
///
/// Behaviour is driven by request headers:
/// - `X-Halt`: `startup_process` returns a 401 response
/// - `X-Redirect`: `startup_process` sets a redirect under the header name
///   given as its value
/// - `X-Replace`: `shutdown_process` returns a 418 response
pub struct Posts {
    journal: Arc<Journal>,
    table: ActionTable<Self>,
    auto_render: bool,
    action: String,
}

impl Posts {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            table: ActionTable::new()
                .public("index", Self::index)
                .public("view", Self::view)
                .public("raw", Self::raw)
                .public("silent", Self::silent)
                .public("initialize", Self::index)
                .private("purge", Self::index),
            auto_render: true,
            action: String::new(),
        }
    }

    fn index(&mut self, _ctx: &mut Context<'_>, _args: &[String]) {
        self.journal.log("action:index");
    }

    fn view(&mut self, ctx: &mut Context<'_>, args: &[String]) {
        self.journal.log(format!("action:view({})", args.join(",")));
        ctx.response.set_body(format!("post {}", args.join(",")));
    }

    fn raw(&mut self, ctx: &mut Context<'_>, _args: &[String]) {
        self.journal.log("action:raw");
        ctx.response.set_body("raw body");
    }

    fn silent(&mut self, _ctx: &mut Context<'_>, _args: &[String]) {
        self.journal.log("action:silent");
        self.auto_render = false;
    }
}

impl Controller for Posts {
    fn name(&self) -> &str {
        "Posts"
    }

    fn visibility(&self, action: &str) -> Option<Visibility> {
        self.table.visibility(action)
    }

    fn invoke(&mut self, action: &str, ctx: &mut Context<'_>, args: &[String]) {
        self.action = action.to_string();
        if let Some(action) = self.table.get(action) {
            action(self, ctx, args);
        }
    }

    fn startup_process(&mut self, ctx: &mut Context<'_>) -> Option<Response> {
        self.journal.log("startup_process");
        if let Some(name) = ctx.request.get_header("X-Redirect") {
            ctx.response
                .headers
                .insert(name.to_string(), "/users/login".to_string());
        }
        ctx.request
            .get_header("X-Halt")
            .map(|_| Response::new(401).body("halted"))
    }

    fn shutdown_process(&mut self, ctx: &mut Context<'_>) -> Option<Response> {
        self.journal.log("shutdown_process");
        ctx.request
            .get_header("X-Replace")
            .map(|_| Response::new(418))
    }

    fn auto_render(&self) -> bool {
        self.auto_render
    }

    fn render(&mut self, ctx: &mut Context<'_>) {
        self.journal.log("render");
        ctx.response
            .set_body(format!("<p>{}</p>", self.action));
    }
}

pub fn registry(journal: &Arc<Journal>) -> ControllerRegistry {
    let posts = journal.clone();
    let blog = journal.clone();
    ControllerRegistry::new()
        .with(None, "posts", move |_| Box::new(Posts::new(posts.clone())))
        .with(Some("blog"), "articles", move |_| {
            Box::new(Posts::new(blog.clone()))
        })
}

pub fn dispatcher(journal: &Arc<Journal>, middleware: MiddlewareChain) -> Dispatcher {
    Dispatcher::new(Arc::new(default_router()), registry(journal)).with_middleware(middleware)
}
