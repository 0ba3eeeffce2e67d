//! oxide-dispatch CLI
//!
//! Inspects a route configuration: resolve paths, build URLs, list routes.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_dispatch::{AppConfig, UrlDescriptor};

/// Route table inspection tool.
#[derive(Parser)]
#[command(name = "oxide-dispatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route configuration file (JSON).
    #[arg(short, long, env = "OXIDE_ROUTES", default_value = "routes.json")]
    routes: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a path and print its parameters as JSON.
    Parse {
        /// Path to resolve, e.g. /posts/view/1.
        path: String,
    },

    /// Build a URL from parameters.
    Url {
        #[arg(short, long)]
        controller: Option<String>,

        #[arg(short, long)]
        action: Option<String>,

        #[arg(short, long)]
        plugin: Option<String>,

        /// Positional argument (repeatable).
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Named argument as key=value (repeatable).
        #[arg(long, value_parser = parse_pair)]
        named: Vec<(String, String)>,

        /// Query parameter as key=value (repeatable).
        #[arg(long, value_parser = parse_pair)]
        query: Vec<(String, String)>,

        #[arg(long)]
        fragment: Option<String>,

        /// Path whose parameters fill in a missing controller or action.
        #[arg(long)]
        from: Option<String>,
    },

    /// List routes in priority order.
    Routes,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::from_path(&cli.routes)
        .with_context(|| format!("loading {}", cli.routes.display()))?;
    let router = config.router()?;

    match cli.command {
        Commands::Parse { path } => match router.parse(&path) {
            Some(params) => println!("{}", serde_json::to_string_pretty(&params)?),
            None => bail!("no route found for '{path}'"),
        },

        Commands::Url {
            controller,
            action,
            plugin,
            args,
            named,
            query,
            fragment,
            from,
        } => {
            let current = match from {
                Some(path) => Some(
                    router
                        .parse(&path)
                        .with_context(|| format!("no route found for '{path}'"))?,
                ),
                None => None,
            };
            let descriptor = UrlDescriptor {
                controller,
                action,
                plugin,
                args,
                named,
                query: (!query.is_empty()).then_some(query),
                fragment,
            };
            println!("{}", router.url(descriptor, current.as_ref())?);
        }

        Commands::Routes => {
            info!(
                namespace = %config.dispatcher.namespace,
                "{} route(s)",
                router.routes().len()
            );
            for (priority, route) in router.routes().iter().enumerate() {
                let defaults = route.defaults();
                println!(
                    "{:>3}  {:<32} {}::{}",
                    priority,
                    route.template(),
                    defaults.controller.as_deref().unwrap_or("*"),
                    defaults.action.as_deref().unwrap_or("*"),
                );
            }
        }
    }

    Ok(())
}
