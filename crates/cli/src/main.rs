mod error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use guard::{Caller, GuardConfig, InboundRequest, Rejection};
use tracing::debug;

use error::{Error, Result};

const CONFIG_FILE: &str = "secureview.toml";

#[derive(Parser)]
#[command(name = "secureview")]
#[command(about = "Inspect and dry-run API route guards", long_about = None)]
#[command(version)]
struct Cli {
    /// Route configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured routes and their rules
    Routes,
    /// Evaluate a route's rules against a synthetic request
    Check {
        /// Route name
        #[arg(short, long)]
        route: String,
        /// HTTP method
        #[arg(short, long, default_value = "POST")]
        method: String,
        /// Submitted field name (repeatable)
        #[arg(short, long = "field")]
        fields: Vec<String>,
        /// Authenticated caller id (anonymous if omitted)
        #[arg(long)]
        caller: Option<String>,
        /// Resource key passed as the route's resource parameter
        #[arg(long)]
        resource: Option<String>,
    },
}

/// Request assembled from command-line arguments.
struct DryRunRequest {
    method: String,
    fields: Vec<String>,
    caller: Caller,
    params: HashMap<String, String>,
}

impl DryRunRequest {
    fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl InboundRequest<Caller> for DryRunRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn caller(&self) -> Caller {
        self.caller.clone()
    }

    fn path_param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }
}

/// What the guarded handler would have produced.
enum Verdict {
    Pass,
    Rejected(Rejection),
}

impl From<Rejection> for Verdict {
    fn from(rejection: Rejection) -> Self {
        Verdict::Rejected(rejection)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => {}
        Err(Error::Rejected(rejection)) => {
            println!("{rejection}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Routes => cmd_routes(&config),
        Commands::Check {
            route,
            method,
            fields,
            caller,
            resource,
        } => {
            let request = DryRunRequest {
                method,
                fields,
                caller: caller.map(Caller::User).unwrap_or_default(),
                params: HashMap::new(),
            };
            cmd_check(&config, &route, request, resource)
        }
    }
}

fn cmd_routes(config: &GuardConfig) -> Result<()> {
    if config.routes.is_empty() {
        println!("No routes configured.");
        return Ok(());
    }

    println!("{:<24}  {:<12}  RULES", "ROUTE", "PARAM");
    println!("{}", "-".repeat(72));

    let fixtures = config.fixtures();
    for name in config.routes.keys() {
        let enforcer = config.enforcer::<Caller, _>(name, Some(fixtures.clone()))?;
        println!(
            "{:<24}  {:<12}  {}",
            name,
            enforcer.resource_param().unwrap_or("-"),
            enforcer.rule_names().join(" -> ")
        );
    }

    Ok(())
}

fn cmd_check(
    config: &GuardConfig,
    route: &str,
    request: DryRunRequest,
    resource: Option<String>,
) -> Result<()> {
    if config.route(route).is_none() {
        return Err(Error::UnknownRoute {
            name: route.to_string(),
            known: config.routes.keys().cloned().collect(),
        });
    }

    let enforcer = config.enforcer::<Caller, _>(route, Some(config.fixtures()))?;
    // --resource binds to whichever path parameter the route declares.
    let request = match (enforcer.resource_param(), resource) {
        (Some(param), Some(key)) => request.with_param(param, key),
        _ => request,
    };
    debug!(route, caller = %request.caller, "dry run");

    match enforcer.intercept(&request, || Verdict::Pass)? {
        Verdict::Pass => {
            println!("pass");
            Ok(())
        }
        Verdict::Rejected(rejection) => Err(Error::Rejected(rejection)),
    }
}

fn load_config(path: &Path) -> Result<GuardConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(GuardConfig::load(path)?)
}
