use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use api_gateway::config::{load_config, GatewayConfig};
use api_gateway::routing::RouteTable;
use api_gateway::security::identity::hash_password;
use bcrypt::DEFAULT_COST;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator tooling for the API gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a bcrypt hash to store as a user's password_hash
    HashPassword {
        password: String,
        /// bcrypt cost factor (4-31)
        #[arg(long, default_value_t = DEFAULT_COST)]
        cost: u32,
    },
    /// Load and validate a configuration file
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show which route and backend URL a request path resolves to
    Resolve {
        #[arg(short, long)]
        config: PathBuf,
        /// Request path with optional query, e.g. /api/reservations/4?full=1
        path: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password, cost } => match hash_password(&password, cost) {
            Ok(hash) => {
                println!("{}", hash);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Check { config } => match load_config(&config) {
            Ok(config) => {
                print_summary(&config);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Resolve { config, path } => {
            let config = match load_config(&config) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let table = RouteTable::from_config(&config);
            let (path, query) = match path.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (path.as_str(), None),
            };
            match table.match_path(path) {
                Some(route) => {
                    println!("route:   {}", route.pattern);
                    println!("backend: {}", route.backend);
                    println!("policy:  {}", route.policy);
                    println!("url:     {}", route.target_url(path, query));
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("No route matches {}", path);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn print_summary(config: &GatewayConfig) {
    println!("Configuration OK");
    println!("  listen:    {}", config.listener.bind_address);
    println!("  base path: {}", config.base_path);
    println!("  security:  {:?}", config.security.mode);
    println!("  users:     {}", config.security.users.len());
    for (name, url) in &config.backends {
        println!("  backend {} -> {}", name, url);
    }
    for route in &config.routes {
        println!("  route {} -> {} ({})", route.path, route.backend, route.auth);
    }
}
