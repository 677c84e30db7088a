//! Comic API entry point.

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use tracing::info;

use comic_api::config::{self, Config};
use comic_api::logging;
use comic_api::metrics;
use comic_api::server::Server;

/// Comic API server.
///
/// Every configuration parameter is also accepted as a global flag, e.g.
/// `--server-port 9000`, and as an `API_`-prefixed environment variable.
#[derive(Parser, Debug)]
#[command(name = "comic-api")]
#[command(about = "Serves odd-month xkcd comics sorted by title")]
#[command(version)]
struct Args {
    /// Do not print the resolved configuration on startup.
    #[arg(short, long, global = true, env = "API_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Begins the API (default).
    Serve,

    /// Check configuration validity and print it.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Args::command().args(config::flag_args()).get_matches();
    let args = Args::from_arg_matches(&matches)?;

    // Global flags are propagated to the subcommand's matches
    let config_matches = match matches.subcommand() {
        Some((_, sub_matches)) => sub_matches,
        None => &matches,
    };

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config_matches),
        Some(Command::Serve) | None => cmd_serve(config_matches, args.quiet).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(matches: &ArgMatches) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("COMIC API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load(matches) {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration check failed"));
        }
    };

    println!("----------------------------------------------------------------------");
    print!("{}", config.render());
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server.
async fn cmd_serve(matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load(matches)?;

    logging::init_logging(&config)?;

    if !quiet {
        println!("Configuration used:\n{}", config.render());
    }

    let handle = metrics::init_metrics()?;

    info!(
        upstream = %config.upstream_url,
        "Starting comic API on {}:{}",
        config.server_address,
        config.server_port
    );

    let server = Server::new(&config, Some(handle))?;
    server.start().await?;

    Ok(())
}
