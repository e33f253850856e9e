use clap::Parser;
use members_dashboard::{app, config};

/// Main entry point for the web dashboard
///
/// Parses the command line into a [`config::Config`], sets up logging and
/// serves the dashboard until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::parse();
    config::init_logging();

    app::run(config).await
}
