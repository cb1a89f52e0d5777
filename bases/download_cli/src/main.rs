// bases/download_cli/src/main.rs
mod app;
mod args;
mod config;
mod output;
mod shell;

use app::App;
use args::Args;
use clap::Parser;
use color_eyre::Result;
use config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let cwd = std::env::current_dir()?;
    let config = Config::from_args(&args, &cwd);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    let app = App::new(config, args.command);

    match app.run().await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(error) => {
            app.print_error(&error);
            std::process::exit(1);
        }
    }
}
