use anyhow::Result;
use clap::Parser;
use pantheon_uploader::cli::{run, Cli};
use pantheon_uploader::upload::HttpTransport;
use tracing::Level;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
    tracing::debug!("tracing initialised, arguments parsed");

    let transport = HttpTransport::new()?;
    let result = run(&cli, &transport);
    match &result {
        Ok(_) => tracing::debug!("upload run completed"),
        Err(e) => tracing::error!(error = %e, "upload run failed"),
    }
    result
}
