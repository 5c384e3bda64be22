//! folio - query portfolio content from the CMS
//!
//! Runs one content query (or image URL build) per invocation and prints the
//! result as JSON on stdout. Logs go to stderr.

use std::process::ExitCode;

use clap::Parser;

use folio::app::App;
use folio::cli::Cli;
use folio::config::SiteConfig;
use folio::logging::init_tracing;

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.env_file {
        Some(path) => SiteConfig::from_env_file(path)?,
        None => SiteConfig::from_env()?,
    };
    tracing::debug!(
        project = %config.sanity.project_id,
        dataset = %config.sanity.dataset,
        perspective = %config.sanity.perspective,
        "Configuration loaded"
    );

    let app = App::new(&config);
    let output = app.run(&cli.command).await?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
