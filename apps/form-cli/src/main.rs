//! Form CLI Binary

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use form_cli::{commands, Config, Outcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "form-cli")]
#[command(version, about = "Compile dynamic form templates and encode submissions")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile one template or an array of templates
    Compile { templates: PathBuf },
    /// Print the validation schema of a template
    Schema { template: PathBuf },
    /// Print field groups and render blocks of a template
    Groups { template: PathBuf },
    /// Validate a values file against a template
    Validate { template: PathBuf, values: PathBuf },
    /// Validate and encode a values file, reading attachments from disk
    Submit { template: PathBuf, values: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the JSON document
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let outcome: Outcome = match &args.command {
        Command::Compile { templates } => commands::compile(templates)?,
        Command::Schema { template } => commands::schema(template)?,
        Command::Groups { template } => commands::groups(template)?,
        Command::Validate { template, values } => commands::validate(&config, template, values).await?,
        Command::Submit { template, values } => commands::submit(&config, template, values).await?,
    };

    let rendered = if config.output.pretty {
        serde_json::to_string_pretty(&outcome.document)
    } else {
        serde_json::to_string(&outcome.document)
    }
    .context("Failed to render output")?;
    println!("{}", rendered);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
