//! Nimbus - serverless deployment client
//!
//! Usage:
//!   nimbus build <environment>             # Run the build steps locally
//!   nimbus deploy <environment> [--force]  # Build, ship and follow a deployment
//!   nimbus cancel <deployment-id>          # Cancel a running deployment

mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nimbus_core::commands::{
    BuildCommand, BuildOptions, CancelCommand, DeployCommand, DeployOptions,
};
use nimbus_core::config::{ClientSettings, ProjectStore};
use nimbus_core::error::DeployError;
use nimbus_core::image::DockerCli;
use nimbus_core::monitor::CancellationToken;
use nimbus_core::remote::HttpRemoteApi;
use nimbus_core::upload::HttpUploader;

use crate::output::{ConsoleBuildObserver, ConsoleMonitorObserver};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "Serverless deployment client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an environment without deploying
    Build {
        /// Environment name from nimbus.toml
        environment: String,
    },

    /// Build and deploy an environment
    Deploy {
        /// Environment name from nimbus.toml
        environment: String,

        /// Sync assets even if they match the last finished deployment
        #[arg(long)]
        force: bool,

        /// Message recorded with the deployment
        #[arg(short, long)]
        message: Option<String>,

        /// Output format for the final report
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Cancel a running deployment
    Cancel {
        /// Deployment id
        deployment: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nimbus=info,nimbus_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run_cli(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(DeployError::Cancelled { deployment_id }) = err.downcast_ref::<DeployError>()
            {
                println!("✓ Deployment {} cancelled", deployment_id);
                return ExitCode::from(130);
            }
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Build { environment } => run_build(environment),
        Commands::Deploy {
            environment,
            force,
            message,
            format,
        } => run_deploy(environment, force, message, format),
        Commands::Cancel { deployment } => run_cancel(deployment),
    }
}

fn run_build(environment: String) -> Result<()> {
    let store = ProjectStore::from_current_dir()?;
    let docker = DockerCli::default();
    let observer = ConsoleBuildObserver;

    let outcome = BuildCommand::new(store.project_root().to_path_buf(), &docker)
        .with_observer(&observer)
        .execute(&BuildOptions::new(&environment))
        .with_context(|| format!("Failed to build environment '{}'", environment))?;

    println!(
        "✓ Built {} ({}) in {:.1}s",
        outcome.environment.name,
        outcome.deployment_type,
        outcome.report.elapsed.as_secs_f64()
    );
    println!("  Build directory: {}", outcome.paths.build_root().display());
    Ok(())
}

fn run_deploy(
    environment: String,
    force: bool,
    message: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let settings = ClientSettings::load()?;
    let store = ProjectStore::from_current_dir()?;
    tracing::debug!(api = %settings.api_url, %environment, force, "deploy requested");

    let remote = HttpRemoteApi::from_settings(&settings)?;
    let uploader = HttpUploader::from_settings(&settings)?;
    let docker = DockerCli::default();
    let build_observer = ConsoleBuildObserver;
    let monitor_observer = ConsoleMonitorObserver;

    let mut options = DeployOptions::new(&environment).with_force(force);
    if let Some(message) = message {
        options = options.with_message(message);
    }

    let report = DeployCommand::new(
        store.project_root().to_path_buf(),
        &remote,
        &uploader,
        &docker,
    )
    .with_build_observer(&build_observer)
    .with_monitor_observer(&monitor_observer)
    .with_token(CancellationToken::new())
    .with_interrupt_handler(true)
    .execute(&options)?;

    match format {
        OutputFormat::Json => println!("{}", output::deploy_report_json(&report)?),
        OutputFormat::Text => output::print_deploy_report(&report),
    }
    Ok(())
}

fn run_cancel(deployment: u64) -> Result<()> {
    let settings = ClientSettings::load()?;
    let remote = HttpRemoteApi::from_settings(&settings)?;
    let observer = ConsoleMonitorObserver;

    let report = CancelCommand::new(&remote)
        .with_observer(&observer)
        .execute(deployment)?;

    if report.already_terminal {
        println!(
            "• Deployment {} already {}",
            report.deployment.id, report.deployment.status
        );
    }
    Ok(())
}
