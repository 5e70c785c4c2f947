//! svn-ci - CI trigger for Subversion-backed Azure DevOps build definitions
//!
//! One `run` invocation checks every definition of a project for branches
//! whose repository revision is ahead of the last completed build, and
//! queues builds for the single stalest definition. Scheduling repeated
//! checks is left to the invoking environment (cron, a timer service).
//!
//! ## Commands
//!
//! - `run`: evaluate all definitions and queue builds for the winner
//! - `definitions`: show definitions, their eligibility, and the branches
//!   their CI triggers watch

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::Level;

use svn_ci_azure::AzureBuildClient;
use svn_ci_core::{resolve_branches, BuildService, CiTrigger, TriggerOutcome};
use svn_ci_repo::SvnCliClient;

#[derive(Parser)]
#[command(name = "svn-ci")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI trigger for Subversion-backed Azure DevOps build definitions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON (log lines and command output)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Azure DevOps collection URL (e.g. https://devops.example.com/DefaultCollection)
    #[arg(long, env = "AZDO_COLLECTION_URL")]
    collection_url: String,

    /// Project containing the build definitions
    #[arg(long, env = "AZDO_PROJECT")]
    project: String,

    /// Personal access token for the collection
    #[arg(long, env = "AZDO_PAT", hide_env_values = true)]
    pat: String,

    /// Subversion username
    #[arg(long, env = "SVN_USERNAME")]
    svn_username: String,

    /// Subversion password
    #[arg(long, env = "SVN_PASSWORD", hide_env_values = true)]
    svn_password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate all definitions and queue builds for the stalest one
    Run {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Evaluate and report without queueing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List definitions with their CI eligibility and resolved branches
    Definitions {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    svn_ci_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            connection,
            dry_run,
        } => cmd_run(connection, dry_run, cli.json).await,
        Commands::Definitions { connection } => cmd_definitions(connection, cli.json).await,
    }
}

fn build_clients(connection: &ConnectionArgs) -> Result<(AzureBuildClient, SvnCliClient)> {
    let builds = AzureBuildClient::new(&connection.collection_url, &connection.pat)
        .context("failed to set up the build service client")?;
    let repository = SvnCliClient::new(&connection.svn_username, &connection.svn_password);
    Ok((builds, repository))
}

async fn cmd_run(connection: ConnectionArgs, dry_run: bool, json: bool) -> Result<()> {
    let (builds, repository) = build_clients(&connection)?;
    let trigger = CiTrigger::new(
        Arc::new(builds),
        Arc::new(repository),
        connection.project.clone(),
    );

    let outcome = trigger
        .run_once(dry_run)
        .await
        .context("trigger pass failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &TriggerOutcome) {
    match &outcome.selection {
        Some(selection) => {
            let verb = if outcome.dry_run {
                "Would queue"
            } else {
                "Queued"
            };
            println!(
                "{verb} {} build(s) for '{}' (order {}):",
                selection.dispatches.len(),
                selection.definition_name,
                selection.build_order
            );
            for dispatch in &selection.dispatches {
                let note = if dispatch.queued || outcome.dry_run {
                    ""
                } else {
                    "  [queueing failed]"
                };
                println!("  {} @ r{}{note}", dispatch.branch, dispatch.revision);
            }
        }
        None => println!(
            "All definitions up to date ({} evaluated, {} skipped).",
            outcome.evaluated, outcome.skipped
        ),
    }
}

#[derive(Serialize)]
struct DefinitionRow {
    id: u32,
    name: String,
    eligible: bool,
    build_order: i64,
    branches: Vec<String>,
    error: Option<String>,
}

async fn cmd_definitions(connection: ConnectionArgs, json: bool) -> Result<()> {
    let (builds, repository) = build_clients(&connection)?;
    let definitions = builds
        .list_definitions(&connection.project)
        .await
        .context("failed to list build definitions")?;

    let mut rows = Vec::with_capacity(definitions.len());
    for definition in &definitions {
        let mut row = DefinitionRow {
            id: definition.id,
            name: definition.name.clone(),
            eligible: definition.is_ci_eligible(),
            build_order: definition.build_order(),
            branches: Vec::new(),
            error: None,
        };
        if row.eligible {
            match resolve_branches(
                &definition.repository,
                &definition.path_filters,
                &repository,
            )
            .await
            {
                Ok(branches) => row.branches = branches,
                Err(err) => row.error = Some(err.to_string()),
            }
        }
        rows.push(row);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        if !row.eligible {
            println!("{} (id {}): not eligible for CI triggering", row.name, row.id);
        } else if let Some(error) = &row.error {
            println!("{} (id {}): branch resolution failed: {error}", row.name, row.id);
        } else {
            println!(
                "{} (id {}, order {}): {}",
                row.name,
                row.id,
                row.build_order,
                row.branches.join(", ")
            );
        }
    }
    Ok(())
}
