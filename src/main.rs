//! modup - Puppet module upgrade CLI tool
//!
//! Upgrades one installed module inside a local module tree:
//! - scans the modulepath for installed modules and their metadata
//! - resolves the newest version the installed dependents allow
//! - applies the resulting plan, or only prints it with --dry-run

use clap::Parser;
use modup::catalog::{ForgeCatalog, HttpClient};
use modup::cli::CliArgs;
use modup::events::{ConsoleEvents, EventSink};
use modup::graph::{scan, InstalledGraph};
use modup::install::Installer;
use modup::output::create_formatter;
use modup::plan::{UpgradePlanner, UpgradeResult};
use modup::progress::Progress;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    // Print environment info in verbose mode
    if args.verbose {
        let path_list = args
            .modulepath
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        eprintln!("modup v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Modulepath: {}", path_list);
        if args.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let request = args.upgrade_request()?;
    let events = ConsoleEvents::new(args.verbose, args.quiet);

    // Snapshot the installed module tree
    let snapshot = scan(&args.modulepath)?;
    for note in &snapshot.notes {
        events.debug(note);
    }
    let graph = InstalledGraph::build(snapshot.records);
    for shadowed in graph.shadowed() {
        events.debug(&format!(
            "'{}' at {} is shadowed by an earlier modulepath entry",
            shadowed.id,
            shadowed.path.display()
        ));
    }
    for edge in graph.missing_dependencies() {
        events.debug(&format!(
            "'{}' requires '{}' ({}) but it is not installed",
            edge.dependent, edge.missing, edge.constraint
        ));
    }

    let client = HttpClient::new()?;
    let forge = ForgeCatalog::with_base_url(client, &args.forge);

    // Resolve the upgrade
    let mut progress = Progress::new(!args.quiet);
    progress.spinner(&format!("Resolving '{}'", request.target));
    let planner = UpgradePlanner::new(&graph, &forge, &events);
    let result = planner.plan(&request).await;
    progress.finish_and_clear();

    // Apply the plan unless this is a dry run
    if let UpgradeResult::Success { plan, .. } = &result {
        if !args.dry_run {
            let installer = Installer::new(&graph, &forge, &events);
            installer.apply(plan, &mut progress).await?;
        }
    }

    // Output results - plans on stdout, diagnostics on stderr
    let formatter = create_formatter(args.output_config());
    match &result {
        UpgradeResult::Success { .. } => {
            let mut stdout = io::stdout().lock();
            formatter.format(&result, &mut stdout)?;
            stdout.flush()?;
        }
        _ => {
            let mut stderr = io::stderr().lock();
            formatter.format(&result, &mut stderr)?;
            stderr.flush()?;
        }
    }

    if result.is_failure() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
