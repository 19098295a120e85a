use clap::Parser;
use miette::{miette, IntoDiagnostic};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tribunal::config::AuditConfig;
use tribunal::pipeline::{build_audit_graph, Collaborators};
use tribunal::providers::{EvidenceReviewer, GitRepoInspector, TextDocInspector};
use tribunal::state::{AuditState, RunInputs};
use tribunal::telemetry;

/// Concurrent audit of a repository against its accompanying document.
#[derive(Debug, Parser)]
#[command(name = "tribunal", version, about)]
struct Cli {
    /// URL of the repository to audit.
    #[arg(long, required_unless_present = "config_check")]
    repo: Option<String>,

    /// Path to the accompanying document (PDF or text).
    #[arg(long, required_unless_present = "config_check")]
    pdf: Option<PathBuf>,

    /// Directory for the rendered report; defaults to the configured one.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the resolved configuration and any issues, then exit.
    #[arg(long)]
    config_check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();
    let config = AuditConfig::from_env();

    if cli.config_check {
        println!("{config}");
        let issues = config.validate();
        if issues.is_empty() {
            println!("\nconfiguration ok");
            return ExitCode::SUCCESS;
        }
        println!();
        for issue in &issues {
            println!("issue: {issue}");
        }
        return ExitCode::FAILURE;
    }

    match run(cli, config).await {
        Ok(path) => {
            println!("report written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AuditConfig) -> miette::Result<PathBuf> {
    for issue in config.validate() {
        tracing::warn!("{issue}");
    }

    // Clap guarantees these when --config-check is absent.
    let repo_url = cli.repo.ok_or_else(|| miette!("--repo is required"))?;
    let doc_path = cli.pdf.ok_or_else(|| miette!("--pdf is required"))?;

    let collaborators = Collaborators {
        repo: Arc::new(GitRepoInspector::new(config.clone_timeout)),
        doc: Arc::new(TextDocInspector::default()),
        reviewer: Arc::new(EvidenceReviewer),
    };

    let app = build_audit_graph(&config, &collaborators).into_diagnostic()?;
    let initial = AuditState::new(RunInputs { repo_url, doc_path });
    let final_state = app.invoke(initial).await.into_diagnostic()?;

    let report = final_state
        .report
        .ok_or_else(|| miette!("the run finished without producing a report"))?;

    let output_dir = cli.output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output_dir).into_diagnostic()?;
    let filename = format!(
        "audit_report_{}.md",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = output_dir.join(filename);
    std::fs::write(&path, report).into_diagnostic()?;
    Ok(path)
}
