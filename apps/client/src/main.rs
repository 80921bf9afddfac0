use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use optimizer_client::upload::ACCEPT_FILTER;
use optimizer_client::{Alert, FormController, HttpTransport, SelectedFile, SubmitOutcome};

/// Upload a resume and a job description and print the optimized resume.
#[derive(Debug, Parser)]
#[command(name = "optimize", version)]
struct Cli {
    /// Resume file (.pdf, .doc, .docx, .png, .jpg, .jpeg, .txt)
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Job description file (same formats as --resume)
    #[arg(long = "jd")]
    job_description: Option<PathBuf>,

    /// Base URL of the optimizer API
    #[arg(long, env = "OPTIMIZER_URL", default_value = "http://127.0.0.1:8080")]
    server: String,
}

/// Terminal stand-in for a modal alert.
struct StderrAlert;

impl Alert for StderrAlert {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    // stderr only; stdout carries the result
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", env!("CARGO_CRATE_NAME")))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let transport = HttpTransport::new(&cli.server).context("Failed to build HTTP client")?;
    let form = FormController::new(Arc::new(transport), Arc::new(StderrAlert));

    if let Some(path) = &cli.resume {
        form.select_resume(load(path).await?);
    }
    if let Some(path) = &cli.job_description {
        form.select_job_description(load(path).await?);
    }

    let outcome = submit_with_progress(&form).await;

    if let Some(result) = form.view().result_pane {
        println!("{result}");
    }

    Ok(match outcome {
        SubmitOutcome::Optimized => ExitCode::SUCCESS,
        SubmitOutcome::MissingFiles => ExitCode::from(2),
        SubmitOutcome::Failed => ExitCode::FAILURE,
    })
}

async fn load(path: &Path) -> Result<SelectedFile> {
    let file = SelectedFile::from_path(path).await?;
    if !file.matches_accept_filter() {
        warn!(
            "{} is not one of {}; sending it anyway",
            file.file_name, ACCEPT_FILTER
        );
    }
    Ok(file)
}

/// Drives `submit()` while echoing the submit label whenever it changes.
async fn submit_with_progress(form: &FormController) -> SubmitOutcome {
    let submit = form.submit();
    tokio::pin!(submit);

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut shown: Option<&'static str> = None;

    loop {
        tokio::select! {
            outcome = &mut submit => return outcome,
            _ = ticker.tick() => {
                let label = form.view().submit_label;
                if form.is_loading() && shown != Some(label) {
                    eprintln!("[ {label} ]");
                    shown = Some(label);
                }
            }
        }
    }
}
