mod app;
mod progress;

use std::process::ExitCode;

use anyhow::Context;
use uplift::{
    AvailableUpdate, CheckOutcome, ManualUpdateInfo, NoopSink, Sha256Verifier, UpdateEngine,
    UpdateMode, UpdateOutcome,
};
use uplift_fetch::ReqwestClient;

pub use self::app::{App, Commands, UpdateArg};
use self::progress::BarSink;

pub async fn run(app: App) -> anyhow::Result<ExitCode> {
    let engine = UpdateEngine::open(&app.root)
        .with_context(|| format!("failed to open installation at '{}'", app.root.display()))?;

    match app.cmd {
        Commands::Check => check(engine.with_progress(NoopSink)).await,
        Commands::Update(arg) => update(engine, arg).await,
        Commands::Manual(arg) => manual(engine, arg).await,
    }
}

async fn check(engine: UpdateEngine<ReqwestClient>) -> anyhow::Result<ExitCode> {
    match engine.check_for_updates().await? {
        CheckOutcome::UpToDate { current } => println!("Up to date ({current})"),
        CheckOutcome::UpdateAvailable(update) => {
            println!(
                "Update available: {} -> {}",
                engine.config().current_version,
                update.version()
            );
            if !update.release.notes.is_empty() {
                println!("\n{}\n", update.release.notes.trim());
            }
            if let UpdateMode::Manual(info) = &update.mode {
                print_manual(info);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn update(engine: UpdateEngine<ReqwestClient>, arg: UpdateArg) -> anyhow::Result<ExitCode> {
    let update = match engine.check_for_updates().await? {
        CheckOutcome::UpToDate { current } => {
            println!("Up to date ({current})");
            return Ok(ExitCode::SUCCESS);
        }
        CheckOutcome::UpdateAvailable(update) => update,
    };
    install(engine, &update, arg).await
}

async fn manual(engine: UpdateEngine<ReqwestClient>, arg: UpdateArg) -> anyhow::Result<ExitCode> {
    let update = match engine.check_cached()? {
        None => {
            println!("No cached release; run `uplift check` while online first");
            return Ok(ExitCode::FAILURE);
        }
        Some(CheckOutcome::UpToDate { current }) => {
            println!("Up to date ({current})");
            return Ok(ExitCode::SUCCESS);
        }
        Some(CheckOutcome::UpdateAvailable(update)) => update,
    };
    install(engine, &update, arg).await
}

async fn install(
    engine: UpdateEngine<ReqwestClient>,
    update: &AvailableUpdate,
    arg: UpdateArg,
) -> anyhow::Result<ExitCode> {
    let engine = match arg.sha256 {
        Some(hex) => engine.with_verifier(
            Sha256Verifier::from_hex(&hex).context("invalid --sha256 digest")?,
        ),
        None => engine,
    };

    let bar = (!arg.quiet).then(BarSink::new);
    let engine = match &bar {
        Some(bar) => engine.with_progress(bar.clone()),
        None => engine.with_progress(NoopSink),
    };

    let outcome = engine.apply(update).await?;
    if let Some(bar) = &bar {
        bar.abandon();
    }

    Ok(report(outcome))
}

fn report(outcome: UpdateOutcome) -> ExitCode {
    match outcome {
        UpdateOutcome::Succeeded { version } => {
            println!("Updated to {version}; restart the application to use it");
            ExitCode::SUCCESS
        }
        UpdateOutcome::ManualRequired(info) => {
            print_manual(&info);
            ExitCode::SUCCESS
        }
        UpdateOutcome::RolledBack { version, error } => {
            eprintln!("Update to {version} failed and was rolled back: {error}");
            ExitCode::FAILURE
        }
        UpdateOutcome::FailedBeforeMutation { error } => {
            eprintln!("Update failed, nothing was changed: {error}");
            ExitCode::FAILURE
        }
        UpdateOutcome::RollbackFailed {
            error,
            rollback_error,
        } => {
            eprintln!("Update failed: {error}");
            eprintln!("Restoring the backup also failed: {rollback_error}");
            eprintln!("The installation needs to be repaired by hand");
            ExitCode::from(2)
        }
    }
}

fn print_manual(info: &ManualUpdateInfo) {
    println!("Version {} has to be installed manually:", info.version);
    for step in &info.steps {
        println!("  {step}");
    }
    if !info.download_urls.is_empty() {
        println!("Download links:");
        for url in &info.download_urls {
            println!("  {url}");
        }
    }
}
