//! Subcommand handlers

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use export_jobs::{ExportConfig, ExportOptions, FilesystemBlobStore, LocalExportClient, Submission};
use serde::de::DeserializeOwned;
use sheet_model::{load_dataset, CatalogSections, Template};
use tokio_util::sync::CancellationToken;

use crate::{Cli, Command};

/// Run the selected export and return the artifact location
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = load_config(&cli).await?;
    let blobs = Arc::new(
        FilesystemBlobStore::new(&cli.out_dir)
            .await
            .with_context(|| format!("cannot use output directory {}", cli.out_dir.display()))?,
    );
    let client = LocalExportClient::local(blobs, config);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling export");
            ctrl_c.cancel();
        }
    });

    let submission = match cli.command {
        Command::Single { template, data, record, name } => {
            let template: Template = read_json(&template).await?;
            let data = load_dataset(&data).with_context(|| format!("cannot load {}", data.display()))?;
            let options = ExportOptions::new(name.unwrap_or_else(|| "spec-sheet.html".to_string()), "specsheet")
                .with_record(record);
            client.submit_single(&template, &data, &options).await?
        }
        Command::Catalog { sections, data, name } => {
            let sections: CatalogSections = read_json(&sections).await?;
            let data = load_dataset(&data).with_context(|| format!("cannot load {}", data.display()))?;
            let options = ExportOptions::new(name.unwrap_or_else(|| "catalog.html".to_string()), "specsheet");
            client.submit_catalog(&sections, &data, &options).await?
        }
    };
    report(&submission);

    let result = client.poll_until_done(&submission.job_id, &cancel).await?;
    client.shutdown().await;

    tracing::info!(file_name = %result.file_name, "Export finished");
    Ok(result.result_location)
}

async fn load_config(cli: &Cli) -> anyhow::Result<ExportConfig> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::load(path).await?,
        None => ExportConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.render.mode = mode;
    }
    if cli.licensed {
        config.render.licensed = true;
    }
    Ok(config)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn report(submission: &Submission) {
    tracing::info!(job_id = %submission.job_id, pages = submission.report.total_pages, "Export submitted");
    for failure in &submission.report.failures {
        tracing::warn!(page = failure.page, "Page replaced by placeholder: {}", failure.message);
    }
}
