use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Downloads a file from a URL to a scratch path with retry support.
#[tracing::instrument(skip(runtime, dest, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    dest: &Path,
    http_client: &HttpClient,
) -> Result<()> {
    info!("Downloading {}...", url);

    let dest = dest.to_path_buf();
    http_client
        .download_file(url, || {
            runtime
                .create_file(&dest)
                .with_context(|| format!("Failed to create scratch file at {:?}", dest))
        })
        .await?;

    info!("Download complete.");
    Ok(())
}
