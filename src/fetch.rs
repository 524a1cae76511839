use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub async fn ensure_shapefile(config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = &config.input.shapefile {
        return Ok(path.clone());
    }

    let target = config.cached_shapefile_path();
    if target.exists() {
        tracing::info!("Using cached shapefile {:?}", target);
        return Ok(target);
    }

    let bytes = tokio::select! {
        result = download_with_retry(config) => result?,
        _ = tokio::signal::ctrl_c() => return Err(anyhow!("Shapefile download cancelled")),
    };

    extract_archive(&bytes, &config.input.cache_dir)?;

    if !target.exists() {
        return Err(anyhow!(
            "Archive from {} did not contain {:?}",
            config.input.shapefile_url,
            target.file_name().unwrap_or_default()
        ));
    }
    Ok(target)
}

async fn download_with_retry(config: &AppConfig) -> Result<Vec<u8>> {
    let settings = &config.download;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let attempts = settings.retries.max(1);
    let mut delay = Duration::from_millis(settings.backoff_ms);
    let mut last_error = None;

    for attempt in 1..=attempts {
        tracing::info!(
            "Downloading {} (attempt {}/{})",
            config.input.shapefile_url,
            attempt,
            attempts
        );
        match download(&client, &config.input.shapefile_url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                tracing::warn!("Download attempt {} failed: {:#}", attempt, e);
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("No download attempted"))
        .context(format!("Failed to download {}", config.input.shapefile_url)))
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

pub fn extract_archive(bytes: &[u8], dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create cache directory: {:?}", dir))?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .context("Downloaded file is not a zip archive")?;
    archive.extract(dir)
        .with_context(|| format!("Failed to extract archive into {:?}", dir))?;
    tracing::info!("Extracted {} files into {:?}", archive.len(), dir);
    Ok(())
}
