use crate::config::Config;
use crate::ffmpeg::check_tool;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

fn required_dirs(cfg: &Config) -> Vec<PathBuf> {
    vec![
        cfg.videos_dir.clone(),
        cfg.pictures_dir.clone(),
        cfg.voices_dir.clone(),
        cfg.templates_dir.clone(),
    ]
}

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in required_dirs(cfg) {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

/// Downloads the configured font unless it is already on disk.
/// Returns `true` when a download happened.
pub async fn ensure_default_font(client: &Client, cfg: &Config) -> Result<bool> {
    ensure_font_at(client, &cfg.font_url, &cfg.font_path).await
}

async fn ensure_font_at(client: &Client, url: &str, path: &Path) -> Result<bool> {
    if path.is_file() {
        return Ok(false);
    }

    logi(format!("Font {} missing, downloading from {}", path.display(), url));
    let bytes = client
        .get(url)
        .timeout(Duration::from_secs(60))
        .send()
        .await
        .context("Font request failed")?
        .error_for_status()?
        .bytes()
        .await
        .context("Font download failed")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    logok("Default font downloaded successfully.");
    Ok(true)
}

pub async fn check_ffmpeg() -> bool {
    check_tool("ffmpeg", "-version").await
}

pub async fn check_ytdlp() -> bool {
    check_tool("yt-dlp", "--version").await
}

/// Warns about missing external tools without failing.
pub async fn report_tools() {
    if !check_ffmpeg().await {
        logw("FFmpeg not found in PATH. Please install FFmpeg.");
    }
    if !check_ytdlp().await {
        logw("yt-dlp not found in PATH. Music and voice downloads will fail.");
    }
}
