use crate::error::{has_extension, MediaError};
use crate::ffmpeg;
use crate::music;
use crate::overlay;
use crate::quote::{clean_filename, format_quote, resolve_quote, QuoteSource};
use crate::timecode::validate_time_format;
use crate::{logi, logok};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tokio::fs;

const TEMPLATE_EXTS: &[&str] = &["mp4", "mkv", "avi"];

pub fn template_output_path(videos_dir: &Path, quote: &str) -> PathBuf {
    videos_dir.join(format!("{}_video.mp4", clean_filename(quote)))
}

pub fn picture_output_path(videos_dir: &Path, image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "picture".to_string());
    videos_dir.join(format!("{}_video.mp4", stem))
}

fn check_template_inputs(template: &Path, font: &Path) -> Result<(), MediaError> {
    if !template.is_file() {
        return Err(MediaError::FileNotFound(template.to_path_buf()));
    }
    if !has_extension(template, TEMPLATE_EXTS) {
        return Err(MediaError::UnsupportedExtension {
            path: template.to_path_buf(),
            expected: ".mp4, .mkv, .avi".to_string(),
        });
    }
    if !font.is_file() {
        return Err(MediaError::FileNotFound(font.to_path_buf()));
    }
    Ok(())
}

/// Draws `quote` onto the template video and writes
/// `<videos_dir>/<quote>_video.mp4`.
pub async fn template_video(quote: &str, template: &Path, font: &Path, videos_dir: &Path) -> Result<PathBuf> {
    check_template_inputs(template, font)?;

    let lines = format_quote(quote);
    let filters = ffmpeg::drawtext_filters(&lines, font);

    fs::create_dir_all(videos_dir)
        .await
        .with_context(|| format!("Failed to create {}", videos_dir.display()))?;
    let out = template_output_path(videos_dir, quote);

    if !ffmpeg::ffmpeg_overlay_template(template, &filters, &out).await? {
        return Err(MediaError::FileNotFound(out).into());
    }
    logok(format!("Video created successfully: {}", out.display()));
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct PictureRequest {
    pub image: PathBuf,
    pub music_start: String,
    pub music_end: String,
    pub music_url: String,
    pub quote: Option<String>,
    pub font: PathBuf,
    /// Render the quote onto the image first. Off for images that already
    /// carry text.
    pub overlay: bool,
    pub videos_dir: PathBuf,
}

/// Loops a still image over a music clip, optionally with a quote drawn on it.
pub async fn picture_video(
    req: &PictureRequest,
    fallback_quote: Option<&str>,
    quotes: &dyn QuoteSource,
) -> Result<PathBuf> {
    if !req.image.is_file() {
        return Err(MediaError::FileNotFound(req.image.clone()).into());
    }
    validate_time_format(&req.music_start)?;
    validate_time_format(&req.music_end)?;

    let work = tempfile::tempdir().context("Failed to create work dir")?;
    let clip = music::get_music(&req.music_url, &req.music_start, &req.music_end, work.path()).await?;

    let image = if req.overlay {
        let quote = resolve_quote(req.quote.as_deref(), fallback_quote, quotes).await?;
        let ext = req
            .image
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jpg".to_string());
        let modified = work.path().join(format!("overlay.{}", ext));
        logi(format!("Overlaying quote on {}", req.image.display()));
        overlay::overlay_quote(&req.image, &quote, &modified, &req.font)?;
        modified
    } else {
        req.image.clone()
    };

    fs::create_dir_all(&req.videos_dir)
        .await
        .with_context(|| format!("Failed to create {}", req.videos_dir.display()))?;
    let out = picture_output_path(&req.videos_dir, &req.image);

    if !ffmpeg::ffmpeg_still_with_audio(&image, &clip.path, clip.duration, &out).await? {
        return Err(MediaError::FileNotFound(out).into());
    }
    logok(format!("Video created successfully: {}", out.display()));
    Ok(out)
}

/// A randomly chosen regular file from `dir`.
pub fn random_file(dir: &Path) -> Result<PathBuf, MediaError> {
    if !dir.is_dir() {
        return Err(MediaError::DirNotFound(dir.to_path_buf()));
    }
    let files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| MediaError::DirNotFound(dir.to_path_buf()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();

    files
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| MediaError::EmptyDir(dir.to_path_buf()))
}
