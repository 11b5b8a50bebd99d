use crate::error::MediaError;
use crate::ffmpeg;
use crate::timecode::clip_window;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// A downloaded music segment and the length the video should run for.
#[derive(Debug, Clone)]
pub struct MusicClip {
    pub path: PathBuf,
    pub duration: u32,
}

/// Drops playlist and tracking parameters (everything from the first `&`).
pub fn clean_music_url(url: &str) -> &str {
    match url.find('&') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Seconds to cut from the head of a download that came out longer than
/// the requested window.
pub fn trim_plan(actual_s: f64, expected_s: u32) -> Option<f64> {
    let surplus = actual_s - expected_s as f64;
    if surplus > 0.0 { Some(surplus) } else { None }
}

pub fn ytdlp_music_args(url: &str, start: &str, end: &str, work_dir: &Path) -> Vec<String> {
    vec![
        "yt-dlp".to_string(),
        "-f".to_string(),
        "bestaudio/best".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "--audio-quality".to_string(),
        "192K".to_string(),
        "--downloader".to_string(),
        "ffmpeg".to_string(),
        "--downloader-args".to_string(),
        format!("ffmpeg_i:-ss {} -to {}", start, end),
        "-o".to_string(),
        work_dir.join("%(title)s.%(ext)s").display().to_string(),
        "--quiet".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

/// First `.mp3` directly inside `dir`, by file name.
pub fn find_mp3(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .find(|p| crate::error::has_extension(p, &["mp3"]))
}

/// Downloads `start..end` of the audio at `url` into `work_dir` as mp3.
///
/// The external downloader does not always cut precisely; when the file runs
/// long, the surplus is removed from the beginning so the clip ends where
/// the caller asked.
pub async fn get_music(url: &str, start: &str, end: &str, work_dir: &Path) -> Result<MusicClip> {
    if !url.starts_with("http") {
        return Err(MediaError::InvalidUrl(url.to_string()).into());
    }
    let expected = clip_window(start, end)?;

    let cleaned = clean_music_url(url);
    if cleaned != url {
        logi(format!("Cleaned URL: {}", cleaned));
    }

    fs::create_dir_all(work_dir)
        .await
        .with_context(|| format!("Failed to create {}", work_dir.display()))?;

    logi(format!("Downloading music {} ({} -> {})", cleaned, start, end));
    ffmpeg::run_cmd(&ytdlp_music_args(cleaned, start, end, work_dir)).await?;

    let music = find_mp3(work_dir)
        .ok_or_else(|| MediaError::FileNotFound(work_dir.join("*.mp3")))?;

    let actual = ffmpeg::ffprobe_duration_seconds(&music).await?;
    if let Some(surplus) = trim_plan(actual, expected) {
        logw(format!(
            "Downloaded {:.2}s, expected {}s; trimming {:.2}s from the start",
            actual, expected, surplus
        ));
        let name = music
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "music.mp3".to_string());
        let trimmed = work_dir.join(format!("trimmed_{}", name));
        if ffmpeg::ffmpeg_trim_head(&music, surplus, expected, &trimmed).await? {
            fs::remove_file(&music).await?;
            fs::rename(&trimmed, &music).await?;
        } else {
            logw(format!("Trim produced no file; keeping {}", music.display()));
        }
    }

    logok(format!("Music ready: {} ({}s)", music.display(), expected));
    Ok(MusicClip {
        path: music,
        duration: expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_cleaning_drops_playlist_params() {
        assert_eq!(
            clean_music_url("https://www.youtube.com/watch?v=A8ze_f2RqwM&list=RDMM&index=11"),
            "https://www.youtube.com/watch?v=A8ze_f2RqwM"
        );
        assert_eq!(clean_music_url("https://youtu.be/abc"), "https://youtu.be/abc");
    }

    #[test]
    fn trim_only_when_longer() {
        assert_eq!(trim_plan(25.5, 22), Some(3.5));
        assert_eq!(trim_plan(22.0, 22), None);
        assert_eq!(trim_plan(21.2, 22), None);
    }

    #[test]
    fn ytdlp_args_pass_window_to_ffmpeg_and_guard_url() {
        let args = ytdlp_music_args("https://youtu.be/x", "1:00", "1:22", Path::new("work"));
        assert!(args.contains(&"ffmpeg_i:-ss 1:00 -to 1:22".to_string()));
        let sep = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[sep + 1], "https://youtu.be/x");
        assert!(args.iter().any(|a| a.ends_with("%(title)s.%(ext)s")));
    }

    #[test]
    fn finds_first_mp3_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("0.webm"), b"").unwrap();
        assert_eq!(find_mp3(dir.path()), Some(dir.path().join("a.mp3")));

        let empty = tempfile::tempdir().unwrap();
        assert_eq!(find_mp3(empty.path()), None);
    }

    #[tokio::test]
    async fn rejects_bad_input_before_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let err = get_music("ftp://x", "0:10", "0:20", dir.path()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<MediaError>(), Some(MediaError::InvalidUrl(_))));

        let err = get_music("https://x", "0:20", "0:10", dir.path()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<MediaError>(), Some(MediaError::EmptyWindow { .. })));
    }
}
