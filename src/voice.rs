use crate::api::elevenlabs::ElevenLabsTts;
use crate::config::Config;
use crate::error::MediaError;
use crate::ffmpeg;
use crate::{logi, logok};
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;

pub fn voice_file_name(name: &str) -> String {
    format!("{}.wav", name.replace(' ', ""))
}

pub fn ytdlp_voice_args(url: &str, out_wav: &Path) -> Vec<String> {
    vec![
        "yt-dlp".to_string(),
        "-f".to_string(),
        "251".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "wav".to_string(),
        "--output".to_string(),
        out_wav.display().to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

/// Downloads the audio track at `url` as a reference voice and stores it as
/// `<voices_dir>/<name without spaces>.wav`.
pub async fn download_voice(url: &str, name: &str, voices_dir: &Path) -> Result<PathBuf> {
    if !url.starts_with("http") {
        return Err(MediaError::InvalidUrl(url.to_string()).into());
    }

    let tmp = tempfile::tempdir().context("Failed to create temp dir")?;
    let tmp_wav = tmp.path().join(format!("{}.wav", name));

    logi(format!("Downloading voice {} -> {}", url, tmp_wav.display()));
    ffmpeg::run_cmd(&ytdlp_voice_args(url, &tmp_wav)).await?;
    if !tmp_wav.is_file() {
        return Err(MediaError::FileNotFound(tmp_wav).into());
    }

    fs::create_dir_all(voices_dir).await?;
    let dest = voices_dir.join(voice_file_name(name));
    fs::copy(&tmp_wav, &dest)
        .await
        .with_context(|| format!("Failed to store voice at {}", dest.display()))?;

    logok(format!("Successfully downloaded: {}", url));
    Ok(dest)
}

/// Narrates `text` into `out_mp3`.
pub async fn generate_tts(client: &Client, cfg: &Config, text: &str, out_mp3: &Path) -> Result<PathBuf> {
    if text.trim().is_empty() {
        anyhow::bail!("nothing to narrate");
    }
    let tts = ElevenLabsTts::new(client.clone(), cfg)?;
    logi(format!("Requesting narration ({} chars)", text.chars().count()));
    let audio = tts.synthesize(text).await?;

    if let Some(parent) = out_mp3.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(out_mp3, &audio)
        .await
        .with_context(|| format!("Failed to write {}", out_mp3.display()))?;
    logok(format!("Narration written: {}", out_mp3.display()));
    Ok(out_mp3.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_names_lose_spaces() {
        assert_eq!(voice_file_name("Nolan Reads"), "NolanReads.wav");
    }

    #[test]
    fn voice_args_pick_opus_track_and_guard_url() {
        let args = ytdlp_voice_args("https://youtu.be/uk6f9L2XhMo", Path::new("/tmp/v.wav"));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "251"));
        assert!(args.windows(2).any(|w| w[0] == "--audio-format" && w[1] == "wav"));
        assert_eq!(args[args.len() - 2], "--");
    }

    #[tokio::test]
    async fn rejects_non_http_voice_url() {
        let dir = tempfile::tempdir().unwrap();
        assert!(download_voice("notaurl", "x", dir.path()).await.is_err());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn empty_text_is_not_sent() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_tts(&Client::new(), &Config::default(), "  ", &dir.path().join("o.mp3"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nothing to narrate"));
    }

    #[tokio::test]
    async fn narration_needs_an_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sub/o.mp3");
        let err = generate_tts(&Client::new(), &Config::default(), "Hello", &out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("elevenlabs_api_key"));
        assert!(!out.exists());
    }
}
