use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_quote: String,
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_font_url")]
    pub font_url: String,
    #[serde(default = "default_quote_api_url")]
    pub quote_api_url: String,
    #[serde(default = "default_max_quote_len")]
    pub max_quote_len: usize,
    #[serde(default = "default_quote_attempts")]
    pub quote_attempts: u32,
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    #[serde(default = "default_pictures_dir")]
    pub pictures_dir: PathBuf,
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(rename = "elevenlabs_api_key")]
    #[serde(default)]
    pub elevenlabs_key: String,
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
}

fn default_font_path() -> PathBuf {
    PathBuf::from("Roboto-Medium.ttf")
}

fn default_font_url() -> String {
    "https://github.com/openmaptiles/fonts/raw/refs/heads/master/roboto/Roboto-Medium.ttf"
        .to_string()
}

fn default_quote_api_url() -> String {
    "https://stoic.tekloon.net/stoic-quote".to_string()
}

fn default_max_quote_len() -> usize {
    150
}

fn default_quote_attempts() -> u32 {
    10
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("Videos")
}

fn default_pictures_dir() -> PathBuf {
    PathBuf::from("Pictures")
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("Voices")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("Templates")
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_quote: String::new(),
            font_path: default_font_path(),
            font_url: default_font_url(),
            quote_api_url: default_quote_api_url(),
            max_quote_len: default_max_quote_len(),
            quote_attempts: default_quote_attempts(),
            videos_dir: default_videos_dir(),
            pictures_dir: default_pictures_dir(),
            voices_dir: default_voices_dir(),
            templates_dir: default_templates_dir(),
            elevenlabs_key: String::new(),
            eleven_voice_id: default_voice_id(),
            eleven_model_id: default_model_id(),
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;

        if config.quote_attempts == 0 {
            anyhow::bail!("config.json: quote_attempts must be at least 1");
        }

        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if fs::metadata(&path).await.is_err() {
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write config: {}", path.as_ref().display()))
    }

    /// The configured default quote, if one is set.
    pub fn fallback_quote(&self) -> Option<&str> {
        let q = self.default_quote.trim();
        if q.is_empty() { None } else { Some(q) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(cfg.font_path, PathBuf::from("Roboto-Medium.ttf"));
        assert_eq!(cfg.max_quote_len, 150);
        assert!(cfg.fallback_quote().is_none());
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "default_quote": "  Be still.  ", "videos_dir": "out" }"#)
            .await
            .unwrap();

        let cfg = Config::load(&path).await.unwrap();
        assert_eq!(cfg.fallback_quote(), Some("Be still."));
        assert_eq!(cfg.videos_dir, PathBuf::from("out"));
        assert_eq!(cfg.quote_attempts, 10);
    }

    #[tokio::test]
    async fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config {
            default_quote: "Memento mori".into(),
            font_path: PathBuf::from("fonts/Other.ttf"),
            ..Config::default()
        };
        cfg.save(&path).await.unwrap();

        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded.default_quote, "Memento mori");
        assert_eq!(loaded.font_path, PathBuf::from("fonts/Other.ttf"));
    }

    #[tokio::test]
    async fn rejects_zero_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "quote_attempts": 0 }"#).await.unwrap();
        assert!(Config::load(&path).await.is_err());
    }
}
