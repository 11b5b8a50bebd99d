use crate::config::Config;
use crate::error::MediaError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// ElevenLabs text-to-speech with the voice and model from config.
pub struct ElevenLabsTts {
    client: Client,
    key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsTts {
    pub fn new(client: Client, cfg: &Config) -> Result<Self> {
        let key = cfg.elevenlabs_key.trim();
        if key.is_empty() {
            anyhow::bail!("config.json: elevenlabs_api_key missing");
        }
        Ok(Self {
            client,
            key: key.to_string(),
            voice_id: cfg.eleven_voice_id.clone(),
            model_id: cfg.eleven_model_id.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}?output_format={}", API_BASE, self.voice_id, OUTPUT_FORMAT)
    }

    fn body(&self, text: &str) -> Value {
        json!({ "text": text, "model_id": self.model_id })
    }

    /// mp3 bytes for `text`. Non-success answers become `ToolFailed` carrying
    /// the status and the start of the response body.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", &self.key)
            .json(&self.body(text))
            .timeout(Duration::from_secs(300))
            .send()
            .await
            .context("ElevenLabs request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(MediaError::ToolFailed {
                tool: "ElevenLabs".into(),
                detail: format!("HTTP {}: {}", status.as_u16(), detail.chars().take(200).collect::<String>()),
            }
            .into());
        }

        let bytes = resp.bytes().await.context("ElevenLabs response read failed")?;
        if bytes.is_empty() {
            return Err(MediaError::ToolFailed {
                tool: "ElevenLabs".into(),
                detail: "empty audio response".into(),
            }
            .into());
        }
        Ok(bytes.to_vec())
    }
}
