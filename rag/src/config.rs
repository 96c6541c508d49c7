use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

pub const GCE_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub secrets_file: PathBuf,
    pub api_base_url: String,
    pub embed_model: String,
    pub chat_model: String,
    pub storage_base_url: String,
    pub bucket: String,
    pub object_path: String,
    pub corpus_file: Option<PathBuf>,
    pub storage_token: Option<String>,
    pub metadata_token_url: Option<String>,
    pub history_path: PathBuf,
    pub history_window: usize,
    pub top_k: usize,
    pub embed_concurrency: usize,
    pub request_timeout_secs: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub sampling_top_k: u32,
    pub assistant_name: String,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secrets_file: PathBuf::from(".streamlit/secrets.toml"),
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            embed_model: "textembedding-gecko-004".to_string(),
            chat_model: "gemini-1.5-flash-latest".to_string(),
            storage_base_url: "https://storage.googleapis.com".to_string(),
            bucket: "chat_bot_file".to_string(),
            object_path: "Chatbot/Chunks/sasichatbot59-3461e68bb98f.json".to_string(),
            corpus_file: None,
            storage_token: None,
            metadata_token_url: None,
            history_path: PathBuf::from("chat_history.json"),
            history_window: 10,
            top_k: 3,
            embed_concurrency: 8,
            request_timeout_secs: 120,
            max_output_tokens: 350,
            temperature: 0.3,
            top_p: 0.8,
            sampling_top_k: 40,
            assistant_name: "Jaidee".to_string(),
            log_dir: PathBuf::from("."),
        }
    }
}

#[derive(Deserialize)]
struct Secrets {
    auth: Option<AuthSecrets>,
}

#[derive(Deserialize)]
struct AuthSecrets {
    api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present so the API key works without exporting it by hand.
        let _ = dotenvy::dotenv();
        let d = Self::default();
        let secrets_file = env::var("CAREBOT_SECRETS_FILE")
            .map(PathBuf::from)
            .unwrap_or(d.secrets_file);
        let api_key = env::var("API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| api_key_from_secrets(&secrets_file))
            .unwrap_or_default();
        let metadata_token_url = match env::var("CAREBOT_METADATA_TOKEN_URL") {
            Ok(v) if v.eq_ignore_ascii_case("off") || v.is_empty() => None,
            Ok(v) => Some(v),
            Err(_) => Some(GCE_METADATA_TOKEN_URL.to_string()),
        };
        Self {
            api_key,
            secrets_file,
            api_base_url: env::var("CAREBOT_API_BASE_URL").unwrap_or(d.api_base_url),
            embed_model: env::var("CAREBOT_EMBED_MODEL").unwrap_or(d.embed_model),
            chat_model: env::var("CAREBOT_CHAT_MODEL").unwrap_or(d.chat_model),
            storage_base_url: env::var("CAREBOT_STORAGE_BASE_URL").unwrap_or(d.storage_base_url),
            bucket: env::var("CAREBOT_BUCKET").unwrap_or(d.bucket),
            object_path: env::var("CAREBOT_OBJECT_PATH").unwrap_or(d.object_path),
            corpus_file: env::var("CAREBOT_CORPUS_FILE").ok().map(PathBuf::from),
            storage_token: env::var("GOOGLE_OAUTH_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            metadata_token_url,
            history_path: env::var("CAREBOT_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or(d.history_path),
            history_window: parse_env("CAREBOT_HISTORY_WINDOW", d.history_window),
            top_k: parse_env("CAREBOT_TOP_K", d.top_k),
            embed_concurrency: parse_env("CAREBOT_EMBED_CONCURRENCY", d.embed_concurrency).max(1),
            request_timeout_secs: parse_env("CAREBOT_REQUEST_TIMEOUT_SECS", d.request_timeout_secs),
            max_output_tokens: parse_env("CAREBOT_MAX_OUTPUT_TOKENS", d.max_output_tokens),
            temperature: parse_env("CAREBOT_TEMPERATURE", d.temperature),
            top_p: parse_env("CAREBOT_TOP_P", d.top_p),
            sampling_top_k: parse_env("CAREBOT_SAMPLING_TOP_K", d.sampling_top_k),
            assistant_name: env::var("CAREBOT_ASSISTANT_NAME").unwrap_or(d.assistant_name),
            log_dir: env::var("CAREBOT_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.log_dir),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads `[auth] api_key` from a Streamlit-style secrets file.
pub fn api_key_from_secrets(path: &Path) -> Option<String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(path = %path.display(), %err, "no secrets file");
            return None;
        }
    };
    match toml::from_str::<Secrets>(&raw) {
        Ok(secrets) => secrets
            .auth
            .and_then(|a| a.api_key)
            .filter(|k| !k.trim().is_empty()),
        Err(err) => {
            debug!(path = %path.display(), %err, "ignoring malformed secrets file");
            None
        }
    }
}
