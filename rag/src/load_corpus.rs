use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::app_context::AppContext;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{get_json_with, get_text, redacted};

/// One corpus line. Identified only by its position in the loaded sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passage {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorpusSource {
    ObjectStore {
        base_url: String,
        bucket: String,
        object_path: String,
    },
    LocalFile(PathBuf),
}

impl CorpusSource {
    pub fn from_config(cfg: &Config) -> Self {
        match &cfg.corpus_file {
            Some(path) => CorpusSource::LocalFile(path.clone()),
            None => CorpusSource::ObjectStore {
                base_url: cfg.storage_base_url.clone(),
                bucket: cfg.bucket.clone(),
                object_path: cfg.object_path.clone(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CorpusSource::ObjectStore {
                bucket, object_path, ..
            } => format!("gs://{}/{}", bucket, object_path),
            CorpusSource::LocalFile(path) => path.display().to_string(),
        }
    }
}

/// Splits on `\n` only, dropping a trailing `\r` so CRLF counts once.
/// Always yields `line breaks + 1` passages; nothing is trimmed or filtered.
pub fn split_passages(text: &str) -> Vec<Passage> {
    text.split('\n')
        .map(|line| Passage {
            text: line.strip_suffix('\r').unwrap_or(line).to_string(),
        })
        .collect()
}

pub async fn load_corpus(ctx: &AppContext) -> Result<Vec<Passage>> {
    let source = CorpusSource::from_config(&ctx.cfg);
    let text = match &source {
        CorpusSource::LocalFile(path) => tokio::fs::read_to_string(path).await?,
        CorpusSource::ObjectStore {
            base_url,
            bucket,
            object_path,
        } => {
            let url = object_media_url(base_url, bucket, object_path)?;
            let token = discover_storage_token(ctx).await;
            get_text(&ctx.client, url, token.as_deref()).await?
        }
    };
    let passages = split_passages(&text);
    info!(source = %source.describe(), passages = passages.len(), "corpus loaded");
    Ok(passages)
}

/// `{base}/storage/v1/b/{bucket}/o/{object}?alt=media`, with the object path
/// encoded as a single segment.
pub fn object_media_url(base_url: &str, bucket: &str, object_path: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::Config(format!("bad storage URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("storage URL cannot be a base: {}", base_url)))?
        .pop_if_empty()
        .extend(["storage", "v1", "b", bucket, "o", object_path]);
    url.query_pairs_mut().append_pair("alt", "media");
    Ok(url)
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Explicit token first, then the metadata server, then anonymous access.
async fn discover_storage_token(ctx: &AppContext) -> Option<String> {
    if let Some(token) = &ctx.cfg.storage_token {
        return Some(token.clone());
    }
    let raw = ctx.cfg.metadata_token_url.as_deref()?;
    let url = Url::parse(raw).ok()?;
    let req = ctx
        .client
        .get(url.clone())
        .header("Metadata-Flavor", "Google")
        .timeout(Duration::from_secs(2));
    match get_json_with::<MetadataToken>(&url, req).await {
        Ok(token) => Some(token.access_token),
        Err(err) => {
            debug!(url = %redacted(&url), %err, "no metadata credentials, reading anonymously");
            None
        }
    }
}
