use serde::{Deserialize, Serialize};

use crate::app_context::AppContext;
use crate::error::{Error, Result};
use crate::http::{endpoint_with_key, post_json};

/// Fixed-length vector for one text. Never cached.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbedValue>,
}

#[derive(Deserialize)]
struct EmbedValue {
    value: Option<Vec<f32>>,
}

/// One request per text; no retry and no batching.
pub async fn embed_text(ctx: &AppContext, text: &str) -> Result<Embedding> {
    let path = format!("/v1beta/models/{}:embedText", ctx.cfg.embed_model);
    let url = endpoint_with_key(&ctx.cfg.api_base_url, &path, &ctx.cfg.api_key)?;
    let res = post_json::<EmbedResponse, _>(&ctx.client, url, &EmbedRequest { text }).await?;
    let value = res
        .embedding
        .and_then(|e| e.value)
        .ok_or(Error::MissingField("embedding.value"))?;
    if value.is_empty() {
        return Err(Error::MissingField("embedding.value"));
    }
    Ok(Embedding(value))
}
