use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app_context::AppContext;
use crate::build_prompt::build_prompt;
use crate::error::Result;
use crate::history::Turn;
use crate::http::{endpoint_with_key, post_json};

pub const NO_ANSWER_MESSAGE: &str = "No answer was returned by the model.";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerationConfig {
    pub fn from_context(ctx: &AppContext) -> Self {
        Self {
            max_output_tokens: ctx.cfg.max_output_tokens,
            temperature: ctx.cfg.temperature,
            top_p: ctx.cfg.top_p,
            top_k: ctx.cfg.sampling_top_k,
        }
    }
}

/// First text part of the first candidate, or `None` when there is none.
pub async fn generate_answer(ctx: &AppContext, prompt: &str) -> Result<Option<String>> {
    let path = format!("/v1beta/models/{}:generateContent", ctx.cfg.chat_model);
    let url = endpoint_with_key(&ctx.cfg.api_base_url, &path, &ctx.cfg.api_key)?;
    let req = GenerateRequest {
        contents: [Content {
            parts: [Part { text: prompt }],
        }],
        generation_config: GenerationConfig::from_context(ctx),
    };
    let res = post_json::<GenerateResponse, _>(&ctx.client, url, &req).await?;
    Ok(res
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text))
}

/// Always returns something to show: the reply, the "no answer" message, or
/// an inline error description.
pub async fn answer_or_fallback(
    ctx: &AppContext,
    question: &str,
    context: &str,
    history: &[Turn],
) -> String {
    let prompt = build_prompt(&ctx.cfg, question, context, history);
    match generate_answer(ctx, &prompt).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            warn!("generation returned no candidates");
            NO_ANSWER_MESSAGE.to_string()
        }
        Err(err) if err.is_status() => {
            warn!(%err, "generation rejected");
            NO_ANSWER_MESSAGE.to_string()
        }
        Err(err) => {
            warn!(%err, "generation failed");
            format!("Error: {}", err)
        }
    }
}
