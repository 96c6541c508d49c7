use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::app_context::AppContext;
use crate::embed_text::{embed_text, Embedding};
use crate::load_corpus::Passage;
use crate::rank_passages::rank_passages;

/// Appended to every retrieved context, whatever was selected.
pub const REFERRAL_SENTENCE: &str =
    "If you have any concerns, please book an appointment with a doctor for further advice.";

pub const NO_CONTEXT_MESSAGE: &str = "Unable to create an embedding for the question.";

#[derive(Clone, Debug, PartialEq)]
pub enum Context {
    /// Top passages in descending similarity. May be empty.
    Retrieved { passages: Vec<String> },
    /// The question itself could not be embedded.
    Unavailable,
}

impl Context {
    pub fn render(&self) -> String {
        match self {
            Context::Retrieved { passages } if passages.is_empty() => REFERRAL_SENTENCE.to_string(),
            Context::Retrieved { passages } => {
                format!("{} {}", passages.join(" "), REFERRAL_SENTENCE)
            }
            Context::Unavailable => NO_CONTEXT_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct EmbeddedPassages {
    /// `(corpus index, text, vector)` in corpus order.
    pub items: Vec<(usize, String, Embedding)>,
    pub failed: usize,
}

/// Embeds every passage with at most `embed_concurrency` requests in flight.
/// Results come back in corpus order; failures are counted and dropped.
pub async fn embed_passages(ctx: &AppContext, passages: &[Passage]) -> EmbeddedPassages {
    let limit = ctx.cfg.embed_concurrency.max(1);
    let results: Vec<_> = stream::iter(0..passages.len())
        .map(move |index| {
            let passage = &passages[index];
            async move { (index, passage, embed_text(ctx, &passage.text).await) }
        })
        .buffered(limit)
        .collect()
        .await;

    let mut out = EmbeddedPassages::default();
    for (index, passage, result) in results {
        match result {
            Ok(embedding) => out.items.push((index, passage.text.clone(), embedding)),
            Err(err) => {
                debug!(index, %err, "passage embedding failed");
                out.failed += 1;
            }
        }
    }
    out
}

/// Embeds the question and every passage, and returns the best matches plus
/// any notices worth showing the user.
pub async fn retrieve_context(
    ctx: &AppContext,
    question: &str,
    passages: &[Passage],
) -> (Context, Vec<String>) {
    let mut notices = Vec::new();
    let query = match embed_text(ctx, question).await {
        Ok(query) => query,
        Err(err) => {
            warn!(%err, "question embedding failed");
            notices.push(format!("Error generating embedding: {}", err));
            return (Context::Unavailable, notices);
        }
    };

    let mut embedded = embed_passages(ctx, passages).await;
    let before = embedded.items.len();
    embedded.items.retain(|(_, _, e)| e.dim() == query.dim());
    let mismatched = before - embedded.items.len();
    if mismatched > 0 {
        warn!(mismatched, expected = query.dim(), "dropping passages with a different dimension");
    }
    let dropped = embedded.failed + mismatched;
    if dropped > 0 {
        warn!(dropped, total = passages.len(), "some passages were not embedded");
        notices.push(format!(
            "{} of {} passages could not be embedded",
            dropped,
            passages.len()
        ));
    }

    let top = rank_passages(&query, &embedded.items, ctx.cfg.top_k);
    info!(
        candidates = embedded.items.len(),
        selected = ?top.iter().map(|s| s.index).collect::<Vec<_>>(),
        "context selected"
    );
    let passages = top.into_iter().map(|s| s.text).collect();
    (Context::Retrieved { passages }, notices)
}
