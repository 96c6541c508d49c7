use tracing::{info, warn};

use crate::error::Result;

use crate::app_context::AppContext;
use crate::generate::answer_or_fallback;
use crate::history::{HistoryStore, Turn};
use crate::load_corpus::{load_corpus, Passage};
use crate::retrieve_context::{retrieve_context, Context};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorpusStatus {
    Loaded(usize),
    Failed(String),
}

/// Result of one user turn.
#[derive(Clone, Debug)]
pub struct Exchange {
    pub question: String,
    pub context: Context,
    pub answer: String,
    /// Non-fatal problems hit along the way, for the status line.
    pub notices: Vec<String>,
}

/// Sequences corpus load, retrieval, generation and persistence for each turn.
///
/// The durable history file is the single source of truth: the transcript is
/// always what was last written to (or read from) disk, and generation sees
/// the same turns that get persisted.
pub struct Conversation {
    ctx: AppContext,
    store: HistoryStore,
    passages: Vec<Passage>,
    transcript: Vec<Turn>,
}

impl Conversation {
    pub fn open(ctx: AppContext) -> Self {
        let store = HistoryStore::new(ctx.cfg.history_path.clone());
        let transcript = store.load_or_default();
        Self {
            ctx,
            store,
            passages: Vec::new(),
            transcript,
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Fetches the corpus again. On failure the corpus is left empty.
    pub async fn reload_corpus(&mut self) -> CorpusStatus {
        match load_corpus(&self.ctx).await {
            Ok(passages) => {
                self.passages = passages;
                CorpusStatus::Loaded(self.passages.len())
            }
            Err(err) => {
                warn!(%err, "corpus load failed");
                self.passages.clear();
                CorpusStatus::Failed(format!("Could not load the corpus from storage: {}", err))
            }
        }
    }

    pub async fn ask(&mut self, question: &str) -> Exchange {
        let mut notices = Vec::new();
        if let CorpusStatus::Failed(msg) = self.reload_corpus().await {
            notices.push(msg);
        }

        let (context, retrieval_notices) = retrieve_context(&self.ctx, question, &self.passages).await;
        notices.extend(retrieval_notices);

        let mut history = self.store.load_async().await;
        let answer = answer_or_fallback(&self.ctx, question, &context.render(), &history).await;

        history.push(Turn::user(question));
        history.push(Turn::assistant(answer.clone()));
        if let Err(err) = self.store.save_async(history.clone()).await {
            warn!(%err, "history save failed");
            notices.push(format!("Could not save the conversation: {}", err));
        }
        self.transcript = history;
        info!(turns = self.transcript.len(), "turn complete");

        Exchange {
            question: question.to_string(),
            context,
            answer,
            notices,
        }
    }

    /// Drops the most recent turn once the shortened history is on disk.
    /// When the save fails the transcript is left as it was.
    pub async fn undo_last(&mut self) -> Result<Option<Turn>> {
        let Some((last, rest)) = self.transcript.split_last() else {
            return Ok(None);
        };
        let last = last.clone();
        let shortened = rest.to_vec();
        if let Err(err) = self.store.save_async(shortened.clone()).await {
            warn!(%err, "history save failed, keeping the last turn");
            return Err(err);
        }
        self.transcript = shortened;
        Ok(Some(last))
    }
}
