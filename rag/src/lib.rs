mod app_context;
mod build_prompt;
mod config;
mod embed_text;
mod error;
mod generate;
mod history;
mod http;
mod load_corpus;
mod rank_passages;
mod retrieve_context;
mod session;

pub use app_context::AppContext;
pub use build_prompt::{build_prompt, render_history};
pub use config::{api_key_from_secrets, Config, GCE_METADATA_TOKEN_URL};
pub use embed_text::{embed_text, Embedding};
pub use error::{Error, Result};
pub use generate::{answer_or_fallback, generate_answer, GenerationConfig, NO_ANSWER_MESSAGE};
pub use history::{HistoryStore, Role, Turn};
pub use load_corpus::{load_corpus, object_media_url, split_passages, CorpusSource, Passage};
pub use rank_passages::{cosine_similarity, rank_passages, ScoredPassage};
pub use retrieve_context::{
    embed_passages, retrieve_context, Context, EmbeddedPassages, NO_CONTEXT_MESSAGE,
    REFERRAL_SENTENCE,
};
pub use session::{Conversation, CorpusStatus, Exchange};
