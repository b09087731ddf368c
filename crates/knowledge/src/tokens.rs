//! Token estimation for model routing.

use ragdesk_core::{AppError, AppResult};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Token counter wrapping tiktoken's cl100k_base tokenizer.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TokenCounter {
    /// Load the cl100k_base encoding.
    pub fn new() -> AppResult<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| {
            AppError::Config(format!("Failed to load cl100k_base tokenizer: {}", e))
        })?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    /// Count tokens in `text`. Special-token markers are counted as text.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Estimate the size of a generation context: the query followed by all
    /// passages, space separated.
    pub fn estimate_context<'a, I>(&self, query: &str, passages: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut text = String::from(query);
        for passage in passages {
            text.push(' ');
            text.push_str(passage);
        }
        self.count(&text)
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}
