//! Feature-hashing embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use ragdesk_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
        "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
        "it", "its", "what", "how", // English
        "の", "は", "が", "を", "に", "で", "と", "も", "へ", "や", "か", "な", "ね", "よ", "て",
        "た", "し", "す", "です", "ます", // Japanese particles and endings
    ]
    .into_iter()
    .collect()
});

/// Deterministic, offline embedder.
///
/// Hashes word unigrams, adjacent-word bigrams and in-word character
/// trigrams into a fixed number of buckets, then L2-normalises. Word
/// segmentation follows Unicode word boundaries, which split Japanese text
/// into single ideographs and kana runs, so bigrams carry most of the signal
/// for compounds like 保証期間.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimensions: usize,
}

impl HashingProvider {
    pub fn new(dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, salt: u64, feature: &str) -> usize {
        let hash = feature
            .bytes()
            .fold(salt, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .unicode_words()
            .filter(|w| !STOP_WORDS.contains(w))
            .collect();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            embedding[self.bucket(17, word)] += *freq as f32;

            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                let trigram: String = trigram.iter().collect();
                embedding[self.bucket(37, &trigram)] += (*freq as f32).sqrt();
            }
        }

        for pair in words.windows(2) {
            let bigram = format!("{}{}", pair[0], pair[1]);
            embedding[self.bucket(53, &bigram)] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingProvider {
    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        "hashing-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
