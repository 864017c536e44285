//! Offline embedding provider based on hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use catalog_core::AppResult;
use std::collections::{BTreeMap, HashSet};

/// Words too common in chunk text to carry signal.
const STOP_WORDS: [&str; 24] = [
    "the", "and", "for", "with", "from", "this", "that", "are", "was", "has", "have", "its",
    "their", "they", "under", "per", "not", "any", "all", "can", "will", "may", "our", "you",
];

/// Deterministic, content-dependent vectors for tests and local runs.
///
/// Each word contributes to one bucket per character trigram plus one bucket
/// for the whole word; the result is scaled to unit length.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }

        for (word, count) in word_counts(text) {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[bucket(&trigram, 37, self.dimensions)] += (count as f32).sqrt();
            }
            vector[bucket(&word, 31, self.dimensions)] += count as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

/// Lowercased words longer than two characters, minus stop words.
fn word_counts(text: &str) -> BTreeMap<String, usize> {
    let stop_words: HashSet<&str> = STOP_WORDS.into_iter().collect();
    let mut counts = BTreeMap::new();

    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2 && !stop_words.contains(w))
    {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }

    counts
}

fn bucket(token: &str, multiplier: u64, dimensions: usize) -> usize {
    let hash = token
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
    (hash % dimensions as u64) as usize
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}
