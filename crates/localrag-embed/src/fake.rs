use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use twox_hash::XxHash64;

use localrag_core::error::Result;
use localrag_core::traits::Embedder;

/// Deterministic bag-of-words hashing embedder.
///
/// Texts sharing lowercase tokens land near each other, which is enough for
/// tests and offline demos without an embedding service.
#[derive(Debug, Clone)]
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model(&self) -> &str { "fake-hash" }

    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cos(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn deterministic_and_normalised() {
        let e = FakeEmbedder::new(64);
        let a = e.embed_text("Reference ID REF-2024-DE");
        assert_eq!(a, e.embed_text("Reference ID REF-2024-DE"));
        assert_eq!(a.len(), 64);
        assert!((cos(&a, &a) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn shared_tokens_score_higher_than_disjoint_text() {
        let e = FakeEmbedder::new(256);
        let q = e.embed_text("GDPR privacy");
        let related = e.embed_text("Alex follows GDPR privacy rules");
        let unrelated = e.embed_text("Python backend APIs");
        assert!(cos(&q, &related) > cos(&q, &unrelated));
    }
}
