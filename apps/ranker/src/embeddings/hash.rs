use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use super::Embedder;
use crate::features::text::tokenize;

/// Fixed keys so vectors are stable across processes and Rust versions.
/// Changing them changes every embedding; retrain the ranker if you do.
const BUCKET_KEYS: (u64, u64) = (0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210);
const SIGN_KEYS: (u64, u64) = (0x1f2e_3d4c_5b6a_7988, 0x8897_a6b5_c4d3_e2f1);

const UNIGRAM_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

pub const DEFAULT_DIMENSION: usize = 384;

/// Deterministic feature-hashing embedder.
///
/// Word unigrams and bigrams are hashed into `dimension` buckets with a
/// signed contribution; the result is L2-normalized. Empty text yields the
/// zero vector, which cosine similarity maps to 0.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash(keys: (u64, u64), token: &str) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(keys.0, keys.1);
        hasher.write(token.as_bytes());
        hasher.finish()
    }

    fn add(&self, vector: &mut [f32], token: &str, weight: f32) {
        let idx = (Self::hash(BUCKET_KEYS, token) % self.dimension as u64) as usize;
        let sign = if Self::hash(SIGN_KEYS, token) % 2 == 0 {
            1.0
        } else {
            -1.0
        };
        vector[idx] += sign * weight;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        let tokens = tokenize(text);

        for token in &tokens {
            self.add(&mut vector, token, UNIGRAM_WEIGHT);
        }
        for pair in tokens.windows(2) {
            self.add(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
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
