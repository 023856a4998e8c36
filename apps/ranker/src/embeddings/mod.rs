// Embedding provider seam. The engine only needs a deterministic text → vector
// function of fixed width; `HashEmbedder` is the in-process default.

pub mod hash;

pub use hash::HashEmbedder;

/// Maps free text to a dense vector of fixed dimension.
///
/// Implementations must be deterministic for identical input and safe to share
/// across threads; the engine holds one instance for the whole process.
pub trait Embedder: Send + Sync {
    /// Backend name, reported at startup.
    fn name(&self) -> &'static str;

    /// Output width of every vector returned by `embed`.
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Cosine similarity of two optional vectors.
///
/// 0.0 if either is absent, empty, of differing width, or of zero magnitude.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let sim = dot / denom;
    if sim.is_finite() {
        sim.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
