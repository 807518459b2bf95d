//! Embedding port: batches of text in, unit vectors of a fixed dimension out.
//!
//! The pipeline and the query path receive an `&dyn Embedder` explicitly; the
//! concrete adapter is chosen from configuration by [`create_embedder`].

mod http;
mod onnx;

pub use http::{HealthResponse, HttpEmbedder};
pub use onnx::OnnxEmbedder;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, EmbeddingProvider};

/// Maximum deviation from unit length accepted from an embedder.
pub const NORM_TOLERANCE: f32 = 1e-4;

/// Text to unit-vector capability.
///
/// Implementations return exactly one vector per input, in input order, each
/// of length [`Embedder::dimension`] and Euclidean norm 1 within
/// [`NORM_TOLERANCE`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode a batch of texts.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimension of every produced vector.
    fn dimension(&self) -> usize;

    /// Short human-readable description for status output.
    fn describe(&self) -> String;
}

/// Build the embedder selected by `config.provider`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbeddingError> {
    match config.provider {
        EmbeddingProvider::Http => Ok(Box::new(HttpEmbedder::new(config)?)),
        EmbeddingProvider::Onnx => {
            let model_dir = config.resolved_model_dir().ok_or_else(|| {
                EmbeddingError::ModelNotFound("could not determine models directory".to_string())
            })?;
            Ok(Box::new(OnnxEmbedder::load(config, &model_dir)?))
        }
    }
}

/// Check an embedder's output against the port contract.
pub fn check_embeddings(
    expected: usize,
    dimension: usize,
    vectors: &[Vec<f32>],
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }

    for (i, vector) in vectors.iter().enumerate() {
        if vector.len() != dimension {
            return Err(EmbeddingError::InvalidResponse(format!(
                "embedding {} has dimension {}, expected {}",
                i,
                vector.len(),
                dimension
            )));
        }
        let norm = l2_norm(vector);
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(EmbeddingError::InvalidResponse(format!(
                "embedding {} is not unit length (norm {:.6})",
                i, norm
            )));
        }
    }

    Ok(())
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length; the zero vector is returned unchanged.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_check_embeddings_accepts_unit_vectors() {
        let vectors = vec![vec![1.0, 0.0], normalize(&[1.0, 1.0])];
        assert!(check_embeddings(2, 2, &vectors).is_ok());
    }

    #[test]
    fn test_check_embeddings_count_mismatch() {
        let vectors = vec![vec![1.0, 0.0]];
        let err = check_embeddings(2, 2, &vectors).unwrap_err();
        assert!(err.to_string().contains("expected 2 embeddings"));
    }

    #[test]
    fn test_check_embeddings_dimension_mismatch() {
        let vectors = vec![vec![1.0, 0.0, 0.0]];
        assert!(check_embeddings(1, 2, &vectors).is_err());
    }

    #[test]
    fn test_check_embeddings_rejects_unnormalized() {
        let vectors = vec![vec![3.0, 4.0]];
        let err = check_embeddings(1, 2, &vectors).unwrap_err();
        assert!(err.to_string().contains("not unit length"));
    }

    #[test]
    fn test_create_http_embedder() {
        let embedder = create_embedder(&EmbeddingConfig::default()).unwrap();
        assert_eq!(embedder.dimension(), 384);
        assert!(embedder.describe().starts_with("http"));
    }
}
