//! Local sentence-transformer embedder backed by ONNX Runtime.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tokenizers::{PaddingParams, PaddingStrategy, TruncationParams, TruncationStrategy};

use super::{Embedder, check_embeddings, normalize};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Mean-pooled, L2-normalized sentence embeddings from an ONNX export
/// (`model.onnx` plus `tokenizer.json`).
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
    batch_size: usize,
    token_type_ids: bool,
    model_id: String,
}

impl OnnxEmbedder {
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, EmbeddingError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(EmbeddingError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?
            .with_intra_threads(num_cpus())
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?;

        // BERT-style exports take token_type_ids as a third input
        let token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_tokens as usize,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        tracing::info!(
            model = %config.model_id,
            path = %model_path.display(),
            dimension = config.dimension,
            "loaded ONNX embedding model"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimension: config.dimension as usize,
            batch_size: config.batch_size.max(1) as usize,
            token_type_ids,
            model_id: config.model_id.clone(),
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let batch_size = encodings.len();

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for j in 0..ids.len() {
                input_ids[i * max_len + j] = ids[j] as i64;
                attention_mask[i * max_len + j] = mask[j] as i64;
                type_ids[i * max_len + j] = types.get(j).copied().unwrap_or(0) as i64;
            }
        }

        let input_ids_tensor = Tensor::from_array(([batch_size, max_len], input_ids))
            .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;
        let attention_mask_tensor =
            Tensor::from_array(([batch_size, max_len], attention_mask.clone()))
                .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Inference("session lock poisoned".to_string()))?;

        let outputs = if self.token_type_ids {
            let type_ids_tensor = Tensor::from_array(([batch_size, max_len], type_ids))
                .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;
            session.run(ort::inputs![
                input_ids_tensor,
                attention_mask_tensor,
                type_ids_tensor
            ])
        } else {
            session.run(ort::inputs![input_ids_tensor, attention_mask_tensor])
        }
        .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;

        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;

        let shape = output_array.shape().to_vec();

        match shape.as_slice() {
            // Token states: mean-pool over unmasked positions
            [_, seq_len, hidden] if *hidden >= self.dimension => Ok((0..batch_size)
                .map(|i| {
                    let mut pooled = vec![0f32; self.dimension];
                    let mut count = 0f32;
                    for j in 0..*seq_len {
                        if attention_mask[i * max_len + j] == 0 {
                            continue;
                        }
                        count += 1.0;
                        for (d, value) in pooled.iter_mut().enumerate() {
                            *value += output_array[[i, j, d]];
                        }
                    }
                    if count > 0.0 {
                        pooled.iter_mut().for_each(|v| *v /= count);
                    }
                    normalize(&pooled)
                })
                .collect()),
            // Already pooled sentence embeddings
            [_, hidden] if *hidden >= self.dimension => Ok((0..batch_size)
                .map(|i| {
                    let embedding: Vec<f32> =
                        (0..self.dimension).map(|d| output_array[[i, d]]).collect();
                    normalize(&embedding)
                })
                .collect()),
            _ => Err(EmbeddingError::Inference(format!(
                "unexpected output shape {:?} for dimension {}",
                shape, self.dimension
            ))),
        }
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            tracing::debug!(batch = batch.len(), "running ONNX inference");
            all_embeddings.extend(self.embed_batch(batch)?);
        }

        check_embeddings(texts.len(), self.dimension, &all_embeddings)?;
        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn describe(&self) -> String {
        format!("onnx ({})", self.model_id)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
