// Sentence embeddings via all-MiniLM-L6-v2 running locally on ONNX Runtime.
//
// Each document is tokenized, run through the BERT encoder, mean-pooled over
// its real tokens (attention mask), and L2-normalized, matching the pooling
// and normalization layers the sentence-transformers checkpoint ships with.
//
// The session is pinned to one intra-op and one inter-op thread.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::traits::DocumentEmbedder;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Longest token sequence the checkpoint was trained with.
pub const MAX_SEQ_LENGTH: usize = 256;

/// Documents per inference call.
pub const BATCH_SIZE: usize = 32;

/// Sentence embedder using a local ONNX model.
pub struct SentenceEmbedder {
    // ort::Session::run takes &mut self; the embedder trait hands out &self.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceEmbedder {
    /// Load the sentence embedding model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    /// Call `download::ensure_embedding_model()` first if they don't exist.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `topicmap download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\nRun `topicmap download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_intra_threads(1)
            .map_err(|e| anyhow::anyhow!("Failed to set ONNX intra-op threads: {e}"))?
            .with_inter_threads(1)
            .map_err(|e| anyhow::anyhow!("Failed to set ONNX inter-op threads: {e}"))?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        // Padding is done by hand per batch.
        tokenizer.with_padding(None);

        debug!(
            "Loaded sentence embedding model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings: Vec<Encoding> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if max_len == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
        }

        let (input_ids, attention_mask, token_type_ids) = pad_batch(&encodings, max_len);
        let shape = [batch_size as i64, max_len as i64];

        let input_ids_tensor =
            Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask.clone()))
            .context("Failed to create attention_mask tensor")?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids))
            .context("Failed to create token_type_ids tensor")?;

        // Output 0 is last_hidden_state: [batch, seq_len, 384]
        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .context("Embedding ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract embedding output tensor")?;

            data.to_vec()
        };

        Ok((0..batch_size)
            .map(|i| {
                let mut pooled = mean_pool(&hidden_states, &attention_mask, i, max_len);
                l2_normalize(&mut pooled);
                pooled
            })
            .collect())
    }
}

impl DocumentEmbedder for SentenceEmbedder {
    fn embed(&self, docs: &[String]) -> Result<Vec<Vec<f32>>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let n_batches = docs.len().div_ceil(BATCH_SIZE);
        let pb = ProgressBar::new(n_batches as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("Batches [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .expect("valid template")
                .progress_chars("=> "),
        );

        let mut embeddings = Vec::with_capacity(docs.len());
        for chunk in docs.chunks(BATCH_SIZE) {
            embeddings.extend(self.embed_batch(chunk)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            documents = embeddings.len(),
            dim = EMBEDDING_DIM,
            "Computed sentence embeddings"
        );
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Build flat, right-padded BERT inputs:
///   input_ids: token IDs (pad with 0)
///   attention_mask: 1 for real tokens, 0 for padding
///   token_type_ids: all zeros for single-sentence input
fn pad_batch(encodings: &[Encoding], max_len: usize) -> (Vec<i64>, Vec<i64>, Vec<i64>) {
    let capacity = encodings.len() * max_len;
    let mut input_ids = Vec::with_capacity(capacity);
    let mut attention_mask = Vec::with_capacity(capacity);
    let token_type_ids = vec![0i64; capacity];

    for enc in encodings {
        let ids = enc.get_ids();
        let pad_len = max_len - ids.len();
        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat_n(0i64, pad_len));
        attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
        attention_mask.extend(std::iter::repeat_n(0i64, pad_len));
    }

    (input_ids, attention_mask, token_type_ids)
}

/// Average the token vectors of row `row`, weighted by its attention mask.
fn mean_pool(hidden: &[f32], mask: &[i64], row: usize, max_len: usize) -> Vec<f32> {
    let mut sum = vec![0.0_f32; EMBEDDING_DIM];
    let mut mask_sum = 0.0_f32;

    for j in 0..max_len {
        let m = mask[row * max_len + j] as f32;
        if m > 0.0 {
            mask_sum += m;
            let offset = (row * max_len + j) * EMBEDDING_DIM;
            for (k, acc) in sum.iter_mut().enumerate() {
                *acc += hidden[offset + k] * m;
            }
        }
    }

    if mask_sum > 0.0 {
        for v in &mut sum {
            *v /= mask_sum;
        }
    }
    sum
}

/// Scale a vector to unit length in place. Zero vectors are left alone.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
