use rig::embeddings::Embedding;

/// Helper functions for converting between Embedding and Vec<f32>
pub trait EmbeddingConversion {
    fn to_vec(&self) -> Vec<f32>;
    fn from_vec(vec: Vec<f32>) -> Self;
    fn to_binary(&self) -> Vec<u8>;
    fn from_binary(binary: &[u8]) -> Self;
}

impl EmbeddingConversion for Embedding {
    fn to_vec(&self) -> Vec<f32> {
        self.vec.iter().map(|f| *f as f32).collect()
    }

    fn from_vec(vec: Vec<f32>) -> Self {
        Self {
            vec: vec.into_iter().map(|f| f as f64).collect(),
            document: "".to_string(),
        }
    }

    /// Little-endian f32 blob, the layout libsql expects for `F32_BLOB` columns
    fn to_binary(&self) -> Vec<u8> {
        self.vec
            .iter()
            .flat_map(|f| (*f as f32).to_le_bytes())
            .collect()
    }

    fn from_binary(binary: &[u8]) -> Self {
        let mut vec = Vec::with_capacity(binary.len() / 4);
        for chunk in binary.chunks_exact(4) {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(chunk);
            vec.push(f32::from_le_bytes(bytes));
        }
        Self::from_vec(vec)
    }
}

/// Cosine similarity; 0.0 when either vector is zero or lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_conversion() {
        let original_vec = vec![1.0, 2.0, 3.0];
        let embedding = Embedding::from_vec(original_vec.clone());

        assert_eq!(embedding.to_vec(), original_vec);

        let binary = embedding.to_binary();
        assert_eq!(binary.len(), 12);
        let recovered_vec = Embedding::from_binary(&binary);
        assert_eq!(recovered_vec.to_vec(), original_vec);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
