use chrono::{DateTime, Utc};

/// Metadata recorded alongside a cached table's raw samples.
#[derive(Clone, Debug)]
pub struct CacheMetadata {
    pub key: String,
    pub version: String,
    pub fetch_time: DateTime<Utc>,
    pub data_size_bytes: u64,
    pub content_hash: blake3::Hash,
}

/// An in-memory cache entry: metadata plus the flat `f64` samples.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub metadata: CacheMetadata,
    pub data: Vec<f64>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, version: impl Into<String>, data: Vec<f64>) -> Self {
        let data_size_bytes = (data.len() * std::mem::size_of::<f64>()) as u64;
        let content_hash = hash_samples(&data);
        Self {
            metadata: CacheMetadata {
                key: key.into(),
                version: version.into(),
                fetch_time: Utc::now(),
                data_size_bytes,
                content_hash,
            },
            data,
        }
    }

    /// Recomputes the content hash over `data` and compares it to the
    /// stored one.
    pub fn verify(&self) -> bool {
        hash_samples(&self.data) == self.metadata.content_hash
    }
}

fn hash_samples(data: &[f64]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for sample in data {
        hasher.update(&sample.to_le_bytes());
    }
    hasher.finalize()
}

/// Cache hit/miss and occupancy counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub bytes_stored: u64,
    pub entries_count: u64,
}
