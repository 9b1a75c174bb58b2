//! Vector index flavours and distance metrics understood by Cosmos DB.
//!
//! The same two knobs are translated differently per backend: MongoDB vCore
//! takes `cosmosSearchOptions.kind`/`similarity`, the NoSQL API takes a
//! vector index `type` and an embedding policy `distanceFunction`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorIndexKind {
    #[default]
    Ivf,
    Hnsw,
    DiskAnn,
}

impl VectorIndexKind {
    /// `cosmosSearchOptions.kind` for MongoDB vCore.
    pub fn mongo_kind(&self) -> &'static str {
        match self {
            VectorIndexKind::Ivf => "vector-ivf",
            VectorIndexKind::Hnsw => "vector-hnsw",
            VectorIndexKind::DiskAnn => "vector-diskann",
        }
    }

    /// `indexingPolicy.vectorIndexes[].type` for the NoSQL API. The NoSQL API
    /// has no IVF or HNSW index, so those map to quantized flat.
    pub fn nosql_type(&self) -> &'static str {
        match self {
            VectorIndexKind::Ivf | VectorIndexKind::Hnsw => "quantizedFlat",
            VectorIndexKind::DiskAnn => "diskANN",
        }
    }
}

impl fmt::Display for VectorIndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorIndexKind::Ivf => write!(f, "ivf"),
            VectorIndexKind::Hnsw => write!(f, "hnsw"),
            VectorIndexKind::DiskAnn => write!(f, "diskann"),
        }
    }
}

impl FromStr for VectorIndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ivf" | "vector-ivf" => Ok(VectorIndexKind::Ivf),
            "hnsw" | "vector-hnsw" => Ok(VectorIndexKind::Hnsw),
            "diskann" | "vector-diskann" => Ok(VectorIndexKind::DiskAnn),
            _ => Err(format!("Unknown vector index kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimilarityMetric {
    #[default]
    #[serde(rename = "COS")]
    Cosine,
    #[serde(rename = "L2")]
    Euclidean,
    #[serde(rename = "IP")]
    InnerProduct,
}

impl SimilarityMetric {
    pub fn mongo_name(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "COS",
            SimilarityMetric::Euclidean => "L2",
            SimilarityMetric::InnerProduct => "IP",
        }
    }

    pub fn nosql_name(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Euclidean => "euclidean",
            SimilarityMetric::InnerProduct => "dotproduct",
        }
    }

    /// Whether a larger score means a closer match.
    pub fn higher_is_closer(&self) -> bool {
        !matches!(self, SimilarityMetric::Euclidean)
    }

    /// Score of `a` against `b` under this metric.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return match self {
                SimilarityMetric::Euclidean => f64::INFINITY,
                _ => 0.0,
            };
        }
        let mut dot = 0.0_f64;
        let mut norm_a = 0.0_f64;
        let mut norm_b = 0.0_f64;
        let mut dist = 0.0_f64;
        for (x, y) in a.iter().zip(b.iter()) {
            let x = *x as f64;
            let y = *y as f64;
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
            dist += (x - y) * (x - y);
        }
        match self {
            SimilarityMetric::Cosine => {
                let denom = norm_a.sqrt() * norm_b.sqrt();
                if denom == 0.0 { 0.0 } else { dot / denom }
            }
            SimilarityMetric::InnerProduct => dot,
            SimilarityMetric::Euclidean => dist.sqrt(),
        }
    }

    /// Whether `score` clears a similarity `threshold`. Distances are
    /// compared against `1 - threshold`.
    pub fn passes(&self, score: f64, threshold: f64) -> bool {
        if self.higher_is_closer() {
            score >= threshold
        } else {
            score <= 1.0 - threshold
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mongo_name())
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COS" | "COSINE" => Ok(SimilarityMetric::Cosine),
            "L2" | "EUCLIDEAN" => Ok(SimilarityMetric::Euclidean),
            "IP" | "DOTPRODUCT" | "INNER" => Ok(SimilarityMetric::InnerProduct),
            _ => Err(format!("Unknown similarity metric: {s}")),
        }
    }
}
