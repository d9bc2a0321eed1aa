//! Symmetric, edge-weighted correlation between concepts.
//!
//! Edges carry a weight in [-1, 1]. Positive weights mean mastery of one
//! concept transfers to the other; negative weights mean it interferes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::types::ConceptId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptGraph {
    concepts: BTreeSet<ConceptId>,
    /// Ordered so neighbour sums accumulate identically across runs
    edges: BTreeMap<ConceptId, BTreeMap<ConceptId, f64>>,
}

impl ConceptGraph {
    pub fn new<I, S>(concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConceptId>,
    {
        Self {
            concepts: concepts.into_iter().map(Into::into).collect(),
            edges: BTreeMap::new(),
        }
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.concepts.contains(concept)
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Declare a symmetric correlation between two known concepts.
    /// Re-declaring an edge overwrites its weight.
    pub fn correlate(&mut self, a: &str, b: &str, weight: f64) -> Result<()> {
        for concept in [a, b] {
            if !self.contains(concept) {
                return Err(SimError::NotFound(format!("concept {concept}")));
            }
        }
        if !weight.is_finite() || !(-1.0..=1.0).contains(&weight) {
            return Err(SimError::InvalidArgument(format!(
                "correlation weight {weight} outside [-1, 1]"
            )));
        }
        if a == b {
            return Err(SimError::InvalidArgument(format!(
                "concept {a} cannot be correlated with itself"
            )));
        }

        self.edges
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), weight);
        self.edges
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string(), weight);

        tracing::debug!(concept_a = a, concept_b = b, weight, "concepts correlated");
        Ok(())
    }

    /// Weight of the (a, b) edge, `None` when unrelated
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        self.edges.get(a).and_then(|m| m.get(b)).copied()
    }

    pub fn neighbors<'a>(&'a self, concept: &str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.edges
            .get(concept)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, &w)| (k.as_str(), w)))
    }

    /// Score transferred to `concept` from its correlated neighbours.
    ///
    /// `score_of` yields a neighbour's own score, or `None` if it has no
    /// evidence. A negative edge contributes `1 - score`. Returns `None` when
    /// no neighbour with evidence is connected by a non-zero edge.
    pub fn transferred_score<F>(&self, concept: &str, mut score_of: F) -> Option<f64>
    where
        F: FnMut(&str) -> Option<f64>,
    {
        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for (neighbor, w) in self.neighbors(concept) {
            if w == 0.0 {
                continue;
            }
            let Some(score) = score_of(neighbor) else {
                continue;
            };
            let aligned = if w > 0.0 { score } else { 1.0 - score };
            weighted += w.abs() * aligned;
            total_weight += w.abs();
        }

        if total_weight > 0.0 {
            Some(weighted / total_weight)
        } else {
            None
        }
    }
}
