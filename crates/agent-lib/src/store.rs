//! Latest estimate per instance
//!
//! Written by the monitor loop, read by the API.

use crate::models::EstimationResult;
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct EstimateStore {
    estimates: DashMap<String, EstimationResult>,
}

impl EstimateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the estimate for the result's instance
    pub fn insert(&self, result: EstimationResult) {
        debug!(instance_id = %result.instance_id, "Storing estimate");
        self.estimates.insert(result.instance_id.clone(), result);
    }

    /// Replace the whole snapshot with the results of one cycle
    ///
    /// Instances missing from `results` are dropped; they are no longer running.
    /// New estimates land before stale ones are removed, so a concurrent
    /// reader never misses an instance that is still running.
    pub fn replace_all(&self, results: &[EstimationResult]) {
        let current: HashSet<&str> = results.iter().map(|r| r.instance_id.as_str()).collect();
        for result in results {
            self.insert(result.clone());
        }
        self.estimates.retain(|id, _| current.contains(id.as_str()));
    }

    pub fn get(&self, instance_id: &str) -> Option<EstimationResult> {
        self.estimates.get(instance_id).map(|r| r.clone())
    }

    /// All estimates ordered by instance id
    pub fn list(&self) -> Vec<EstimationResult> {
        let mut all: Vec<_> = self.estimates.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        all
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}
