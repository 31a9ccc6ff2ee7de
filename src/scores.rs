//! Best-score table, one integer per difficulty
//!
//! Storage itself belongs to the host (LocalStorage, a file, anything); this
//! module only models the table and its JSON round-trip.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BestScores {
    entries: HashMap<String, u64>,
}

impl BestScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best score for a difficulty, 0 when none recorded
    pub fn get(&self, difficulty: &str) -> u64 {
        self.entries.get(difficulty).copied().unwrap_or(0)
    }

    /// Record a score; returns whether the entry improved
    pub fn record(&mut self, difficulty: &str, score: u64) -> bool {
        if score <= self.get(difficulty) {
            return false;
        }
        self.entries.insert(difficulty.to_string(), score);
        true
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_only_improvements() {
        let mut scores = BestScores::new();
        assert_eq!(scores.get("normal"), 0);
        assert!(scores.record("normal", 120));
        assert!(!scores.record("normal", 120));
        assert!(!scores.record("normal", 90));
        assert!(scores.record("normal", 150));
        assert_eq!(scores.get("normal"), 150);
        // Difficulties are independent keys
        assert!(scores.record("hard", 10));
        assert_eq!(scores.get("normal"), 150);
        assert_eq!(scores.get("hard"), 10);
    }

    #[test]
    fn zero_never_records() {
        let mut scores = BestScores::new();
        assert!(!scores.record("easy", 0));
        assert_eq!(scores.get("easy"), 0);
    }

    #[test]
    fn json_round_trip() {
        let mut scores = BestScores::new();
        scores.record("easy", 44);
        scores.record("paradise", 9001);
        let json = scores.to_json().unwrap();
        let back = BestScores::from_json(&json).unwrap();
        assert_eq!(back, scores);
    }
}
