//! Collection progress reporting.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::form::Field;

/// How far the collection conversation has come.
///
/// `current` counts collected fields whose values the engine accepted;
/// `total` adds the fields still waiting for a usable answer. A collected
/// field the engine rejected counts as remaining, not done, so the
/// percentage never overstates progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionProgress {
    pub current: usize,
    pub total: usize,
    pub percentage: u8,
}

impl CollectionProgress {
    /// Computes progress from the collected names and the live fillable
    /// snapshot.
    pub fn compute<'a>(
        collected: impl IntoIterator<Item = &'a str>,
        fillable: &[Field],
    ) -> Self {
        let remaining: BTreeSet<&str> = fillable.iter().map(|f| f.name.as_str()).collect();
        let done = collected
            .into_iter()
            .filter(|name| !remaining.contains(name))
            .count();

        let total = done + remaining.len();
        let percentage = if total == 0 {
            0
        } else {
            ((done as f64 / total as f64) * 100.0).round() as u8
        };

        Self {
            current: done,
            total,
            percentage,
        }
    }

    /// True once nothing remains to collect.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.current == self.total
    }
}
