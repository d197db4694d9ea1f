//! Session-lifetime occurrence counter per emotion category.

use crate::types::{EmotionCategory, NormalizedFace};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Cumulative count per category. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; EmotionCategory::COUNT],
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, category: EmotionCategory) {
        let slot = &mut self.counts[category.index()];
        *slot = slot.saturating_add(1);
    }

    /// Count each face's dominant category once.
    pub fn record(&mut self, faces: &[NormalizedFace]) {
        for face in faces {
            self.increment(face.category);
        }
    }

    pub fn count(&self, category: EmotionCategory) -> u64 {
        self.counts[category.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Counts in registry declaration order, for chart redraws.
    pub fn snapshot(&self) -> [(EmotionCategory, u64); EmotionCategory::COUNT] {
        std::array::from_fn(|i| (EmotionCategory::ALL[i], self.counts[i]))
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EmotionCategory::COUNT))?;
        for (category, count) in self.snapshot() {
            map.serialize_entry(category.as_str(), &count)?;
        }
        map.end()
    }
}
