use bevy::prelude::*;
use std::collections::VecDeque;

use constants::history::{ALIGNMENT_HISTORY_CAPACITY, POSITION_HISTORY_CAPACITY};

use crate::engine::tracking::anchors::PlaneAlignment;

/// Bounded FIFO of recent world positions; the displayed position is the
/// arithmetic mean of the buffer.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    samples: VecDeque<Vec3>,
    capacity: usize,
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::new(POSITION_HISTORY_CAPACITY)
    }
}

impl PositionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Vec3) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn average(&self) -> Option<Vec3> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: Vec3 = self.samples.iter().copied().sum();
        Some(sum / self.samples.len() as f32)
    }

    /// Push a sample and return the smoothed position in one step.
    pub fn smoothed(&mut self, sample: Vec3) -> Vec3 {
        self.push(sample);
        self.average().unwrap_or(sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.samples.iter()
    }
}

/// Bounded FIFO of recent alignment observations, used to hysteresis-filter
/// alignment flips.
#[derive(Debug, Clone)]
pub struct AlignmentHistory {
    samples: VecDeque<PlaneAlignment>,
    capacity: usize,
}

impl Default for AlignmentHistory {
    fn default() -> Self {
        Self::new(ALIGNMENT_HISTORY_CAPACITY)
    }
}

impl AlignmentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, alignment: PlaneAlignment) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(alignment);
    }

    pub fn count(&self, alignment: PlaneAlignment) -> usize {
        self.samples.iter().filter(|a| **a == alignment).count()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn history_is_bounded_and_ordered() {
        let mut history = PositionHistory::new(10);
        for i in 0..15 {
            history.push(Vec3::splat(i as f32));
        }
        assert_eq!(history.len(), 10);
        let values: Vec<f32> = history.iter().map(|v| v.x).collect();
        assert_eq!(values, (5..15).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn smoothing_identical_samples_is_exact() {
        let mut history = PositionHistory::new(10);
        let p = Vec3::new(1.25, -0.5, 3.0);
        let mut out = Vec3::ZERO;
        for _ in 0..12 {
            out = history.smoothed(p);
        }
        assert_relative_eq!(out.x, p.x);
        assert_relative_eq!(out.y, p.y);
        assert_relative_eq!(out.z, p.z);
    }

    #[test]
    fn average_of_empty_is_none() {
        let history = PositionHistory::new(10);
        assert!(history.average().is_none());
    }

    #[test]
    fn alignment_counts_track_the_window() {
        let mut history = AlignmentHistory::new(4);
        history.push(PlaneAlignment::Horizontal);
        history.push(PlaneAlignment::Horizontal);
        history.push(PlaneAlignment::Vertical);
        history.push(PlaneAlignment::Vertical);
        history.push(PlaneAlignment::Vertical);
        // First horizontal fell off the window.
        assert_eq!(history.count(PlaneAlignment::Horizontal), 1);
        assert_eq!(history.count(PlaneAlignment::Vertical), 3);
    }
}
