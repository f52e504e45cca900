//! Rolling quality and timing history for trend reporting

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of recent generations kept for trend reporting
pub const QUALITY_WINDOW: usize = 20;

/// One successful generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSample {
    pub quality_score: u8,
    pub duration_ms: u64,
    pub passes: u32,
}

/// Direction of recent quality scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTrend {
    Improving,
    Stable,
    Declining,
    /// Fewer than four samples
    #[default]
    Unknown,
}

/// Summary of the rolling window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub samples: usize,
    pub avg_quality: f64,
    pub avg_duration_ms: f64,
    pub avg_passes: f64,
    pub trend: QualityTrend,
}

/// Bounded window of recent generation outcomes
#[derive(Debug, Clone)]
pub struct QualityTracker {
    samples: VecDeque<GenerationSample>,
    capacity: usize,
}

impl QualityTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, sample: GenerationSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
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

    /// Compare the older half of the window against the newer half
    pub fn trend(&self) -> QualityTrend {
        if self.samples.len() < 4 {
            return QualityTrend::Unknown;
        }
        let mid = self.samples.len() / 2;
        let older = mean(self.samples.iter().take(mid).map(|s| s.quality_score as f64));
        let newer = mean(self.samples.iter().skip(mid).map(|s| s.quality_score as f64));

        let delta = newer - older;
        if delta > 2.0 {
            QualityTrend::Improving
        } else if delta < -2.0 {
            QualityTrend::Declining
        } else {
            QualityTrend::Stable
        }
    }

    pub fn summary(&self) -> QualitySummary {
        QualitySummary {
            samples: self.samples.len(),
            avg_quality: mean(self.samples.iter().map(|s| s.quality_score as f64)),
            avg_duration_ms: mean(self.samples.iter().map(|s| s.duration_ms as f64)),
            avg_passes: mean(self.samples.iter().map(|s| s.passes as f64)),
            trend: self.trend(),
        }
    }
}

impl Default for QualityTracker {
    fn default() -> Self {
        Self::new(QUALITY_WINDOW)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(quality_score: u8) -> GenerationSample {
        GenerationSample {
            quality_score,
            duration_ms: 1000,
            passes: 1,
        }
    }

    #[test]
    fn test_window_is_bounded() {
        let mut tracker = QualityTracker::new(3);
        for q in [50, 60, 70, 80] {
            tracker.record(sample(q));
        }
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.summary().avg_quality, 70.0);
    }

    #[test]
    fn test_trend_detection() {
        let mut tracker = QualityTracker::default();
        assert_eq!(tracker.trend(), QualityTrend::Unknown);

        for q in [60, 62, 80, 85] {
            tracker.record(sample(q));
        }
        assert_eq!(tracker.trend(), QualityTrend::Improving);

        tracker.clear();
        for q in [90, 88, 70, 65] {
            tracker.record(sample(q));
        }
        assert_eq!(tracker.trend(), QualityTrend::Declining);

        tracker.clear();
        for q in [80, 81, 80, 79] {
            tracker.record(sample(q));
        }
        assert_eq!(tracker.trend(), QualityTrend::Stable);
    }

    #[test]
    fn test_empty_summary() {
        let summary = QualityTracker::default().summary();
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.avg_quality, 0.0);
        assert_eq!(summary.trend, QualityTrend::Unknown);
    }
}
