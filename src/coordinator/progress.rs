//! Mastery score aggregation.

use crate::config::ProgressSettings;
use crate::schema::SubtopicId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Where a practice score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeSource {
    Quiz,
    Game,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeRecord {
    pub source: PracticeSource,
    pub score: u8,
    pub recorded_at: DateTime<Utc>,
}

/// Learning signals collected for one subtopic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubtopicSignals {
    pub materials_viewed: usize,
    pub practice: Vec<PracticeRecord>,
}

impl SubtopicSignals {
    /// The most recent practice score.
    pub fn latest_practice(&self) -> Option<u8> {
        self.practice.last().map(|p| p.score)
    }
}

/// Weights combining material and practice into a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPolicy {
    pub material_weight: u8,
    pub practice_weight: u8,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            material_weight: 30,
            practice_weight: 70,
        }
    }
}

impl From<&ProgressSettings> for ProgressPolicy {
    fn from(settings: &ProgressSettings) -> Self {
        Self {
            material_weight: settings.material_weight,
            practice_weight: settings.practice_weight,
        }
    }
}

impl ProgressPolicy {
    /// Score a subtopic's signals.
    ///
    /// Material counts as 100 once any article was viewed. Practice is the
    /// latest practice score and contributes nothing until one exists.
    pub fn score(&self, signals: &SubtopicSignals) -> u8 {
        let total = self.material_weight as f64 + self.practice_weight as f64;
        if total == 0.0 {
            return 0;
        }

        let material = if signals.materials_viewed > 0 { 100.0 } else { 0.0 };
        let practice = signals.latest_practice().map(f64::from).unwrap_or(0.0);

        let weighted =
            self.material_weight as f64 * material + self.practice_weight as f64 * practice;
        (weighted / total).round().clamp(0.0, 100.0) as u8
    }
}

/// A snapshot of a subtopic's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub subtopic: SubtopicId,
    pub score: u8,
    pub materials_viewed: usize,
    pub practice_attempts: usize,
    pub latest_practice: Option<u8>,
}

/// Per-session learning signals, keyed by subtopic.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    policy: ProgressPolicy,
    signals: HashMap<SubtopicId, SubtopicSignals>,
}

impl ProgressTracker {
    pub fn new(policy: ProgressPolicy) -> Self {
        Self {
            policy,
            signals: HashMap::new(),
        }
    }

    pub fn policy(&self) -> ProgressPolicy {
        self.policy
    }

    pub fn record_material_viewed(&mut self, id: SubtopicId) {
        self.signals.entry(id).or_default().materials_viewed += 1;
    }

    /// Record a practice score. Values above 100 are clamped.
    pub fn record_practice(&mut self, id: SubtopicId, source: PracticeSource, score: u8) {
        self.signals.entry(id).or_default().practice.push(PracticeRecord {
            source,
            score: score.min(100),
            recorded_at: Utc::now(),
        });
    }

    pub fn signals(&self, id: SubtopicId) -> Option<&SubtopicSignals> {
        self.signals.get(&id)
    }

    pub fn score(&self, id: SubtopicId) -> u8 {
        self.signals
            .get(&id)
            .map(|s| self.policy.score(s))
            .unwrap_or(0)
    }

    pub fn report(&self, id: SubtopicId) -> ProgressReport {
        let empty = SubtopicSignals::default();
        let signals = self.signals.get(&id).unwrap_or(&empty);
        ProgressReport {
            subtopic: id,
            score: self.policy.score(signals),
            materials_viewed: signals.materials_viewed,
            practice_attempts: signals.practice.len(),
            latest_practice: signals.latest_practice(),
        }
    }

    /// Forget all signals, e.g. when a new topic replaces the old one.
    pub fn clear(&mut self) {
        self.signals.clear();
    }
}
