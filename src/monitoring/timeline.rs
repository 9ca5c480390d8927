//! Project Timeline
//!
//! Tracks per-phase status, timestamps and outcomes for one workflow
//! execution, and renders timing reports and Gantt charts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a phase within one execution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl PhaseStatus {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record for one phase.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    #[serde(skip)]
    pub phase_name: String,

    pub status: PhaseStatus,

    pub start_time: DateTime<Utc>,

    /// Set once the phase reaches a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TimelineEntry {
    /// Milliseconds between start and end, if the phase has finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }
}

/// Timeline of one workflow execution.
///
/// Entries are kept in first-start order. Starting a phase again replaces
/// its entry in place; no history is retained.
#[derive(Debug, Clone)]
pub struct ProjectTimeline {
    entries: Vec<TimelineEntry>,
    start_time: DateTime<Utc>,
}

impl ProjectTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            start_time: Utc::now(),
        }
    }

    fn position(&self, phase_name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.phase_name == phase_name)
    }

    fn entry_mut(&mut self, phase_name: &str) -> Option<&mut TimelineEntry> {
        self.entries.iter_mut().find(|e| e.phase_name == phase_name)
    }

    /// Marks a phase as in progress, replacing any earlier entry.
    pub fn start(&mut self, phase_name: &str) {
        let entry = TimelineEntry {
            phase_name: phase_name.to_string(),
            status: PhaseStatus::InProgress,
            start_time: Utc::now(),
            end_time: None,
            result: None,
            error: None,
        };

        match self.position(phase_name) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Marks a started phase as completed. Does nothing if the phase was
    /// never started.
    pub fn complete(&mut self, phase_name: &str, result: Value) {
        if let Some(entry) = self.entry_mut(phase_name) {
            entry.status = PhaseStatus::Completed;
            entry.end_time = Some(Utc::now());
            entry.result = Some(result);
            entry.error = None;
        }
    }

    /// Marks a started phase as failed. Does nothing if the phase was
    /// never started.
    pub fn fail(&mut self, phase_name: &str, error: impl Into<String>) {
        if let Some(entry) = self.entry_mut(phase_name) {
            entry.status = PhaseStatus::Failed;
            entry.end_time = Some(Utc::now());
            entry.result = None;
            entry.error = Some(error.into());
        }
    }

    pub fn get(&self, phase_name: &str) -> Option<&TimelineEntry> {
        self.entries.iter().find(|e| e.phase_name == phase_name)
    }

    /// Returns the phase status, `NotStarted` for unknown phases.
    pub fn status(&self, phase_name: &str) -> PhaseStatus {
        self.get(phase_name)
            .map(|e| e.status)
            .unwrap_or(PhaseStatus::NotStarted)
    }

    /// Returns all entries in first-start order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns the total elapsed time since timeline creation.
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }

    /// Returns phase durations in milliseconds for finished phases.
    pub fn durations(&self) -> HashMap<String, i64> {
        self.entries
            .iter()
            .filter_map(|e| e.duration_ms().map(|ms| (e.phase_name.clone(), ms)))
            .collect()
    }

    /// Generates an ASCII Gantt chart representation.
    ///
    /// Each finished phase is shown as a bar indicating when it ran
    /// relative to the total execution time. Failed phases are drawn
    /// with `x` instead of `#`.
    pub fn gantt_chart(&self) -> String {
        let mut output = String::from("\nExecution Timeline:\n\n");

        let total_time = self.elapsed().num_milliseconds();

        if total_time <= 0 {
            return output;
        }

        // Scale to 50 characters width
        let scale = 50.0 / total_time as f64;

        for entry in &self.entries {
            let Some(end_time) = entry.end_time else {
                continue;
            };

            let start = (entry.start_time - self.start_time).num_milliseconds().max(0);
            let end = (end_time - self.start_time).num_milliseconds().max(start);

            let start_pos = (start as f64 * scale) as usize;
            let width = ((end - start) as f64 * scale).max(1.0) as usize;
            let mark = if entry.status == PhaseStatus::Failed { "x" } else { "#" };

            let mut bar = " ".repeat(start_pos);
            bar.push_str(&mark.repeat(width));

            output.push_str(&format!(
                "{:18} |{}| ({} ms)\n",
                truncate(&entry.phase_name, 18),
                bar,
                end - start
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", total_time));
        output
    }
}

impl Default for ProjectTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for ProjectTimeline {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.phase_name, entry)?;
        }
        map.end()
    }
}

/// Pads or truncates a string to a fixed width.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
