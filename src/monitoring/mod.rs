//! Execution Monitoring Module
//!
//! Provides per-execution tracking of phase status and timing.
//!
//! # Components
//!
//! - [`ProjectTimeline`]: Phase start/complete/fail records and Gantt charts

pub mod timeline;

pub use timeline::{PhaseStatus, ProjectTimeline, TimelineEntry};
