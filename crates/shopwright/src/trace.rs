//! Scenario traces: the step log and attachments of one scenario.
//!
//! Page objects report user-visible steps ("Clicked View Cart") through
//! [`crate::element::Ui::step`]. The lifecycle attaches screenshots, then
//! writes the trace as JSON next to the other traces of the run.

use crate::result::ShopResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Shared handle to the running scenario's trace
pub type TraceHandle = Arc<Mutex<ScenarioTrace>>;

/// Outcome of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioStatus {
    /// Still running
    Running,
    /// All steps passed
    Passed,
    /// A step or hook failed
    Failed,
    /// Skipped (undefined steps, filtered)
    Skipped,
}

/// Severity of a step entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepLevel {
    /// Normal step
    Info,
    /// Recoverable problem
    Warn,
    /// Failure
    Error,
}

/// One entry of the step log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Milliseconds since scenario start
    pub at_ms: i64,
    /// Severity
    pub level: StepLevel,
    /// Message
    pub message: String,
}

/// Kind of attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    /// Inline text
    Text,
    /// PNG file on disk
    Image,
}

/// A file or text attached to the scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment title
    pub name: String,
    /// Kind
    pub kind: AttachmentKind,
    /// File path for images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Body for text attachments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Trace of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTrace {
    /// Unique id
    pub id: Uuid,
    /// Scenario name
    pub name: String,
    /// Feature name
    pub feature: String,
    /// Tags without `@`
    pub tags: Vec<String>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub finished_at: Option<DateTime<Utc>>,
    /// Outcome
    pub status: ScenarioStatus,
    /// Step log
    pub steps: Vec<TraceStep>,
    /// Attachments
    pub attachments: Vec<Attachment>,
}

impl ScenarioTrace {
    /// Start a trace now
    #[must_use]
    pub fn start(name: impl Into<String>, feature: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            feature: feature.into(),
            tags,
            started_at: Utc::now(),
            finished_at: None,
            status: ScenarioStatus::Running,
            steps: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Wrap in a shared handle
    #[must_use]
    pub fn shared(self) -> TraceHandle {
        Arc::new(Mutex::new(self))
    }

    /// Append a step entry
    pub fn record(&mut self, level: StepLevel, message: impl Into<String>) {
        let at_ms = (Utc::now() - self.started_at).num_milliseconds();
        self.steps.push(TraceStep {
            at_ms,
            level,
            message: message.into(),
        });
    }

    /// Attach a text body
    pub fn attach_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.attachments.push(Attachment {
            name: name.into(),
            kind: AttachmentKind::Text,
            path: None,
            text: Some(text.into()),
        });
    }

    /// Attach an image file
    pub fn attach_image(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.attachments.push(Attachment {
            name: name.into(),
            kind: AttachmentKind::Image,
            path: Some(path.into()),
            text: None,
        });
    }

    /// Close the trace
    pub fn finish(&mut self, status: ScenarioStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Duration in milliseconds, once finished
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// File name used by [`ScenarioTrace::save_json`]
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.id, crate::screenshot::sanitize(&self.name))
    }

    /// Write the trace into `dir`, returning the file path
    pub fn save_json(&self, dir: &Path) -> ShopResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Load a trace file
    pub fn load_json(path: &Path) -> ShopResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Totals over the traces of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// Passed scenarios
    pub passed: usize,
    /// Failed scenarios
    pub failed: usize,
    /// Skipped or unfinished scenarios
    pub skipped: usize,
    /// Names of failed scenarios
    pub failures: Vec<String>,
}

impl SuiteSummary {
    /// Aggregate every `*.json` trace in `dir`; unreadable files are skipped.
    pub fn from_dir(dir: &Path) -> ShopResult<Self> {
        let mut summary = Self::default();
        if !dir.is_dir() {
            return Ok(summary);
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                match ScenarioTrace::load_json(&path) {
                    Ok(trace) => summary.add(&trace),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping trace"),
                }
            }
        }
        summary.failures.sort();
        Ok(summary)
    }

    /// Count one trace
    pub fn add(&mut self, trace: &ScenarioTrace) {
        match trace.status {
            ScenarioStatus::Passed => self.passed += 1,
            ScenarioStatus::Failed => {
                self.failed += 1;
                self.failures.push(trace.name.clone());
            }
            ScenarioStatus::Skipped | ScenarioStatus::Running => self.skipped += 1,
        }
    }

    /// Total scenarios
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}
