// SPDX-License-Identifier: MIT

//! Job identifier and state machine (spec.md §3 `Job`, §4.6, §8 invariant 9).

use crate::id::JobId;
use serde::{Deserialize, Serialize};

/// The kind of background operation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Copy,
    Move,
    Delete,
}

crate::simple_display! {
    JobType {
        Copy => "copy",
        Move => "move",
        Delete => "delete",
    }
}

impl std::str::FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(JobType::Copy),
            "move" => Ok(JobType::Move),
            "delete" => Ok(JobType::Delete),
            _ => Err(()),
        }
    }
}

/// Job lifecycle state. Transitions form the DAG
/// `pending -> running -> {completed | failed | cancelled}`; terminal states
/// are monotonic (spec.md §3 invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Cancelled)
    }

    /// Whether `self -> next` is a legal transition per the state DAG.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Pending, Running) => true,
            (Running, Completed | Failed | Cancelled) => true,
            _ => false,
        }
    }
}

/// A background copy/move/delete operation with tracked progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub state: JobState,
    /// 0..=100, monotonically non-decreasing across a job's life.
    pub progress: u8,
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
}

impl Job {
    pub fn new(
        id: JobId,
        job_type: JobType,
        source_path: impl Into<String>,
        dest_path: Option<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            job_type,
            state: JobState::Pending,
            progress: 0,
            source_path: source_path.into(),
            dest_path,
            error: None,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Move to `running`. Panics (debug_assert) if called out of order —
    /// callers (the scheduler) are expected to only call this from `pending`.
    pub fn start(&mut self, now_ms: u64) {
        debug_assert!(self.state.can_transition_to(JobState::Running) || self.state == JobState::Pending);
        self.state = JobState::Running;
        self.started_at = Some(now_ms);
    }

    /// Advance progress. Clamped to never move backwards (invariant 9).
    pub fn set_progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.progress {
            self.progress = percent;
        }
    }

    pub fn complete(&mut self, now_ms: u64) {
        self.state = JobState::Completed;
        self.progress = 100;
        self.completed_at = Some(now_ms);
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) {
        self.state = JobState::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(now_ms);
    }

    pub fn cancel(&mut self, now_ms: u64) {
        self.state = JobState::Cancelled;
        self.completed_at = Some(now_ms);
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self.state, JobState::Pending | JobState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_decreases() {
        let mut job = Job::new(JobId::new(), JobType::Copy, "media/a", Some("media/b".into()), 0);
        job.start(1);
        job.set_progress(50);
        job.set_progress(30);
        assert_eq!(job.progress, 50);
        job.set_progress(100);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn complete_always_reports_100() {
        let mut job = Job::new(JobId::new(), JobType::Delete, "media/a", None, 0);
        job.start(1);
        job.set_progress(10);
        job.complete(2);
        assert_eq!(job.progress, 100);
        assert_eq!(job.state, JobState::Completed);
    }

    #[test]
    fn terminal_state_is_final() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Pending.can_transition_to(JobState::Completed));
    }

    #[test]
    fn only_pending_and_running_are_cancellable() {
        let mut job = Job::new(JobId::new(), JobType::Move, "media/a", Some("media/b".into()), 0);
        assert!(job.is_cancellable());
        job.start(1);
        assert!(job.is_cancellable());
        job.complete(2);
        assert!(!job.is_cancellable());
    }
}
