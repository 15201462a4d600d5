// SPDX-License-Identifier: MIT

//! Wire frames the event channel exchanges with clients (spec.md §6
//! "Event-channel frames").

use hearth_core::{Job, JobId};
use serde::{Deserialize, Serialize};

/// A frame sent from a client to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Subscribe { job_id: JobId },
    Unsubscribe { job_id: JobId },
    Ping,
}

/// The payload of a `job_update`/`job_complete` frame.
#[derive(Debug, Clone, Serialize)]
pub struct JobUpdatePayload {
    pub job_id: JobId,
    pub state: hearth_core::JobState,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for JobUpdatePayload {
    fn from(job: &Job) -> Self {
        Self { job_id: job.id, state: job.state, progress: job.progress, error: job.error.clone() }
    }
}

/// A frame sent from the server to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    JobUpdate { payload: JobUpdatePayload },
    JobComplete { payload: JobUpdatePayload },
    Pong,
    Error { payload: ErrorPayload },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl OutboundFrame {
    pub fn for_job(job: &Job) -> Self {
        let payload = JobUpdatePayload::from(job);
        if job.state.is_terminal() {
            OutboundFrame::JobComplete { payload }
        } else {
            OutboundFrame::JobUpdate { payload }
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OutboundFrame::Error { payload: ErrorPayload { message: message.into() } }
    }

    pub fn to_json(&self) -> String {
        // Every variant here is plain data; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{\"type\":\"error\"}".to_string())
    }
}
