// SPDX-License-Identifier: MIT

//! A single registered event-channel connection (spec.md §3 "Client
//! registration", §4.7).

use crate::frame::OutboundFrame;
use hearth_core::{ClientId, JobId};
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Bounded outbound queue capacity per client. Delivery is non-blocking
/// (spec.md §5 "drop on full after a short grace") — a slow reader's socket
/// cannot stall the broadcaster.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// A registered client connection: its authenticated subject, its bounded
/// outbound queue, and the set of job ids it is subscribed to.
pub struct Client {
    pub id: ClientId,
    pub subject: String,
    subscriptions: HashSet<JobId>,
    sender: mpsc::Sender<OutboundFrame>,
}

impl Client {
    pub fn new(id: ClientId, subject: String) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        (Self { id, subject, subscriptions: HashSet::new(), sender }, receiver)
    }

    pub fn subscribe(&mut self, job_id: JobId) {
        self.subscriptions.insert(job_id);
    }

    pub fn unsubscribe(&mut self, job_id: JobId) {
        self.subscriptions.remove(&job_id);
    }

    pub fn is_subscribed(&self, job_id: JobId) -> bool {
        self.subscriptions.contains(&job_id)
    }

    /// Enqueue a frame for delivery. Returns `false` (and the caller should
    /// deregister this client) when the outbound queue is full or the
    /// client's read/write loop has already exited.
    pub fn try_send(&self, frame: OutboundFrame) -> bool {
        self.sender.try_send(frame).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_set_tracks_job_ids() {
        let (mut client, _rx) = Client::new(ClientId::new(), "alice".into());
        let job_id = JobId::new();
        assert!(!client.is_subscribed(job_id));
        client.subscribe(job_id);
        assert!(client.is_subscribed(job_id));
        client.unsubscribe(job_id);
        assert!(!client.is_subscribed(job_id));
    }

    #[test]
    fn try_send_fails_once_receiver_is_dropped() {
        let (client, rx) = Client::new(ClientId::new(), "alice".into());
        drop(rx);
        assert!(!client.try_send(OutboundFrame::Pong));
    }
}
