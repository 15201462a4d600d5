// SPDX-License-Identifier: MIT

//! The event hub (spec.md §4.7, C7): client registry, subscription sets,
//! and broadcast fan-out. Implements [`JobObserver`] so the job scheduler
//! can report through this without depending on it directly.

use crate::client::Client;
use crate::frame::OutboundFrame;
use hearth_core::{ClientId, Job, JobId};
use hearth_jobs::JobObserver;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Registry of connected clients and the broadcast fan-out over them.
#[derive(Default)]
pub struct EventHub {
    clients: RwLock<HashMap<ClientId, Client>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self { clients: RwLock::new(HashMap::new()) }
    }

    /// Register a new connection, returning its id and the receiver half of
    /// its outbound queue — the caller's write loop drains this.
    pub fn register(&self, subject: String) -> (ClientId, mpsc::Receiver<OutboundFrame>) {
        let id = ClientId::new();
        let (client, receiver) = Client::new(id, subject);
        self.clients.write().insert(id, client);
        (id, receiver)
    }

    pub fn deregister(&self, id: ClientId) {
        self.clients.write().remove(&id);
    }

    pub fn subscribe(&self, id: ClientId, job_id: JobId) {
        if let Some(client) = self.clients.write().get_mut(&id) {
            client.subscribe(job_id);
        }
    }

    pub fn unsubscribe(&self, id: ClientId, job_id: JobId) {
        if let Some(client) = self.clients.write().get_mut(&id) {
            client.unsubscribe(job_id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Deliver `frame` directly to one client, used for `pong`/`error`
    /// replies that don't go through the broadcast path.
    pub fn send_to(&self, id: ClientId, frame: OutboundFrame) {
        let stale = match self.clients.read().get(&id) {
            Some(client) => !client.try_send(frame),
            None => false,
        };
        if stale {
            self.deregister(id);
        }
    }

    /// Deliver a job state/progress change to every client subscribed to
    /// that job id. Ordering per job id is preserved because delivery here
    /// is synchronous and callers broadcast one job event at a time
    /// (spec.md §5 "no ordering [across jobs] is promised").
    pub fn broadcast_job_update(&self, job: &Job) {
        let frame = OutboundFrame::for_job(job);
        let mut stale = Vec::new();
        {
            let clients = self.clients.read();
            for client in clients.values() {
                if client.is_subscribed(job.id) && !client.try_send(frame.clone()) {
                    stale.push(client.id);
                }
            }
        }
        for id in stale {
            self.deregister(id);
        }
    }
}

impl JobObserver for EventHub {
    fn on_job_event(&self, job: &Job) {
        self.broadcast_job_update(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::JobType;

    #[test]
    fn subscribed_client_receives_job_update() {
        let hub = EventHub::new();
        let (id, mut rx) = hub.register("alice".into());
        let job = hearth_core::test_support::job(JobType::Copy, "media/a", Some("media/b"));
        hub.subscribe(id, job.id);

        hub.broadcast_job_update(&job);
        let frame = rx.try_recv().unwrap();
        assert!(matches!(frame, OutboundFrame::JobUpdate { .. }));
    }

    #[test]
    fn unsubscribed_client_receives_nothing() {
        let hub = EventHub::new();
        let (_id, mut rx) = hub.register("alice".into());
        let job = hearth_core::test_support::job(JobType::Copy, "media/a", Some("media/b"));

        hub.broadcast_job_update(&job);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn terminal_job_becomes_job_complete_frame() {
        let hub = EventHub::new();
        let (id, mut rx) = hub.register("alice".into());
        let mut job = hearth_core::test_support::job(JobType::Delete, "media/a", None);
        hub.subscribe(id, job.id);
        job.complete(1);

        hub.broadcast_job_update(&job);
        let frame = rx.try_recv().unwrap();
        assert!(matches!(frame, OutboundFrame::JobComplete { .. }));
    }

    #[test]
    fn deregister_removes_the_client() {
        let hub = EventHub::new();
        let (id, _rx) = hub.register("alice".into());
        assert_eq!(hub.client_count(), 1);
        hub.deregister(id);
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn overflowing_outbound_queue_drops_the_client() {
        let hub = EventHub::new();
        let (id, _rx) = hub.register("alice".into());
        let job = hearth_core::test_support::job(JobType::Copy, "media/a", Some("media/b"));
        hub.subscribe(id, job.id);

        for _ in 0..(crate::client::OUTBOUND_QUEUE_CAPACITY + 10) {
            hub.broadcast_job_update(&job);
        }
        assert_eq!(hub.client_count(), 0);
    }
}
