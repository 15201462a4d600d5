// SPDX-License-Identifier: MIT

//! The background job scheduler (spec.md §4.6, C6): a fixed-size worker
//! pool draining a bounded queue, executing copy/move/delete with tracked
//! progress and cooperative cancellation.

use crate::observer::JobObserver;
use crate::ops;
use hearth_core::{Clock, Error, Job, JobId, JobType, Result};
use hearth_vfs::FileSystem;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Job-creation parameters accepted by [`JobScheduler::create`].
#[derive(Debug, Clone)]
pub struct JobParams {
    pub job_type: JobType,
    pub source_path: String,
    pub dest_path: Option<String>,
}

impl JobParams {
    fn validate(&self) -> Result<()> {
        if self.source_path.trim().is_empty() {
            return Err(Error::InvalidJobParams("source_path must not be empty".into()));
        }
        match self.job_type {
            JobType::Copy | JobType::Move => {
                if self.dest_path.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(Error::InvalidJobParams(format!(
                        "{} requires a dest_path",
                        self.job_type
                    )));
                }
            }
            JobType::Delete => {}
        }
        Ok(())
    }
}

struct WorkItem {
    job_id: JobId,
    cancel: CancellationToken,
}

/// Per-job bookkeeping the scheduler needs beyond the stored [`Job`] record:
/// the cancellation token a worker observes, and whether a `pending` job was
/// cancelled before a worker ever picked it up.
struct Slot {
    job: Job,
    cancel: CancellationToken,
    skip: bool,
}

/// Bounded worker pool draining a bounded request queue (spec.md §4.6, §5
/// "the job queue is bounded — saturation fails job creation fast").
pub struct JobScheduler<C: Clock> {
    registry: Arc<hearth_vfs::MountRegistry>,
    fs: Arc<dyn FileSystem>,
    clock: C,
    jobs: Arc<RwLock<HashMap<JobId, Slot>>>,
    observer: Arc<dyn JobObserver>,
    sender: mpsc::Sender<WorkItem>,
}

impl<C: Clock> JobScheduler<C> {
    /// Spawn `worker_count` worker tasks draining a queue bounded at
    /// `queue_capacity`. The returned scheduler can be cloned cheaply; every
    /// clone shares the same queue and job store.
    pub fn new(
        registry: Arc<hearth_vfs::MountRegistry>,
        fs: Arc<dyn FileSystem>,
        clock: C,
        observer: Arc<dyn JobObserver>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let jobs: Arc<RwLock<HashMap<JobId, Slot>>> = Arc::new(RwLock::new(HashMap::new()));
        let scheduler = Arc::new(Self { registry, fs, clock, jobs, observer, sender });

        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        for worker_id in 0..worker_count {
            let scheduler = scheduler.clone();
            let receiver = receiver.clone();
            tokio::spawn(async move {
                scheduler.run_worker(worker_id, receiver).await;
            });
        }
        scheduler
    }

    /// Validate and enqueue a new job. Returns the job in `pending` state
    /// immediately; on queue saturation the job is stored `failed` with a
    /// queue-overflow error and the caller still gets it back (spec.md
    /// §4.6 step 2).
    pub fn create(&self, params: JobParams) -> Result<Job> {
        params.validate()?;
        let now = self.clock.epoch_ms();
        let mut job = Job::new(JobId::new(), params.job_type, params.source_path, params.dest_path, now);

        let cancel = CancellationToken::new();
        self.jobs.write().insert(job.id, Slot { job: job.clone(), cancel: cancel.clone(), skip: false });

        match self.sender.try_send(WorkItem { job_id: job.id, cancel }) {
            Ok(()) => {}
            Err(_) => {
                job.fail("job queue is full", now);
                self.store_and_notify(job.clone());
            }
        }
        Ok(job)
    }

    pub fn get(&self, id: JobId) -> Result<Job> {
        self.jobs.read().get(&id).map(|s| s.job.clone()).ok_or_else(|| Error::JobNotFound(id.to_string()))
    }

    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().values().map(|s| s.job.clone()).collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Cancel a `pending` or `running` job (spec.md §4.6). `pending` jobs
    /// never execute; `running` jobs have their token signalled.
    pub fn cancel(&self, id: JobId) -> Result<()> {
        let mut jobs = self.jobs.write();
        let slot = jobs.get_mut(&id).ok_or_else(|| Error::JobNotFound(id.to_string()))?;
        if !slot.job.is_cancellable() {
            return Err(Error::NotCancellable(id.to_string()));
        }
        slot.skip = true;
        slot.cancel.cancel();
        if slot.job.state == hearth_core::JobState::Pending {
            // No worker will observe `skip` until it dequeues this job; for
            // a job still sitting in the channel, mark cancelled now so
            // `get`/`list` reflect it immediately.
            slot.job.cancel(self.clock.epoch_ms());
            drop(jobs);
            self.notify(id);
        }
        Ok(())
    }

    fn store_and_notify(&self, job: Job) {
        let id = job.id;
        if let Some(slot) = self.jobs.write().get_mut(&id) {
            slot.job = job;
        }
        self.notify(id);
    }

    fn notify(&self, id: JobId) {
        if let Some(job) = self.jobs.read().get(&id).map(|s| s.job.clone()) {
            self.observer.on_job_event(&job);
        }
    }

    async fn run_worker(self: Arc<Self>, worker_id: usize, receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<WorkItem>>>) {
        tracing::debug!(worker_id, "job worker started");
        loop {
            let item = {
                let mut guard = receiver.lock().await;
                guard.recv().await
            };
            let Some(item) = item else {
                tracing::debug!(worker_id, "job worker shutting down, queue closed");
                return;
            };
            self.execute(item).await;
        }
    }

    async fn execute(&self, item: WorkItem) {
        let skip = self.jobs.read().get(&item.job_id).map(|s| s.skip).unwrap_or(false);
        if skip {
            return;
        }

        let now = self.clock.epoch_ms();
        {
            let mut jobs = self.jobs.write();
            let Some(slot) = jobs.get_mut(&item.job_id) else { return };
            slot.job.start(now);
        }
        self.notify(item.job_id);

        let (job_type, source, dest) = {
            let jobs = self.jobs.read();
            let job = &jobs[&item.job_id].job;
            (job.job_type, job.source_path.clone(), job.dest_path.clone())
        };

        let result = self.run_job(&item, job_type, &source, dest.as_deref()).await;

        let now = self.clock.epoch_ms();
        let mut jobs = self.jobs.write();
        let Some(slot) = jobs.get_mut(&item.job_id) else { return };
        match result {
            Ok(()) if item.cancel.is_cancelled() => slot.job.cancel(now),
            Ok(()) => slot.job.complete(now),
            Err(err) => slot.job.fail(err.to_string(), now),
        }
        let job = slot.job.clone();
        drop(jobs);
        self.observer.on_job_event(&job);
    }

    async fn run_job(
        &self,
        item: &WorkItem,
        job_type: JobType,
        source_virtual: &str,
        dest_virtual: Option<&str>,
    ) -> Result<()> {
        // Copy only reads its source; move and delete mutate it, so those
        // two require the source mount to be writable too.
        let source_requires_write = !matches!(job_type, JobType::Copy);
        let src = self.registry.resolve(source_virtual, source_requires_write)?;
        match job_type {
            JobType::Copy => {
                let dest_virtual = dest_virtual.ok_or_else(|| Error::InvalidJobParams("copy requires dest_path".into()))?;
                let dst = self.registry.resolve(dest_virtual, true)?;
                self.run_copy(item, &src.host_path, &dst.host_path).await
            }
            JobType::Move => {
                let dest_virtual = dest_virtual.ok_or_else(|| Error::InvalidJobParams("move requires dest_path".into()))?;
                let dst = self.registry.resolve(dest_virtual, true)?;
                self.run_move(item, &src.host_path, &dst.host_path).await
            }
            JobType::Delete => self.run_delete(item, &src.host_path).await,
        }
    }

    /// Copy `src` to `dest`. A copy cancelled mid-flight (directory or
    /// single file) leaves the destination scrubbed rather than partial or
    /// complete, the same cleanup `run_move` applies to its own copy phase
    /// (spec.md §4.6 "on cancellation the worker cleans up — remove partial
    /// destination for copy/move").
    async fn run_copy(&self, item: &WorkItem, src: &std::path::Path, dest: &std::path::Path) -> Result<()> {
        let meta = self.fs.stat(src).await?;
        if meta.is_dir {
            let progress = self.progress_reporter(item.job_id);
            ops::copy_tree(self.fs.as_ref(), src, dest, &item.cancel, move |done, total| {
                progress((done * 100 / total.max(1)) as u8);
            })
            .await?;
        } else {
            let total = meta.size.max(1);
            let progress = self.progress_reporter(item.job_id);
            ops::copy_file(self.fs.as_ref(), src, dest, &item.cancel, move |bytes| {
                progress(((bytes * 100) / total) as u8);
            })
            .await?;
        }

        if item.cancel.is_cancelled() {
            let scrub = CancellationToken::new();
            let _ = self.fs.remove_tree(dest, &scrub).await;
        }
        Ok(())
    }

    async fn run_move(&self, item: &WorkItem, src: &std::path::Path, dest: &std::path::Path) -> Result<()> {
        let progress = self.progress_reporter(item.job_id);
        ops::move_path(self.fs.as_ref(), src, dest, &item.cancel, move |done, total| {
            progress((done * 100 / total.max(1)) as u8);
        })
        .await
    }

    async fn run_delete(&self, item: &WorkItem, target: &std::path::Path) -> Result<()> {
        let progress = self.progress_reporter(item.job_id);
        ops::delete_path(self.fs.as_ref(), target, &item.cancel, move |done, total| {
            progress((done * 100 / total.max(1)) as u8);
        })
        .await
    }

    /// Build a closure that updates a job's stored progress and broadcasts
    /// through the observer only when the integer percent actually changes
    /// (spec.md §4.6: "broadcasting when the integer percent changes").
    fn progress_reporter(&self, job_id: JobId) -> impl Fn(u8) + Send + 'static {
        let jobs = self.jobs.clone();
        let observer = self.observer.clone();
        move |percent: u8| {
            let changed = {
                let mut jobs = jobs.write();
                match jobs.get_mut(&job_id) {
                    Some(slot) => {
                        let before = slot.job.progress;
                        slot.job.set_progress(percent);
                        slot.job.progress != before
                    }
                    None => false,
                }
            };
            if changed {
                if let Some(job) = jobs.read().get(&job_id).map(|s| s.job.clone()) {
                    observer.on_job_event(&job);
                }
            }
        }
    }
}
