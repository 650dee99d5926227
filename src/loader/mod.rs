//! Background thumbnail loader
//!
//! `Loader` owns one worker thread and the queue feeding it:
//! - `enqueue` adds paths (new ones at the front, repeats moved to the front)
//! - the thread resolves one request at a time and raises a `ResultArgs`
//! - `stop` cancels everything not yet started, leaving the thread idle
//! - `shutdown` (or drop) ends the thread after any in-flight request
//!
//! The loader holds the render device weakly. Whoever owns the device
//! must shut the loader down before releasing it.

pub mod dispatch;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier, Weak};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::gpu::RenderDevice;
use crate::state::{AddOutcome, LoaderStats, PathRequest, ResultArgs};
use crate::thumbnail::{AssetClassifier, ExtensionClassifier, Resolver};

pub use dispatch::{ResultDispatcher, SubscriptionId};
use worker::{Counters, Shared, Worker, WorkerExit};

pub struct Loader {
    shared: Arc<Shared>,
    thumbnail_directory: PathBuf,
    worker: Option<JoinHandle<WorkerExit>>,
}

impl Loader {
    /// Spawn the loader thread with the default extension-based classifier
    pub fn start(device: Weak<dyn RenderDevice>, config: LoaderConfig) -> Result<Self> {
        let classifier = Arc::new(ExtensionClassifier::new(&config.shader_extension));
        Self::start_with_classifier(device, config, classifier)
    }

    /// Spawn the loader thread; returns once the thread is running
    pub fn start_with_classifier(
        device: Weak<dyn RenderDevice>,
        config: LoaderConfig,
        classifier: Arc<dyn AssetClassifier>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared::default());
        let worker = Worker {
            shared: Arc::clone(&shared),
            device,
            resolver: Resolver::new(
                config.thumbnail_directory.clone(),
                config.thumbnail_size,
                classifier,
            ),
            poll_interval: config.device_poll_interval(),
        };

        let started = Arc::new(Barrier::new(2));
        let handle = {
            let started = Arc::clone(&started);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || {
                    started.wait();
                    worker.run()
                })
                .map_err(Error::Spawn)?
        };
        started.wait();

        info!(
            thumbnail_directory = %config.thumbnail_directory.display(),
            "thumbnail loader started"
        );

        Ok(Self {
            shared,
            thumbnail_directory: config.thumbnail_directory,
            worker: Some(handle),
        })
    }

    /// Queue `paths`, returning how many were not already queued
    ///
    /// After the call the batch sits at the front in its own iteration
    /// order. Paths that were already waiting are moved up rather than
    /// queued twice, so each path still produces exactly one result.
    pub fn enqueue<I>(&self, paths: I) -> usize
    where
        I: IntoIterator,
        I::IntoIter: DoubleEndedIterator,
        I::Item: Into<PathRequest>,
    {
        let mut requests = self.shared.requests.lock();
        let mut added = 0;
        let mut reprioritized = 0;

        for path in paths.into_iter().rev() {
            match requests.add(path.into()) {
                AddOutcome::Added => {
                    self.shared.signal.increment();
                    added += 1;
                }
                AddOutcome::Reprioritized => reprioritized += 1,
            }
        }

        // at most the loader thread's own claim is missing from the count
        #[cfg(debug_assertions)]
        {
            let signalled = self.shared.signal.value();
            assert!(
                requests.len() >= signalled && requests.len() - signalled <= 1,
                "ready signal ({signalled}) out of step with the request queue ({})",
                requests.len()
            );
        }

        Counters::add(&self.shared.counters.signals, added);
        Counters::add(&self.shared.counters.reprioritized, reprioritized);
        debug!(added, reprioritized, pending = requests.len(), "enqueued thumbnail requests");

        added
    }

    /// Cancel every request that has not started yet
    ///
    /// Raises a cancelled `ResultArgs` for each, front to back, before
    /// returning. A request the thread has already popped is unaffected.
    /// The request lock is held throughout, so subscribers must not call
    /// back into this loader from a cancellation.
    pub fn stop(&self) -> usize {
        let mut requests = self.shared.requests.lock();
        if requests.is_empty() {
            return 0;
        }

        let mut cancelled = 0;
        while let Some(request) = requests.remove_front() {
            self.shared.dispatcher.raise(&ResultArgs::cancelled(request));
            cancelled += 1;
        }
        self.shared.signal.reset();

        Counters::add(&self.shared.counters.cancelled, cancelled);
        debug!(cancelled, "cancelled pending thumbnail requests");

        cancelled
    }

    /// End the loader thread and wait for it
    ///
    /// A request already being resolved still completes and raises its
    /// result. Reports how the thread ended if it was not a clean quit.
    pub fn shutdown(mut self) -> Result<()> {
        self.join_worker()
    }

    fn join_worker(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };

        self.shared.quit.store(true, Ordering::SeqCst);
        self.shared.signal.increment();

        match handle.join() {
            Ok(WorkerExit::Quit) => {
                info!("thumbnail loader stopped");
                Ok(())
            }
            Ok(WorkerExit::DeviceGone) => Err(Error::DeviceGone),
            Ok(WorkerExit::QueueInvariant) => Err(Error::QueueInvariant),
            Err(_) => Err(Error::WorkerPanicked),
        }
    }

    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&ResultArgs) + Send + Sync + 'static,
    {
        self.shared.dispatcher.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.dispatcher.unsubscribe(id)
    }

    pub fn dispatcher(&self) -> Arc<ResultDispatcher> {
        Arc::clone(&self.shared.dispatcher)
    }

    /// Requests waiting to be serviced, front first
    pub fn pending(&self) -> Vec<PathRequest> {
        self.shared.requests.lock().iter().cloned().collect()
    }

    /// `false` once the thread has exited, e.g. after losing the device
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stats(&self) -> LoaderStats {
        self.shared.counters.snapshot()
    }

    pub fn thumbnail_directory(&self) -> &Path {
        &self.thumbnail_directory
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        if let Err(e) = self.join_worker() {
            error!("thumbnail loader ended abnormally: {e}");
        }
    }
}
