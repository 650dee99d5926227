//! The loader thread
//!
//! One iteration: wait on the ready signal, make sure the device can take
//! uploads, pop the front request, resolve it, raise the result. The
//! request lock is only held for the pop.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::gpu::{RecoveryState, RenderDevice};
use crate::loader::dispatch::ResultDispatcher;
use crate::state::{LoaderStats, PathRequest, ReadySignal, RequestSet, ResultArgs};
use crate::thumbnail::Resolver;

/// State shared between the `Loader` handle and its thread
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub requests: parking_lot::Mutex<RequestSet>,
    pub signal: ReadySignal,
    pub quit: AtomicBool,
    pub dispatcher: Arc<ResultDispatcher>,
    pub counters: Counters,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub signals: AtomicUsize,
    pub reprioritized: AtomicUsize,
    pub serviced: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub thumbnails: AtomicUsize,
    pub failed_candidates: AtomicUsize,
}

impl Counters {
    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoaderStats {
        LoaderStats {
            signals: self.signals.load(Ordering::Relaxed),
            reprioritized: self.reprioritized.load(Ordering::Relaxed),
            serviced: self.serviced.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            thumbnails: self.thumbnails.load(Ordering::Relaxed),
            failed_candidates: self.failed_candidates.load(Ordering::Relaxed),
        }
    }
}

/// Why the loader thread returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Shutdown was requested
    Quit,
    /// The device was released while the loader still ran
    DeviceGone,
    /// The ready signal fired but there was nothing queued
    QueueInvariant,
}

pub(crate) struct Worker {
    pub shared: Arc<Shared>,
    pub device: Weak<dyn RenderDevice>,
    pub resolver: Resolver,
    pub poll_interval: Duration,
}

impl Worker {
    pub fn run(self) -> WorkerExit {
        debug!("thumbnail loader thread running");

        loop {
            let claim = self.shared.signal.decrement();

            if self.quit_requested() {
                return WorkerExit::Quit;
            }

            let device = match self.acquire_device() {
                Ok(device) => device,
                Err(exit) => return exit,
            };

            let request = match self.pop(claim) {
                Ok(Some(request)) => request,
                // a `stop` drained the request this unit stood for
                Ok(None) => continue,
                Err(exit) => return exit,
            };

            Counters::add(&self.shared.counters.serviced, 1);
            debug!(path = %request.path().display(), "resolving thumbnail request");

            let resolution = self.resolver.resolve(&device, &request);
            drop(device);

            Counters::add(&self.shared.counters.thumbnails, resolution.thumbnails.len());
            Counters::add(&self.shared.counters.failed_candidates, resolution.failed);
            debug!(
                path = %request.path().display(),
                thumbnails = resolution.thumbnails.len(),
                failed = resolution.failed,
                "thumbnail request resolved"
            );

            self.shared
                .dispatcher
                .raise(&ResultArgs::completed(request, resolution.thumbnails));
        }
    }

    fn quit_requested(&self) -> bool {
        self.shared.quit.load(Ordering::SeqCst)
    }

    /// Wait out a lost device; fail if it is gone for good
    fn acquire_device(&self) -> Result<Arc<dyn RenderDevice>, WorkerExit> {
        let mut waiting = false;

        loop {
            let Some(device) = self.device.upgrade().filter(|device| device.is_present()) else {
                // the owner must shut the loader down before releasing the device
                error!("render device is gone while the thumbnail loader is running");
                return Err(WorkerExit::DeviceGone);
            };

            if device.recovery_state() == RecoveryState::Operational {
                if waiting {
                    info!("render device recovered");
                }
                return Ok(device);
            }

            if !waiting {
                info!("render device lost, waiting for it to recover");
                waiting = true;
            }

            drop(device);
            thread::sleep(self.poll_interval);

            if self.quit_requested() {
                return Err(WorkerExit::Quit);
            }
        }
    }

    /// Pop the front request for a unit claimed in generation `claim`
    ///
    /// `Ok(None)` when a reset has voided the claim: the request it stood
    /// for was cancelled, and any newer requests carry their own units.
    fn pop(&self, claim: u64) -> Result<Option<PathRequest>, WorkerExit> {
        let mut requests = self.shared.requests.lock();

        if self.shared.signal.generation() != claim {
            debug!("ready signal was reset since it fired, waiting again");
            return Ok(None);
        }

        match requests.remove_front() {
            Some(request) => Ok(Some(request)),
            None => {
                error!("ready signal fired with an empty request queue, bookkeeping is broken");
                Err(WorkerExit::QueueInvariant)
            }
        }
    }
}
