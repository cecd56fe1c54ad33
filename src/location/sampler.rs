//! Periodic, restartable location sampling.
//!
//! A [`Sampler`] owns one provider and polls it on a background thread. Every
//! result is stamped with the sampler generation and a per-run sequence number
//! before it is handed to the caller's `emit` callback:
//!
//! - `generation` increases on every `start`/`restart`/`stop`. A message whose
//!   generation is not the current one belongs to a cancelled run and must be
//!   discarded ([`Sampler::is_current`]).
//! - `sequence` increases by one per message within a run.
//!
//! Stopping never joins the worker: an acquisition may be blocked inside the
//! provider for up to the sample timeout, and the core loop must not wait for
//! it. The worker notices the generation change once the call returns and exits
//! without emitting.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{LocationError, LocationFix, LocationProvider};

/// One sampling result on its way to the core loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMessage {
    pub generation: u64,
    pub sequence: u64,
    pub result: Result<LocationFix, LocationError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

type SharedProvider = Arc<Mutex<Box<dyn LocationProvider>>>;

struct Run {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct Sampler {
    generation: Arc<AtomicU64>,
    provider: Option<SharedProvider>,
    provider_name: Option<&'static str>,
    settings: Option<SamplerSettings>,
    run: Option<Run>,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start sampling `provider`, replacing any previous provider and run.
    ///
    /// The first sample is taken immediately. `emit` returning `false` ends the
    /// run (the receiving side has gone away). Returns the new generation.
    pub fn start<F>(
        &mut self,
        provider: Box<dyn LocationProvider>,
        settings: SamplerSettings,
        emit: F,
    ) -> Result<u64>
    where
        F: FnMut(SampleMessage) -> bool + Send + 'static,
    {
        self.provider_name = Some(provider.name());
        self.provider = Some(Arc::new(Mutex::new(provider)));
        self.settings = Some(settings);
        self.spawn(emit)
    }

    /// Start a new run with the current provider, optionally with new settings.
    pub fn restart<F>(&mut self, settings: Option<SamplerSettings>, emit: F) -> Result<u64>
    where
        F: FnMut(SampleMessage) -> bool + Send + 'static,
    {
        if settings.is_some() {
            self.settings = settings;
        }
        self.spawn(emit)
    }

    /// Cancel the current run. Any in-flight result becomes stale.
    pub fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(run) = self.run.take() {
            let _ = run.stop_tx.send(());
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether `message` comes from the active run.
    pub fn is_current(&self, message: &SampleMessage) -> bool {
        self.run.is_some() && message.generation == self.generation()
    }

    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider_name
    }

    fn spawn<F>(&mut self, mut emit: F) -> Result<u64>
    where
        F: FnMut(SampleMessage) -> bool + Send + 'static,
    {
        let (Some(provider), Some(settings)) = (self.provider.clone(), self.settings) else {
            anyhow::bail!("Sampler has no location provider");
        };

        self.stop();
        let generation = self.generation();
        let current = Arc::clone(&self.generation);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("mimicoach-sampler".to_string())
            .spawn(move || {
                let mut sequence = 0;
                loop {
                    let result = {
                        let mut guard = match provider.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        // A previous run may still hold the lock; recheck once we have it
                        if current.load(Ordering::SeqCst) != generation {
                            return;
                        }
                        guard.current_location(settings.timeout)
                    };

                    if current.load(Ordering::SeqCst) != generation {
                        return;
                    }

                    sequence += 1;
                    if !emit(SampleMessage {
                        generation,
                        sequence,
                        result,
                    }) {
                        return;
                    }

                    match stop_rx.recv_timeout(settings.poll_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
            })
            .context("Failed to spawn the location sampler thread")?;

        self.run = Some(Run { stop_tx, handle });
        Ok(generation)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}
