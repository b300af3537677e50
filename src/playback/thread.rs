//! Coordinator thread
//!
//! Runs the `Coordinator` on a dedicated thread together with the remote
//! command router and the interruption policy. Everything that touches
//! playback state arrives through one queue and is applied in order, so
//! no lock is held across a transition.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

use super::coordinator::Coordinator;
use super::events::{Command, CoordinatorMessage, CoordinatorReceiver, coordinator_channel};
use super::handle::CoordinatorHandle;
use super::state::SharedPlaybackState;
use crate::engine::PlayerEngine;
use crate::interruption::InterruptionPolicy;
use crate::metadata::{LoftyMetadataSource, MetadataPipeline, MetadataSource};
use crate::now_playing::NowPlayingPublisher;
use crate::observer::{EventBus, ObserverRegistry};
use crate::remote::RemoteCommandRouter;
use crate::resource::{DefaultResolver, ResourceResolver};
use crate::settings::Settings;

/// Collaborators handed to [`spawn_coordinator`]
pub struct CoordinatorParts {
    pub settings: Settings,
    pub resolver: Arc<dyn ResourceResolver>,
    pub metadata_source: Arc<dyn MetadataSource>,
    /// Runtime for metadata work; the ambient runtime is used when unset
    pub runtime: Option<tokio::runtime::Handle>,
    pub now_playing: Option<Box<dyn NowPlayingPublisher>>,
}

impl CoordinatorParts {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            resolver: Arc::new(DefaultResolver::default()),
            metadata_source: Arc::new(LoftyMetadataSource),
            runtime: None,
            now_playing: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata_source = source;
        self
    }

    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_now_playing(mut self, publisher: Box<dyn NowPlayingPublisher>) -> Self {
        self.now_playing = Some(publisher);
        self
    }
}

impl Default for CoordinatorParts {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// Owner of the coordinator thread
///
/// Dropping it asks the thread to shut down without waiting.
pub struct CoordinatorThread {
    handle: CoordinatorHandle,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CoordinatorThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorThread")
            .field("handle", &self.handle)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl CoordinatorThread {
    pub fn handle(&self) -> &CoordinatorHandle {
        &self.handle
    }

    /// Detach the engine and wait up to `timeout` for the thread to exit
    pub fn shutdown(mut self, timeout: Duration) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        self.handle.request_shutdown();

        let start = Instant::now();
        loop {
            if thread.is_finished() {
                if thread.join().is_err() {
                    bail!("Coordinator thread panicked");
                }
                return Ok(());
            }
            if start.elapsed() > timeout {
                bail!("Coordinator thread did not exit in time");
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for CoordinatorThread {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.handle.request_shutdown();
        }
    }
}

/// Spawn the coordinator thread around `engine`
///
/// Metadata resolution runs on `parts.runtime`, or on the runtime this is
/// called from. Without either, only the item's supplied text fields are
/// shown.
pub fn spawn_coordinator<E>(engine: E, parts: CoordinatorParts) -> Result<CoordinatorThread>
where
    E: PlayerEngine + 'static,
{
    let CoordinatorParts {
        settings,
        resolver,
        metadata_source,
        runtime,
        now_playing,
    } = parts;

    settings.validate().context("Invalid coordinator settings")?;

    let (tx, rx) = coordinator_channel();
    let shared = SharedPlaybackState::new();
    let observers = ObserverRegistry::new();
    let bus = EventBus::default();

    let router = RemoteCommandRouter::new(&settings.remote);
    let policy = InterruptionPolicy::new(settings.playback.should_resume_when_interrupt_ended);

    let runtime = runtime.or_else(|| tokio::runtime::Handle::try_current().ok());
    if runtime.is_none() {
        tracing::warn!("No tokio runtime available, metadata resolution disabled");
    }

    let mut coordinator = Coordinator::new(engine, settings, tx.clone())
        .with_resolver(resolver)
        .with_observers(observers.clone())
        .with_event_bus(bus.clone())
        .with_shared_state(shared.clone());
    if let Some(runtime) = runtime {
        coordinator = coordinator.with_metadata_pipeline(MetadataPipeline::new(
            runtime,
            tx.clone(),
            metadata_source,
        ));
    }
    if let Some(publisher) = now_playing {
        coordinator = coordinator.with_now_playing(publisher);
    }

    let handle = CoordinatorHandle::new(tx, shared, observers, bus);

    let thread = thread::Builder::new()
        .name("cadenza-coordinator".to_string())
        .spawn(move || coordinator_thread_main(coordinator, rx, router, policy))
        .context("Failed to spawn coordinator thread")?;

    Ok(CoordinatorThread {
        handle,
        thread: Some(thread),
    })
}

/// Main loop for the coordinator thread
///
/// Blocks on `rx.blocking_recv()` until `Shutdown` arrives. The coordinator
/// holds senders of its own queue (engine callbacks, metadata workers), so
/// the channel never closes on its own while it is alive.
fn coordinator_thread_main<E: PlayerEngine>(
    mut coordinator: Coordinator<E>,
    mut rx: CoordinatorReceiver,
    mut router: RemoteCommandRouter,
    mut policy: InterruptionPolicy,
) {
    tracing::info!("Coordinator thread started");

    while let Some(message) = rx.blocking_recv() {
        match message {
            CoordinatorMessage::Control(Command::UpdateSettings(settings)) => {
                coordinator.update_settings(*settings);
                let applied = coordinator.settings();
                router.update_settings(&applied.remote);
                policy.set_should_resume(applied.playback.should_resume_when_interrupt_ended);
            }
            CoordinatorMessage::Control(command) => coordinator.handle_command(command),
            CoordinatorMessage::Engine(event) => coordinator.handle_engine_event(event),
            CoordinatorMessage::Metadata(update) => coordinator.handle_metadata(update),
            CoordinatorMessage::Interruption(event) => {
                policy.handle_interruption(event, &mut coordinator)
            }
            CoordinatorMessage::RouteChange(reason) => {
                policy.handle_route_change(reason, &mut coordinator)
            }
            CoordinatorMessage::Remote { command, reply } => {
                let status = router.handle(command, &mut coordinator);
                if let Some(reply) = reply {
                    let _ = reply.send(status);
                }
            }
            CoordinatorMessage::RemoteConfig(config) => router.apply(config),
            CoordinatorMessage::Shutdown => break,
        }
    }

    coordinator.shutdown();
    tracing::info!("Coordinator thread exiting");
}
