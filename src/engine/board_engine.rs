//! Board engine with statum state machine
//!
//! # State Machine
//!
//! ```text
//! Idle ──(start)──► Running ──(run_until_shutdown)──► Stopped
//! ```
//!
//! # Architecture
//!
//! ```text
//! TouchEvent ──► mpsc ──► [BoardEngine task] ──► watch ──► BoardSnapshot
//!                          │ buttons
//!                          │ SoftBoardService ──► Connection
//! ```
//!
//! A stay secondary that asks for repetition is fired again every repeat
//! interval until its button is released.

use super::{BoardSnapshot, EngineError, TouchEvent};
use crate::board::{Button, ON_STAY};
use crate::connection::{EditorSink, SoftBoardListener, SoftBoardService};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_SIZE: usize = 100;

#[state]
#[derive(Debug, Clone)]
pub enum BoardEngineState {
    Idle,    // Built, nothing published yet
    Running, // Handling touch events
    Stopped, // Loop ended, service can be taken back
}

#[machine]
pub struct BoardEngine<S: BoardEngineState> {
    service: SoftBoardService,
    buttons: Vec<Button>,
    events: mpsc::Receiver<TouchEvent>,
    snapshot_sender: watch::Sender<BoardSnapshot>,
    repeat_interval: Duration,
    // Button whose stay secondary repeats, and when it fires next
    repeating: Option<(usize, Instant)>,
    handled_events: u64,
}

impl<S: BoardEngineState> BoardEngine<S> {
    pub fn service(&self) -> &SoftBoardService {
        &self.service
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            titles: self
                .buttons
                .iter()
                .map(|button| button.title(&self.service))
                .collect(),
            meta: self.service.meta_state().levels(),
            board: self.service.board_table().active().to_string(),
            active_short_cut: self.service.active_short_cut().map(str::to_string),
            process_counter: self.service.get_process_counter(),
            storing_text: self.service.is_store_text_enabled(),
            handled_events: self.handled_events,
        }
    }

    fn publish(&self) {
        // Nobody listening is fine, the last snapshot stays readable
        self.snapshot_sender.send_replace(self.snapshot());
    }
}

impl BoardEngine<Idle> {
    pub fn create(
        service: SoftBoardService,
        buttons: Vec<Button>,
        events: mpsc::Receiver<TouchEvent>,
        snapshot_sender: watch::Sender<BoardSnapshot>,
        repeat_interval: Duration,
    ) -> Self {
        info!("Creating board engine with {} buttons", buttons.len());
        Self::new(
            service,
            buttons,
            events,
            snapshot_sender,
            repeat_interval,
            None, // repeating
            0,    // handled_events
        )
    }

    pub fn start(self) -> BoardEngine<Running> {
        self.publish();
        info!("Board engine running");
        self.transition()
    }
}

impl BoardEngine<Running> {
    /// Dispatches one touch event to its button and publishes the result
    pub fn handle_event(&mut self, event: TouchEvent) {
        debug!("Handling {:?}", event);
        match event {
            TouchEvent::MainStart {
                button,
                is_touch_down,
            } => {
                if let Some(target) = self.buttons.get_mut(button) {
                    target.main_touch_start(&mut self.service, is_touch_down);
                } else {
                    warn!("Touch on unknown button {}", button);
                }
            }
            TouchEvent::Secondary { button, kind } => {
                if let Some(target) = self.buttons.get_mut(button) {
                    if target.main_touch_secondary(&mut self.service, kind) && kind == ON_STAY {
                        self.repeating = Some((button, Instant::now() + self.repeat_interval));
                    }
                } else {
                    warn!("Secondary on unknown button {}", button);
                }
            }
            TouchEvent::MainEnd {
                button,
                is_touch_up,
            } => {
                if self.repeating.is_some_and(|(repeating, _)| repeating == button) {
                    self.repeating = None;
                }
                if let Some(target) = self.buttons.get_mut(button) {
                    target.main_touch_end(&mut self.service, is_touch_up);
                } else {
                    warn!("Release on unknown button {}", button);
                }
            }
            TouchEvent::MultiTouch { button, phase } => {
                if let Some(target) = self.buttons.get_mut(button) {
                    target.multi_touch_event(&mut self.service, phase);
                } else {
                    warn!("Multi-touch {:?} on unknown button {}", phase, button);
                }
            }
            TouchEvent::EditorChanged => {
                debug!("Editor changed outside the keyboard");
                self.service.editor_changed();
            }
        }
        self.handled_events += 1;
        self.publish();
    }

    /// Fires the pending stay repeat
    fn repeat(&mut self) {
        let Some((button, _)) = self.repeating.take() else {
            return;
        };
        let Some(target) = self.buttons.get_mut(button) else {
            return;
        };
        if target.main_touch_secondary(&mut self.service, ON_STAY) {
            self.repeating = Some((button, Instant::now() + self.repeat_interval));
        }
        self.publish();
    }

    /// Main loop: events first, then shutdown, then pending repeats
    ///
    /// Events already queued when the shutdown arrives are still handled.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> BoardEngine<Stopped> {
        info!("Starting touch event loop");

        loop {
            let repeat_at = self.repeating.map(|(_, at)| at);
            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("Touch event channel closed");
                        break;
                    }
                },

                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received");
                    break;
                }

                _ = sleep_until(repeat_at.unwrap_or_else(Instant::now)), if repeat_at.is_some() => {
                    self.repeat();
                }
            }
        }

        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
        self.transition()
    }
}

impl BoardEngine<Stopped> {
    pub fn into_service(self) -> SoftBoardService {
        info!(
            "Board engine stopped after {} events",
            self.handled_events
        );
        self.service
    }
}

/// Handle for a board engine running in a tokio task
pub struct BoardEngineHandle {
    event_sender: mpsc::Sender<TouchEvent>,
    snapshot_receiver: watch::Receiver<BoardSnapshot>,
    task_handle: Option<JoinHandle<SoftBoardService>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl BoardEngineHandle {
    /// Starts an engine owning `service` and `buttons` in a tokio task
    pub fn spawn(service: SoftBoardService, buttons: Vec<Button>, repeat_interval: Duration) -> Self {
        let (event_sender, event_receiver) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (snapshot_sender, snapshot_receiver) = watch::channel(BoardSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let engine = BoardEngine::<Idle>::create(
            service,
            buttons,
            event_receiver,
            snapshot_sender,
            repeat_interval,
        )
        .start();

        let task_handle = tokio::spawn(async move {
            info!("Spawning board engine");
            engine.run_until_shutdown(shutdown_rx).await.into_service()
        });

        Self {
            event_sender,
            snapshot_receiver,
            task_handle: Some(task_handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub async fn send(&self, event: TouchEvent) -> Result<(), EngineError> {
        self.event_sender.send(event).await.map_err(|e| {
            error!("Failed to send touch event: {}", e);
            EngineError::ChannelError(format!("Failed to send touch event: {}", e))
        })
    }

    /// Sender for input layers that feed the engine themselves
    pub fn sender(&self) -> mpsc::Sender<TouchEvent> {
        self.event_sender.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshot_receiver.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> BoardSnapshot {
        self.snapshot_receiver.borrow().clone()
    }

    /// Stops the engine after the queued events and returns its service
    pub async fn shutdown(&mut self) -> Result<SoftBoardService, EngineError> {
        debug!("Sending shutdown signal to board engine");
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Board engine task already terminated");
            }
        }

        let Some(handle) = self.task_handle.take() else {
            return Err(EngineError::NotRunning(
                "board engine already shut down".to_string(),
            ));
        };
        match handle.await {
            Ok(service) => {
                debug!("Board engine task completed");
                Ok(service)
            }
            Err(e) => {
                error!("Board engine task panicked: {}", e);
                Err(EngineError::ThreadError(format!(
                    "Board engine task panicked: {}",
                    e
                )))
            }
        }
    }
}
