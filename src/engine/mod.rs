//! Board engine: the single owner of the keyboard state
//!
//! Touch events from the input layer arrive over an mpsc channel and are
//! handled strictly one after the other by one tokio task. That task owns the
//! [`SoftBoardService`](crate::connection::SoftBoardService) and every button
//! instance, so nothing inside needs a lock. After each event a
//! [`BoardSnapshot`] with the button titles and the modal state is published
//! on a watch channel for whoever draws the keyboard.

pub mod board_engine;
pub mod error;

pub use board_engine::{BoardEngine, BoardEngineHandle, BoardEngineState};
pub use error::EngineError;

use crate::board::{MetaLevel, MultiTouchPhase};
use serde::Deserialize;

/// Touch input addressed to a button by its index on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TouchEvent {
    MainStart {
        button: usize,
        #[serde(default = "touch_default")]
        is_touch_down: bool,
    },
    Secondary {
        button: usize,
        kind: i32,
    },
    MainEnd {
        button: usize,
        #[serde(default = "touch_default")]
        is_touch_up: bool,
    },
    MultiTouch {
        button: usize,
        phase: MultiTouchPhase,
    },
    /// The editor changed outside the keyboard
    EditorChanged,
}

fn touch_default() -> bool {
    true
}

/// State published after every handled event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub titles: Vec<String>,
    /// Shift, ctrl, alt and caps, in this order
    pub meta: [MetaLevel; 4],
    pub board: String,
    pub active_short_cut: Option<String>,
    pub process_counter: u64,
    pub storing_text: bool,
    pub handled_events: u64,
}
