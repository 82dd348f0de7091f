//! Active board selection driven by switch buttons
//!
//! A switch button held while another button is typed works as a momentary
//! switch: releasing it returns to the previous board. Tapping it without
//! typing locks the target board; tapping it again on a locked board returns
//! to the root board.

use super::error::BoardError;
use tracing::{debug, info, warn};

pub const ROOT_BOARD: &str = "main";

#[derive(Debug, Clone)]
pub struct BoardTable {
    boards: Vec<String>,
    active: usize,
    previous: usize,
    locked: bool,
    // Board index of a switch currently held down
    in_touch: Option<usize>,
    used: bool,
}

impl Default for BoardTable {
    fn default() -> Self {
        Self {
            boards: vec![ROOT_BOARD.to_string()],
            active: 0,
            previous: 0,
            locked: false,
            in_touch: None,
            used: false,
        }
    }
}

impl BoardTable {
    /// Board names, the first one is the root board
    pub fn new(boards: Vec<String>) -> Result<Self, BoardError> {
        if boards.is_empty() {
            return Err(BoardError::InvalidExternalData(
                "board table needs at least one board".to_string(),
            ));
        }
        for (index, board) in boards.iter().enumerate() {
            if boards[..index].contains(board) {
                return Err(BoardError::InvalidExternalData(format!(
                    "board {:?} defined twice",
                    board
                )));
            }
        }
        Ok(Self {
            boards,
            ..Self::default()
        })
    }

    pub fn contains(&self, board: &str) -> bool {
        self.position(board).is_some()
    }

    pub fn active(&self) -> &str {
        &self.boards[self.active]
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn position(&self, board: &str) -> Option<usize> {
        self.boards.iter().position(|known| known == board)
    }

    pub fn press(&mut self, board: &str) {
        let Some(target) = self.position(board) else {
            warn!("Switch to unknown board {:?}", board);
            return;
        };

        if target == self.active && self.locked && target != 0 {
            info!("Board {:?} unlocked, back to {:?}", board, self.boards[0]);
            self.active = 0;
            self.locked = false;
            self.in_touch = None;
            return;
        }

        self.previous = self.active;
        self.active = target;
        self.locked = false;
        self.in_touch = Some(target);
        self.used = false;
        debug!("Board {:?} in touch", board);
    }

    pub fn release(&mut self, board: &str) {
        let Some(target) = self.position(board) else {
            return;
        };
        if self.in_touch != Some(target) {
            return;
        }
        self.in_touch = None;

        if self.used {
            self.active = self.previous;
            debug!("Momentary board {:?} released", board);
        } else {
            self.locked = target != 0;
            info!("Board {:?} active (locked: {})", board, self.locked);
        }
    }

    /// Called after a packet: a held switch becomes momentary
    pub fn mark_used(&mut self) {
        if self.in_touch.is_some() {
            self.used = true;
        }
    }
}
