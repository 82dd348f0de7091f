//! Packets: what happens when a button fires
//!
//! A packet is immutable configuration plus behaviour. Buttons share their
//! packets between instances; every mutable touch state lives in the button.
//!
//! Every packet follows the same protocol:
//!
//! * `send` performs the primary effect;
//! * `send_secondary` runs on a secondary gesture, by default it re-sends a
//!   repeating packet and asks for immediate repeat;
//! * `release` ends the packet, consuming one-shot metas.

use super::error::BoardError;
use super::meta::apply_caps;
use crate::connection::{AutoSpace, ContextAction, KeyCode, Movement, SoftBoardListener};
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::fmt::{self, Write};
use std::str::FromStr;
use tracing::{debug, warn};

/// Editor functions without text of their own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    DeleteBefore,
    DeleteAfter,
    SelectAll,
    Copy,
    Cut,
    Paste,
    UndoString,
    ClearMeta,
    ToggleAbbreviation(String),
    Modify { reverse: bool },
    InvalidateText,
}

impl FromStr for Function {
    type Err = BoardError;

    /// Parses `delete_before`, `modify_reverse`, `abbreviation:<id>` and the like
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if let Some(id) = name.strip_prefix("abbreviation:") {
            if id.is_empty() {
                return Err(BoardError::InvalidExternalData(
                    "abbreviation function without shortcut id".to_string(),
                ));
            }
            return Ok(Function::ToggleAbbreviation(id.to_string()));
        }
        match name {
            "delete_before" => Ok(Function::DeleteBefore),
            "delete_after" => Ok(Function::DeleteAfter),
            "select_all" => Ok(Function::SelectAll),
            "copy" => Ok(Function::Copy),
            "cut" => Ok(Function::Cut),
            "paste" => Ok(Function::Paste),
            "undo_string" => Ok(Function::UndoString),
            "clear_meta" => Ok(Function::ClearMeta),
            "modify" => Ok(Function::Modify { reverse: false }),
            "modify_reverse" => Ok(Function::Modify { reverse: true }),
            "invalidate" => Ok(Function::InvalidateText),
            other => Err(BoardError::InvalidExternalData(format!(
                "unknown function {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::DeleteBefore => write!(f, "DEL"),
            Function::DeleteAfter => write!(f, "FDEL"),
            Function::SelectAll => write!(f, "ALL"),
            Function::Copy => write!(f, "COPY"),
            Function::Cut => write!(f, "CUT"),
            Function::Paste => write!(f, "PASTE"),
            Function::UndoString => write!(f, "UNDO"),
            Function::ClearMeta => write!(f, "CLR"),
            Function::ToggleAbbreviation(id) => write!(f, "{}", id),
            Function::Modify { reverse: false } => write!(f, "MOD"),
            Function::Modify { reverse: true } => write!(f, "DOM"),
            Function::InvalidateText => write!(f, "SYNC"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PacketKind {
    Text { text: String, auto_space: AutoSpace },
    Key { code: KeyCode },
    Function(Function),
    Run { package: String },
    Combine(Vec<Packet>),
    Move { movement: Movement, select: bool },
    TextTime { format: String },
    /// Legend `index` of the active group of `varia`
    Varia { varia: String, index: usize },
}

#[derive(Debug, Clone)]
pub struct Packet {
    title: Option<String>,
    repeat: bool,
    kind: PacketKind,
}

impl Packet {
    fn from_kind(kind: PacketKind) -> Self {
        Self {
            title: None,
            repeat: false,
            kind,
        }
    }

    pub fn text(text: impl Into<String>, auto_space: AutoSpace) -> Self {
        Self::from_kind(PacketKind::Text {
            text: text.into(),
            auto_space,
        })
    }

    pub fn key(code: KeyCode) -> Self {
        Self::from_kind(PacketKind::Key { code })
    }

    pub fn function(function: Function) -> Self {
        Self::from_kind(PacketKind::Function(function))
    }

    pub fn run(package: impl Into<String>) -> Self {
        Self::from_kind(PacketKind::Run {
            package: package.into(),
        })
    }

    pub fn combine(packets: Vec<Packet>) -> Result<Self, BoardError> {
        if packets.is_empty() {
            return Err(BoardError::InvalidExternalData(
                "combine packet without packets".to_string(),
            ));
        }
        Ok(Self::from_kind(PacketKind::Combine(packets)))
    }

    pub fn movement(movement: Movement, select: bool) -> Self {
        Self::from_kind(PacketKind::Move { movement, select })
    }

    /// Current local time formatted with a strftime pattern
    pub fn text_time(format: impl Into<String>) -> Result<Self, BoardError> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(BoardError::InvalidExternalData(format!(
                "invalid time format {:?}",
                format
            )));
        }
        Ok(Self::from_kind(PacketKind::TextTime { format }))
    }

    pub fn varia(varia: impl Into<String>, index: usize) -> Self {
        Self::from_kind(PacketKind::Varia {
            varia: varia.into(),
            index,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn kind(&self) -> &PacketKind {
        &self.kind
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    /// Shortcut set ids this packet toggles, including inside combines
    pub fn abbreviation_keys(&self) -> Vec<&str> {
        match &self.kind {
            PacketKind::Function(Function::ToggleAbbreviation(id)) => vec![id.as_str()],
            PacketKind::Combine(packets) => packets
                .iter()
                .flat_map(Packet::abbreviation_keys)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn send(&self, listener: &mut dyn SoftBoardListener) {
        match &self.kind {
            PacketKind::Text { text, auto_space } => {
                let text = apply_caps(text, listener.meta_state().caps_mode());
                listener.send_string(&text, *auto_space);
            }
            PacketKind::Key { code } => listener.send_key_down_up(*code),
            PacketKind::Function(function) => send_function(function, listener),
            PacketKind::Run { package } => {
                if !listener.launch(package) {
                    warn!("Could not launch {:?}", package);
                }
            }
            PacketKind::Combine(packets) => {
                for packet in packets {
                    packet.send(listener);
                }
            }
            PacketKind::Move { movement, select } => {
                if !listener.move_cursor(*movement, *select) {
                    debug!("Cursor move {:?} not possible", movement);
                }
            }
            PacketKind::TextTime { format } => match format_now(format) {
                Ok(text) => listener.send_string(&text, AutoSpace::NONE),
                Err(_) => warn!("Time format {:?} failed", format),
            },
            PacketKind::Varia { varia, index } => send_varia(varia, *index, listener),
        }
    }

    /// Returns `true` when the packet wants to be repeated immediately
    pub fn send_secondary(&self, listener: &mut dyn SoftBoardListener) -> bool {
        if self.repeat {
            self.send(listener);
            return true;
        }
        false
    }

    pub fn release(&self, listener: &mut dyn SoftBoardListener) {
        match &self.kind {
            PacketKind::Combine(packets) => {
                for packet in packets.iter().rev() {
                    packet.release(listener);
                }
            }
            _ => listener.packet_released(),
        }
    }

    pub fn title(&self, listener: &dyn SoftBoardListener) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        match &self.kind {
            PacketKind::Text { text, .. } => {
                apply_caps(text, listener.meta_state().caps_mode())
            }
            PacketKind::Key { code } => key_title(*code),
            PacketKind::Function(Function::ToggleAbbreviation(id)) => {
                if listener.is_active_short_cut(id) {
                    id.to_uppercase()
                } else {
                    id.clone()
                }
            }
            PacketKind::Function(function) => function.to_string(),
            PacketKind::Run { package } => package
                .rsplit('.')
                .next()
                .unwrap_or(package.as_str())
                .to_string(),
            PacketKind::Combine(packets) => packets
                .first()
                .map(|packet| packet.title(listener))
                .unwrap_or_default(),
            PacketKind::Move { movement, .. } => movement_title(*movement).to_string(),
            PacketKind::TextTime { format } => format_now(format).unwrap_or_default(),
            PacketKind::Varia { varia, index } => listener
                .varia_legend(varia, *index)
                .map(|legend| legend.title().to_string())
                .unwrap_or_default(),
        }
    }
}

fn send_function(function: &Function, listener: &mut dyn SoftBoardListener) {
    match function {
        Function::DeleteBefore => listener.delete_char_before_cursor(1),
        Function::DeleteAfter => listener.delete_char_after_cursor(1),
        Function::SelectAll => {
            listener.context_action(ContextAction::SelectAll);
        }
        Function::Copy => {
            listener.context_action(ContextAction::Copy);
        }
        Function::Cut => {
            listener.context_action(ContextAction::Cut);
        }
        Function::Paste => {
            listener.context_action(ContextAction::Paste);
        }
        Function::UndoString => {
            if !listener.undo_last_string() {
                debug!("Nothing to undo");
            }
        }
        Function::ClearMeta => listener.meta_state_mut().clear(),
        Function::ToggleAbbreviation(id) => listener.toggle_abbreviation(id),
        Function::Modify { reverse } => {
            if !listener.modify_text(*reverse) {
                debug!("Nothing to modify before the cursor");
            }
        }
        Function::InvalidateText => listener.invalidate_text(),
    }
}

fn send_varia(varia: &str, index: usize, listener: &mut dyn SoftBoardListener) {
    let Some(legend) = listener.varia_legend(varia, index) else {
        warn!("Varia {:?} has no legend {}", varia, index);
        return;
    };

    // A kept code is only replaced while nothing was edited after it
    match listener.take_kept_code(varia) {
        Some(kept) if listener.check_process_counter(kept.counter) => {
            listener.change_string_before_cursor(kept.length, legend.text());
        }
        _ => listener.send_string(legend.text(), AutoSpace::NONE),
    }
}

fn format_now(format: &str) -> Result<String, fmt::Error> {
    let mut text = String::new();
    write!(text, "{}", Local::now().format(format))?;
    Ok(text)
}

fn key_title(code: KeyCode) -> String {
    match code {
        KeyCode::ENTER => "ENTER".to_string(),
        KeyCode::TAB => "TAB".to_string(),
        KeyCode::SPACE => "SPACE".to_string(),
        KeyCode::DEL => "DEL".to_string(),
        KeyCode::FORWARD_DEL => "FDEL".to_string(),
        KeyCode::ESCAPE => "ESC".to_string(),
        KeyCode::DPAD_LEFT => "LEFT".to_string(),
        KeyCode::DPAD_RIGHT => "RIGHT".to_string(),
        KeyCode::DPAD_UP => "UP".to_string(),
        KeyCode::DPAD_DOWN => "DOWN".to_string(),
        KeyCode::MOVE_HOME => "HOME".to_string(),
        KeyCode::MOVE_END => "END".to_string(),
        KeyCode(other) => format!("#{}", other),
    }
}

fn movement_title(movement: Movement) -> &'static str {
    match movement {
        Movement::CharLeft => "<",
        Movement::CharRight => ">",
        Movement::WordLeft => "<<",
        Movement::WordRight => ">>",
        Movement::LineStart => "|<",
        Movement::LineEnd => ">|",
    }
}
