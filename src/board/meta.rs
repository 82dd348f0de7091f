//! Modal modifier state: shift, ctrl, alt and caps lock
//!
//! Each meta runs the same small cycle. Touching a meta button holds it
//! `InTouch`. Releasing it without typing anything meanwhile advances the
//! level it had before the touch (`Off → On → Lock → Off`); typing while it
//! was held makes it momentary and it falls back to `Off`. `On` is one-shot:
//! the next released packet consumes it.

use super::error::BoardError;
use crate::connection::MetaFlags;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaType {
    Shift = 0,
    Ctrl = 1,
    Alt = 2,
    Caps = 3,
}

impl MetaType {
    pub const ALL: [MetaType; 4] = [MetaType::Shift, MetaType::Ctrl, MetaType::Alt, MetaType::Caps];

    fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<i32> for MetaType {
    type Error = BoardError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MetaType::Shift),
            1 => Ok(MetaType::Ctrl),
            2 => Ok(MetaType::Alt),
            3 => Ok(MetaType::Caps),
            other => Err(BoardError::InvalidExternalData(format!(
                "meta type {} out of range 0..=3",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaLevel {
    #[default]
    Off,
    InTouch,
    On,
    Lock,
}

/// How typed letters are capitalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapsMode {
    None,
    First,
    All,
}

#[derive(Debug, Clone, Copy, Default)]
struct MetaSlot {
    level: MetaLevel,
    // Level before the current touch
    before_touch: MetaLevel,
    used: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MetaState {
    slots: [MetaSlot; 4],
}

impl MetaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, meta: MetaType) -> MetaLevel {
        self.slots[meta.index()].level
    }

    pub fn is_active(&self, meta: MetaType) -> bool {
        self.level(meta) != MetaLevel::Off
    }

    pub fn touch(&mut self, meta: MetaType) {
        let slot = &mut self.slots[meta.index()];
        if slot.level != MetaLevel::InTouch {
            slot.before_touch = slot.level;
        }
        slot.level = MetaLevel::InTouch;
        slot.used = false;
        debug!("{:?} in touch", meta);
    }

    pub fn release(&mut self, meta: MetaType) {
        let slot = &mut self.slots[meta.index()];
        if slot.level != MetaLevel::InTouch {
            return;
        }
        slot.level = if slot.used {
            MetaLevel::Off
        } else {
            match slot.before_touch {
                MetaLevel::Off | MetaLevel::InTouch => MetaLevel::On,
                MetaLevel::On => MetaLevel::Lock,
                MetaLevel::Lock => MetaLevel::Off,
            }
        };
        debug!("{:?} released to {:?}", meta, slot.level);
    }

    /// Abandons a touch, restoring the level it started from
    pub fn cancel(&mut self, meta: MetaType) {
        let slot = &mut self.slots[meta.index()];
        if slot.level == MetaLevel::InTouch {
            slot.level = slot.before_touch;
        }
    }

    /// Sets a meta directly, bypassing the touch cycle
    pub fn set(&mut self, meta: MetaType, level: MetaLevel) {
        let slot = &mut self.slots[meta.index()];
        slot.level = level;
        slot.before_touch = level;
        slot.used = false;
    }

    /// Called after a packet: held metas become momentary, one-shot metas end
    pub fn consume(&mut self) {
        for slot in &mut self.slots {
            match slot.level {
                MetaLevel::InTouch => slot.used = true,
                MetaLevel::On => slot.level = MetaLevel::Off,
                MetaLevel::Off | MetaLevel::Lock => {}
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    /// Flags for hard keys; caps never reaches the editor as a modifier
    pub fn flags(&self) -> MetaFlags {
        let mut flags = MetaFlags::NONE;
        if self.is_active(MetaType::Shift) {
            flags = flags | MetaFlags::SHIFT;
        }
        if self.is_active(MetaType::Ctrl) {
            flags = flags | MetaFlags::CTRL;
        }
        if self.is_active(MetaType::Alt) {
            flags = flags | MetaFlags::ALT;
        }
        flags
    }

    pub fn caps_mode(&self) -> CapsMode {
        if self.is_active(MetaType::Caps) || self.level(MetaType::Shift) == MetaLevel::Lock {
            CapsMode::All
        } else if self.is_active(MetaType::Shift) {
            CapsMode::First
        } else {
            CapsMode::None
        }
    }

    pub fn levels(&self) -> [MetaLevel; 4] {
        MetaType::ALL.map(|meta| self.level(meta))
    }
}

/// Applies `mode` to text about to be sent
pub fn apply_caps(text: &str, mode: CapsMode) -> String {
    match mode {
        CapsMode::None => text.to_string(),
        CapsMode::All => text.to_uppercase(),
        CapsMode::First => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_cycles_through_levels() {
        let mut meta = MetaState::new();
        for expected in [MetaLevel::On, MetaLevel::Lock, MetaLevel::Off] {
            meta.touch(MetaType::Shift);
            assert_eq!(meta.level(MetaType::Shift), MetaLevel::InTouch);
            meta.release(MetaType::Shift);
            assert_eq!(meta.level(MetaType::Shift), expected);
        }
    }

    #[test]
    fn used_meta_is_momentary() {
        let mut meta = MetaState::new();
        meta.touch(MetaType::Ctrl);
        meta.consume();
        meta.release(MetaType::Ctrl);
        assert_eq!(meta.level(MetaType::Ctrl), MetaLevel::Off);
    }

    #[test]
    fn one_shot_is_consumed_lock_is_not() {
        let mut meta = MetaState::new();
        meta.set(MetaType::Shift, MetaLevel::On);
        meta.set(MetaType::Alt, MetaLevel::Lock);
        assert_eq!(meta.flags(), MetaFlags::SHIFT | MetaFlags::ALT);

        meta.consume();
        assert_eq!(meta.level(MetaType::Shift), MetaLevel::Off);
        assert_eq!(meta.level(MetaType::Alt), MetaLevel::Lock);
    }

    #[test]
    fn cancel_restores_previous_level() {
        let mut meta = MetaState::new();
        meta.set(MetaType::Caps, MetaLevel::Lock);
        meta.touch(MetaType::Caps);
        meta.cancel(MetaType::Caps);
        assert_eq!(meta.level(MetaType::Caps), MetaLevel::Lock);
    }

    #[test]
    fn caps_modes() {
        let mut meta = MetaState::new();
        assert_eq!(meta.caps_mode(), CapsMode::None);
        meta.set(MetaType::Shift, MetaLevel::On);
        assert_eq!(meta.caps_mode(), CapsMode::First);
        meta.set(MetaType::Shift, MetaLevel::Lock);
        assert_eq!(meta.caps_mode(), CapsMode::All);

        assert_eq!(apply_caps("őszi", CapsMode::First), "Őszi");
        assert_eq!(apply_caps("őszi", CapsMode::All), "ŐSZI");
        assert_eq!(apply_caps("", CapsMode::First), "");
    }

    #[test]
    fn out_of_range_meta_type_is_invalid_data() {
        assert_eq!(MetaType::try_from(3).ok(), Some(MetaType::Caps));
        assert!(matches!(
            MetaType::try_from(4),
            Err(BoardError::InvalidExternalData(_))
        ));
        assert!(MetaType::try_from(-1).is_err());
    }
}
