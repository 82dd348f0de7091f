//! Buttons, packets and the modal state they drive

pub mod board_table;
pub mod button;
pub mod error;
pub mod meta;
pub mod packet;

pub use board_table::{BoardTable, ROOT_BOARD};
pub use button::{Button, ButtonKind, MultiTouchPhase, ON_CIRCLE, ON_HARD_PRESS, ON_STAY};
pub use error::BoardError;
pub use meta::{CapsMode, MetaLevel, MetaState, MetaType};
pub use packet::{Function, Packet, PacketKind};
