//! Core of a soft keyboard: code-text expansion, varias, modify rolls, meta
//! and board switching, and the packet/button touch protocol, driven by a
//! single tokio task that owns the editor connection.

pub mod board;
pub mod codetext;
pub mod config;
pub mod connection;
pub mod engine;
pub mod text;
