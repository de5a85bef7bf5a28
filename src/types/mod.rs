//! Core types for Acontext.

pub mod message;

pub use message::*;
