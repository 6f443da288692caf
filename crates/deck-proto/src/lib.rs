//! Shared types for feeddeck: configuration, command tokens, the row model,
//! viewport arithmetic and the cross-thread state container.

pub mod config;
pub mod platform;
pub mod protocol;
pub mod row;
pub mod state;
pub mod viewport;
