//! Route modules.

pub mod autosave;
pub mod content;
pub mod publish;
