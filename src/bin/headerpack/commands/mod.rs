//! Command implementations

pub mod clean;
pub mod completions;
pub mod copy;
pub mod export;
pub mod info;
pub mod init;
pub mod list;
pub mod package;
pub mod publish;
pub mod verify;
