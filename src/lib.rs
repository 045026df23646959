//! Steam game presence bridge.
//!
//! Scans `/proc` for a running Steam game, maps its folder name to an
//! application id, and reports it over the chat client's local IPC socket.

pub mod bridge;
pub mod catalog;
pub mod config;
pub mod distro;
pub mod ipc;
pub mod normalize;
pub mod resolver;
pub mod scanner;
