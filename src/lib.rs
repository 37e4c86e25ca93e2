//! Tapedeck - playlist-to-audio batch ripping with live progress
//!
//! This library crate exposes the core functionality for integration testing.

pub mod classify;
pub mod config;
pub mod events;
pub mod job;
pub mod resolver;
pub mod server;
pub mod tools;
