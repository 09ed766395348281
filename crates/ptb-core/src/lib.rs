//! Core of the panel remote-control bot.
//!
//! This crate is framework-agnostic. Telegram and the panel HTTP API live behind
//! ports (traits) implemented in adapter crates; everything stateful about a
//! conversation (pending text captures, their timeouts, menu transitions) lives here.

pub mod audit;
pub mod capture;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod menu;
pub mod messaging;
pub mod panel;
pub mod render;
pub mod timeout;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
