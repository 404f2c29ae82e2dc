//! pollbridge library
//!
//! Logs a presenter in to Twitch with the implicit OAuth grant, scrapes the
//! current question from a TalesUp story page and submits it as a timed
//! Twitch poll.

pub mod auth;
pub mod browser;
pub mod cli;
pub mod config;
pub mod host;
pub mod logging;
pub mod polls;
pub mod session;
pub mod store;
pub mod twitch;
