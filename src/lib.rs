//! Saver Bot Library
//!
//! Startup configuration for a Telegram bot that saves restricted content.
//!
//! This crate provides:
//! - Merging an optional local `config.env` into the process environment
//! - Validating the bot token and user session credentials
//! - The immutable [`config::Settings`] record shared by the rest of the bot

pub mod config;
