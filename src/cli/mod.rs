//! CLI module for peertrade

pub mod app;
pub mod commands;

pub use app::TradeApp;
pub use commands::{Cli, Commands, NodeArgs};
