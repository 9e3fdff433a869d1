//! CLI command handlers

pub mod commands;

pub use commands::{inspect, render, report_file_name};
