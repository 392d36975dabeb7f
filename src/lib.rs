// weather-alerts library crate
// Exposes modules for integration testing

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod storage;
pub mod weather;
