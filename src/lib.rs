pub mod commands;
pub mod config;
pub mod context;
pub mod models;
pub mod notion;
pub mod providers;
pub mod symbols;
pub mod yahoo;
