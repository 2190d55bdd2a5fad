pub mod app;
pub mod commands;
pub mod config;
pub mod git;
pub mod porcelain;
pub mod screen;
pub mod session;
pub mod surface;
pub mod types;
pub mod ui;
pub mod watcher;
