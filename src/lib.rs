/// The top-level application module.
mod app;
pub use app::{App, AppState, AppView};

/// Views for each "screen".
pub mod views;
pub use views::*;

/// Registry mirror, edits, refresh loop and diagnostics.
pub mod console;

pub mod common;
pub mod config;
mod constants;
mod keymap;
mod utils;
mod widgets;
