mod app;
pub mod confirm;
pub mod event;
pub mod ui;

pub use app::{format_elapsed, App};
