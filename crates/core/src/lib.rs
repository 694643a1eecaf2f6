pub mod assets;
pub mod clock;
pub mod engine;
pub mod logger;
pub mod notify;
pub mod platform;
pub mod runner;
pub mod settings;
pub mod types;
