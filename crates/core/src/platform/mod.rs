pub mod desktop;
pub mod hotkey;
pub mod stub;

use std::path::Path;
use std::time::Duration;

use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// OS refused or dropped the event; the action is skipped
    #[error("input backend: {0}")]
    Backend(String),

    /// Config names a key the backend cannot synthesize
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Template locator and screenshot source.
pub trait Screen {
    /// Find `template` on screen with at least `min_confidence` similarity.
    /// A missing template file is `Ok(None)`.
    fn locate(&mut self, template: &Path, min_confidence: f32) -> anyhow::Result<Option<Region>>;

    /// Save a screenshot, cropped to `area` when given.
    fn screenshot(&mut self, area: Option<Area>, dest: &Path) -> anyhow::Result<()>;
}

/// Raw mouse and keyboard synthesis. Timing and jitter live in the engine.
pub trait Input {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError>;
    fn move_by(&mut self, dx: i32, dy: i32) -> Result<(), InputError>;
    fn mouse_down(&mut self) -> Result<(), InputError>;
    fn mouse_up(&mut self) -> Result<(), InputError>;
    fn click(&mut self) -> Result<(), InputError>;
    fn key_down(&mut self, key: &str) -> Result<(), InputError>;
    fn key_up(&mut self, key: &str) -> Result<(), InputError>;
    fn cursor(&mut self) -> Result<Point, InputError>;
}

/// Devices for one run, created on the thread that uses them.
pub struct Devices {
    pub screen: Box<dyn Screen>,
    pub input: Box<dyn Input>,
}

/// Platform-level factory.
pub trait Platform: Send + Sync {
    fn name(&self) -> &str;
    fn devices(&self) -> anyhow::Result<Devices>;
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Box<dyn Platform> {
    if force_stub {
        return Box::new(stub::StubPlatform);
    }
    Box::new(desktop::DesktopPlatform)
}
