use std::path::Path;
use std::time::Duration;

use tracing::info;

use super::{Devices, Input, InputError, Platform, Screen};
use crate::types::*;

/// Dry-run platform: logs every call, never sees a landmark.
pub struct StubPlatform;

impl Platform for StubPlatform {
    fn name(&self) -> &str {
        "stub"
    }

    fn devices(&self) -> anyhow::Result<Devices> {
        info!("stub devices created");
        Ok(Devices {
            screen: Box::new(StubScreen),
            input: Box::new(StubInput { cursor: Point::new(960, 540) }),
        })
    }
}

struct StubScreen;

impl Screen for StubScreen {
    fn locate(&mut self, template: &Path, min_confidence: f32) -> anyhow::Result<Option<Region>> {
        tracing::debug!("locate(\"{}\", {:.2})", template.display(), min_confidence);
        Ok(None)
    }

    fn screenshot(&mut self, area: Option<Area>, dest: &Path) -> anyhow::Result<()> {
        info!("screenshot({:?}) -> {}", area, dest.display());
        anyhow::bail!("stub platform has no screen")
    }
}

struct StubInput {
    cursor: Point,
}

impl Input for StubInput {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError> {
        info!("move_to({}, {}, {:.2}s)", x, y, duration.as_secs_f64());
        self.cursor = Point::new(x, y);
        Ok(())
    }

    fn move_by(&mut self, dx: i32, dy: i32) -> Result<(), InputError> {
        info!("move_by({}, {})", dx, dy);
        self.cursor = Point::new(self.cursor.x + dx, self.cursor.y + dy);
        Ok(())
    }

    fn mouse_down(&mut self) -> Result<(), InputError> {
        info!("mouse_down at {}", self.cursor);
        Ok(())
    }

    fn mouse_up(&mut self) -> Result<(), InputError> {
        info!("mouse_up at {}", self.cursor);
        Ok(())
    }

    fn click(&mut self) -> Result<(), InputError> {
        info!("click at {}", self.cursor);
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<(), InputError> {
        info!("key_down(\"{}\")", key);
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<(), InputError> {
        info!("key_up(\"{}\")", key);
        Ok(())
    }

    fn cursor(&mut self) -> Result<Point, InputError> {
        Ok(self.cursor)
    }
}
