use std::path::Path;

use tracing::debug;

use crate::platform::Screen;
use crate::settings::Landmarks;
use crate::types::{Area, Landmark, Region};

/// Landmark lookups over a `Screen`. Every failure reads as "not visible".
pub struct Eyes {
    screen: Box<dyn Screen>,
    images: Landmarks,
    confidence: f32,
}

impl Eyes {
    pub fn new(screen: Box<dyn Screen>, images: Landmarks, confidence: f32) -> Self {
        Self { screen, images, confidence }
    }

    pub fn find(&mut self, landmark: Landmark) -> Option<Region> {
        let path = self.images.path(landmark);
        if !path.is_file() {
            return None;
        }
        let min = landmark.confidence_override().unwrap_or(self.confidence);
        match self.screen.locate(path, min) {
            Ok(found) => found,
            Err(e) => {
                debug!(%landmark, "locate failed: {:#}", e);
                None
            }
        }
    }

    pub fn sees(&mut self, landmark: Landmark) -> bool {
        self.find(landmark).is_some()
    }

    /// Results screen in either state.
    pub fn sees_results(&mut self) -> bool {
        self.sees(Landmark::Open) || self.sees(Landmark::Continue)
    }

    /// Returns whether the file was written.
    pub fn screenshot(&mut self, area: Option<Area>, dest: &Path) -> bool {
        match self.screen.screenshot(area, dest) {
            Ok(()) => true,
            Err(e) => {
                debug!("screenshot failed: {:#}", e);
                false
            }
        }
    }
}
