use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};
use imageproc::template_matching::{find_extremes, match_template_parallel, MatchTemplateMethod};
use tracing::{debug, info};

use super::{Devices, Input, InputError, Platform, Screen};
use crate::types::*;

/// Matching runs at 1/SCALE resolution.
const SCALE: u32 = 2;
/// Consecutive locates within this window share one capture.
const FRAME_TTL: Duration = Duration::from_millis(150);
const MOVE_STEP: Duration = Duration::from_millis(10);

/// Real screen and input: `xcap` capture, `imageproc` matching, `enigo` synthesis.
pub struct DesktopPlatform;

impl Platform for DesktopPlatform {
    fn name(&self) -> &str {
        "desktop"
    }

    fn devices(&self) -> Result<Devices> {
        let enigo = Enigo::new(&Settings::default()).context("failed to open input backend")?;
        info!("desktop devices created");
        Ok(Devices {
            screen: Box::new(DesktopScreen::default()),
            input: Box::new(DesktopInput { enigo }),
        })
    }
}

struct Frame {
    taken: Instant,
    origin: Point,
    gray: GrayImage,
    /// Best score and position per template, scored against this frame.
    hits: HashMap<PathBuf, (f32, (u32, u32))>,
}

#[derive(Default)]
struct DesktopScreen {
    templates: HashMap<PathBuf, GrayImage>,
    frame: Option<Frame>,
}

fn primary_monitor() -> Result<xcap::Monitor> {
    let monitors = xcap::Monitor::all().context("failed to list monitors")?;
    let mut fallback = None;
    for m in monitors {
        if m.is_primary().unwrap_or(false) {
            return Ok(m);
        }
        fallback.get_or_insert(m);
    }
    fallback.context("no monitor found")
}

fn capture_full() -> Result<(Point, RgbaImage)> {
    let monitor = primary_monitor()?;
    let origin = Point::new(monitor.x()?, monitor.y()?);
    let img = monitor.capture_image().context("screen capture failed")?;
    Ok((origin, img))
}

fn downscale(img: &GrayImage) -> GrayImage {
    let w = (img.width() / SCALE).max(1);
    let h = (img.height() / SCALE).max(1);
    imageops::resize(img, w, h, FilterType::Triangle)
}

impl DesktopScreen {
    fn frame(&mut self) -> Result<&Frame> {
        let stale = self.frame.as_ref().map_or(true, |f| f.taken.elapsed() > FRAME_TTL);
        if stale {
            let (origin, img) = capture_full()?;
            let gray = downscale(&imageops::grayscale(&img));
            self.frame = Some(Frame { taken: Instant::now(), origin, gray, hits: HashMap::new() });
        }
        self.frame.as_ref().context("frame missing after capture")
    }

    fn template(&mut self, path: &Path) -> Result<&GrayImage> {
        if !self.templates.contains_key(path) {
            let img = image::open(path)
                .with_context(|| format!("failed to read template {}", path.display()))?
                .to_luma8();
            self.templates.insert(path.to_path_buf(), downscale(&img));
        }
        self.templates.get(path).context("template missing after load")
    }
}

impl Screen for DesktopScreen {
    fn locate(&mut self, template: &Path, min_confidence: f32) -> Result<Option<Region>> {
        if !template.is_file() {
            return Ok(None);
        }
        let tpl = self.template(template)?.clone();
        self.frame()?;
        let Some(frame) = self.frame.as_mut() else {
            return Ok(None);
        };
        if tpl.width() > frame.gray.width() || tpl.height() > frame.gray.height() {
            return Ok(None);
        }

        let (score, (x, y)) = match frame.hits.get(template) {
            Some(hit) => *hit,
            None => {
                let hit = best_match(&frame.gray, &tpl);
                debug!("{} best score {:.3}", template.display(), hit.0);
                frame.hits.insert(template.to_path_buf(), hit);
                hit
            }
        };
        if score < min_confidence {
            return Ok(None);
        }

        Ok(Some(Region {
            l: frame.origin.x + (x * SCALE) as i32,
            t: frame.origin.y + (y * SCALE) as i32,
            w: (tpl.width() * SCALE) as i32,
            h: (tpl.height() * SCALE) as i32,
        }))
    }

    fn screenshot(&mut self, area: Option<Area>, dest: &Path) -> Result<()> {
        let (origin, img) = capture_full()?;
        let out = match area {
            Some(a) => {
                let x = (a.x - origin.x).max(0) as u32;
                let y = (a.y - origin.y).max(0) as u32;
                imageops::crop_imm(&img, x, y, a.w, a.h).to_image()
            }
            None => img,
        };
        if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        out.save(dest)
            .with_context(|| format!("failed to save screenshot to {}", dest.display()))?;
        Ok(())
    }
}

/// Highest normalized cross-correlation of `tpl` over `frame` and where it sits.
fn best_match(frame: &GrayImage, tpl: &GrayImage) -> (f32, (u32, u32)) {
    let scores = match_template_parallel(frame, tpl, MatchTemplateMethod::CrossCorrelationNormalized);
    let best = find_extremes(&scores);
    (best.max_value, best.max_value_location)
}

struct DesktopInput {
    enigo: Enigo,
}

fn backend(e: enigo::InputError) -> InputError {
    InputError::Backend(e.to_string())
}

/// Map a config key name to an enigo key.
pub fn parse_key(name: &str) -> Result<Key, InputError> {
    let lower = name.trim().to_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Key::Unicode(c));
    }
    let key = match lower.as_str() {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "shift" => Key::Shift,
        "ctrl" | "control" => Key::Control,
        "alt" => Key::Alt,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => return Err(InputError::UnknownKey(name.to_string())),
    };
    Ok(key)
}

impl Input for DesktopInput {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError> {
        let (sx, sy) = self.enigo.location().map_err(backend)?;
        let steps = (duration.as_millis() / MOVE_STEP.as_millis()).max(1) as i32;
        for i in 1..=steps {
            let px = sx + (x - sx) * i / steps;
            let py = sy + (y - sy) * i / steps;
            self.enigo.move_mouse(px, py, Coordinate::Abs).map_err(backend)?;
            if i < steps {
                thread::sleep(MOVE_STEP);
            }
        }
        Ok(())
    }

    fn move_by(&mut self, dx: i32, dy: i32) -> Result<(), InputError> {
        self.enigo.move_mouse(dx, dy, Coordinate::Rel).map_err(backend)
    }

    fn mouse_down(&mut self) -> Result<(), InputError> {
        self.enigo.button(Button::Left, Direction::Press).map_err(backend)
    }

    fn mouse_up(&mut self) -> Result<(), InputError> {
        self.enigo.button(Button::Left, Direction::Release).map_err(backend)
    }

    fn click(&mut self) -> Result<(), InputError> {
        self.enigo.button(Button::Left, Direction::Click).map_err(backend)
    }

    fn key_down(&mut self, key: &str) -> Result<(), InputError> {
        let k = parse_key(key)?;
        self.enigo.key(k, Direction::Press).map_err(backend)
    }

    fn key_up(&mut self, key: &str) -> Result<(), InputError> {
        let k = parse_key(key)?;
        self.enigo.key(k, Direction::Release).map_err(backend)
    }

    fn cursor(&mut self) -> Result<Point, InputError> {
        let (x, y) = self.enigo.location().map_err(backend)?;
        Ok(Point::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_keys() {
        assert_eq!(parse_key("W").unwrap(), Key::Unicode('w'));
        assert_eq!(parse_key("1").unwrap(), Key::Unicode('1'));
        assert_eq!(parse_key("space").unwrap(), Key::Space);
        assert_eq!(parse_key("F1").unwrap(), Key::F1);
    }

    fn textured(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| image::Luma([((x * 37 + y * 91) % 251) as u8]))
    }

    #[test]
    fn best_match_finds_the_cropped_patch() {
        let frame = textured(64, 48);
        let tpl = imageops::crop_imm(&frame, 20, 10, 8, 8).to_image();
        let (score, at) = best_match(&frame, &tpl);
        assert!(score > 0.99, "score {}", score);
        assert_eq!(at, (20, 10));
    }

    #[test]
    fn scores_are_reused_within_a_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("open.png");
        std::fs::write(&path, b"").unwrap();

        let gray = textured(64, 48);
        let tpl = imageops::crop_imm(&gray, 20, 10, 8, 8).to_image();
        let mut screen = DesktopScreen {
            templates: HashMap::from([(path.clone(), tpl)]),
            frame: Some(Frame { taken: Instant::now(), origin: Point::new(0, 0), gray, hits: HashMap::new() }),
        };

        let first = screen.locate(&path, 0.9).unwrap();
        assert_eq!(first, Some(Region { l: 40, t: 20, w: 16, h: 16 }));

        // same frame: the stored score answers without rematching
        if let Some(frame) = screen.frame.as_mut() {
            assert_eq!(frame.hits.len(), 1);
            frame.gray = GrayImage::new(64, 48);
        }
        assert_eq!(screen.locate(&path, 0.9).unwrap(), first);
        assert_eq!(screen.locate(&path, 1.01).unwrap(), None);
    }

    #[test]
    fn rejects_unknown_key_names() {
        assert!(matches!(parse_key("hyper"), Err(InputError::UnknownKey(k)) if k == "hyper"));
    }
}
