//! Deterministic stand-ins for the engine's seams.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{secs, Clock};
use crate::notify::Notifier;
use crate::platform::{Input, InputError, Screen};
use crate::types::{Area, Point, Region};

/// Virtual time. Sleeping advances it instantly; crossing `stop_at` clears the run flag.
pub struct FakeClock {
    nanos: AtomicU64,
    stop: Mutex<Option<(Duration, Arc<AtomicBool>)>>,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { nanos: AtomicU64::new(0), stop: Mutex::new(None) })
    }

    pub fn stop_at(&self, at: f64, running: Arc<AtomicBool>) {
        *self.stop.lock().unwrap() = Some((secs(at), running));
    }

    pub fn advance(&self, d: Duration) {
        self.nanos.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
        if let Some((at, flag)) = self.stop.lock().unwrap().as_ref() {
            if self.now() >= *at {
                flag.store(false, Ordering::SeqCst);
            }
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// A landmark visible over `[from, to)` virtual seconds, keyed by template file stem.
#[derive(Clone)]
pub struct Sighting {
    pub stem: &'static str,
    pub from: f64,
    pub to: f64,
}

pub fn seen(stem: &'static str, from: f64, to: f64) -> Sighting {
    Sighting { stem, from, to }
}

/// Fixed on-screen spot per stem, so tests can tell which landmark was clicked.
pub fn region_of(stem: &str) -> Region {
    let slot = match stem {
        "change" => 0,
        "br_mode" => 1,
        "solo_mode" => 2,
        "leave" => 3,
        "ultimate" => 4,
        "open" => 5,
        "continue" => 6,
        _ => 7,
    };
    Region { l: 1000 + slot * 100, t: 800, w: 40, h: 40 }
}

pub struct ScriptedScreen {
    pub clock: Arc<FakeClock>,
    pub script: Vec<Sighting>,
    /// Stems whose lookup fails with an error.
    pub broken: Vec<&'static str>,
    pub shots: Arc<Mutex<Vec<Option<Area>>>>,
}

impl Screen for ScriptedScreen {
    fn locate(&mut self, template: &Path, _min_confidence: f32) -> anyhow::Result<Option<Region>> {
        let stem = template.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        if self.broken.contains(&stem.as_str()) {
            anyhow::bail!("capture failed");
        }
        let now = self.clock.now().as_secs_f64();
        let visible = self.script.iter().any(|s| s.stem == stem && s.from <= now && now < s.to);
        Ok(visible.then(|| region_of(&stem)))
    }

    fn screenshot(&mut self, area: Option<Area>, _dest: &Path) -> anyhow::Result<()> {
        self.shots.lock().unwrap().push(area);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Act {
    MoveTo(i32, i32),
    MoveBy(i32, i32),
    Down,
    Up,
    Click,
    KeyDown(String),
    KeyUp(String),
}

impl Act {
    /// Anything that starts an action, as opposed to releasing one.
    pub fn is_press(&self) -> bool {
        !matches!(self, Act::Up | Act::KeyUp(_))
    }
}

pub type ActLog = Arc<Mutex<Vec<(f64, Act)>>>;

/// Records every call with its virtual timestamp. Moves take their full duration.
pub struct RecordingInput {
    pub clock: Arc<FakeClock>,
    pub log: ActLog,
    pub cursor: Point,
}

impl RecordingInput {
    fn record(&self, act: Act) {
        self.log.lock().unwrap().push((self.clock.now().as_secs_f64(), act));
    }
}

fn check_key(key: &str) -> Result<(), InputError> {
    if key.chars().count() == 1 {
        Ok(())
    } else {
        Err(InputError::UnknownKey(key.to_string()))
    }
}

impl Input for RecordingInput {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError> {
        self.record(Act::MoveTo(x, y));
        self.cursor = Point::new(x, y);
        self.clock.advance(duration);
        Ok(())
    }

    fn move_by(&mut self, dx: i32, dy: i32) -> Result<(), InputError> {
        self.record(Act::MoveBy(dx, dy));
        self.cursor = Point::new(self.cursor.x + dx, self.cursor.y + dy);
        Ok(())
    }

    fn mouse_down(&mut self) -> Result<(), InputError> {
        self.record(Act::Down);
        Ok(())
    }

    fn mouse_up(&mut self) -> Result<(), InputError> {
        self.record(Act::Up);
        Ok(())
    }

    fn click(&mut self) -> Result<(), InputError> {
        self.record(Act::Click);
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<(), InputError> {
        check_key(key)?;
        self.record(Act::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<(), InputError> {
        check_key(key)?;
        self.record(Act::KeyUp(key.to_string()));
        Ok(())
    }

    fn cursor(&mut self) -> Result<Point, InputError> {
        Ok(self.cursor)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Option<PathBuf>)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, text: &str, image: Option<&Path>) {
        self.sent.lock().unwrap().push((text.to_string(), image.map(Path::to_path_buf)));
    }
}
