use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::Phase;

/// Screen position in absolute pixels, stored in config as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from(v: [i32; 2]) -> Self {
        Point::new(v[0], v[1])
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Where a template was found on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub l: i32,
    pub t: i32,
    pub w: i32,
    pub h: i32,
}

impl Region {
    pub fn center(&self) -> Point {
        Point::new(self.l + self.w / 2, self.t + self.h / 2)
    }

    /// Click jitter that stays inside the button: a quarter of the smaller side, 1..=8 px.
    pub fn safe_jitter(&self) -> i32 {
        let x = (self.w / 4).clamp(1, 8);
        let y = (self.h / 4).clamp(1, 8);
        x.min(y)
    }
}

/// Screen rectangle for partial capture, stored in config as `[x, y, w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Area {
    /// Normalize two opposite corners. Rejects selections under 3x3 px.
    pub fn from_corners(a: Point, b: Point) -> Option<Self> {
        let (l, r) = (a.x.min(b.x), a.x.max(b.x));
        let (t, bt) = (a.y.min(b.y), a.y.max(b.y));
        let area = Area { x: l, y: t, w: (r - l) as u32, h: (bt - t) as u32 };
        area.is_usable().then_some(area)
    }

    pub fn is_usable(&self) -> bool {
        self.w >= 3 && self.h >= 3
    }
}

impl From<[i32; 4]> for Area {
    fn from(v: [i32; 4]) -> Self {
        Area { x: v[0], y: v[1], w: v[2].max(0) as u32, h: v[3].max(0) as u32 }
    }
}

impl From<Area> for [i32; 4] {
    fn from(a: Area) -> Self {
        [a.x, a.y, a.w as i32, a.h as i32]
    }
}

impl FromStr for Area {
    type Err = String;

    /// Parses `x,y,w,h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|p| p.trim().parse::<i32>().map_err(|e| format!("bad number '{}': {}", p, e)))
            .collect::<Result<_, _>>()?;
        let &[x, y, w, h] = parts.as_slice() else {
            return Err(format!("expected x,y,w,h, got '{}'", s));
        };
        if w < 0 || h < 0 {
            return Err("width and height must be positive".into());
        }
        Ok(Area::from([x, y, w, h]))
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.w, self.h)
    }
}

/// How a match is played out once the leave button shows up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Stay until the natural end, keepalive clicks only
    #[default]
    Full,
    /// Leave as soon as the leave button is available
    Quick,
}

impl MatchMode {
    pub fn toggled(self) -> Self {
        match self {
            MatchMode::Full => MatchMode::Quick,
            MatchMode::Quick => MatchMode::Full,
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Full => f.write_str("full"),
            MatchMode::Quick => f.write_str("quick"),
        }
    }
}

/// Named UI elements the bot reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Change,
    BattleRoyale,
    Solo,
    Leave,
    Ultimate,
    Open,
    Continue,
}

impl Landmark {
    pub const ALL: [Landmark; 7] = [
        Landmark::Change,
        Landmark::BattleRoyale,
        Landmark::Solo,
        Landmark::Leave,
        Landmark::Ultimate,
        Landmark::Open,
        Landmark::Continue,
    ];

    /// Key used in the `images` config table and for captured asset file names.
    pub fn key(self) -> &'static str {
        match self {
            Landmark::Change => "change",
            Landmark::BattleRoyale => "br_mode",
            Landmark::Solo => "solo_mode",
            Landmark::Leave => "return_to_lobby_alone",
            Landmark::Ultimate => "ultimate",
            Landmark::Open => "open",
            Landmark::Continue => "continue",
        }
    }

    /// The leave button is semi-transparent over gameplay and needs a looser match.
    pub fn confidence_override(self) -> Option<f32> {
        match self {
            Landmark::Leave => Some(0.7),
            _ => None,
        }
    }
}

impl FromStr for Landmark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Landmark::ALL
            .into_iter()
            .find(|l| l.key() == wanted)
            .or(match wanted.as_str() {
                "leave" => Some(Landmark::Leave),
                "br" => Some(Landmark::BattleRoyale),
                "solo" => Some(Landmark::Solo),
                _ => None,
            })
            .ok_or_else(|| format!("unknown landmark '{}'", s))
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Display tone of a status line, mapped to colors by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Waiting,
    Active,
    Finished,
    Error,
}

/// Runner lifecycle as seen by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Stopped,
    Running,
    Stopping,
}

/// Command from TUI to runner
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    StartStop,
    ToggleMode,
    AdjustConfidence(f32),
    Quit,
}

/// Progress report from the worker and runner to the dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Phase(Phase),
    MatchStarted { count: u32 },
    Runner(RunnerState),
    Config { mode: MatchMode, confidence: f32, webhook_set: bool },
}
