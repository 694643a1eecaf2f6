//! Helpers for preparing a config: template captures and point picking.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::platform::{Input, Screen};
use crate::settings::RunConfig;
use crate::types::{Area, Landmark, Point};

pub const ASSET_DIR: &str = "assets";

/// What a `pick` command writes into the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Pos1,
    Pos2,
    OutcomeArea,
}

impl FromStr for PickTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pos1" | "pos_1" => Ok(PickTarget::Pos1),
            "pos2" | "pos_2" => Ok(PickTarget::Pos2),
            "area" | "outcome_area" => Ok(PickTarget::OutcomeArea),
            other => Err(format!("unknown pick target '{}', expected pos1, pos2 or area", other)),
        }
    }
}

/// Count down on `out` so the user can move the cursor or bring the game forward.
pub fn countdown(clock: &dyn Clock, seconds: u64, what: &str, out: &mut dyn Write) -> io::Result<()> {
    for left in (1..=seconds).rev() {
        writeln!(out, "{} in {}...", what, left)?;
        out.flush()?;
        debug!("{} in {}", what, left);
        clock.sleep(Duration::from_secs(1));
    }
    Ok(())
}

/// Crop `area` into `<dir>/<key>.png` and bind it to `landmark`.
pub fn capture_landmark(
    screen: &mut dyn Screen,
    cfg: &mut RunConfig,
    landmark: Landmark,
    area: Area,
    dir: &Path,
) -> Result<PathBuf> {
    if !area.is_usable() {
        bail!("capture area {} is too small, need at least 3x3", area);
    }
    let dest = dir.join(format!("{}.png", landmark.key()));
    screen.screenshot(Some(area), &dest)?;
    cfg.images.set(landmark, dest.clone());
    info!(%landmark, "template saved to {}", dest.display());
    Ok(dest)
}

pub fn read_cursor(input: &mut dyn Input) -> Result<Point> {
    Ok(input.cursor()?)
}

pub fn set_point(cfg: &mut RunConfig, target: PickTarget, p: Point) -> Result<()> {
    match target {
        PickTarget::Pos1 => cfg.pos_1 = p,
        PickTarget::Pos2 => cfg.pos_2 = p,
        PickTarget::OutcomeArea => bail!("an area needs two corners"),
    }
    info!("{:?} set to {}", target, p);
    Ok(())
}

/// Store the rectangle spanned by two corners as the outcome crop.
pub fn set_area(cfg: &mut RunConfig, a: Point, b: Point) -> Result<Area> {
    let Some(area) = Area::from_corners(a, b) else {
        bail!("selection from {} to {} is too small", a, b);
    };
    cfg.outcome_area = Some(area);
    info!("outcome area set to {}", area);
    Ok(area)
}

pub fn clear_area(cfg: &mut RunConfig) {
    cfg.outcome_area = None;
    info!("outcome area cleared, full screen will be captured");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::engine::fakes::{FakeClock, RecordingInput, ScriptedScreen};

    #[test]
    fn capture_binds_template_path() {
        let shots = Arc::new(Mutex::new(Vec::new()));
        let mut screen = ScriptedScreen { clock: FakeClock::new(), script: vec![], broken: vec![], shots: shots.clone() };
        let mut cfg = RunConfig::default();
        let area = Area { x: 5, y: 5, w: 40, h: 20 };

        let dest = capture_landmark(&mut screen, &mut cfg, Landmark::Leave, area, Path::new("assets")).unwrap();
        assert_eq!(dest, Path::new("assets").join("return_to_lobby_alone.png"));
        assert_eq!(cfg.images.return_to_lobby_alone, dest);
        assert_eq!(*shots.lock().unwrap(), vec![Some(area)]);
    }

    #[test]
    fn capture_rejects_slivers() {
        let mut screen = ScriptedScreen { clock: FakeClock::new(), script: vec![], broken: vec![], shots: Arc::default() };
        let mut cfg = RunConfig::default();
        let area = Area { x: 5, y: 5, w: 2, h: 20 };
        assert!(capture_landmark(&mut screen, &mut cfg, Landmark::Open, area, Path::new("assets")).is_err());
        assert_eq!(cfg.images.open, PathBuf::from("open.png"));
    }

    #[test]
    fn area_from_reversed_corners() {
        let mut cfg = RunConfig::default();
        let area = set_area(&mut cfg, Point::new(300, 200), Point::new(100, 50)).unwrap();
        assert_eq!(area, Area { x: 100, y: 50, w: 200, h: 150 });
        assert_eq!(cfg.outcome_area, Some(area));
        assert!(set_area(&mut cfg, Point::new(1, 1), Point::new(2, 9)).is_err());
        clear_area(&mut cfg);
        assert_eq!(cfg.outcome_area, None);
    }

    #[test]
    fn picked_cursor_lands_in_config() {
        let clock = FakeClock::new();
        let mut input = RecordingInput { clock: clock.clone(), log: Arc::default(), cursor: Point::new(640, 360) };
        let mut cfg = RunConfig::default();
        let p = read_cursor(&mut input).unwrap();
        set_point(&mut cfg, PickTarget::Pos2, p).unwrap();
        assert_eq!(cfg.pos_2, Point::new(640, 360));
        let mut out = Vec::new();
        countdown(clock.as_ref(), 3, "reading cursor", &mut out).unwrap();
        assert_eq!(clock.now(), Duration::from_secs(3));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "reading cursor in 3...\nreading cursor in 2...\nreading cursor in 1...\n"
        );
    }

    #[test]
    fn pick_target_names() {
        assert_eq!("pos1".parse::<PickTarget>().unwrap(), PickTarget::Pos1);
        assert_eq!("AREA".parse::<PickTarget>().unwrap(), PickTarget::OutcomeArea);
        assert!("pos3".parse::<PickTarget>().is_err());
    }
}
