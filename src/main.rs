use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use autobr_core::assets::{self, PickTarget, ASSET_DIR};
use autobr_core::clock::SystemClock;
use autobr_core::notify::WebhookNotifier;
use autobr_core::platform::{create_platform, hotkey, Platform};
use autobr_core::settings::RunConfig;
use autobr_core::types::{Area, Command, Landmark};
use autobr_core::{logger, runner};

/// Lobby-to-results automation for solo battle royale queues.
#[derive(Parser, Debug)]
#[command(name = "autobr", version, about)]
struct Cli {
    /// Config file, created on first edit
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Use the logging stub instead of the real screen and input
    #[arg(long)]
    stub: bool,

    /// Debug-level logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Crop a screen region into assets/<landmark>.png and bind it
    Capture {
        landmark: Landmark,
        /// x,y,w,h in screen pixels
        area: Area,
        #[arg(long, default_value_t = 3)]
        delay: u64,
    },
    /// Store the cursor position as pos1/pos2, or two corners as the outcome area
    Pick {
        target: PickTarget,
        #[arg(long, default_value_t = 3)]
        delay: u64,
    },
    /// Capture the full screen for outcome reports
    ClearArea,
    /// Post a test message to the configured webhook
    TestWebhook,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let _log_guard = logger::init(&cwd.join("logs"), cli.debug)?;

    let platform: Arc<dyn Platform> = Arc::from(create_platform(cli.stub));

    match cli.command {
        None => dashboard(&cli.config, platform),
        Some(Cmd::Capture { landmark, area, delay }) => capture(&cli.config, platform.as_ref(), landmark, area, delay),
        Some(Cmd::Pick { target, delay }) => pick(&cli.config, platform.as_ref(), target, delay),
        Some(Cmd::ClearArea) => {
            let mut cfg = RunConfig::load(&cli.config);
            assets::clear_area(&mut cfg);
            cfg.save(&cli.config)?;
            println!("outcome area cleared");
            Ok(())
        }
        Some(Cmd::TestWebhook) => test_webhook(&cli.config),
    }
}

fn dashboard(config: &Path, platform: Arc<dyn Platform>) -> Result<()> {
    let (log_tx, log_rx) = mpsc::channel::<String>();
    let (event_tx, event_rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    logger::set_tui_sender(log_tx);
    tracing::info!(platform = platform.name(), "autobr started");

    let config_path = config.to_path_buf();
    let supervisor = thread::Builder::new()
        .name("runner".into())
        .spawn(move || runner::supervise(&config_path, platform, cmd_rx, event_tx))
        .context("failed to spawn runner thread")?;

    let hotkey_flag = Arc::new(AtomicBool::new(false));
    hotkey::start_hotkey_listener(Arc::clone(&hotkey_flag));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = autobr_tui::App::new(log_rx, event_rx, cmd_tx, hotkey_flag);
    let result = autobr_tui::event::run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // make sure the worker has released its keys before exit
    app.quit();
    drop(app);
    if supervisor.join().is_err() {
        eprintln!("runner thread panicked");
    }

    result
}

fn capture(config: &Path, platform: &dyn Platform, landmark: Landmark, area: Area, delay: u64) -> Result<()> {
    let mut cfg = RunConfig::load(config);
    let mut devices = platform.devices()?;

    println!("capturing {} from {} in {}s, bring the game to the front", landmark, area, delay);
    assets::countdown(&SystemClock::new(), delay, "capture", &mut io::stdout())?;
    let dest = assets::capture_landmark(devices.screen.as_mut(), &mut cfg, landmark, area, Path::new(ASSET_DIR))?;
    cfg.save(config)?;

    println!("saved {} and bound it to '{}'", dest.display(), landmark.key());
    Ok(())
}

fn pick(config: &Path, platform: &dyn Platform, target: PickTarget, delay: u64) -> Result<()> {
    let mut cfg = RunConfig::load(config);
    let mut devices = platform.devices()?;
    let clock = SystemClock::new();

    match target {
        PickTarget::OutcomeArea => {
            println!("hover the top-left corner");
            assets::countdown(&clock, delay, "first corner", &mut io::stdout())?;
            let a = assets::read_cursor(devices.input.as_mut())?;
            println!("first corner {}, now hover the bottom-right corner", a);
            assets::countdown(&clock, delay, "second corner", &mut io::stdout())?;
            let b = assets::read_cursor(devices.input.as_mut())?;
            let area = assets::set_area(&mut cfg, a, b)?;
            println!("outcome area set to {}", area);
        }
        _ => {
            println!("hover the target point");
            assets::countdown(&clock, delay, "reading cursor", &mut io::stdout())?;
            let p = assets::read_cursor(devices.input.as_mut())?;
            assets::set_point(&mut cfg, target, p)?;
            println!("{:?} set to {}", target, p);
        }
    }

    cfg.save(config)?;
    Ok(())
}

fn test_webhook(config: &Path) -> Result<()> {
    let cfg = RunConfig::load(config);
    cfg.validate()?;
    let notifier = WebhookNotifier::new(cfg.discord_webhook)?;
    if !notifier.is_configured() {
        bail!("no discord_webhook in {}", config.display());
    }
    notifier.post("autobr webhook test", None)?;
    println!("webhook OK");
    Ok(())
}
