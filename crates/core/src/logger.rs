use std::fmt::Write as _;
use std::path::Path;
use std::sync::{mpsc, Mutex, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_FILE: &str = "debug_log.txt";

// Color indices for TUI rendering (mapped in ui.rs)
pub const COLOR_GRAY: u8 = 1;
pub const COLOR_BLUE: u8 = 2;

static TUI_TX: OnceLock<Mutex<Option<mpsc::Sender<String>>>> = OnceLock::new();

/// Install the global subscriber: append-only file log plus the TUI channel.
/// Keep the returned guard alive for the whole program.
pub fn init(log_dir: &Path, debug: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(TuiLayer)
        .try_init()
        .context("logger already initialized")?;

    Ok(guard)
}

/// Wire the TUI log channel.
pub fn set_tui_sender(tx: mpsc::Sender<String>) {
    let slot = TUI_TX.get_or_init(|| Mutex::new(None));
    if let Ok(mut s) = slot.lock() {
        *s = Some(tx);
    }
}

/// Forwards events to the TUI as `level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage`.
struct TuiLayer;

impl<S: Subscriber> Layer<S> for TuiLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let Some(slot) = TUI_TX.get() else { return };
        let Ok(guard) = slot.lock() else { return };
        let Some(tx) = guard.as_ref() else { return };

        let meta = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let (prefix, color) = prefix_for(meta.target());
        let line = format_tui_line(meta.level(), prefix, color, &visitor.finish());
        tx.send(line).ok();
    }
}

/// Prefix and color from the emitting module: platform backends are gray, the engine blue.
fn prefix_for(target: &str) -> (&str, u8) {
    let last = target.rsplit("::").next().unwrap_or(target);
    if target.contains("::platform") {
        (last, COLOR_GRAY)
    } else if target.contains("::engine") {
        ("bot", COLOR_BLUE)
    } else if target.starts_with("autobr") {
        ("", 0)
    } else {
        (last, COLOR_GRAY)
    }
}

fn format_tui_line(level: &Level, prefix: &str, color: u8, msg: &str) -> String {
    let ts = Local::now().format("%H:%M:%S");
    let level = match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        _ => "DEBUG",
    };
    format!("{}\x1f{}\x1f{}\x1f{}\x1f{}", level, prefix, color, ts, msg)
}

/// Collects the `message` field, then the rest as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            write!(self.message, "{:?}", value).ok();
        } else {
            write!(self.fields, " {}={:?}", field.name(), value).ok();
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            write!(self.fields, " {}={}", field.name(), value).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_line_has_five_fields() {
        let line = format_tui_line(&Level::WARN, "bot", COLOR_BLUE, "hello");
        let parts: Vec<&str> = line.split('\x1f').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "WARN");
        assert_eq!(parts[1], "bot");
        assert_eq!(parts[2], "2");
        assert_eq!(parts[4], "hello");
    }

    #[test]
    fn engine_targets_get_bot_prefix() {
        assert_eq!(prefix_for("autobr_core::engine::combat"), ("bot", COLOR_BLUE));
        assert_eq!(prefix_for("autobr_core::platform::stub"), ("stub", COLOR_GRAY));
        assert_eq!(prefix_for("autobr_core::runner"), ("", 0));
    }
}
