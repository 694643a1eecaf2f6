//! Match outcome delivery to a Discord-style webhook.
//!
//! Delivery is best effort: `notify` never fails and never blocks the bot loop.

use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use tracing::{debug, warn};

const TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("attachment unreadable: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome sink used by the engine.
pub trait Notifier: Send + Sync {
    /// Fire and forget. Silently does nothing when no endpoint is configured.
    fn notify(&self, text: &str, image: Option<&Path>);
}

/// Posts `{"content": ...}` or a multipart form with the screenshot attached.
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            url: url.into().trim().to_string(),
            client: Client::builder().timeout(TIMEOUT).build()?,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Blocking post; used directly by the `test-webhook` command.
    pub fn post(&self, text: &str, image: Option<(String, Vec<u8>)>) -> Result<(), NotifyError> {
        let request = self.client.post(&self.url);
        let request = match image {
            Some((name, bytes)) => {
                let part = multipart::Part::bytes(bytes).file_name(name);
                let form = multipart::Form::new().text("content", text.to_string()).part("file", part);
                request.multipart(form)
            }
            None => request.json(&serde_json::json!({ "content": text })),
        };
        let status = request.send()?.error_for_status()?.status();
        debug!(%status, "webhook delivered");
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, text: &str, image: Option<&Path>) {
        if !self.is_configured() {
            return;
        }

        // Read now: the file is overwritten by the next match.
        let attachment = image.and_then(|p| match std::fs::read(p) {
            Ok(bytes) => {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "outcome.png".into());
                Some((name, bytes))
            }
            Err(e) => {
                warn!("screenshot not attached: {}", NotifyError::Io(e));
                None
            }
        });

        let this = self.clone();
        let text = text.to_string();
        thread::spawn(move || {
            if let Err(e) = this.post(&text, attachment) {
                warn!("webhook delivery failed: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_endpoint_is_not_configured() {
        let n = WebhookNotifier::new("   ").unwrap();
        assert!(!n.is_configured());
        // must return without spawning or panicking
        n.notify("Queue #1 Finish time: 0 min 5 sec", None);
    }
}
