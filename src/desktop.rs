//! Host environment integration: the embedding window and URL opening

use anyhow::{Context, Result};
use log::info;
use std::process::{Command, Stdio};

use crate::client::ClientId;

/// Read-only handle of the host window the compositor draws into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostWindow {
    /// Native handle as reported by the windowing host
    pub handle: u64,
    pub title: String,
    pub size: (u32, u32),
}

impl HostWindow {
    pub fn new(handle: u64, title: impl Into<String>, size: (u32, u32)) -> Self {
        Self {
            handle,
            title: title.into(),
            size,
        }
    }
}

/// Handles `open_url` requests coming from clients
pub trait UrlHandler: Send {
    fn open_url(&mut self, client: ClientId, url: &str) -> Result<()>;
}

/// Default handler: hands the URL to the desktop's opener program
#[derive(Debug, Clone)]
pub struct HostUrlOpener {
    program: String,
}

impl Default for HostUrlOpener {
    fn default() -> Self {
        Self {
            program: "xdg-open".to_string(),
        }
    }
}

impl HostUrlOpener {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl UrlHandler for HostUrlOpener {
    fn open_url(&mut self, client: ClientId, url: &str) -> Result<()> {
        info!("🔗 {} asked to open {}", client, url);
        // Spawned and left running; the opener detaches on its own
        Command::new(&self.program)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {} for {}", self.program, url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_opener_reports_error() {
        let mut opener = HostUrlOpener::with_program("/nonexistent/wlsession-url-opener");
        let err = opener
            .open_url(ClientId::from_raw(1), "https://example.org")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to launch"));
    }
}
