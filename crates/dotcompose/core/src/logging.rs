// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Logging setup and the composition log sink

use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Receives composition milestones as `(tags, message)` pairs
pub trait LogSink: Send + Sync {
    fn log(&self, tags: &[&str], message: &str);
}

impl<F> LogSink for F
where
    F: Fn(&[&str], &str) + Send + Sync,
{
    fn log(&self, tags: &[&str], message: &str) {
        self(tags, message)
    }
}

/// Forwards milestones to `tracing`, picking the level from the tags
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, tags: &[&str], message: &str) {
        let tags = tags.join(",");

        if tags.split(',').any(|tag| tag == "error") {
            error!(target: "dotcompose", %tags, "{}", message);
        } else if tags.split(',').any(|tag| tag == "warn") {
            warn!(target: "dotcompose", %tags, "{}", message);
        } else if tags.split(',').any(|tag| tag == "debug") {
            debug!(target: "dotcompose", %tags, "{}", message);
        } else {
            info!(target: "dotcompose", %tags, "{}", message);
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _tags: &[&str], _message: &str) {}
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`
pub fn setup_logging() -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init()?;

    info!("Logging initialized.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |tags: &[&str], message: &str| seen.lock().unwrap().push(format!("{}: {}", tags.join("/"), message));

        sink.log(&["dotcompose", "info"], "hello");
        NoopSink.log(&["dotcompose"], "ignored");
        TracingSink.log(&["dotcompose", "error"], "forwarded");

        assert_eq!(*seen.lock().unwrap(), vec!["dotcompose/info: hello".to_string()]);
    }

    #[test]
    fn test_setup_logging_twice_fails_gracefully() {
        let _ = setup_logging();
        assert!(setup_logging().is_err());
    }
}
