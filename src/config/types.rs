use rush_media::SinkTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// File the RUSH stream is written to (created or truncated on start)
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// fsync the file when the session finalizes
    #[serde(default = "default_true")]
    pub sync_on_close: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            sync_on_close: true,
        }
    }
}

impl OutputConfig {
    /// Sink target for this configuration, with `~` expanded.
    pub fn sink_target(&self) -> SinkTarget {
        let path = shellexpand::tilde(&self.path.to_string_lossy()).into_owned();
        SinkTarget::File {
            path: PathBuf::from(path),
            sync_on_close: self.sync_on_close,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("/tmp/test.fbvp")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// tracing-subscriber filter directive, used when RUST_LOG is unset
    #[serde(default)]
    pub filter: Option<String>,
}
