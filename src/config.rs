use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::core::{domain::LinkMode, engine::SandboxSettings};
use crate::http::present::LinkSettings;

/// Python sandbox service.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Root directory for run directories; also served under /files.
    #[arg(long, env = "SANDBOX_TEMP_DIR", default_value = "/app/temp")]
    pub temp_dir: PathBuf,

    /// Wall-clock limit for one execution, in seconds.
    #[arg(long, env = "EXEC_TIMEOUT_SECONDS", default_value_t = 30)]
    pub exec_timeout_seconds: u64,

    /// Save open matplotlib figures at interpreter exit.
    #[arg(
        long,
        env = "AUTO_SAVE_MPL",
        default_value = "1",
        value_parser = parse_flag,
        action = clap::ArgAction::Set
    )]
    pub auto_save_mpl: bool,

    #[arg(long, env = "SANDBOX_PYTHON", default_value = "python3")]
    pub python: PathBuf,

    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub public_base_url: String,

    #[arg(
        long,
        env = "PUBLIC_BASE_URL_MODE",
        value_enum,
        ignore_case = true,
        default_value = "rest"
    )]
    pub public_base_url_mode: LinkMode,

    #[arg(long, env = "SANDBOX_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,
}

impl Config {
    pub fn sandbox_settings(&self) -> SandboxSettings {
        SandboxSettings {
            timeout: Duration::from_secs(self.exec_timeout_seconds),
            autosave: self.auto_save_mpl,
        }
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            base_url: self.public_base_url.clone(),
            mode: self.public_base_url_mode,
        }
    }
}

/// Anything but `0`, `false` or `False` turns the flag on.
fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(!matches!(value, "0" | "false" | "False"))
}
