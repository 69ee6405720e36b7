//! Process configuration, read once at startup.

use caldav_mcp_core::constants::{DEFAULT_CALDAV_URL, DEFAULT_SCAN_DAYS, DEFAULT_TZID};
use caldav_mcp_core::datetime::parse_zone;
use caldav_mcp_core::protocol::ToolProfile;
use caldav_mcp_core::{CalMcpError, CalMcpResult};
use chrono_tz::Tz;
use clap::Parser;
use secrecy::Secret;

/// Every option can be given as a flag or as the environment variable named
/// beside it (a `.env` file in the working directory is loaded first).
#[derive(Debug, Parser)]
#[command(name = "caldav-mcp")]
#[command(about = "Expose iCloud/CalDAV calendars as MCP tools", version)]
pub struct Cli {
    /// Apple ID (or CalDAV username)
    #[arg(long, env = "APPLE_ID")]
    pub apple_id: Option<String>,

    /// App-specific password
    #[arg(long, env = "ICLOUD_APP_PASSWORD", hide_env_values = true)]
    pub app_password: Option<String>,

    /// CalDAV server root
    #[arg(long, env = "CALDAV_URL", default_value = DEFAULT_CALDAV_URL)]
    pub caldav_url: String,

    /// IANA zone applied to naive datetimes; empty to write UTC
    #[arg(long, env = "TZID", default_value = DEFAULT_TZID)]
    pub tzid: String,

    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Set to 1 to expose only the read-only search/fetch tools
    #[arg(long, env = "DR_PROFILE", default_value = "0")]
    pub dr_profile: String,

    /// Days either side of now searched when looking an event up by UID
    #[arg(long, env = "SCAN_DAYS", default_value_t = DEFAULT_SCAN_DAYS)]
    pub scan_days: i64,
}

/// Immutable settings shared by every request handler.
#[derive(Debug)]
pub struct AppConfig {
    pub apple_id: String,
    pub password: Secret<String>,
    pub caldav_url: String,
    pub default_tzid: Option<String>,
    pub host: String,
    pub port: u16,
    pub profile: ToolProfile,
    pub scan_days: i64,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> CalMcpResult<Self> {
        let apple_id = required("APPLE_ID", cli.apple_id)?;
        let password = required("ICLOUD_APP_PASSWORD", cli.app_password)?;

        let caldav_url = cli.caldav_url.trim().to_string();
        if caldav_url.is_empty() {
            return Err(CalMcpError::Config("CALDAV_URL is empty".to_string()));
        }

        let default_tzid = match cli.tzid.trim() {
            "" => None,
            tzid if parse_zone(tzid).is_some() => Some(tzid.to_string()),
            tzid => {
                return Err(CalMcpError::Config(format!(
                    "TZID '{tzid}' is not a known IANA time zone"
                )));
            }
        };

        if cli.scan_days <= 0 {
            return Err(CalMcpError::Config(format!(
                "SCAN_DAYS must be positive, got {}",
                cli.scan_days
            )));
        }

        let profile = match cli.dr_profile.trim() {
            "1" | "true" | "yes" => ToolProfile::DeepResearch,
            _ => ToolProfile::Standard,
        };

        Ok(AppConfig {
            apple_id,
            password: Secret::new(password),
            caldav_url,
            default_tzid,
            host: cli.host,
            port: cli.port,
            profile,
            scan_days: cli.scan_days,
        })
    }

    /// The default zone, for interpreting floating times.
    pub fn default_zone(&self) -> Option<Tz> {
        self.default_tzid.as_deref().and_then(parse_zone)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(name: &str, value: Option<String>) -> CalMcpResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CalMcpError::Config(format!("{name} must be set")))
}
