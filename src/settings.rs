use std::collections::HashMap;
use std::env;

use log::debug;

use crate::content::Revision;
use crate::error::{Error, Result};

/// Prefix of the environment variables read by `Settings::from_env`.
pub const ENV_PREFIX: &str = "TREASURY_";

#[derive(Clone, Debug)]
pub struct TemplateSettings {
    pub dir: String,
    pub debug: bool,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub ws_port: u16,
    pub revision: Revision,
    pub log_level: String,
    pub max_body_bytes: usize,
    pub template: TemplateSettings,
    pub other: HashMap<String, String>, // unrecognised TREASURY_* values, keyed lower-case
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            host: "127.0.0.1".to_string(),
            port: 8501,
            ws_port: 8502,
            revision: Revision::default(),
            log_level: "info".to_string(),
            max_body_bytes: 64 * 1024,
            template: TemplateSettings {
                dir: "templates".to_string(),
                debug: false,
            },
            other: HashMap::new(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::config(key, format!("expected a boolean, got '{value}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(key, format!("expected a number, got '{value}'")))
}

impl Settings {
    /// Load settings from the process environment, on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    /// Overlay `TREASURY_*` variables from `vars` onto the defaults.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Settings::default();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "HOST" => settings.host = value.to_string(),
                "PORT" => settings.port = parse_number(key, value)?,
                "WS_PORT" => settings.ws_port = parse_number(key, value)?,
                "DEBUG" => settings.debug = parse_bool(key, value)?,
                "REVISION" => settings.revision = value.parse()?,
                "LOG_LEVEL" => settings.log_level = value.to_string(),
                "MAX_BODY_BYTES" => settings.max_body_bytes = parse_number(key, value)?,
                "TEMPLATE_DIR" => settings.template.dir = value.to_string(),
                "TEMPLATE_DEBUG" => settings.template.debug = parse_bool(key, value)?,
                other => {
                    debug!("Keeping unrecognised setting {}", key);
                    settings
                        .other
                        .insert(other.to_ascii_lowercase(), value.to_string());
                }
            }
        }
        if settings.debug && settings.port == settings.ws_port {
            return Err(Error::config(
                "TREASURY_WS_PORT",
                "must differ from TREASURY_PORT when debug is on",
            ));
        }
        Ok(settings)
    }

    /// URL the live-reload script connects to.
    pub fn reload_url(&self) -> String {
        format!("ws://{}:{}/ws/reload", self.host, self.ws_port)
    }
}
