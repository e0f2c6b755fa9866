use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Unprefixed variables understood for compatibility with existing `.env` files.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("YTDL_PARAMS", "downloader.extra_params"),
    ("COOKIES_FILE", "downloader.cookies_file"),
    ("REPORT_WEBHOOK_URL", "reporter.default_url"),
    ("DOWNLOAD_BASE_URL", "reporter.public_base_url"),
];

/// Load configuration: defaults, then the TOML file (optional), then legacy
/// variables, then `ASSETOR_`-prefixed variables (`__` separates sections).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(legacy_env())
        .merge(Env::prefixed("ASSETOR_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}
