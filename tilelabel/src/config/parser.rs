//! INI parsing: `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;

use ini::Ini;

use super::file::{ConfigFile, ConfigFileError};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [service] section
    if let Some(section) = ini.section(Some("service")) {
        if let Some(v) = section.get("label_url") {
            config.service.label_url = parse_url("service", "label_url", v)?;
        }
        if let Some(v) = section.get("metadata_url") {
            config.service.metadata_url = parse_url("service", "metadata_url", v)?;
        }
        if let Some(v) = section.get("tile_url") {
            config.service.tile_url = parse_url("service", "tile_url", v)?;
        }
        if let Some(v) = section.get("timeout_secs") {
            config.service.timeout_secs = parse_positive("service", "timeout_secs", v)?;
        }
    }

    // [batching] section
    if let Some(section) = ini.section(Some("batching")) {
        if let Some(v) = section.get("debounce_ms") {
            config.batching.debounce_ms = parse_number("batching", "debounce_ms", v)?;
        }
        if let Some(v) = section.get("threshold") {
            config.batching.threshold = parse_positive("batching", "threshold", v)?;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Accept an http(s) url, dropping any trailing slash.
pub(super) fn parse_url(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if !(v.starts_with("http://") || v.starts_with("https://")) {
        return Err(invalid(
            section,
            key,
            value,
            "must start with http:// or https://",
        ));
    }
    Ok(v.trim_end_matches('/').to_string())
}

pub(super) fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

pub(super) fn parse_positive<T: FromStr + Default + PartialEq>(
    section: &str,
    key: &str,
    value: &str,
) -> Result<T, ConfigFileError> {
    let n: T = parse_number(section, key, value)?;
    if n == T::default() {
        return Err(invalid(section, key, value, "must be greater than zero"));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_service_section() {
        let config = parse(
            "[service]\nlabel_url = http://labels:9000/\ntile_url = https://cdn.example\ntimeout_secs = 2\n",
        )
        .unwrap();
        assert_eq!(config.service.label_url, "http://labels:9000");
        assert_eq!(config.service.tile_url, "https://cdn.example");
        assert_eq!(config.service.timeout_secs, 2);
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = parse("[service]\nlabel_url = ftp://labels\n").unwrap_err();
        assert!(err.to_string().contains("service.label_url"));
    }

    #[test]
    fn test_rejects_zero_threshold_and_timeout() {
        assert!(parse("[batching]\nthreshold = 0\n").is_err());
        assert!(parse("[service]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_zero_debounce_is_allowed() {
        let config = parse("[batching]\ndebounce_ms = 0\n").unwrap();
        assert_eq!(config.batching.debounce_ms, 0);
    }
}
