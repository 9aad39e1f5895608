use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Where alias records come from.
#[derive(Clone, Debug, PartialEq)]
pub enum AliasSource {
    Postgres(String),
    JsonFile(PathBuf),
    /// Built-in seed table only
    Seed,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub crown_fixtures_path: PathBuf,
    pub api_fixtures_path: PathBuf,
    pub mapping_output_path: PathBuf,
    pub alias_source: AliasSource,
    /// `None` runs a single pass
    pub interval: Option<Duration>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn path_var(key: &str, default: &str) -> PathBuf {
    non_empty_var(key).unwrap_or_else(|| default.to_string()).into()
}

/// `DATABASE_URL` wins over `ALIAS_FILE_PATH`; neither means the seed table.
pub fn alias_source(database_url: Option<String>, alias_file: Option<String>) -> AliasSource {
    match (database_url, alias_file) {
        (Some(url), _) => AliasSource::Postgres(url),
        (None, Some(path)) => AliasSource::JsonFile(path.into()),
        (None, None) => AliasSource::Seed,
    }
}

/// Seconds between passes; missing or zero means run once.
pub fn parse_interval(value: Option<&str>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let secs: u64 = raw.trim().parse().with_context(|| {
                format!("MAPPER_INTERVAL_SECS must be a number of seconds, got {:?}", raw)
            })?;
            Ok((secs > 0).then(|| Duration::from_secs(secs)))
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            crown_fixtures_path: path_var("CROWN_FIXTURES_PATH", "data/crown_fixtures.json"),
            api_fixtures_path: path_var("API_FIXTURES_PATH", "data/api_fixtures.json"),
            mapping_output_path: path_var("MAPPING_OUTPUT_PATH", "data/fixture_mapping.json"),
            alias_source: alias_source(
                non_empty_var("DATABASE_URL"),
                non_empty_var("ALIAS_FILE_PATH"),
            ),
            interval: parse_interval(non_empty_var("MAPPER_INTERVAL_SECS").as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_source_precedence() {
        assert_eq!(
            alias_source(Some("postgres://db".to_string()), Some("aliases.json".to_string())),
            AliasSource::Postgres("postgres://db".to_string())
        );
        assert_eq!(
            alias_source(None, Some("aliases.json".to_string())),
            AliasSource::JsonFile(PathBuf::from("aliases.json"))
        );
        assert_eq!(alias_source(None, None), AliasSource::Seed);
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval(None).unwrap(), None);
        assert_eq!(parse_interval(Some("0")).unwrap(), None);
        assert_eq!(parse_interval(Some(" 30 ")).unwrap(), Some(Duration::from_secs(30)));
        assert!(parse_interval(Some("soon")).is_err());
    }
}
