use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;

use crate::error::CardError;
use crate::game::Game;

pub const DEFAULT_CACHE_TTL_SECS: i64 = 3_600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const CACHE_DIR_NAME: &str = "cardskill";

/// Environment-driven settings shared by every invocation.
#[derive(Debug, Clone)]
pub struct Tunables {
    pub cache_dir: PathBuf,
    pub cache_ttl: TimeDelta,
    pub http_timeout: Duration,
    pub sekai_cards_url: String,
    pub bandori_cards_url: String,
    pub bandori_skills_url: String,
    /// When set, structured logs are also written here as JSON.
    pub log_dir: Option<PathBuf>,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_directory(),
            cache_ttl: TimeDelta::seconds(DEFAULT_CACHE_TTL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sekai_cards_url: Game::Sekai.schema().cards_url.to_string(),
            bandori_cards_url: Game::Bandori.schema().cards_url.to_string(),
            bandori_skills_url: Game::Bandori
                .skill_source()
                .map(|source| source.url.to_string())
                .unwrap_or_default(),
            log_dir: None,
        }
    }
}

impl Tunables {
    pub fn from_env() -> Result<Self, CardError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from any variable source; `lookup` returns `None` for unset names.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, CardError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let cache_dir = non_empty("CARDSKILL_CACHE_DIR")
            .map(|value| expand_path(&value))
            .unwrap_or(defaults.cache_dir);

        let ttl_secs = parse_var(
            "CARDSKILL_CACHE_TTL_SECS",
            non_empty("CARDSKILL_CACHE_TTL_SECS"),
            DEFAULT_CACHE_TTL_SECS,
            |s| s.parse::<i64>(),
        )?;
        let cache_ttl = TimeDelta::try_seconds(ttl_secs)
            .filter(|ttl| *ttl >= TimeDelta::zero())
            .ok_or_else(|| {
                CardError::Config(format!(
                    "invalid value for CARDSKILL_CACHE_TTL_SECS: {ttl_secs}"
                ))
            })?;

        let timeout_secs = parse_var(
            "CARDSKILL_HTTP_TIMEOUT_SECS",
            non_empty("CARDSKILL_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
            |s| s.parse::<u64>(),
        )?;

        let sekai_cards_url =
            non_empty("CARDSKILL_SEKAI_CARDS_URL").unwrap_or(defaults.sekai_cards_url);
        let bandori_cards_url =
            non_empty("CARDSKILL_BANDORI_CARDS_URL").unwrap_or(defaults.bandori_cards_url);
        let bandori_skills_url =
            non_empty("CARDSKILL_BANDORI_SKILLS_URL").unwrap_or(defaults.bandori_skills_url);

        let log_dir = non_empty("CARDSKILL_LOG_DIR").map(|value| expand_path(&value));

        Ok(Self {
            cache_dir,
            cache_ttl,
            http_timeout: Duration::from_secs(timeout_secs),
            sekai_cards_url,
            bandori_cards_url,
            bandori_skills_url,
            log_dir,
        })
    }

    pub fn cards_url(&self, game: Game) -> &str {
        match game {
            Game::Sekai => &self.sekai_cards_url,
            Game::Bandori => &self.bandori_cards_url,
        }
    }

    pub fn skills_url(&self, game: Game) -> Option<&str> {
        match game {
            Game::Sekai => None,
            Game::Bandori => Some(&self.bandori_skills_url),
        }
    }
}

/// Per-user cache directory, falling back to the system temp dir.
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join(CACHE_DIR_NAME)
}

fn expand_path(value: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(value.trim()).to_string())
}

fn parse_var<T, F, E>(
    var: &str,
    value: Option<String>,
    default: T,
    mut parser: F,
) -> Result<T, CardError>
where
    F: FnMut(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    match value {
        Some(value) => match parser(value.trim()) {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(CardError::Config(format!(
                "invalid value for {}: {}",
                var, err
            ))),
        },
        None => Ok(default),
    }
}
