//! Skill text from a game's companion skills document.
//!
//! Cards only carry a skill ID; the localized description and per-level
//! durations live in a separate upstream document that is cached the same
//! way as the card list.

use std::collections::HashMap;

use crate::game::Server;
use crate::locale::Locale;

/// One skill. Text arrays are indexed like the per-server arrays
/// (jp, en, tw, cn, kr).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillEntry {
    pub descriptions: Vec<Option<String>>,
    pub summaries: Vec<Option<String>>,
    /// Effect duration in seconds for each skill level, lowest first.
    pub durations: Vec<f64>,
}

impl SkillEntry {
    /// Full description with the duration filled in for `level`.
    pub fn description(&self, locale: Locale, level: Option<u8>) -> Option<String> {
        localized(&self.descriptions, locale).map(|text| apply_level(text, &self.durations, level))
    }

    pub fn summary(&self, locale: Locale) -> Option<String> {
        localized(&self.summaries, locale).map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillTable {
    entries: HashMap<u32, SkillEntry>,
}

impl SkillTable {
    pub fn new(entries: HashMap<u32, SkillEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, skill_id: u32) -> Option<&SkillEntry> {
        self.entries.get(&skill_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The locale's region, falling back to the JP text.
fn localized(values: &[Option<String>], locale: Locale) -> Option<&str> {
    let pick = |index: usize| {
        values
            .get(index)
            .and_then(|value| value.as_deref())
            .filter(|value| !value.trim().is_empty())
    };
    pick(region_for(locale).index()).or_else(|| pick(Server::Jp.index()))
}

fn region_for(locale: Locale) -> Server {
    match locale {
        Locale::ZhHant => Server::Tw,
        Locale::ZhHans => Server::Cn,
        Locale::En => Server::En,
    }
}

/// Substitute the duration placeholder (`{1}` if present, else `{0}`).
///
/// A level is clamped to the available durations. Without one, every
/// level's duration is listed as `5/5.5/6`.
pub fn apply_level(text: &str, durations: &[f64], level: Option<u8>) -> String {
    if durations.is_empty() {
        return text.to_string();
    }

    let value = match level {
        Some(level) => {
            let index = usize::from(level).clamp(1, durations.len()) - 1;
            durations
                .get(index)
                .map(f64::to_string)
                .unwrap_or_default()
        }
        None => durations
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join("/"),
    };

    let placeholder = if text.contains("{1}") { "{1}" } else { "{0}" };
    text.replace(placeholder, &value)
}
