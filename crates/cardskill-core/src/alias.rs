use std::collections::HashMap;

use strsim::jaro_winkler;

use crate::error::CardError;
use crate::game::{CharacterEntry, Game};

/// Minimum Jaro-Winkler score for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Maps user-supplied character tokens onto canonical character IDs.
///
/// Lookups are exact after normalization and run in a fixed order: numeric
/// ID, romaji, native-script name, localized name, abbreviation. The first
/// table that contains the token wins, so an abbreviation can never shadow a
/// real name.
#[derive(Debug, Clone)]
pub struct AliasResolver<'a> {
    entries: &'a [CharacterEntry],
    by_romaji: HashMap<String, u32>,
    by_native: HashMap<String, u32>,
    by_localized: HashMap<String, u32>,
    by_abbreviation: HashMap<String, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Id,
    Romaji,
    Native,
    Localized,
    Abbreviation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasMatch {
    pub character_id: u32,
    pub strategy: MatchStrategy,
}

impl AliasResolver<'static> {
    pub fn for_game(game: Game) -> Self {
        Self::new(game.characters())
    }
}

impl<'a> AliasResolver<'a> {
    pub fn new(entries: &'a [CharacterEntry]) -> Self {
        let mut by_romaji = HashMap::new();
        let mut by_native = HashMap::new();
        let mut by_localized = HashMap::new();
        let mut by_abbreviation = HashMap::new();

        for entry in entries {
            for name in entry.romaji {
                index(&mut by_romaji, name, entry.id);
            }
            for name in entry.native {
                index(&mut by_native, name, entry.id);
                index(&mut by_native, &strip_spaces(name), entry.id);
            }
            for name in entry.localized {
                index(&mut by_localized, name, entry.id);
                index(&mut by_localized, &strip_spaces(name), entry.id);
            }
            for name in entry.abbreviations {
                index(&mut by_abbreviation, name, entry.id);
            }
        }

        Self {
            entries,
            by_romaji,
            by_native,
            by_localized,
            by_abbreviation,
        }
    }

    pub fn resolve(&self, token: &str) -> Result<AliasMatch, CardError> {
        let normalized = normalize(token);
        self.lookup(&normalized)
            .ok_or_else(|| CardError::UnknownCharacter {
                token: token.trim().to_string(),
                suggestion: self.suggest(&normalized),
            })
    }

    fn lookup(&self, normalized: &str) -> Option<AliasMatch> {
        if normalized.is_empty() {
            return None;
        }

        if let Ok(id) = normalized.parse::<u32>() {
            if self.entries.iter().any(|entry| entry.id == id) {
                return Some(AliasMatch {
                    character_id: id,
                    strategy: MatchStrategy::Id,
                });
            }
        }

        let tables = [
            (&self.by_romaji, MatchStrategy::Romaji),
            (&self.by_native, MatchStrategy::Native),
            (&self.by_localized, MatchStrategy::Localized),
            (&self.by_abbreviation, MatchStrategy::Abbreviation),
        ];

        tables.into_iter().find_map(|(table, strategy)| {
            table.get(normalized).map(|&character_id| AliasMatch {
                character_id,
                strategy,
            })
        })
    }

    /// Closest romaji name, for the error message only.
    fn suggest(&self, normalized: &str) -> Option<String> {
        if normalized.is_empty() || !normalized.is_ascii() {
            return None;
        }

        let mut best: Option<(f64, &str)> = None;
        for entry in self.entries {
            for name in entry.romaji {
                let score = jaro_winkler(normalized, name);
                if score < SUGGESTION_THRESHOLD {
                    continue;
                }
                match best {
                    Some((best_score, _)) if score <= best_score + 1e-6 => {}
                    _ => best = Some((score, name)),
                }
            }
        }

        best.map(|(_, name)| name.to_string())
    }
}

/// First registration wins so table order decides collisions.
fn index(table: &mut HashMap<String, u32>, name: &str, id: u32) {
    let key = normalize(name);
    if !key.is_empty() {
        table.entry(key).or_insert(id);
    }
}

fn strip_spaces(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Lowercase, trim and collapse runs of whitespace to one space.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
