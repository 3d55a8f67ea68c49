//! Per-game schema descriptors.
//!
//! Everything that differs between the supported games lives here: the
//! upstream URL and JSON layout, character/unit/attribute tables, asset and
//! detail-page URL templates, and the default output locale. The rest of the
//! pipeline is written once against [`Game`].

mod bandori;
mod sekai;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::card::CardRecord;
use crate::error::{CardError, ValidationError};
use crate::locale::Locale;
use crate::skill::SkillTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Game {
    /// Project SEKAI COLORFUL STAGE!
    Sekai,
    /// BanG Dream! Girls Band Party!
    Bandori,
}

/// Regional game server. Selects display titles, release dates and asset paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Server {
    #[default]
    Jp,
    En,
    Tw,
    Cn,
    Kr,
}

/// One row of a character table.
#[derive(Debug, Clone, Copy)]
pub struct CharacterEntry {
    pub id: u32,
    pub romaji: &'static [&'static str],
    /// Native-script names; the first one is used for display.
    pub native: &'static [&'static str],
    /// Traditional Chinese names.
    pub localized: &'static [&'static str],
    pub abbreviations: &'static [&'static str],
    pub unit: &'static str,
}

impl CharacterEntry {
    pub fn display_name(&self) -> &'static str {
        self.native.first().copied().unwrap_or("—")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnitEntry {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    pub display: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeEntry {
    pub key: &'static str,
    pub display: &'static str,
}

/// Companion document that maps skill IDs to their text.
#[derive(Clone, Copy)]
pub struct SkillSource {
    pub url: &'static str,
    pub cache_key: &'static str,
    parse: fn(&Value) -> Result<SkillTable, CardError>,
}

impl SkillSource {
    pub fn parse(&self, data: &Value) -> Result<SkillTable, CardError> {
        (self.parse)(data)
    }
}

pub struct GameSchema {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub cards_url: &'static str,
    pub cache_key: &'static str,
    /// Asset base; `{server}` is substituted with the server code.
    pub asset_base: &'static str,
    pub detail_base: &'static str,
    pub servers: &'static [Server],
    pub default_locale: Locale,
    pub characters: &'static [CharacterEntry],
    pub units: &'static [UnitEntry],
    pub attributes: &'static [AttributeEntry],
    /// Absent when the game's skill text is not available as one document.
    pub skills: Option<SkillSource>,
    parse: fn(&Value, Server) -> Result<Vec<CardRecord>, CardError>,
}

pub const NO_UNIT: &str = "none";

impl Game {
    pub const ALL: [Game; 2] = [Game::Sekai, Game::Bandori];

    pub fn schema(self) -> &'static GameSchema {
        match self {
            Game::Sekai => &sekai::SCHEMA,
            Game::Bandori => &bandori::SCHEMA,
        }
    }

    pub fn slug(self) -> &'static str {
        self.schema().slug
    }

    pub fn display_name(self) -> &'static str {
        self.schema().display_name
    }

    pub fn cache_key(self) -> &'static str {
        self.schema().cache_key
    }

    pub fn default_locale(self) -> Locale {
        self.schema().default_locale
    }

    pub fn characters(self) -> &'static [CharacterEntry] {
        self.schema().characters
    }

    pub fn character(self, id: u32) -> Option<&'static CharacterEntry> {
        self.characters().iter().find(|entry| entry.id == id)
    }

    pub fn unit_of(self, character_id: u32) -> &'static str {
        self.character(character_id)
            .map(|entry| entry.unit)
            .unwrap_or(NO_UNIT)
    }

    pub fn unit_display(self, key: &str) -> &'static str {
        self.schema()
            .units
            .iter()
            .find(|unit| unit.key == key)
            .map(|unit| unit.display)
            .unwrap_or("—")
    }

    pub fn attribute_display(self, key: &str) -> Option<&'static str> {
        self.schema()
            .attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.display)
    }

    /// Accepts a short alias or the canonical unit key, case-insensitively.
    pub fn resolve_unit(self, token: &str) -> Result<&'static UnitEntry, ValidationError> {
        let needle = token.trim().to_lowercase();
        self.schema()
            .units
            .iter()
            .find(|unit| unit.key == needle || unit.aliases.contains(&needle.as_str()))
            .ok_or_else(|| ValidationError::UnknownUnit {
                value: token.to_string(),
                expected: self
                    .schema()
                    .units
                    .iter()
                    .filter_map(|unit| unit.aliases.first().copied())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn resolve_attribute(
        self,
        token: &str,
    ) -> Result<&'static AttributeEntry, ValidationError> {
        let needle = token.trim().to_lowercase();
        self.schema()
            .attributes
            .iter()
            .find(|attr| attr.key == needle)
            .ok_or_else(|| ValidationError::InvalidAttribute {
                value: token.to_string(),
                expected: self
                    .schema()
                    .attributes
                    .iter()
                    .map(|attr| attr.key)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn ensure_server(self, server: Server) -> Result<(), ValidationError> {
        if self.schema().servers.contains(&server) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedServer {
                server: server.code().to_string(),
                game: self.display_name().to_string(),
            })
        }
    }

    pub fn skill_source(self) -> Option<&'static SkillSource> {
        self.schema().skills.as_ref()
    }

    pub fn parse_cards(self, data: &Value, server: Server) -> Result<Vec<CardRecord>, CardError> {
        (self.schema().parse)(data, server)
    }

    pub fn image_url(self, server: Server, art_key: &str) -> String {
        let base = self.schema().asset_base.replace("{server}", server.code());
        format!("{base}/{art_key}.png")
    }

    pub fn detail_url(self, card_id: u32) -> String {
        format!("{}/{card_id}", self.schema().detail_base)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Game {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sekai" | "pjsk" | "prsk" => Ok(Game::Sekai),
            "bandori" | "bestdori" | "garupa" => Ok(Game::Bandori),
            other => Err(format!("unknown game '{other}' (expected sekai or bandori)")),
        }
    }
}

impl Server {
    pub fn code(self) -> &'static str {
        match self {
            Server::Jp => "jp",
            Server::En => "en",
            Server::Tw => "tw",
            Server::Cn => "cn",
            Server::Kr => "kr",
        }
    }

    /// Position of this server in Bestdori's per-region arrays.
    pub fn index(self) -> usize {
        match self {
            Server::Jp => 0,
            Server::En => 1,
            Server::Tw => 2,
            Server::Cn => 3,
            Server::Kr => 4,
        }
    }
}

impl FromStr for Server {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jp" => Ok(Server::Jp),
            "en" => Ok(Server::En),
            "tw" => Ok(Server::Tw),
            "cn" => Ok(Server::Cn),
            "kr" => Ok(Server::Kr),
            other => Err(format!("unknown server '{other}' (expected jp, en, tw, cn or kr)")),
        }
    }
}
