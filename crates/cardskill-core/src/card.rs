use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ValidationError;

/// Card rarity: a numeric star tier or the birthday tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rarity {
    Star(u8),
    Birthday,
}

impl Rarity {
    /// Parse user input (`1`..`5`, `bd`, `birthday`). Only bare digits count.
    pub fn parse_filter(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "bd" | "birthday" => Ok(Rarity::Birthday),
            "1" => Ok(Rarity::Star(1)),
            "2" => Ok(Rarity::Star(2)),
            "3" => Ok(Rarity::Star(3)),
            "4" => Ok(Rarity::Star(4)),
            "5" => Ok(Rarity::Star(5)),
            _ => Err(ValidationError::InvalidRarity(value.to_string())),
        }
    }

    /// Trained art only exists for three stars and up, never for birthday cards.
    pub fn has_trained_art(self) -> bool {
        match self {
            Rarity::Star(stars) => stars >= 3,
            Rarity::Birthday => false,
        }
    }

    pub fn display_stars(self) -> String {
        match self {
            Rarity::Star(stars) => "★".repeat(usize::from(stars)),
            Rarity::Birthday => "BD ★".to_string(),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rarity::Star(stars) => write!(f, "{stars}"),
            Rarity::Birthday => f.write_str("birthday"),
        }
    }
}

/// One releasable card, rebuilt from upstream JSON on every load.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    pub id: u32,
    /// Display title for the selected server.
    pub title: String,
    /// Every non-empty localized title, searched by `--prefix`.
    pub titles: Vec<String>,
    pub character_id: u32,
    pub unit: &'static str,
    pub attribute: String,
    pub rarity: Rarity,
    pub released_at: Option<DateTime<Utc>>,
    pub skill_name: Option<String>,
    pub skill_id: Option<u32>,
    /// Distribution type as published upstream (`permanent`, `limited`, ...).
    pub card_type: Option<String>,
    normal_art: String,
    trained_art: Option<String>,
}

impl CardRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        title: String,
        titles: Vec<String>,
        character_id: u32,
        unit: &'static str,
        attribute: String,
        rarity: Rarity,
        released_at: Option<DateTime<Utc>>,
        skill_name: Option<String>,
        art_bundle: &str,
    ) -> Self {
        let normal_art = format!("{art_bundle}/card_normal");
        let trained_art = rarity
            .has_trained_art()
            .then(|| format!("{art_bundle}/card_after_training"));

        Self {
            id,
            title,
            titles,
            character_id,
            unit,
            attribute,
            rarity,
            released_at,
            skill_name,
            skill_id: None,
            card_type: None,
            normal_art,
            trained_art,
        }
    }

    pub fn with_skill_id(mut self, skill_id: Option<u32>) -> Self {
        self.skill_id = skill_id;
        self
    }

    pub fn with_card_type(mut self, card_type: Option<String>) -> Self {
        self.card_type = card_type.filter(|kind| !kind.is_empty());
        self
    }

    pub fn normal_art(&self) -> &str {
        &self.normal_art
    }

    pub fn trained_art(&self) -> Option<&str> {
        self.trained_art.as_deref()
    }

    pub fn title_contains(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.titles.iter().any(|title| title.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rarity: Rarity) -> CardRecord {
        CardRecord::new(
            1,
            "title".to_string(),
            vec!["title".to_string()],
            19,
            "school_refusal",
            "cool".to_string(),
            rarity,
            None,
            None,
            "res019_no001",
        )
    }

    #[test]
    fn bd_and_birthday_are_the_same_tier() {
        assert_eq!(Rarity::parse_filter("bd"), Ok(Rarity::Birthday));
        assert_eq!(Rarity::parse_filter("Birthday"), Ok(Rarity::Birthday));
        assert_eq!(Rarity::parse_filter(" 4 "), Ok(Rarity::Star(4)));
    }

    #[test]
    fn rejects_out_of_range_rarity() {
        assert!(matches!(
            Rarity::parse_filter("6"),
            Err(ValidationError::InvalidRarity(_))
        ));
        assert!(Rarity::parse_filter("0").is_err());
        assert!(Rarity::parse_filter("four").is_err());
    }

    #[test]
    fn rarity_needs_a_bare_digit() {
        for value in ["+4", "04", "4.0", "٤"] {
            assert_eq!(
                Rarity::parse_filter(value),
                Err(ValidationError::InvalidRarity(value.to_string())),
                "{value}"
            );
        }
    }

    #[test]
    fn empty_card_type_is_dropped() {
        let record = record(Rarity::Star(4))
            .with_skill_id(Some(42))
            .with_card_type(Some(String::new()));
        assert_eq!(record.skill_id, Some(42));
        assert_eq!(record.card_type, None);
    }

    #[test]
    fn trained_art_follows_rarity() {
        assert!(record(Rarity::Star(1)).trained_art().is_none());
        assert!(record(Rarity::Star(2)).trained_art().is_none());
        assert!(record(Rarity::Birthday).trained_art().is_none());
        assert_eq!(
            record(Rarity::Star(3)).trained_art(),
            Some("res019_no001/card_after_training")
        );
        assert_eq!(record(Rarity::Star(5)).normal_art(), "res019_no001/card_normal");
    }

    #[test]
    fn star_display() {
        assert_eq!(Rarity::Star(4).display_stars(), "★★★★");
        assert_eq!(Rarity::Birthday.display_stars(), "BD ★");
    }
}
