//! Text and JSON rendering.
//!
//! Both modes go through [`render_result`], which also owns the exit code so
//! that every failure, in either mode, is reported the same way.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Asia::Tokyo;
use serde::Serialize;
use serde_json::json;

use crate::card::CardRecord;
use crate::error::CardError;
use crate::game::{Game, Server};
use crate::locale::Locale;
use crate::pipeline::QueryOutcome;
use crate::skill::SkillEntry;

const PLACEHOLDER: &str = "—";

/// One card as shown to the user. Field names are the JSON keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub id: u32,
    pub title: String,
    pub character_id: u32,
    pub character_name: &'static str,
    pub unit: &'static str,
    pub unit_name: &'static str,
    pub attr: String,
    pub attr_name: String,
    pub rarity: String,
    pub rarity_display: String,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub skill_id: Option<u32>,
    pub skill_name: Option<String>,
    pub skill_summary: Option<String>,
    /// Durations filled in for the requested skill level.
    pub skill_description: Option<String>,
    /// `YYYY-MM-DD` in Japan Standard Time.
    pub release_date: Option<String>,
    pub released_at: Option<String>,
    pub detail_url: String,
    pub normal_image: String,
    pub trained_image: Option<String>,
}

impl CardView {
    pub fn new(record: &CardRecord, game: Game, server: Server) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            character_id: record.character_id,
            character_name: game
                .character(record.character_id)
                .map(|entry| entry.display_name())
                .unwrap_or(PLACEHOLDER),
            unit: record.unit,
            unit_name: game.unit_display(record.unit),
            attr: record.attribute.clone(),
            attr_name: game
                .attribute_display(&record.attribute)
                .map(str::to_string)
                .unwrap_or_else(|| record.attribute.clone()),
            rarity: record.rarity.to_string(),
            rarity_display: record.rarity.display_stars(),
            card_type: record.card_type.clone(),
            skill_id: record.skill_id,
            skill_name: record.skill_name.clone(),
            skill_summary: None,
            skill_description: None,
            release_date: record.released_at.map(release_date),
            released_at: record
                .released_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            detail_url: game.detail_url(record.id),
            normal_image: game.image_url(server, record.normal_art()),
            trained_image: record.trained_art().map(|key| game.image_url(server, key)),
        }
    }

    pub fn attach_skill(&mut self, skill: &SkillEntry, locale: Locale, level: Option<u8>) {
        self.skill_summary = skill.summary(locale);
        self.skill_description = skill.description(locale, level);
    }
}

pub fn release_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Tokyo).format("%Y-%m-%d").to_string()
}

/// Everything one invocation writes, plus how it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub stdout: String,
    pub stderr: Vec<String>,
    pub exit_code: i32,
}

pub fn render_result(result: Result<QueryOutcome, CardError>, json: bool, locale: Locale) -> Rendered {
    match result {
        Ok(outcome) => {
            let stderr = outcome
                .warnings
                .iter()
                .map(|warning| locale.warning_message(warning))
                .collect();
            let stdout = if json {
                render_json(&outcome, locale)
            } else {
                render_text(&outcome.cards, locale)
            };
            Rendered {
                stdout,
                stderr,
                exit_code: 0,
            }
        }
        Err(err) => {
            let message = locale.error_message(&err);
            if json {
                Rendered {
                    stdout: json_error(&message),
                    stderr: Vec::new(),
                    exit_code: 1,
                }
            } else {
                Rendered {
                    stdout: String::new(),
                    stderr: vec![format!("{}{message}", locale.error_prefix())],
                    exit_code: 1,
                }
            }
        }
    }
}

pub fn render_text(cards: &[CardView], locale: Locale) -> String {
    if cards.is_empty() {
        return locale.no_results().to_string();
    }

    let labels = locale.labels();
    let numbered = cards.len() > 1;
    let mut blocks = Vec::with_capacity(cards.len());

    for (index, card) in cards.iter().enumerate() {
        let mut lines = Vec::new();
        if numbered {
            lines.push(format!("── {} #{} ──", labels.card, index + 1));
        }
        lines.push(format!("{}: {}", labels.title, card.title));
        lines.push(format!("{}: {}", labels.character, card.character_name));
        lines.push(format!("{}: {}", labels.unit, card.unit_name));
        lines.push(format!("{}: {} ({})", labels.attribute, card.attr_name, card.attr));
        lines.push(format!("{}: {}", labels.rarity, card.rarity_display));
        if let Some(kind) = &card.card_type {
            lines.push(format!("{}: {kind}", labels.card_type));
        }
        if let Some(skill) = &card.skill_name {
            lines.push(format!("{}: {skill}", labels.skill));
        }
        if let Some(skill_id) = card.skill_id {
            lines.push(format!("{}: {skill_id}", labels.skill_id));
        }
        if let Some(effect) = card.skill_description.as_ref().or(card.skill_summary.as_ref()) {
            lines.push(format!("{}: {effect}", labels.skill_effect));
        }
        lines.push(format!(
            "{}: {}",
            labels.release_date,
            card.release_date.as_deref().unwrap_or(PLACEHOLDER)
        ));
        lines.push(format!("{}: {}", labels.detail, card.detail_url));
        lines.push(format!("{}: {}", labels.normal_art, card.normal_image));
        if let Some(trained) = &card.trained_image {
            lines.push(format!("{}: {trained}", labels.trained_art));
        }
        blocks.push(lines.join("\n"));
    }

    blocks.join("\n\n")
}

#[derive(Serialize)]
struct Envelope<'a> {
    game: &'static str,
    count: usize,
    results: &'a [CardView],
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub fn render_json(outcome: &QueryOutcome, locale: Locale) -> String {
    let envelope = Envelope {
        game: outcome.game.slug(),
        count: outcome.cards.len(),
        results: &outcome.cards,
        warnings: outcome
            .warnings
            .iter()
            .map(|warning| locale.warning_message(warning))
            .collect(),
        message: outcome.cards.is_empty().then(|| locale.no_results()),
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(rendered) => rendered,
        Err(err) => json_error(&locale.error_message(&CardError::from(err))),
    }
}

/// `{"error": ..., "results": []}`, the one failure shape in JSON mode.
pub fn json_error(message: &str) -> String {
    json!({ "error": message, "results": [] }).to_string()
}
