//! Query validation and the filter chain.
//!
//! [`FilterSpec::build`] turns the raw request into a validated spec before
//! any network access; [`apply`] then narrows a loaded record set.

use crate::alias::AliasResolver;
use crate::card::{CardRecord, Rarity};
use crate::error::{CardError, ValidationError};
use crate::game::{Game, Server};
use crate::locale::Locale;
use crate::skill::SkillTable;
use crate::warning::Warning;

/// Raw request as it arrives from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CardQuery {
    pub game: Game,
    pub server: Server,
    pub lang: Option<Locale>,
    pub character: Option<String>,
    pub prefix: Option<String>,
    pub card_id: Option<u32>,
    pub unit: Option<String>,
    pub rarity: Option<String>,
    pub attr: Option<String>,
    pub skill_id: Option<u32>,
    /// Substring of the skill description.
    pub skill_keyword: Option<String>,
    /// Skill level used to fill in skill durations; all levels when unset.
    pub skill_level: Option<u8>,
    pub limit: i64,
    pub all: bool,
    pub json: bool,
    pub no_cache: bool,
}

impl CardQuery {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            server: Server::default(),
            lang: None,
            character: None,
            prefix: None,
            card_id: None,
            unit: None,
            rarity: None,
            attr: None,
            skill_id: None,
            skill_keyword: None,
            skill_level: None,
            limit: 1,
            all: false,
            json: false,
            no_cache: false,
        }
    }

    pub fn locale(&self) -> Locale {
        self.lang.unwrap_or_else(|| self.game.default_locale())
    }
}

/// The one filter that picks which cards are candidates at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    CardId(u32),
    Title(String),
    Character(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Limit(usize),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub identity: Option<Identity>,
    pub unit: Option<&'static str>,
    pub rarity: Option<Rarity>,
    pub attribute: Option<&'static str>,
    pub skill_id: Option<u32>,
    /// Applied by [`retain_skill_text`] once the skill table is loaded.
    pub skill_keyword: Option<String>,
    pub selection: Selection,
}

impl FilterSpec {
    /// Validate a request and resolve its aliases.
    ///
    /// Never touches the network. Returns the `FilterSpec` together with any
    /// warnings about flags that will not be applied.
    pub fn build(query: &CardQuery) -> Result<(Self, Vec<Warning>), CardError> {
        let game = query.game;
        let mut warnings = Vec::new();

        if query.limit <= 0 {
            return Err(ValidationError::NonPositiveLimit(query.limit).into());
        }
        let selection = if query.all {
            Selection::All
        } else {
            Selection::Limit(usize::try_from(query.limit).unwrap_or(usize::MAX))
        };

        let character = non_empty(query.character.as_deref());
        let prefix = non_empty(query.prefix.as_deref());
        let unit = non_empty(query.unit.as_deref());
        let skill_keyword = non_empty(query.skill_keyword.as_deref());
        if character.is_none()
            && prefix.is_none()
            && query.card_id.is_none()
            && unit.is_none()
            && query.skill_id.is_none()
            && skill_keyword.is_none()
        {
            return Err(ValidationError::MissingQuery.into());
        }

        game.ensure_server(query.server)?;
        if skill_keyword.is_some() && game.skill_source().is_none() {
            return Err(ValidationError::SkillSearchUnsupported {
                game: game.display_name().to_string(),
            }
            .into());
        }

        let rarity = query.rarity.as_deref().map(Rarity::parse_filter).transpose()?;
        let attribute = query
            .attr
            .as_deref()
            .map(|value| game.resolve_attribute(value).map(|attr| attr.key))
            .transpose()?;
        let unit = unit
            .map(|value| game.resolve_unit(value).map(|entry| entry.key))
            .transpose()?;

        let identity = if let Some(card_id) = query.card_id {
            let mut ignored = Vec::new();
            if prefix.is_some() {
                ignored.push("--prefix");
            }
            if character.is_some() {
                ignored.push("character");
            }
            if !ignored.is_empty() {
                warnings.push(Warning::IgnoredIdentity {
                    used: "--card-id",
                    ignored,
                });
            }

            let mut dropped = Vec::new();
            if unit.is_some() {
                dropped.push("--unit");
            }
            if rarity.is_some() {
                dropped.push("--rarity");
            }
            if attribute.is_some() {
                dropped.push("--attr");
            }
            if query.skill_id.is_some() {
                dropped.push("--skill-id");
            }
            if skill_keyword.is_some() {
                dropped.push("--skill-keyword");
            }
            if !dropped.is_empty() {
                warnings.push(Warning::IgnoredFilters { flags: dropped });
            }

            return Ok((
                Self {
                    identity: Some(Identity::CardId(card_id)),
                    unit: None,
                    rarity: None,
                    attribute: None,
                    skill_id: None,
                    skill_keyword: None,
                    selection,
                },
                warnings,
            ));
        } else if let Some(title) = prefix {
            if character.is_some() {
                warnings.push(Warning::IgnoredIdentity {
                    used: "--prefix",
                    ignored: vec!["character"],
                });
            }
            Some(Identity::Title(title.to_string()))
        } else if let Some(token) = character {
            let matched = AliasResolver::for_game(game).resolve(token)?;
            Some(Identity::Character(matched.character_id))
        } else {
            None
        };

        Ok((
            Self {
                identity,
                unit,
                rarity,
                attribute,
                skill_id: query.skill_id,
                skill_keyword: skill_keyword.map(str::to_string),
                selection,
            },
            warnings,
        ))
    }

    fn matches(&self, record: &CardRecord) -> bool {
        let identity = match &self.identity {
            Some(Identity::CardId(id)) => record.id == *id,
            Some(Identity::Title(text)) => record.title_contains(text),
            Some(Identity::Character(id)) => record.character_id == *id,
            None => true,
        };

        identity
            && self.unit.is_none_or(|unit| record.unit == unit)
            && self.rarity.is_none_or(|rarity| record.rarity == rarity)
            && self
                .attribute
                .is_none_or(|attr| record.attribute == attr)
            && self
                .skill_id
                .is_none_or(|skill_id| record.skill_id == Some(skill_id))
    }
}

/// Narrow `records` to those matching `spec`, keeping their relative order.
pub fn apply<'a>(records: &'a [CardRecord], spec: &FilterSpec) -> Vec<&'a CardRecord> {
    records.iter().filter(|record| spec.matches(record)).collect()
}

/// Keep records whose skill description contains `keyword`.
///
/// The description is matched as rendered: in `locale` with `level` applied.
/// Records without a skill, or whose skill is missing from `skills`, drop out.
pub fn retain_skill_text<'a>(
    records: Vec<&'a CardRecord>,
    keyword: &str,
    skills: &SkillTable,
    locale: Locale,
    level: Option<u8>,
) -> Vec<&'a CardRecord> {
    records
        .into_iter()
        .filter(|record| {
            record
                .skill_id
                .and_then(|skill_id| skills.get(skill_id))
                .and_then(|skill| skill.description(locale, level))
                .is_some_and(|text| text.contains(keyword))
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::skill::SkillEntry;

    fn card(id: u32, character_id: u32, rarity: Rarity, attribute: &str, title: &str) -> CardRecord {
        CardRecord::new(
            id,
            title.to_string(),
            vec![title.to_string()],
            character_id,
            Game::Sekai.unit_of(character_id),
            attribute.to_string(),
            rarity,
            None,
            None,
            "res000_no000",
        )
    }

    fn records() -> Vec<CardRecord> {
        vec![
            card(1200, 19, Rarity::Star(4), "cute", "ひとりぼっちの夜").with_skill_id(Some(11)),
            card(1316, 19, Rarity::Star(4), "mysterious", "色褪せない夜").with_skill_id(Some(12)),
            card(1400, 19, Rarity::Birthday, "cool", "誕生日の夜"),
            card(1500, 17, Rarity::Star(4), "mysterious", "夜を越えて").with_skill_id(Some(12)),
            card(1600, 1, Rarity::Star(3), "cool", "朝"),
        ]
    }

    fn query() -> CardQuery {
        CardQuery::new(Game::Sekai)
    }

    fn ids(matched: &[&CardRecord]) -> Vec<u32> {
        matched.iter().map(|record| record.id).collect()
    }

    #[test]
    fn character_and_rarity_filters_combine() {
        let (spec, warnings) = FilterSpec::build(&CardQuery {
            character: Some("ena".to_string()),
            rarity: Some("4".to_string()),
            ..query()
        })
        .expect("valid");
        assert!(warnings.is_empty());
        assert_eq!(spec.identity, Some(Identity::Character(19)));

        let data = records();
        assert_eq!(ids(&apply(&data, &spec)), vec![1200, 1316]);
    }

    #[test]
    fn card_id_drops_refinements_with_warning() {
        let (spec, warnings) = FilterSpec::build(&CardQuery {
            card_id: Some(1316),
            rarity: Some("5".to_string()),
            attr: Some("cute".to_string()),
            ..query()
        })
        .expect("valid");

        assert_eq!(spec.rarity, None);
        assert_eq!(spec.attribute, None);
        assert_eq!(
            warnings,
            vec![Warning::IgnoredFilters {
                flags: vec!["--rarity", "--attr"]
            }]
        );

        let data = records();
        assert_eq!(ids(&apply(&data, &spec)), vec![1316]);
    }

    #[test]
    fn identity_priority_is_card_id_then_title_then_character() {
        let (spec, warnings) = FilterSpec::build(&CardQuery {
            card_id: Some(1600),
            prefix: Some("夜".to_string()),
            character: Some("ena".to_string()),
            ..query()
        })
        .expect("valid");
        assert_eq!(spec.identity, Some(Identity::CardId(1600)));
        assert_eq!(
            warnings,
            vec![Warning::IgnoredIdentity {
                used: "--card-id",
                ignored: vec!["--prefix", "character"],
            }]
        );

        let (spec, warnings) = FilterSpec::build(&CardQuery {
            prefix: Some("夜".to_string()),
            character: Some("not-a-character".to_string()),
            ..query()
        })
        .expect("unresolvable character is never consulted");
        assert_eq!(spec.identity, Some(Identity::Title("夜".to_string())));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn title_is_an_unanchored_substring() {
        let (spec, _) = FilterSpec::build(&CardQuery {
            prefix: Some("夜".to_string()),
            ..query()
        })
        .expect("valid");
        let data = records();
        assert_eq!(ids(&apply(&data, &spec)), vec![1200, 1316, 1400, 1500]);
    }

    #[test]
    fn unit_alone_is_a_valid_query() {
        let (spec, _) = FilterSpec::build(&CardQuery {
            unit: Some("n25".to_string()),
            ..query()
        })
        .expect("valid");
        assert_eq!(spec.identity, None);
        assert_eq!(spec.unit, Some("school_refusal"));

        let data = records();
        assert_eq!(ids(&apply(&data, &spec)), vec![1200, 1316, 1400, 1500]);
    }

    #[test]
    fn skill_id_refines_and_can_stand_alone() {
        let data = records();

        let (spec, _) = FilterSpec::build(&CardQuery {
            skill_id: Some(12),
            ..query()
        })
        .expect("skill id alone is a query");
        assert_eq!(spec.identity, None);
        assert_eq!(ids(&apply(&data, &spec)), vec![1316, 1500]);

        let (spec, _) = FilterSpec::build(&CardQuery {
            character: Some("ena".to_string()),
            skill_id: Some(12),
            ..query()
        })
        .expect("valid");
        assert_eq!(ids(&apply(&data, &spec)), vec![1316]);
    }

    #[test]
    fn skill_keyword_needs_a_skills_document() {
        let err = FilterSpec::build(&CardQuery {
            skill_keyword: Some("スコア".to_string()),
            ..query()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            CardError::Validation(ValidationError::SkillSearchUnsupported { .. })
        ));

        let (spec, _) = FilterSpec::build(&CardQuery {
            skill_keyword: Some(" スコア ".to_string()),
            ..CardQuery::new(Game::Bandori)
        })
        .expect("keyword alone is a query");
        assert_eq!(spec.skill_keyword.as_deref(), Some("スコア"));
    }

    #[test]
    fn skill_text_is_matched_as_rendered() {
        let skills = SkillTable::new(HashMap::from([
            (
                11,
                SkillEntry {
                    descriptions: vec![Some("{1}秒間スコアが100%UP".to_string())],
                    summaries: Vec::new(),
                    durations: vec![5.0, 7.0],
                },
            ),
            (
                12,
                SkillEntry {
                    descriptions: vec![Some("ライフが300回復".to_string())],
                    summaries: Vec::new(),
                    durations: Vec::new(),
                },
            ),
        ]));
        let data = records();
        let all: Vec<&CardRecord> = data.iter().collect();

        let kept = retain_skill_text(all.clone(), "スコア", &skills, Locale::En, None);
        assert_eq!(ids(&kept), vec![1200]);
        let kept = retain_skill_text(all.clone(), "7秒間", &skills, Locale::En, Some(2));
        assert_eq!(ids(&kept), vec![1200]);
        let kept = retain_skill_text(all, "7秒間", &skills, Locale::En, Some(1));
        assert!(kept.is_empty());
    }

    #[test]
    fn card_id_drops_skill_id_with_warning() {
        let (spec, warnings) = FilterSpec::build(&CardQuery {
            card_id: Some(1400),
            skill_id: Some(12),
            ..query()
        })
        .expect("valid");
        assert_eq!(spec.skill_id, None);
        assert_eq!(
            warnings,
            vec![Warning::IgnoredFilters {
                flags: vec!["--skill-id"]
            }]
        );

        let data = records();
        assert_eq!(ids(&apply(&data, &spec)), vec![1400]);
    }

    #[test]
    fn bd_and_birthday_select_the_same_cards() {
        let data = records();
        let pick = |rarity: &str| {
            let (spec, _) = FilterSpec::build(&CardQuery {
                character: Some("ena".to_string()),
                rarity: Some(rarity.to_string()),
                ..query()
            })
            .expect("valid");
            ids(&apply(&data, &spec))
        };
        assert_eq!(pick("bd"), vec![1400]);
        assert_eq!(pick("bd"), pick("BIRTHDAY"));
    }

    #[test]
    fn validation_failures() {
        let cases: Vec<(CardQuery, ValidationError)> = vec![
            (
                CardQuery {
                    limit: 0,
                    character: Some("ena".to_string()),
                    ..query()
                },
                ValidationError::NonPositiveLimit(0),
            ),
            (
                CardQuery {
                    limit: -3,
                    all: true,
                    character: Some("ena".to_string()),
                    ..query()
                },
                ValidationError::NonPositiveLimit(-3),
            ),
            (query(), ValidationError::MissingQuery),
            (
                CardQuery {
                    rarity: Some("7".to_string()),
                    character: Some("ena".to_string()),
                    ..query()
                },
                ValidationError::InvalidRarity("7".to_string()),
            ),
            (
                CardQuery {
                    server: Server::En,
                    character: Some("ena".to_string()),
                    ..query()
                },
                ValidationError::UnsupportedServer {
                    server: "en".to_string(),
                    game: "Project SEKAI".to_string(),
                },
            ),
        ];

        for (query, expected) in cases {
            match FilterSpec::build(&query) {
                Err(CardError::Validation(actual)) => assert_eq!(actual, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_character_is_reported() {
        let err = FilterSpec::build(&CardQuery {
            character: Some("nobody".to_string()),
            ..query()
        })
        .unwrap_err();
        assert!(matches!(err, CardError::UnknownCharacter { .. }));
    }

    #[test]
    fn all_overrides_limit() {
        let (spec, _) = FilterSpec::build(&CardQuery {
            character: Some("ena".to_string()),
            limit: 5,
            all: true,
            ..query()
        })
        .expect("valid");
        assert_eq!(spec.selection, Selection::All);
    }

    #[test]
    fn locale_defaults_per_game() {
        assert_eq!(query().locale(), Locale::ZhHant);
        assert_eq!(CardQuery::new(Game::Bandori).locale(), Locale::ZhHans);
        let english = CardQuery {
            lang: Some(Locale::En),
            ..query()
        };
        assert_eq!(english.locale(), Locale::En);
    }
}
