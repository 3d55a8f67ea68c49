use tracing::{debug, warn};

use crate::cache::{CacheStore, DatasetCache, DatasetOrigin};
use crate::error::CardError;
use crate::fetch::Fetcher;
use crate::filter::{self, CardQuery, FilterSpec};
use crate::format::CardView;
use crate::game::Game;
use crate::select::select;
use crate::skill::SkillTable;
use crate::warning::Warning;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub game: Game,
    pub cards: Vec<CardView>,
    pub warnings: Vec<Warning>,
}

/// Validate, load, filter, select and build views for one request.
///
/// Validation and alias resolution finish before the dataset is loaded, so
/// a bad request never costs a network round trip.
pub fn run_query<S: CacheStore, F: Fetcher>(
    query: &CardQuery,
    cache: &DatasetCache<S, F>,
) -> Result<QueryOutcome, CardError> {
    let (spec, mut warnings) = FilterSpec::build(query)?;
    debug!(?spec, "Query validated");

    let dataset = cache.load(query.game, query.server, query.no_cache)?;
    if let DatasetOrigin::StaleCache { fetched_at, reason } = dataset.origin {
        warnings.push(Warning::StaleCache { fetched_at, reason });
    }

    let locale = query.locale();
    let mut matches = filter::apply(&dataset.records, &spec);
    let mut skills = None;
    if let Some(keyword) = spec.skill_keyword.as_deref() {
        let table = require_skills(query, cache, &mut warnings)?;
        matches = filter::retain_skill_text(matches, keyword, &table, locale, query.skill_level);
        skills = Some(table);
    }
    debug!(
        total = dataset.records.len(),
        matched = matches.len(),
        "Filtered cards"
    );

    let selected = select(matches, spec.selection);
    if skills.is_none() && selected.iter().any(|record| record.skill_id.is_some()) {
        skills = load_skills(query, cache, &mut warnings);
    }

    let cards = selected
        .into_iter()
        .map(|record| {
            let mut view = CardView::new(record, query.game, query.server);
            let skill = record
                .skill_id
                .zip(skills.as_ref())
                .and_then(|(skill_id, table)| table.get(skill_id));
            if let Some(skill) = skill {
                view.attach_skill(skill, locale, query.skill_level);
            }
            view
        })
        .collect();

    Ok(QueryOutcome {
        game: query.game,
        cards,
        warnings,
    })
}

/// Skill text searched by keyword; without it the query cannot be answered.
fn require_skills<S: CacheStore, F: Fetcher>(
    query: &CardQuery,
    cache: &DatasetCache<S, F>,
    warnings: &mut Vec<Warning>,
) -> Result<SkillTable, CardError> {
    let Some(skills) = cache.load_skills(query.game, query.no_cache)? else {
        return Ok(SkillTable::default());
    };
    if let DatasetOrigin::StaleCache { fetched_at, reason } = skills.origin {
        warnings.push(Warning::StaleCache { fetched_at, reason });
    }
    Ok(skills.table)
}

/// Skill text for display is optional: a failed load becomes a warning.
fn load_skills<S: CacheStore, F: Fetcher>(
    query: &CardQuery,
    cache: &DatasetCache<S, F>,
    warnings: &mut Vec<Warning>,
) -> Option<SkillTable> {
    match cache.load_skills(query.game, query.no_cache) {
        Ok(Some(skills)) => {
            if let DatasetOrigin::StaleCache { fetched_at, reason } = skills.origin {
                warnings.push(Warning::StaleCache { fetched_at, reason });
            }
            Some(skills.table)
        }
        Ok(None) => None,
        Err(err) => {
            warn!(game = %query.game, error = %err, "Skill data unavailable");
            warnings.push(Warning::SkillsUnavailable {
                reason: err.to_string(),
            });
            None
        }
    }
}
