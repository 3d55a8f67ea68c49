use std::cmp::Reverse;

use crate::card::CardRecord;
use crate::filter::Selection;

/// Newest first, ties broken by higher ID; cards without a release date sort last.
pub fn select<'a>(mut matches: Vec<&'a CardRecord>, selection: Selection) -> Vec<&'a CardRecord> {
    matches.sort_by_key(|record| Reverse((record.released_at, record.id)));

    if let Selection::Limit(limit) = selection {
        matches.truncate(limit);
    }
    matches
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::card::Rarity;

    fn card(id: u32, released: Option<i64>) -> CardRecord {
        CardRecord::new(
            id,
            format!("card {id}"),
            Vec::new(),
            19,
            "school_refusal",
            "cool".to_string(),
            Rarity::Star(4),
            released.and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            None,
            "res019_no000",
        )
    }

    fn ids(selected: &[&CardRecord]) -> Vec<u32> {
        selected.iter().map(|record| record.id).collect()
    }

    #[test]
    fn orders_by_release_then_id() {
        let records = vec![
            card(10, Some(1_000)),
            card(11, Some(3_000)),
            card(12, Some(1_000)),
            card(13, None),
            card(14, Some(2_000)),
        ];
        let selected = select(records.iter().collect(), Selection::All);
        assert_eq!(ids(&selected), vec![11, 14, 12, 10, 13]);
    }

    #[test]
    fn limit_caps_at_available_matches() {
        let records: Vec<CardRecord> = (1..=4).map(|id| card(id, Some(i64::from(id)))).collect();
        for (limit, expected) in [(1, 1), (3, 3), (4, 4), (10, 4)] {
            let selected = select(records.iter().collect(), Selection::Limit(limit));
            assert_eq!(selected.len(), expected, "limit {limit}");
        }
        assert_eq!(
            ids(&select(records.iter().collect(), Selection::Limit(2))),
            vec![4, 3]
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(select(Vec::new(), Selection::Limit(1)).is_empty());
    }
}
