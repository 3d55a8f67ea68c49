use chrono::{DateTime, Utc};

/// Non-fatal conditions surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// `--card-id` is exact; these refinement flags were dropped.
    IgnoredFilters { flags: Vec<&'static str> },
    /// More than one identity filter was given; only `used` applied.
    IgnoredIdentity {
        used: &'static str,
        ignored: Vec<&'static str>,
    },
    /// The refresh failed and an expired snapshot was served instead.
    StaleCache {
        fetched_at: DateTime<Utc>,
        reason: String,
    },
    /// Cards were found but their skill text could not be loaded.
    SkillsUnavailable { reason: String },
}
