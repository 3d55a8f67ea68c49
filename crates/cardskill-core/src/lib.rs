//! Card lookup pipeline for rhythm-game card datasets.

pub mod alias;
pub mod cache;
pub mod card;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod format;
pub mod game;
pub mod locale;
pub mod logging;
pub mod pipeline;
pub mod select;
pub mod skill;
pub mod warning;

pub use cache::{CacheEntry, CacheStore, DatasetCache, FileCacheStore, MemoryCacheStore};
pub use card::{CardRecord, Rarity};
pub use config::Tunables;
pub use error::{CardError, ErrorKind, ValidationError};
pub use fetch::{Fetcher, HttpFetcher};
pub use filter::{CardQuery, FilterSpec, Identity, Selection};
pub use format::{CardView, Rendered, json_error, render_result};
pub use game::{Game, Server, SkillSource};
pub use locale::Locale;
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use pipeline::{QueryOutcome, run_query};
pub use skill::{SkillEntry, SkillTable};
pub use warning::Warning;
