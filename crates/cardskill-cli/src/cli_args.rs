use clap::{ArgAction, Parser};
use cardskill_core::{CardQuery, Game, Locale, Server};

/// Look up Project SEKAI and BanG Dream! cards by character, title or ID.
#[derive(Parser, Debug, Clone)]
#[command(name = "cardskill", version, about, long_about = None)]
pub struct Cli {
    /// Character name (romaji, Japanese, Chinese, abbreviation) or character ID.
    pub character: Option<String>,

    /// Game dataset to query: sekai or bandori.
    #[arg(short, long, default_value = "sekai", value_name = "GAME")]
    pub game: Game,

    /// Search by card title (substring match).
    #[arg(short, long, value_name = "TEXT")]
    pub prefix: Option<String>,

    /// Exact card ID lookup; unit, rarity, attribute and skill filters are ignored.
    #[arg(short, long, value_name = "ID")]
    pub card_id: Option<u32>,

    /// Unit or band, by short alias or full key.
    #[arg(short, long)]
    pub unit: Option<String>,

    /// Rarity: 1-5, bd or birthday.
    #[arg(short, long)]
    pub rarity: Option<String>,

    /// Card attribute.
    #[arg(short, long)]
    pub attr: Option<String>,

    /// Only cards with this skill ID.
    #[arg(short, long, value_name = "ID")]
    pub skill_id: Option<u32>,

    /// Only cards whose skill description contains this text.
    #[arg(long, value_name = "TEXT")]
    pub skill_keyword: Option<String>,

    /// Skill level (1-5) used for skill durations; every level when omitted.
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(1..=5))]
    pub skill_level: Option<u8>,

    /// Number of cards to return, newest first.
    #[arg(
        short = 'n',
        long,
        default_value_t = 1,
        allow_negative_numbers = true,
        value_name = "N"
    )]
    pub limit: i64,

    /// Return every match (overrides --limit).
    #[arg(long, action = ArgAction::SetTrue)]
    pub all: bool,

    /// Emit JSON instead of text.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Refetch the dataset even if the cached copy is fresh.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_cache: bool,

    /// Regional server for titles, release dates and images (jp, en, tw, cn, kr).
    #[arg(long, default_value = "jp", value_name = "SERVER")]
    pub server: Server,

    /// Output language: zh-hant, zh-hans or en. Defaults per game.
    #[arg(long, value_name = "LANG")]
    pub lang: Option<Locale>,
}

impl Cli {
    pub fn to_query(&self) -> CardQuery {
        CardQuery {
            game: self.game,
            server: self.server,
            lang: self.lang,
            character: self.character.clone(),
            prefix: self.prefix.clone(),
            card_id: self.card_id,
            unit: self.unit.clone(),
            rarity: self.rarity.clone(),
            attr: self.attr.clone(),
            skill_id: self.skill_id,
            skill_keyword: self.skill_keyword.clone(),
            skill_level: self.skill_level,
            limit: self.limit,
            all: self.all,
            json: self.json,
            no_cache: self.no_cache,
        }
    }
}
