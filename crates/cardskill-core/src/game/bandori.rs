use std::collections::HashMap;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{AttributeEntry, CharacterEntry, Game, GameSchema, Server, SkillSource, UnitEntry};
use crate::card::{CardRecord, Rarity};
use crate::error::CardError;
use crate::locale::Locale;
use crate::skill::{SkillEntry, SkillTable};

pub(super) static SCHEMA: GameSchema = GameSchema {
    slug: "bandori",
    display_name: "BanG Dream! Girls Band Party!",
    cards_url: "https://bestdori.com/api/cards/all.5.json",
    cache_key: "bandori-cards",
    asset_base: "https://bestdori.com/assets/{server}/characters/resourceset",
    detail_base: "https://bestdori.com/info/cards",
    servers: &[Server::Jp, Server::En, Server::Tw, Server::Cn, Server::Kr],
    default_locale: Locale::ZhHans,
    characters: CHARACTERS,
    units: UNITS,
    attributes: ATTRIBUTES,
    skills: Some(SkillSource {
        url: "https://bestdori.com/api/skills/all.5.json",
        cache_key: "bandori-skills",
        parse: parse_skills,
    }),
    parse: parse_cards,
};

#[rustfmt::skip]
const CHARACTERS: &[CharacterEntry] = &[
    CharacterEntry { id: 1, romaji: &["kasumi", "kasumi toyama"], native: &["戸山 香澄", "香澄"], localized: &["戶山香澄"], abbreviations: &["ksm"], unit: "poppin_party" },
    CharacterEntry { id: 2, romaji: &["tae", "tae hanazono"], native: &["花園 たえ", "たえ"], localized: &["花園多惠", "多惠"], abbreviations: &["otae"], unit: "poppin_party" },
    CharacterEntry { id: 3, romaji: &["rimi", "rimi ushigome"], native: &["牛込 りみ", "りみ"], localized: &["牛込里美", "里美"], abbreviations: &[], unit: "poppin_party" },
    CharacterEntry { id: 4, romaji: &["saaya", "saaya yamabuki"], native: &["山吹 沙綾", "沙綾"], localized: &["山吹沙綾"], abbreviations: &[], unit: "poppin_party" },
    CharacterEntry { id: 5, romaji: &["arisa", "arisa ichigaya"], native: &["市ヶ谷 有咲", "有咲"], localized: &["市谷有咲"], abbreviations: &[], unit: "poppin_party" },
    CharacterEntry { id: 6, romaji: &["ran", "ran mitake"], native: &["美竹 蘭", "蘭"], localized: &["美竹蘭"], abbreviations: &[], unit: "afterglow" },
    CharacterEntry { id: 7, romaji: &["moca", "moca aoba"], native: &["青葉 モカ", "モカ"], localized: &["青葉摩卡", "摩卡"], abbreviations: &[], unit: "afterglow" },
    CharacterEntry { id: 8, romaji: &["himari", "himari uehara"], native: &["上原 ひまり", "ひまり"], localized: &["上原緋瑪麗", "緋瑪麗"], abbreviations: &[], unit: "afterglow" },
    CharacterEntry { id: 9, romaji: &["tomoe", "tomoe udagawa"], native: &["宇田川 巴", "巴"], localized: &["宇田川巴"], abbreviations: &[], unit: "afterglow" },
    CharacterEntry { id: 10, romaji: &["tsugumi", "tsugumi hazawa"], native: &["羽沢 つぐみ", "つぐみ"], localized: &["羽澤鶇", "鶇"], abbreviations: &["tgm"], unit: "afterglow" },
    CharacterEntry { id: 11, romaji: &["kokoro", "kokoro tsurumaki"], native: &["弦巻 こころ", "こころ"], localized: &["弦卷心", "心"], abbreviations: &[], unit: "hello_happy_world" },
    CharacterEntry { id: 12, romaji: &["kaoru", "kaoru seta"], native: &["瀬田 薫", "薫"], localized: &["瀨田薰", "薰"], abbreviations: &[], unit: "hello_happy_world" },
    CharacterEntry { id: 13, romaji: &["hagumi", "hagumi kitazawa"], native: &["北沢 はぐみ", "はぐみ"], localized: &["北澤育美", "育美"], abbreviations: &[], unit: "hello_happy_world" },
    CharacterEntry { id: 14, romaji: &["kanon", "kanon matsubara"], native: &["松原 花音", "花音"], localized: &["松原花音"], abbreviations: &[], unit: "hello_happy_world" },
    CharacterEntry { id: 15, romaji: &["misaki", "misaki okusawa"], native: &["奥沢 美咲", "美咲"], localized: &["奧澤美咲"], abbreviations: &["michelle"], unit: "hello_happy_world" },
    CharacterEntry { id: 16, romaji: &["aya", "aya maruyama"], native: &["丸山 彩", "彩"], localized: &["丸山彩"], abbreviations: &[], unit: "pastel_palettes" },
    CharacterEntry { id: 17, romaji: &["hina", "hina hikawa"], native: &["氷川 日菜", "日菜"], localized: &["冰川日菜"], abbreviations: &[], unit: "pastel_palettes" },
    CharacterEntry { id: 18, romaji: &["chisato", "chisato shirasagi"], native: &["白鷺 千聖", "千聖"], localized: &["白鷺千聖"], abbreviations: &[], unit: "pastel_palettes" },
    CharacterEntry { id: 19, romaji: &["maya", "maya yamato"], native: &["大和 麻弥", "麻弥"], localized: &["大和麻彌", "麻彌"], abbreviations: &[], unit: "pastel_palettes" },
    CharacterEntry { id: 20, romaji: &["eve", "eve wakamiya"], native: &["若宮 イヴ", "イヴ"], localized: &["若宮伊芙", "伊芙"], abbreviations: &[], unit: "pastel_palettes" },
    CharacterEntry { id: 21, romaji: &["yukina", "yukina minato"], native: &["湊 友希那", "友希那"], localized: &["湊友希那"], abbreviations: &["ykn"], unit: "roselia" },
    CharacterEntry { id: 22, romaji: &["sayo", "sayo hikawa"], native: &["氷川 紗夜", "紗夜"], localized: &["冰川紗夜"], abbreviations: &[], unit: "roselia" },
    CharacterEntry { id: 23, romaji: &["lisa", "lisa imai"], native: &["今井 リサ", "リサ"], localized: &["今井莉莎", "莉莎"], abbreviations: &[], unit: "roselia" },
    CharacterEntry { id: 24, romaji: &["ako", "ako udagawa"], native: &["宇田川 あこ", "あこ"], localized: &["宇田川亞子", "亞子"], abbreviations: &[], unit: "roselia" },
    CharacterEntry { id: 25, romaji: &["rinko", "rinko shirokane"], native: &["白金 燐子", "燐子"], localized: &["白金燐子"], abbreviations: &[], unit: "roselia" },
    CharacterEntry { id: 26, romaji: &["mashiro", "mashiro kurata"], native: &["倉田 ましろ", "ましろ"], localized: &["倉田真白", "真白"], abbreviations: &[], unit: "morfonica" },
    CharacterEntry { id: 27, romaji: &["toko", "touko", "toko kirigaya"], native: &["桐ヶ谷 透子", "透子"], localized: &["桐谷透子"], abbreviations: &[], unit: "morfonica" },
    CharacterEntry { id: 28, romaji: &["nanami", "nanami hiromachi"], native: &["広町 七深", "七深"], localized: &["廣町七深"], abbreviations: &[], unit: "morfonica" },
    CharacterEntry { id: 29, romaji: &["tsukushi", "tsukushi futaba"], native: &["二葉 つくし", "つくし"], localized: &["二葉筑紫", "筑紫"], abbreviations: &[], unit: "morfonica" },
    CharacterEntry { id: 30, romaji: &["rui", "rui yashio"], native: &["八潮 瑠唯", "瑠唯"], localized: &["八潮瑠唯"], abbreviations: &[], unit: "morfonica" },
    CharacterEntry { id: 31, romaji: &["rei", "rei wakana"], native: &["和奏 レイ", "レイ"], localized: &["和奏瑞依", "瑞依"], abbreviations: &["layer"], unit: "raise_a_suilen" },
    CharacterEntry { id: 32, romaji: &["rokka", "rokka asahi"], native: &["朝日 六花", "六花"], localized: &["朝日六花"], abbreviations: &["lock"], unit: "raise_a_suilen" },
    CharacterEntry { id: 33, romaji: &["masuki", "masuki satou"], native: &["佐藤 ますき", "ますき"], localized: &["佐藤益木", "益木"], abbreviations: &["masking"], unit: "raise_a_suilen" },
    CharacterEntry { id: 34, romaji: &["reona", "reona nyubara"], native: &["鳰原 令王那", "令王那"], localized: &["鳰原令王那"], abbreviations: &["pareo"], unit: "raise_a_suilen" },
    CharacterEntry { id: 35, romaji: &["chiyu", "chiyu tamade"], native: &["珠手 ちゆ", "ちゆ"], localized: &["珠手知由", "知由"], abbreviations: &["chu2", "chu²", "chuchu"], unit: "raise_a_suilen" },
    CharacterEntry { id: 36, romaji: &["tomori", "tomori takamatsu"], native: &["高松 燈", "燈"], localized: &["高松燈"], abbreviations: &[], unit: "mygo" },
    CharacterEntry { id: 37, romaji: &["anon", "anon chihaya"], native: &["千早 愛音", "愛音"], localized: &["千早愛音"], abbreviations: &[], unit: "mygo" },
    CharacterEntry { id: 38, romaji: &["raana", "rana", "raana kaname"], native: &["要 楽奈", "楽奈"], localized: &["要樂奈", "樂奈"], abbreviations: &[], unit: "mygo" },
    CharacterEntry { id: 39, romaji: &["soyo", "soyo nagasaki"], native: &["長崎 そよ", "そよ"], localized: &["長崎爽世", "爽世"], abbreviations: &[], unit: "mygo" },
    CharacterEntry { id: 40, romaji: &["taki", "taki shiina"], native: &["椎名 立希", "立希"], localized: &["椎名立希"], abbreviations: &[], unit: "mygo" },
];

#[rustfmt::skip]
const UNITS: &[UnitEntry] = &[
    UnitEntry { key: "poppin_party", aliases: &["ppp", "popipa"], display: "Poppin'Party" },
    UnitEntry { key: "afterglow", aliases: &["ag"], display: "Afterglow" },
    UnitEntry { key: "hello_happy_world", aliases: &["hhw", "harohapi"], display: "ハロー、ハッピーワールド！" },
    UnitEntry { key: "pastel_palettes", aliases: &["pp", "pasupare"], display: "Pastel＊Palettes" },
    UnitEntry { key: "roselia", aliases: &["r", "rsl"], display: "Roselia" },
    UnitEntry { key: "morfonica", aliases: &["morf", "monica"], display: "Morfonica" },
    UnitEntry { key: "raise_a_suilen", aliases: &["ras"], display: "RAISE A SUILEN" },
    UnitEntry { key: "mygo", aliases: &["mygo!!!!!"], display: "MyGO!!!!!" },
    UnitEntry { key: "none", aliases: &[], display: "—" },
];

#[rustfmt::skip]
const ATTRIBUTES: &[AttributeEntry] = &[
    AttributeEntry { key: "powerful", display: "パワフル" },
    AttributeEntry { key: "cool", display: "クール" },
    AttributeEntry { key: "pure", display: "ピュア" },
    AttributeEntry { key: "happy", display: "ハッピー" },
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPayload {
    character_id: u32,
    rarity: u8,
    #[serde(default)]
    attribute: Option<String>,
    #[serde(default)]
    resource_set_name: Option<String>,
    #[serde(default)]
    prefix: Option<Vec<Option<String>>>,
    #[serde(default)]
    released_at: Option<Vec<Option<String>>>,
    #[serde(default)]
    skill_id: Option<u32>,
    #[serde(default, rename = "type")]
    card_type: Option<String>,
}

/// Bestdori serves `{ "<card id>": { ... } }`. Malformed rows are skipped.
fn parse_cards(data: &Value, server: Server) -> Result<Vec<CardRecord>, CardError> {
    let rows = HashMap::<String, Value>::deserialize(data)?;
    let mut records = Vec::with_capacity(rows.len());

    for (key, row) in &rows {
        let Ok(id) = key.parse::<u32>() else {
            debug!(key = %key, "Skipping card with non-numeric id");
            continue;
        };
        let payload = match CardPayload::deserialize(row) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(card_id = id, error = %err, "Skipping malformed card row");
                continue;
            }
        };
        if let Some(record) = build_record(id, payload, server) {
            records.push(record);
        }
    }

    records.sort_by_key(|record| record.id);
    Ok(records)
}

fn build_record(id: u32, payload: CardPayload, server: Server) -> Option<CardRecord> {
    let Some(resource_set) = payload.resource_set_name.filter(|name| !name.is_empty()) else {
        debug!(card_id = id, "Skipping card without resource set");
        return None;
    };
    if !(1..=5).contains(&payload.rarity) {
        debug!(card_id = id, rarity = payload.rarity, "Skipping card with unrecognised rarity");
        return None;
    }

    let prefixes = payload.prefix.unwrap_or_default();
    let releases = payload.released_at.unwrap_or_default();

    let titles: Vec<String> = prefixes
        .iter()
        .flatten()
        .filter(|title| !title.is_empty())
        .cloned()
        .collect();
    let title = regional(&prefixes, server)
        .map(str::to_string)
        .or_else(|| titles.first().cloned())
        .unwrap_or_default();
    let released_at = regional(&releases, server)
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis);

    let record = CardRecord::new(
        id,
        title,
        titles,
        payload.character_id,
        Game::Bandori.unit_of(payload.character_id),
        payload.attribute.unwrap_or_default(),
        Rarity::Star(payload.rarity),
        released_at,
        None,
        &format!("{resource_set}_rip"),
    );
    Some(
        record
            .with_skill_id(payload.skill_id)
            .with_card_type(payload.card_type),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkillPayload {
    #[serde(default)]
    description: Vec<Option<String>>,
    #[serde(default)]
    simple_description: Vec<Option<String>>,
    #[serde(default)]
    duration: Vec<f64>,
}

/// `skills/all.5.json`: `{ "<skill id>": { "description": [...], ... } }`.
fn parse_skills(data: &Value) -> Result<SkillTable, CardError> {
    let rows = HashMap::<String, Value>::deserialize(data)?;
    let mut entries = HashMap::with_capacity(rows.len());

    for (key, row) in &rows {
        let Ok(id) = key.parse::<u32>() else {
            debug!(key = %key, "Skipping skill with non-numeric id");
            continue;
        };
        match SkillPayload::deserialize(row) {
            Ok(payload) => {
                entries.insert(
                    id,
                    SkillEntry {
                        descriptions: payload.description,
                        summaries: payload.simple_description,
                        durations: payload.duration,
                    },
                );
            }
            Err(err) => debug!(skill_id = id, error = %err, "Skipping malformed skill row"),
        }
    }

    Ok(SkillTable::new(entries))
}

/// The server's entry, falling back to the JP entry.
fn regional(values: &[Option<String>], server: Server) -> Option<&str> {
    let pick = |index: usize| {
        values
            .get(index)
            .and_then(|value| value.as_deref())
            .filter(|value| !value.is_empty())
    };
    pick(server.index()).or_else(|| pick(Server::Jp.index()))
}
