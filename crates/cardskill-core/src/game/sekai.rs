use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{AttributeEntry, CharacterEntry, Game, GameSchema, Server, UnitEntry};
use crate::card::{CardRecord, Rarity};
use crate::error::CardError;
use crate::locale::Locale;

pub(super) static SCHEMA: GameSchema = GameSchema {
    slug: "sekai",
    display_name: "Project SEKAI",
    cards_url: "https://raw.githubusercontent.com/Sekai-World/sekai-master-db-diff/main/cards.json",
    cache_key: "sekai-cards",
    asset_base: "https://storage.sekai.best/sekai-jp-assets/character/member",
    detail_base: "https://sekai.best/card",
    servers: &[Server::Jp],
    default_locale: Locale::ZhHant,
    characters: CHARACTERS,
    units: UNITS,
    attributes: ATTRIBUTES,
    skills: None,
    parse: parse_cards,
};

#[rustfmt::skip]
const CHARACTERS: &[CharacterEntry] = &[
    CharacterEntry { id: 1, romaji: &["ichika"], native: &["星乃 一歌", "一歌"], localized: &["星乃一歌", "一歌"], abbreviations: &["ick"], unit: "light_sound" },
    CharacterEntry { id: 2, romaji: &["saki"], native: &["天馬 咲希", "咲希"], localized: &["天馬咲希"], abbreviations: &["sk"], unit: "light_sound" },
    CharacterEntry { id: 3, romaji: &["honami"], native: &["望月 穂波", "穂波"], localized: &["望月穗波", "穗波"], abbreviations: &["hnm"], unit: "light_sound" },
    CharacterEntry { id: 4, romaji: &["shiho"], native: &["日野森 志歩", "志歩"], localized: &["日野森志步", "志步"], abbreviations: &["shh"], unit: "light_sound" },
    CharacterEntry { id: 5, romaji: &["minori"], native: &["花里 みのり", "みのり"], localized: &["花里實乃理", "實乃理"], abbreviations: &["mnr"], unit: "idol" },
    CharacterEntry { id: 6, romaji: &["haruka"], native: &["桐谷 遥", "遥"], localized: &["桐谷遙", "遙"], abbreviations: &["hrk"], unit: "idol" },
    CharacterEntry { id: 7, romaji: &["airi"], native: &["桃井 愛莉", "愛莉"], localized: &["桃井愛莉"], abbreviations: &["ar"], unit: "idol" },
    CharacterEntry { id: 8, romaji: &["shizuku"], native: &["日野森 雫", "雫"], localized: &["日野森雫"], abbreviations: &["szk"], unit: "idol" },
    CharacterEntry { id: 9, romaji: &["kohane"], native: &["小豆沢 こはね", "こはね"], localized: &["小豆澤心羽", "心羽"], abbreviations: &["khn"], unit: "street" },
    CharacterEntry { id: 10, romaji: &["an"], native: &["白石 杏", "杏"], localized: &["白石杏"], abbreviations: &[], unit: "street" },
    CharacterEntry { id: 11, romaji: &["akito"], native: &["東雲 彰人", "彰人"], localized: &["東雲彰人"], abbreviations: &["akt"], unit: "street" },
    CharacterEntry { id: 12, romaji: &["toya", "touya"], native: &["青柳 冬弥", "冬弥"], localized: &["青柳冬彌", "冬彌"], abbreviations: &["ty"], unit: "street" },
    CharacterEntry { id: 13, romaji: &["tsukasa"], native: &["天馬 司", "司"], localized: &["天馬司"], abbreviations: &["tks"], unit: "theme_park" },
    CharacterEntry { id: 14, romaji: &["emu"], native: &["鳳 えむ", "えむ"], localized: &["鳳笑夢", "笑夢"], abbreviations: &[], unit: "theme_park" },
    CharacterEntry { id: 15, romaji: &["nene"], native: &["草薙 寧々", "寧々"], localized: &["草薙寧寧", "寧寧"], abbreviations: &["nn"], unit: "theme_park" },
    CharacterEntry { id: 16, romaji: &["rui"], native: &["神代 類", "類"], localized: &["神代類"], abbreviations: &[], unit: "theme_park" },
    CharacterEntry { id: 17, romaji: &["kanade"], native: &["宵崎 奏", "奏"], localized: &["宵崎奏"], abbreviations: &["knd"], unit: "school_refusal" },
    CharacterEntry { id: 18, romaji: &["mafuyu"], native: &["朝比奈 まふゆ", "まふゆ"], localized: &["朝比奈真冬", "真冬"], abbreviations: &["mfy"], unit: "school_refusal" },
    CharacterEntry { id: 19, romaji: &["ena"], native: &["東雲 絵名", "絵名"], localized: &["東雲繪名", "繪名"], abbreviations: &["enn"], unit: "school_refusal" },
    CharacterEntry { id: 20, romaji: &["mizuki"], native: &["暁山 瑞希", "瑞希"], localized: &["曉山瑞希"], abbreviations: &["mzk"], unit: "school_refusal" },
    CharacterEntry { id: 21, romaji: &["miku"], native: &["初音 ミク", "ミク"], localized: &["初音未來", "未來"], abbreviations: &["39"], unit: "piapro" },
    CharacterEntry { id: 22, romaji: &["rin"], native: &["鏡音 リン", "リン"], localized: &["鏡音鈴"], abbreviations: &[], unit: "piapro" },
    CharacterEntry { id: 23, romaji: &["len"], native: &["鏡音 レン", "レン"], localized: &["鏡音連"], abbreviations: &[], unit: "piapro" },
    CharacterEntry { id: 24, romaji: &["luka"], native: &["巡音 ルカ", "ルカ"], localized: &["巡音流歌", "流歌"], abbreviations: &[], unit: "piapro" },
    CharacterEntry { id: 25, romaji: &["meiko"], native: &["MEIKO"], localized: &[], abbreviations: &[], unit: "piapro" },
    CharacterEntry { id: 26, romaji: &["kaito"], native: &["KAITO"], localized: &[], abbreviations: &[], unit: "piapro" },
];

#[rustfmt::skip]
const UNITS: &[UnitEntry] = &[
    UnitEntry { key: "light_sound", aliases: &["leo", "leoneed", "leo/need"], display: "Leo/need" },
    UnitEntry { key: "idol", aliases: &["mmj", "moremorejump"], display: "MORE MORE JUMP!" },
    UnitEntry { key: "street", aliases: &["vbs", "vividbadsquad"], display: "Vivid BAD SQUAD" },
    UnitEntry { key: "theme_park", aliases: &["ws", "wxs", "wonderlands"], display: "ワンダーランズ×ショウタイム" },
    UnitEntry { key: "school_refusal", aliases: &["n25", "25ji", "nightcord"], display: "25時、ナイトコードで。" },
    UnitEntry { key: "piapro", aliases: &["vs", "virtual_singer"], display: "VIRTUAL SINGER" },
    UnitEntry { key: "none", aliases: &[], display: "—" },
];

#[rustfmt::skip]
const ATTRIBUTES: &[AttributeEntry] = &[
    AttributeEntry { key: "cute", display: "キュート" },
    AttributeEntry { key: "cool", display: "クール" },
    AttributeEntry { key: "pure", display: "ピュア" },
    AttributeEntry { key: "happy", display: "ハッピー" },
    AttributeEntry { key: "mysterious", display: "ミステリアス" },
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPayload {
    id: u32,
    character_id: u32,
    card_rarity_type: String,
    #[serde(default)]
    attr: Option<String>,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    assetbundle_name: Option<String>,
    #[serde(default)]
    release_at: Option<i64>,
    #[serde(default)]
    skill_id: Option<u32>,
    #[serde(default)]
    card_skill_name: Option<String>,
}

/// Rows are parsed one at a time; a malformed row is skipped, not fatal.
fn parse_cards(data: &Value, _server: Server) -> Result<Vec<CardRecord>, CardError> {
    let rows = Vec::<Value>::deserialize(data)?;
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let payload = match CardPayload::deserialize(row) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(row = index, error = %err, "Skipping malformed card row");
                continue;
            }
        };
        if let Some(record) = build_record(payload) {
            records.push(record);
        }
    }

    Ok(records)
}

fn build_record(payload: CardPayload) -> Option<CardRecord> {
    let Some(rarity) = parse_rarity(&payload.card_rarity_type) else {
        debug!(
            card_id = payload.id,
            rarity = %payload.card_rarity_type,
            "Skipping card with unrecognised rarity"
        );
        return None;
    };
    let Some(bundle) = payload.assetbundle_name.filter(|name| !name.is_empty()) else {
        debug!(card_id = payload.id, "Skipping card without asset bundle");
        return None;
    };

    let title = payload.prefix.unwrap_or_default();
    let titles = if title.is_empty() {
        Vec::new()
    } else {
        vec![title.clone()]
    };

    let record = CardRecord::new(
        payload.id,
        title,
        titles,
        payload.character_id,
        Game::Sekai.unit_of(payload.character_id),
        payload.attr.unwrap_or_default(),
        rarity,
        payload.release_at.and_then(DateTime::from_timestamp_millis),
        payload.card_skill_name.filter(|name| !name.is_empty()),
        &bundle,
    );
    Some(record.with_skill_id(payload.skill_id))
}

fn parse_rarity(raw: &str) -> Option<Rarity> {
    match raw {
        "rarity_birthday" => Some(Rarity::Birthday),
        other => other
            .strip_prefix("rarity_")
            .and_then(|stars| stars.parse::<u8>().ok())
            .filter(|stars| (1..=5).contains(stars))
            .map(Rarity::Star),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!([
            {
                "id": 1316,
                "characterId": 19,
                "cardRarityType": "rarity_4",
                "attr": "cool",
                "prefix": "夕暮れの窓辺",
                "assetbundleName": "res019_no042",
                "releaseAt": 1_700_000_000_000i64,
                "skillId": 21,
                "cardSkillName": "描きたいもの"
            },
            {
                "id": 1320,
                "characterId": 19,
                "cardRarityType": "rarity_birthday",
                "attr": "cute",
                "prefix": "Happy Birthday!!2024 えななん",
                "assetbundleName": "res019_no043",
                "releaseAt": 1_701_000_000_000i64
            },
            {
                "id": 7,
                "characterId": 2,
                "cardRarityType": "rarity_2",
                "attr": "happy",
                "prefix": "ワンダフル★ヒーロー",
                "assetbundleName": "res002_no002"
            },
            {
                "id": 9999,
                "characterId": 2,
                "cardRarityType": "rarity_legendary",
                "assetbundleName": "res002_no999"
            }
        ])
    }

    #[test]
    fn parses_cards_and_derives_units() {
        let records = parse_cards(&sample(), Server::Jp).expect("parse");
        assert_eq!(records.len(), 3);

        let ena = &records[0];
        assert_eq!(ena.id, 1316);
        assert_eq!(ena.unit, "school_refusal");
        assert_eq!(ena.rarity, Rarity::Star(4));
        assert_eq!(ena.skill_name.as_deref(), Some("描きたいもの"));
        assert_eq!(ena.skill_id, Some(21));
        assert_eq!(
            ena.released_at.map(|dt| dt.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert_eq!(ena.trained_art(), Some("res019_no042/card_after_training"));

        assert!(records[2].released_at.is_none());
    }

    #[test]
    fn trained_art_invariant_holds_over_dataset() {
        let records = parse_cards(&sample(), Server::Jp).expect("parse");
        for record in &records {
            let expected = match record.rarity {
                Rarity::Star(stars) => stars >= 3,
                Rarity::Birthday => false,
            };
            assert_eq!(record.trained_art().is_some(), expected, "card {}", record.id);
        }
    }

    #[test]
    fn malformed_rows_are_skipped_without_losing_the_rest() {
        let data = json!([
            {
                "id": 1316,
                "characterId": 19,
                "cardRarityType": "rarity_4",
                "attr": "cool",
                "prefix": "夕暮れの窓辺",
                "assetbundleName": "res019_no042",
                "releaseAt": 1_700_000_000_000i64
            },
            {
                "id": 1317,
                "characterId": 19,
                "cardRarityType": "rarity_3",
                "attr": null,
                "prefix": null,
                "assetbundleName": "res019_no043",
                "cardSkillName": null
            },
            {
                "id": "not-a-number",
                "characterId": 19,
                "cardRarityType": "rarity_4"
            },
            {
                "id": 1318,
                "characterId": 19,
                "cardRarityType": "rarity_4",
                "prefix": "no art"
            },
            "garbage"
        ]);

        let records = parse_cards(&data, Server::Jp).expect("document still parses");
        let ids: Vec<u32> = records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1316, 1317]);

        let untitled = &records[1];
        assert_eq!(untitled.title, "");
        assert!(untitled.titles.is_empty());
        assert_eq!(untitled.attribute, "");
        assert_eq!(untitled.skill_name, None);
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(parse_cards(&json!({"cards": []}), Server::Jp).is_err());
    }

    #[test]
    fn rarity_codes() {
        assert_eq!(parse_rarity("rarity_1"), Some(Rarity::Star(1)));
        assert_eq!(parse_rarity("rarity_birthday"), Some(Rarity::Birthday));
        assert_eq!(parse_rarity("rarity_6"), None);
    }
}
