//! Output language tables.
//!
//! Every user-facing string the formatter emits (field labels, warnings,
//! error messages) is looked up here so the pipeline itself stays
//! language-agnostic.

use std::fmt;
use std::str::FromStr;

use crate::error::{CardError, ValidationError};
use crate::warning::Warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    /// Traditional Chinese.
    ZhHant,
    /// Simplified Chinese.
    ZhHans,
    En,
}

/// Field labels for text output, in display order.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub card: &'static str,
    pub title: &'static str,
    pub character: &'static str,
    pub unit: &'static str,
    pub attribute: &'static str,
    pub rarity: &'static str,
    pub card_type: &'static str,
    pub skill: &'static str,
    pub skill_id: &'static str,
    pub skill_effect: &'static str,
    pub release_date: &'static str,
    pub detail: &'static str,
    pub normal_art: &'static str,
    pub trained_art: &'static str,
}

const ZH_HANT_LABELS: Labels = Labels {
    card: "卡片",
    title: "標題",
    character: "角色",
    unit: "團隊",
    attribute: "屬性",
    rarity: "稀有度",
    card_type: "類型",
    skill: "技能",
    skill_id: "技能ID",
    skill_effect: "技能效果",
    release_date: "實裝日",
    detail: "詳情",
    normal_art: "普通圖",
    trained_art: "覺醒圖",
};

const ZH_HANS_LABELS: Labels = Labels {
    card: "卡片",
    title: "标题",
    character: "角色",
    unit: "乐队",
    attribute: "属性",
    rarity: "稀有度",
    card_type: "类型",
    skill: "技能",
    skill_id: "技能ID",
    skill_effect: "技能效果",
    release_date: "实装日",
    detail: "详情",
    normal_art: "普通图",
    trained_art: "特训后",
};

const EN_LABELS: Labels = Labels {
    card: "Card",
    title: "Title",
    character: "Character",
    unit: "Unit",
    attribute: "Attribute",
    rarity: "Rarity",
    card_type: "Type",
    skill: "Skill",
    skill_id: "Skill ID",
    skill_effect: "Effect",
    release_date: "Released",
    detail: "Details",
    normal_art: "Normal",
    trained_art: "Trained",
};

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::ZhHant => "zh-hant",
            Locale::ZhHans => "zh-hans",
            Locale::En => "en",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::ZhHant => &ZH_HANT_LABELS,
            Locale::ZhHans => &ZH_HANS_LABELS,
            Locale::En => &EN_LABELS,
        }
    }

    fn pick(self, hant: &'static str, hans: &'static str, en: &'static str) -> &'static str {
        match self {
            Locale::ZhHant => hant,
            Locale::ZhHans => hans,
            Locale::En => en,
        }
    }

    pub fn no_results(self) -> &'static str {
        self.pick("未找到匹配的卡片。", "未找到匹配的卡片。", "No matching cards found.")
    }

    pub fn error_prefix(self) -> &'static str {
        self.pick("錯誤: ", "错误：", "error: ")
    }

    pub fn warning_message(self, warning: &Warning) -> String {
        match warning {
            Warning::IgnoredFilters { flags } => self
                .pick(
                    "注意: --card-id 為精確查找，{flags} 過濾器已被忽略",
                    "注意：--card-id 为精确查找，{flags} 筛选已被忽略",
                    "note: --card-id is an exact lookup; {flags} ignored",
                )
                .replace("{flags}", &flags.join("/")),
            Warning::IgnoredIdentity { used, ignored } => self
                .pick(
                    "注意: 已按 {used} 查找，{ignored} 已被忽略",
                    "注意：已按 {used} 查找，{ignored} 已被忽略",
                    "note: searching by {used}; {ignored} ignored",
                )
                .replace("{used}", used)
                .replace("{ignored}", &ignored.join("/")),
            Warning::StaleCache { fetched_at, reason } => self
                .pick(
                    "注意: 無法更新卡片數據（{reason}），改用 {date} 的快取",
                    "注意：无法更新卡片数据（{reason}），使用 {date} 的缓存",
                    "note: could not refresh card data ({reason}); using cache from {date}",
                )
                .replace("{reason}", reason)
                .replace("{date}", &fetched_at.format("%Y-%m-%d %H:%M UTC").to_string()),
            Warning::SkillsUnavailable { reason } => self
                .pick(
                    "注意: 無法獲取技能數據（{reason}），未顯示技能說明",
                    "注意：无法获取技能数据（{reason}），未显示技能说明",
                    "note: could not load skill data ({reason}); skill text omitted",
                )
                .replace("{reason}", reason),
        }
    }

    pub fn error_message(self, err: &CardError) -> String {
        match err {
            CardError::Validation(validation) => self.validation_message(validation),
            CardError::UnknownCharacter { token, suggestion } => {
                let base = self
                    .pick(
                        "無法識別角色 '{token}'",
                        "无法识别角色 '{token}'",
                        "unknown character '{token}'",
                    )
                    .replace("{token}", token);
                match suggestion {
                    Some(name) => format!(
                        "{base}{}",
                        self.pick(
                            "（你是指 '{name}' 嗎？）",
                            "（你是指 '{name}' 吗？）",
                            " (did you mean '{name}'?)",
                        )
                        .replace("{name}", name)
                    ),
                    None => base,
                }
            }
            CardError::Fetch(_) | CardError::Http(_) | CardError::Json(_) => self
                .pick(
                    "無法獲取卡片數據: {detail}",
                    "无法获取卡片数据：{detail}",
                    "could not fetch card data: {detail}",
                )
                .replace("{detail}", &fetch_detail(err)),
            CardError::Config(message) => self
                .pick("設定錯誤: {detail}", "配置错误：{detail}", "configuration error: {detail}")
                .replace("{detail}", message),
            CardError::Io(io) => self
                .pick("讀寫錯誤: {detail}", "读写错误：{detail}", "I/O error: {detail}")
                .replace("{detail}", &io.to_string()),
        }
    }

    fn validation_message(self, err: &ValidationError) -> String {
        match err {
            ValidationError::NonPositiveLimit(value) => self
                .pick(
                    "--limit 必須為正整數（收到: {value}）",
                    "--limit 必须为正整数（收到：{value}）",
                    "--limit must be a positive integer (got {value})",
                )
                .replace("{value}", &value.to_string()),
            ValidationError::InvalidRarity(value) => self
                .pick(
                    "無效稀有度 '{value}'（可選: 1, 2, 3, 4, 5, bd）",
                    "无效稀有度 '{value}'（可选：1, 2, 3, 4, 5, bd）",
                    "invalid rarity '{value}' (choose 1, 2, 3, 4, 5 or bd)",
                )
                .replace("{value}", value),
            ValidationError::InvalidAttribute { value, expected } => self
                .pick(
                    "無效屬性 '{value}'（可選: {expected}）",
                    "无效属性 '{value}'（可选：{expected}）",
                    "invalid attribute '{value}' (choose {expected})",
                )
                .replace("{value}", value)
                .replace("{expected}", expected),
            ValidationError::UnknownUnit { value, expected } => self
                .pick(
                    "無效團隊 '{value}'（可選: {expected}）",
                    "无效乐队 '{value}'（可选：{expected}）",
                    "unknown unit '{value}' (choose {expected})",
                )
                .replace("{value}", value)
                .replace("{expected}", expected),
            ValidationError::UnsupportedServer { server, game } => self
                .pick(
                    "{game} 不支援伺服器 '{server}'",
                    "{game} 不支持服务器 '{server}'",
                    "server '{server}' is not available for {game}",
                )
                .replace("{server}", server)
                .replace("{game}", game),
            ValidationError::SkillSearchUnsupported { game } => self
                .pick(
                    "{game} 沒有可搜尋的技能說明",
                    "{game} 没有可搜索的技能说明",
                    "{game} has no skill descriptions to search",
                )
                .replace("{game}", game),
            ValidationError::MissingQuery => self
                .pick(
                    "請指定角色名、--prefix、--card-id、--unit 或 --skill-id",
                    "请指定角色名、--prefix、--card-id、--unit 或 --skill-id",
                    "specify a character, --prefix, --card-id, --unit or --skill-id",
                )
                .to_string(),
        }
    }
}

fn fetch_detail(err: &CardError) -> String {
    match err {
        CardError::Fetch(message) => message.clone(),
        CardError::Http(http) => http.to_string(),
        CardError::Json(json) => json.to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zh-hant" | "zh-tw" | "zh-hk" | "tc" => Ok(Locale::ZhHant),
            "zh-hans" | "zh-cn" | "zh" | "sc" => Ok(Locale::ZhHans),
            "en" | "en-us" => Ok(Locale::En),
            other => Err(format!(
                "unknown language '{other}' (expected zh-hant, zh-hans or en)"
            )),
        }
    }
}
