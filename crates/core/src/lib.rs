//! Core domain types for duoread.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ARTICLE_ID: &str = "intel-analysis";
pub const ARTICLE_QUERY_PARAM: &str = "article";
pub const WORDS_PER_MINUTE: usize = 250;
/// Viewports at or below this width use the compact (drawer) layout.
pub const COMPACT_BREAKPOINT_PX: u32 = 1023;

static ARTICLE_ID_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleId(String);

impl ArticleId {
    /// Accepts `value` only when it is made of ASCII letters, digits, `_` and `-`.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = ARTICLE_ID_RE
            .as_ref()
            .is_ok_and(|re| re.is_match(value));
        valid.then(|| Self(value.to_string()))
    }

    pub fn resolve(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    /// Resolves the `article` parameter of a page query string such as
    /// `?article=intel-analysis&lang=en`.
    pub fn from_query(query: &str) -> Self {
        let value = query_param(query, ARTICLE_QUERY_PARAM);
        Self::resolve(value.as_deref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource_path(&self) -> String {
        format!("data/{}.data.json", self.0)
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self(DEFAULT_ARTICLE_ID.to_string())
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// First value of `name` in a URL query string, percent-decoded.
pub fn query_param(query: &str, name: &str) -> Option<String> {
    let query = query.trim();
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_query_component(key) == name).then(|| decode_query_component(value))
        })
}

fn decode_query_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub en: String,
    pub zh: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabItem {
    pub term: String,
    pub etymology: String,
    pub definition: String,
    pub role_in_text: String,
    pub original_sentence: String,
    pub collocations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleData {
    pub title: String,
    pub subtitle: String,
    pub source: String,
    pub audio_url: String,
    pub paragraphs: Vec<Paragraph>,
    pub summary_points: Vec<String>,
    pub critical_review_points: Vec<String>,
    pub vocabulary: Vec<VocabItem>,
}

impl ArticleData {
    /// All English paragraphs joined by a single space.
    pub fn english_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.en.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Orders the vocabulary by where each term first shows up in the English
    /// text, ignoring case. Terms that never appear go last; ties keep their
    /// input order.
    pub fn reorder_vocabulary(&mut self) {
        let text = self.english_text().to_lowercase();
        self.vocabulary.sort_by_cached_key(|item| {
            match text.find(&item.term.to_lowercase()) {
                Some(index) => (false, index),
                None => (true, 0),
            }
        });
    }

    /// English words plus translated characters.
    pub fn reading_units(&self) -> usize {
        self.paragraphs
            .iter()
            .map(|p| p.en.split_whitespace().count() + p.zh.chars().count())
            .sum()
    }

    /// Estimated reading time in whole minutes, never less than one.
    pub fn reading_minutes(&self) -> u32 {
        reading_minutes_for_units(self.reading_units())
    }

    pub fn find_vocab(&self, term: &str) -> Option<&VocabItem> {
        let term = term.to_lowercase();
        self.vocabulary
            .iter()
            .find(|item| item.term.to_lowercase() == term)
    }
}

pub fn reading_minutes_for_units(units: usize) -> u32 {
    let minutes = units.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Phonetic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Definition {
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antonyms: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    pub definitions: Vec<Definition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antonyms: Option<Vec<String>>,
}

/// An entry of the word book, keyed by `word` (case-sensitive).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWord {
    pub word: String,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_height: Option<f64>,
}

impl SavedWord {
    pub fn from_vocab(item: &VocabItem) -> Self {
        let synonyms = (!item.collocations.is_empty()).then(|| item.collocations.clone());
        let example = Some(item.original_sentence.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            word: item.term.clone(),
            phonetics: Vec::new(),
            meanings: vec![Meaning {
                part_of_speech: String::new(),
                definitions: vec![Definition {
                    definition: item.definition.clone(),
                    example,
                    synonyms,
                    antonyms: None,
                }],
                synonyms: None,
                antonyms: None,
            }],
            timestamp: 0,
            notes: String::new(),
            note_height: None,
        }
    }

    pub fn first_definition(&self) -> Option<&str> {
        self.meanings
            .iter()
            .flat_map(|m| m.definitions.iter())
            .map(|d| d.definition.as_str())
            .find(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarView {
    Vocabulary,
    WordBook,
}

impl SidebarView {
    pub fn as_str(&self) -> &'static str {
        match self {
            SidebarView::Vocabulary => "vocabulary",
            SidebarView::WordBook => "wordbook",
        }
    }
}

impl std::fmt::Display for SidebarView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document scroll geometry, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: u32,
    pub scroll_height: u32,
    pub client_height: u32,
}

impl ScrollMetrics {
    pub fn max_scroll_top(&self) -> u32 {
        self.scroll_height.saturating_sub(self.client_height)
    }

    /// Reading progress in `[0, 100]`; zero when the content fits the viewport.
    pub fn percent(&self) -> f32 {
        let scrollable = self.max_scroll_top();
        if scrollable == 0 {
            0.0
        } else {
            ((self.scroll_top as f32 / scrollable as f32) * 100.0).clamp(0.0, 100.0)
        }
    }
}

pub fn is_compact_width(width_px: u32) -> bool {
    width_px <= COMPACT_BREAKPOINT_PX
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory that contains the `data/` folder of article documents.
    pub data_root: String,
    pub default_article: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: String::new(),
            default_article: DEFAULT_ARTICLE_ID.to_string(),
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.data_root = self.data_root.trim().to_string();
        let article = self.default_article.trim();
        self.default_article = ArticleId::parse(article)
            .map(|id| id.0)
            .unwrap_or_else(|| DEFAULT_ARTICLE_ID.to_string());
    }

    /// Resolves the query string, falling back to the configured default article.
    pub fn resolve_article(&self, query: Option<&str>) -> ArticleId {
        let fallback =
            ArticleId::parse(&self.default_article).unwrap_or_default();
        query
            .and_then(|q| query_param(q, ARTICLE_QUERY_PARAM))
            .and_then(|value| ArticleId::parse(&value))
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(term: &str) -> VocabItem {
        VocabItem {
            term: term.to_string(),
            ..VocabItem::default()
        }
    }

    fn article(paragraphs: &[(&str, &str)], terms: &[&str]) -> ArticleData {
        ArticleData {
            paragraphs: paragraphs
                .iter()
                .map(|(en, zh)| Paragraph {
                    en: en.to_string(),
                    zh: zh.to_string(),
                })
                .collect(),
            vocabulary: terms.iter().map(|t| vocab(t)).collect(),
            ..ArticleData::default()
        }
    }

    fn terms(article: &ArticleData) -> Vec<&str> {
        article.vocabulary.iter().map(|v| v.term.as_str()).collect()
    }

    #[test]
    fn invalid_article_id_falls_back_to_default() {
        assert_eq!(ArticleId::resolve(Some("../../etc")).as_str(), DEFAULT_ARTICLE_ID);
        assert_eq!(ArticleId::resolve(Some("")).as_str(), DEFAULT_ARTICLE_ID);
        assert_eq!(ArticleId::resolve(None).as_str(), DEFAULT_ARTICLE_ID);
        assert_eq!(ArticleId::resolve(Some("unit_test-1")).as_str(), "unit_test-1");
    }

    #[test]
    fn article_id_builds_resource_path() {
        let id = ArticleId::resolve(Some("brief-01"));
        assert_eq!(id.resource_path(), "data/brief-01.data.json");
    }

    #[test]
    fn query_param_decodes_values() {
        assert_eq!(
            query_param("?lang=en&article=unit_test-1", "article").as_deref(),
            Some("unit_test-1")
        );
        assert_eq!(query_param("article=a%2Db", "article").as_deref(), Some("a-b"));
        assert_eq!(query_param("article=a+b", "article").as_deref(), Some("a b"));
        assert_eq!(query_param("article", "article").as_deref(), Some(""));
        assert_eq!(query_param("other=1", "article"), None);
        assert_eq!(ArticleId::from_query("?article=..%2F..%2Fetc").as_str(), DEFAULT_ARTICLE_ID);
        assert_eq!(ArticleId::from_query("article=%41rt").as_str(), "Art");
    }

    #[test]
    fn reorder_sorts_by_first_occurrence() {
        let mut data = article(
            &[("The Analyst reviewed", ""), ("raw signals before the briefing", "")],
            &["briefing", "signals", "analyst"],
        );
        data.reorder_vocabulary();
        assert_eq!(terms(&data), vec!["analyst", "signals", "briefing"]);
    }

    #[test]
    fn reorder_puts_absent_terms_last_in_input_order() {
        let mut data = article(
            &[("alpha beta gamma", "")],
            &["missing-one", "gamma", "missing-two", "alpha"],
        );
        data.reorder_vocabulary();
        assert_eq!(terms(&data), vec!["alpha", "gamma", "missing-one", "missing-two"]);
    }

    #[test]
    fn reorder_matches_across_paragraph_boundary() {
        let mut data = article(&[("end of one", ""), ("start", "")], &["start", "one start"]);
        data.reorder_vocabulary();
        assert_eq!(terms(&data), vec!["one start", "start"]);
    }

    #[test]
    fn reading_minutes_has_floor_and_ceiling() {
        assert_eq!(reading_minutes_for_units(0), 1);
        assert_eq!(reading_minutes_for_units(10), 1);
        assert_eq!(reading_minutes_for_units(250), 1);
        assert_eq!(reading_minutes_for_units(251), 2);
        assert_eq!(reading_minutes_for_units(500), 2);
    }

    #[test]
    fn reading_units_count_words_and_characters() {
        let data = article(&[("  one two\tthree  ", "你好"), ("four", "世界!")], &[]);
        assert_eq!(data.reading_units(), 4 + 5);
        assert_eq!(data.reading_minutes(), 1);
    }

    #[test]
    fn progress_is_zero_without_overflow() {
        let metrics = ScrollMetrics {
            scroll_top: 40,
            scroll_height: 100,
            client_height: 100,
        };
        assert_eq!(metrics.percent(), 0.0);
    }

    #[test]
    fn progress_is_clamped() {
        let half = ScrollMetrics {
            scroll_top: 25,
            scroll_height: 150,
            client_height: 100,
        };
        assert_eq!(half.percent(), 50.0);
        let overshoot = ScrollMetrics {
            scroll_top: 80,
            scroll_height: 150,
            client_height: 100,
        };
        assert_eq!(overshoot.percent(), 100.0);
    }

    #[test]
    fn theme_parses_strings() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!(" Dark ".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn saved_word_json_uses_camel_case() {
        let word = SavedWord {
            word: "run".to_string(),
            note_height: Some(120.0),
            ..SavedWord::default()
        };
        let json = serde_json::to_value(&word).unwrap();
        assert_eq!(json["noteHeight"], 120.0);
        assert!(json.get("note_height").is_none());

        let decoded: SavedWord =
            serde_json::from_str(r#"{"word":"run","phonetics":[],"meanings":[],"timestamp":5}"#)
                .unwrap();
        assert_eq!(decoded.notes, "");
        assert_eq!(decoded.note_height, None);
    }

    #[test]
    fn saved_word_from_vocab_keeps_definition() {
        let item = VocabItem {
            term: "covert".to_string(),
            definition: "not openly acknowledged".to_string(),
            original_sentence: "A covert program.".to_string(),
            collocations: vec!["covert action".to_string()],
            ..VocabItem::default()
        };
        let word = SavedWord::from_vocab(&item);
        assert_eq!(word.word, "covert");
        assert_eq!(word.first_definition(), Some("not openly acknowledged"));
        assert_eq!(
            word.meanings[0].definitions[0].example.as_deref(),
            Some("A covert program.")
        );
    }

    #[test]
    fn settings_normalize_default_article() {
        let mut settings = Settings {
            data_root: "  /srv/articles ".to_string(),
            default_article: "../nope".to_string(),
        };
        settings.normalize();
        assert_eq!(settings.data_root, "/srv/articles");
        assert_eq!(settings.default_article, DEFAULT_ARTICLE_ID);
    }

    #[test]
    fn settings_resolve_article_uses_configured_fallback() {
        let settings = Settings {
            data_root: String::new(),
            default_article: "weekly".to_string(),
        };
        assert_eq!(settings.resolve_article(None).as_str(), "weekly");
        assert_eq!(settings.resolve_article(Some("article=bad/id")).as_str(), "weekly");
        assert_eq!(settings.resolve_article(Some("article=daily")).as_str(), "daily");
    }

    #[test]
    fn compact_breakpoint() {
        assert!(is_compact_width(1023));
        assert!(!is_compact_width(1024));
    }
}
