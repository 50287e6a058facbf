//! Item search and sort composer.
//!
//! # Responsibility
//! - Build one parameterized filter + order query over the Item table from
//!   four enumerated axes.
//! - Return matching ids in order plus a deduplicated completion list.
//!
//! # Invariants
//! - Deleted items are never returned.
//! - Blank search text means no filter, not no results.
//! - User text only ever reaches SQL as a bound parameter; LIKE wildcards in
//!   it are escaped.
//! - Ordering is deterministic: ties on the sort key fall back to `ItemID`.

use crate::db::DbError;
use crate::model::ids::ItemId;
use crate::model::item::ItemStatus;
use crate::repo::accessor::AccessError;
use crate::settings::IdFormat;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("numeric id regex must compile"));

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Access(AccessError),
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Access(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<AccessError> for SearchError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Wildcard placement applied to the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    BeginsWith,
    EndsWith,
    #[default]
    Contains,
    Equals,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeginsWith => "begins_with",
            Self::EndsWith => "ends_with",
            Self::Contains => "contains",
            Self::Equals => "equals",
        }
    }

    fn like_pattern(self, text: &str) -> String {
        let escaped = escape_like(text);
        match self {
            Self::BeginsWith => format!("{escaped}%"),
            Self::EndsWith => format!("%{escaped}"),
            Self::Contains => format!("%{escaped}%"),
            Self::Equals => escaped,
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "begins_with" => Ok(Self::BeginsWith),
            "ends_with" => Ok(Self::EndsWith),
            "contains" => Ok(Self::Contains),
            "equals" => Ok(Self::Equals),
            other => Err(format!("unknown match mode `{other}`")),
        }
    }
}

/// Item attribute used for filtering or ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKey {
    #[default]
    Name,
    Manufacturer,
    Id,
    Created,
    Modified,
}

impl SearchKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Manufacturer => "manufacturer",
            Self::Id => "id",
            Self::Created => "created",
            Self::Modified => "modified",
        }
    }

    /// SQL expression for this key. `Id` renders through the bound
    /// `printf` format parameter `?1`.
    fn expression(self) -> &'static str {
        match self {
            Self::Name => r#"i."Name""#,
            Self::Manufacturer => r#"m."Name""#,
            Self::Id => r#"printf(?1, i."ItemID")"#,
            Self::Created => r#"i."DateCreated""#,
            Self::Modified => r#"i."DateModified""#,
        }
    }

    fn order_expression(self) -> &'static str {
        match self {
            Self::Name => r#"i."Name" COLLATE NOCASE"#,
            Self::Manufacturer => r#"m."Name" COLLATE NOCASE"#,
            Self::Id => r#"i."ItemID""#,
            Self::Created => r#"i."DateCreated""#,
            Self::Modified => r#"i."DateModified""#,
        }
    }
}

impl FromStr for SearchKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(Self::Name),
            "manufacturer" => Ok(Self::Manufacturer),
            "id" => Ok(Self::Id),
            "created" => Ok(Self::Created),
            "modified" => Ok(Self::Modified),
            other => Err(format!("unknown search key `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// The four independent search axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SearchConfig {
    pub mode: MatchMode,
    pub key: SearchKey,
    pub sort_key: SearchKey,
    pub order: SortOrder,
}

/// Ordered hits plus the deduplicated completion strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub ids: Vec<ItemId>,
    pub completions: Vec<String>,
}

/// Runs one search.
///
/// Completion strings are the literal values of the search key column per
/// hit, in hit order, each appearing once. NULL and empty values are skipped.
pub fn search_items(
    conn: &Connection,
    config: &SearchConfig,
    text: &str,
    format: &IdFormat,
) -> SearchResult<SearchOutcome> {
    let text = text.trim();
    let mut bind_values = vec![
        Value::Text(format!("%0{}d", format.item_width())),
        Value::Integer(ItemStatus::Deleted.to_db()),
    ];

    let mut sql = format!(
        r#"SELECT i."ItemID", {matched}
         FROM "Item" i
         LEFT JOIN "Manufacturer" m ON m."MfrID" = i."MfrID"
         WHERE i."ItemStatusID" <> ?2"#,
        matched = config.key.expression()
    );

    if !text.is_empty() {
        if config.key == SearchKey::Id && config.mode == MatchMode::Equals && is_numeric(text) {
            match text.parse::<i64>() {
                Ok(id) => {
                    bind_values.push(Value::Integer(id));
                    sql.push_str(&format!(r#" AND i."ItemID" = ?{}"#, bind_values.len()));
                }
                // Too large for a key, so nothing can match.
                Err(_) => return Ok(SearchOutcome::default()),
            }
        } else {
            bind_values.push(Value::Text(config.mode.like_pattern(text)));
            sql.push_str(&format!(
                r#" AND {} LIKE ?{} ESCAPE '\'"#,
                config.key.expression(),
                bind_values.len()
            ));
        }
    }

    sql.push_str(&format!(
        r#" ORDER BY {} {}, i."ItemID" ASC"#,
        config.sort_key.order_expression(),
        config.order.sql()
    ));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut outcome = SearchOutcome::default();
    let mut seen = HashSet::new();

    while let Some(row) = rows.next()? {
        outcome.ids.push(ItemId::new(row.get(0)?));
        let matched: Option<String> = row.get(1)?;
        if let Some(matched) = matched.filter(|value| !value.is_empty()) {
            if seen.insert(matched.clone()) {
                outcome.completions.push(matched);
            }
        }
    }

    info!(
        "event=item_search module=search status=ok key={} mode={} sort_key={} hits={} completions={}",
        config.key.as_str(),
        config.mode.as_str(),
        config.sort_key.as_str(),
        outcome.ids.len(),
        outcome.completions.len()
    );
    Ok(outcome)
}

/// Stateful search holding the axes and the last outcome.
#[derive(Debug, Clone, Default)]
pub struct ItemSearch {
    config: SearchConfig,
    last: SearchOutcome,
}

impl ItemSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            last: SearchOutcome::default(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.config.mode = mode;
    }

    pub fn set_search_key(&mut self, key: SearchKey) {
        self.config.key = key;
    }

    pub fn set_sort_key(&mut self, key: SearchKey) {
        self.config.sort_key = key;
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.config.order = order;
    }

    /// Recomputes results and completions. On error the previous outcome is kept.
    pub fn run(&mut self, conn: &Connection, format: &IdFormat, text: &str) -> SearchResult<&[ItemId]> {
        self.last = search_items(conn, &self.config, text, format)?;
        Ok(&self.last.ids)
    }

    pub fn results(&self) -> &[ItemId] {
        &self.last.ids
    }

    pub fn completions(&self) -> &[String] {
        &self.last.completions
    }
}

fn is_numeric(text: &str) -> bool {
    NUMERIC_RE.is_match(text)
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, is_numeric, MatchMode, SearchConfig, SearchKey, SortOrder};

    #[test]
    fn wildcards_follow_match_mode() {
        assert_eq!(MatchMode::BeginsWith.like_pattern("ab"), "ab%");
        assert_eq!(MatchMode::EndsWith.like_pattern("ab"), "%ab");
        assert_eq!(MatchMode::Contains.like_pattern("ab"), "%ab%");
        assert_eq!(MatchMode::Equals.like_pattern("ab"), "ab");
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(MatchMode::Contains.like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn numeric_detection_rejects_signs_and_spaces() {
        assert!(is_numeric("000042"));
        assert!(!is_numeric("-1"));
        assert!(!is_numeric("4 2"));
        assert!(!is_numeric(""));
    }

    #[test]
    fn axes_parse_from_snake_case() {
        assert_eq!("ends_with".parse::<MatchMode>(), Ok(MatchMode::EndsWith));
        assert_eq!("modified".parse::<SearchKey>(), Ok(SearchKey::Modified));
        assert!("price".parse::<SearchKey>().is_err());
    }

    #[test]
    fn default_config_is_contains_by_name_ascending() {
        let config = SearchConfig::default();
        assert_eq!(config.mode, MatchMode::Contains);
        assert_eq!(config.key, SearchKey::Name);
        assert_eq!(config.sort_key, SearchKey::Name);
        assert_eq!(config.order, SortOrder::Ascending);
    }
}
