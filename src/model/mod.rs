use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Marker the server uses in `finalResult` for a killed record.
pub const FINAL_RESULT_KILLED: &str = "1";
/// Marker the server uses in `finalResult` for a hit record.
pub const FINAL_RESULT_HIT: &str = "中";

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Accepts strings, numbers and booleans as display text. Nulls and
/// non-scalar values are treated as absent.
fn display_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One history row as the server reports it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, deserialize_with = "display_string")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub numbers: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub prediction: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub kill_number: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub flag: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub final_result: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub percent30: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub percent50: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub percent100: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub open_result: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub updated_at: Option<String>,
}

impl Record {
    pub fn row_style(&self) -> RowStyle {
        RowStyle::for_final_result(self.final_result.as_deref())
    }

    /// Cell texts in column order. Absent fields become empty strings.
    pub fn cells(&self) -> [String; COLUMN_COUNT] {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        [
            text(&self.period),
            text(&self.numbers),
            text(&self.prediction),
            text(&self.outcome),
            text(&self.kill_number),
            text(&self.flag),
            text(&self.final_result),
            text(&self.percent30),
            text(&self.percent50),
            text(&self.percent100),
            text(&self.open_result),
            self.updated_at
                .as_deref()
                .map(format_updated_at)
                .unwrap_or_default(),
        ]
    }
}

pub const COLUMN_COUNT: usize = 12;

pub const COLUMN_HEADERS: [&str; COLUMN_COUNT] = [
    "Period",
    "Numbers",
    "Prediction",
    "Outcome",
    "Kill",
    "Flag",
    "Final",
    "Kill% 30",
    "Kill% 50",
    "Kill% 100",
    "Open Result",
    "Updated",
];

/// Formats an ISO date-time as `YYYY-MM-DD HH:MM:SS`; anything that does not
/// parse is returned unchanged.
pub fn format_updated_at(raw: &str) -> String {
    const OUT: &str = "%Y-%m-%d %H:%M:%S";
    let trimmed = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(&chrono::Local).format(OUT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, pattern) {
            return dt.format(OUT).to_string();
        }
    }
    raw.to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStyle {
    Danger,
    Success,
    Plain,
}

impl RowStyle {
    pub fn for_final_result(final_result: Option<&str>) -> Self {
        match final_result {
            Some(FINAL_RESULT_KILLED) => RowStyle::Danger,
            Some(FINAL_RESULT_HIT) => RowStyle::Success,
            _ => RowStyle::Plain,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            RowStyle::Danger => "table-danger",
            RowStyle::Success => "table-success",
            RowStyle::Plain => "",
        }
    }
}

/// Statistics over the whole data set. Every field is optional because older
/// servers only send the page itself.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    #[serde(default)]
    pub killed_count: Option<u64>,
    #[serde(default)]
    pub hit_count: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub suggested_bet_count: Option<u64>,
    #[serde(default)]
    pub killed_rate: Option<f64>,
    #[serde(default)]
    pub hit_rate: Option<f64>,
    #[serde(default)]
    pub suggested_hit_rate: Option<f64>,
}

impl GlobalStats {
    pub fn is_empty(&self) -> bool {
        self == &GlobalStats::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Vec<Record>,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub current_page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub filter_type: Option<String>,
    #[serde(flatten)]
    pub stats: GlobalStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PageSize {
    Fixed(u32),
    All,
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Fixed(DEFAULT_PAGE_SIZE)
    }
}

impl PageSize {
    pub fn query_value(&self) -> String {
        match self {
            PageSize::Fixed(n) => n.to_string(),
            PageSize::All => "all".to_string(),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(PageSize::All);
        }
        match value.parse::<u32>() {
            Ok(0) => Err("page size must be positive".to_string()),
            Ok(n) => Ok(PageSize::Fixed(n)),
            Err(_) => Err(format!("expected a positive number or 'all', got '{value}'")),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_value())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum FilterType {
    #[default]
    All,
    Killed,
    Hit,
}

impl FilterType {
    pub fn query_value(&self) -> &'static str {
        match self {
            FilterType::All => "all",
            FilterType::Killed => FINAL_RESULT_KILLED,
            FilterType::Hit => FINAL_RESULT_HIT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterType::All => "all records",
            FilterType::Killed => "killed only",
            FilterType::Hit => "hits only",
        }
    }
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("all") => Ok(FilterType::All),
            "1" | "killed" | "kill" => Ok(FilterType::Killed),
            "中" | "hit" => Ok(FilterType::Hit),
            other => Err(format!(
                "unknown filter '{other}', expected all, 1 (killed) or 中 (hit)"
            )),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}
