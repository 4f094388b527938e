use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog source a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Primary paginated catalog API
    Primary,
    /// Price-comparison API
    Comparison,
    /// Embedded fallback set
    #[default]
    Static,
}

impl SourceKind {
    /// All sources, in global-search precedence order
    pub const ALL: [SourceKind; 3] = [SourceKind::Primary, SourceKind::Comparison, SourceKind::Static];

    /// Id prefix used when records from several sources are merged
    pub fn id_prefix(&self) -> &'static str {
        match self {
            SourceKind::Primary => "rawg",
            SourceKind::Comparison => "cheapshark",
            SourceKind::Static => "static",
        }
    }

    /// Whether fetching from this source goes over the network
    pub fn is_network(&self) -> bool {
        !matches!(self, SourceKind::Static)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Primary => "primary",
            SourceKind::Comparison => "comparison",
            SourceKind::Static => "static",
        };
        f.write_str(name)
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "rawg" => Ok(SourceKind::Primary),
            "comparison" | "cheapshark" => Ok(SourceKind::Comparison),
            "static" | "fallback" => Ok(SourceKind::Static),
            other => Err(format!("unknown catalog source: {}", other)),
        }
    }
}

/// Nested platform reference as delivered by catalog APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

/// Platform a game runs on.
///
/// Upstreams disagree on the shape: some send a bare name, others a nested
/// object. Both are kept as-is and resolved through [`Platform::name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Platform {
    Name(String),
    Ref(PlatformRef),
}

impl Platform {
    pub fn name(&self) -> &str {
        match self {
            Platform::Name(name) => name,
            Platform::Ref(platform) => &platform.name,
        }
    }

    /// Case-insensitive comparison against a platform name
    pub fn matches(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name.trim())
    }
}

impl From<&str> for Platform {
    fn from(name: &str) -> Self {
        Platform::Name(name.to_string())
    }
}

/// Accept numbers, numeric strings or null for prices (upstreams send all three)
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PriceValue {
        Number(f64),
        String(String),
        Null,
    }

    Ok(match PriceValue::deserialize(deserializer)? {
        PriceValue::Number(n) if n.is_finite() && n >= 0.0 => Some(n),
        PriceValue::Number(_) => None,
        PriceValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0),
        PriceValue::Null => None,
    })
}

/// Lenient date parsing: anything that isn't `YYYY-MM-DD` becomes `None`
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

fn deserialize_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(clamp_rating(raw.unwrap_or(0.0)))
}

/// Ratings live on a 0-5 scale
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, 5.0)
    } else {
        0.0
    }
}

/// Normalized, source-independent game record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    /// Identifier, unique within `source`
    #[serde(default)]
    pub id: String,

    /// Catalog source this record came from
    #[serde(default)]
    pub source: SourceKind,

    /// Game name
    #[serde(default)]
    pub name: String,

    /// Cover/header image URL
    #[serde(default)]
    pub image: String,

    /// User rating (0.0-5.0)
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: f64,

    /// Current price
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,

    /// List price, or cheapest known price for comparison results
    #[serde(default, deserialize_with = "deserialize_price")]
    pub original_price: Option<f64>,

    /// Platform(s)
    #[serde(default)]
    pub platforms: Vec<Platform>,

    /// Genre(s)
    #[serde(default)]
    pub genres: Vec<String>,

    /// Release date
    #[serde(default, deserialize_with = "deserialize_date")]
    pub released: Option<NaiveDate>,

    #[serde(default)]
    pub description: String,
}

impl GameRecord {
    /// Create a new GameRecord with required fields
    pub fn new(source: SourceKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source,
            name: name.into(),
            image: String::new(),
            rating: 0.0,
            price: None,
            original_price: None,
            platforms: Vec::new(),
            genres: Vec::new(),
            released: None,
            description: String::new(),
        }
    }

    /// Price used for totals and price filters; missing counts as free
    pub fn effective_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Percentage saved against the original price, when both are known
    pub fn discount_percent(&self) -> Option<f64> {
        match (self.price, self.original_price) {
            (Some(price), Some(original)) if original > 0.0 && price < original => {
                Some(((original - price) / original * 100.0).round())
            }
            _ => None,
        }
    }

    /// Copy of this record with its id prefixed by the source name
    pub fn with_source_prefix(mut self) -> Self {
        let prefix = format!("{}-", self.source.id_prefix());
        if !self.id.starts_with(&prefix) {
            self.id = format!("{}{}", prefix, self.id);
        }
        self
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        let genre = genre.trim();
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    pub fn has_platform(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p.matches(platform))
    }

    /// Get display name (for logging/UI)
    pub fn display_name(&self) -> String {
        match self.released {
            Some(date) => format!("{} ({})", self.name, date.format("%Y")),
            None => self.name.clone(),
        }
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::new(SourceKind::Static, "", "Unknown Game")
    }
}
