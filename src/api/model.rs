//! Purpose: Define the wire and in-memory shapes shared by the builder, client and parser.
//! Exports: `ToolKind`, `Point`, `DrawingSource`, `SourceState`, `DrawingGroup`,
//! `DrawingBundle`, `Credentials`.
//! Role: Serde contract with the drawing storage API (camelCase keys, nested `state`).
//! Invariants: `groupId` is omitted from JSON when unset; `currencyId`/`unitId` serialize as null.
//! Invariants: Unknown tool tags survive a decode/encode cycle unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const OWNER_SOURCE: &str = "_seriesId";

/// Drawing tool kinds known to the storage API.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    TrendLine,
    Rectangle,
    Path,
    Table,
    HorizontalLine,
    VerticalLine,
    ParallelChannel,
    FibRetracement,
    FibExtension,
    Ellipse,
    Circle,
    Arrow,
    Text,
    Note,
    Callout,
    Other(String),
}

impl ToolKind {
    pub const KNOWN: [ToolKind; 15] = [
        ToolKind::TrendLine,
        ToolKind::Rectangle,
        ToolKind::Path,
        ToolKind::Table,
        ToolKind::HorizontalLine,
        ToolKind::VerticalLine,
        ToolKind::ParallelChannel,
        ToolKind::FibRetracement,
        ToolKind::FibExtension,
        ToolKind::Ellipse,
        ToolKind::Circle,
        ToolKind::Arrow,
        ToolKind::Text,
        ToolKind::Note,
        ToolKind::Callout,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::TrendLine => "LineToolTrendLine",
            ToolKind::Rectangle => "LineToolRectangle",
            ToolKind::Path => "LineToolPath",
            ToolKind::Table => "LineToolTable",
            ToolKind::HorizontalLine => "LineToolHorzLine",
            ToolKind::VerticalLine => "LineToolVertLine",
            ToolKind::ParallelChannel => "LineToolParallelChannel",
            ToolKind::FibRetracement => "LineToolFibRetracement",
            ToolKind::FibExtension => "LineToolFibExtension",
            ToolKind::Ellipse => "LineToolEllipse",
            ToolKind::Circle => "LineToolCircle",
            ToolKind::Arrow => "LineToolArrow",
            ToolKind::Text => "LineToolText",
            ToolKind::Note => "LineToolNote",
            ToolKind::Callout => "LineToolCallout",
            ToolKind::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|kind| kind.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| ToolKind::Other(tag.to_string()))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ToolKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ToolKind::from_tag(&tag))
    }
}

/// Anchor point of a drawing: bar time in seconds plus price.
/// Decoding is lenient: missing or null fields read as zero/empty, and float times truncate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default, deserialize_with = "lenient_int")]
    pub time_t: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub offset: i64,
    #[serde(default, deserialize_with = "lenient_float")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub interval: String,
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

impl Point {
    pub fn new(time_t: i64, price: f64, interval: impl Into<String>) -> Self {
        Self {
            time_t,
            offset: 0,
            price,
            interval: interval.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceState {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub id: String,
    /// Merged style plus generated metadata (`interval`, `lastUpdateTime`, ...).
    pub state: Map<String, Value>,
    pub points: Vec<Point>,
    pub zorder: i64,
    pub owner_source: String,
    pub link_key: String,
    pub sharing_mode: i64,
}

/// One drawing as exchanged with the save endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingSource {
    pub id: String,
    pub owner_source: String,
    pub state: SourceState,
    pub symbol: String,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DrawingSource {
    pub fn kind(&self) -> &ToolKind {
        &self.state.kind
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingGroup {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_update_time: Option<i64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
}

/// Envelope of drawings and groups sent to (and stored by) the API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingBundle {
    pub sources: BTreeMap<String, DrawingSource>,
    #[serde(default, rename = "drawing_groups")]
    pub drawing_groups: BTreeMap<String, DrawingGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Session credentials used for token issuance and the save cookie.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Credentials {
    pub session: Option<String>,
    pub signature: Option<String>,
    pub id: Option<i64>,
}

impl Credentials {
    pub fn new(session: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            session: Some(session.into()),
            signature: Some(signature.into()),
            id: None,
        }
    }

    pub fn with_user_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref().filter(|session| !session.is_empty())
    }

    pub fn user_id(&self) -> i64 {
        self.id.unwrap_or(-1)
    }

    /// Cookie header value for authenticated requests, if a session is set.
    pub fn auth_cookie(&self) -> Option<String> {
        let session = self.session()?;
        let mut cookie = format!("sessionid={session};");
        if let Some(signature) = self.signature.as_deref().filter(|sig| !sig.is_empty()) {
            cookie.push_str(&format!("sessionid_sign={signature};"));
        }
        Some(cookie)
    }
}
