//! Purpose: Decode drawings responses into a uniform, array-based drawing model.
//! Exports: `parse`, `parse_drawings`, `parse_drawing`, `parse_points`,
//! `parse_drawing_groups`, filters, `get_summary` and the parsed types.
//! Role: Inbound half of the drawing workflow; pure functions over `serde_json::Value`.
//! Invariants: Every source in the payload yields exactly one drawing or the call fails.
//! Invariants: Unknown tool kinds are not errors; their style blob passes through whole.
//! Invariants: Group references are never validated against `drawing_groups`.
//! Notes: Parsed drawings are a projection, not the inverse of the builder's wire shape.
#![allow(clippy::result_large_err)]

use super::model::{Point, ToolKind};
use super::style::{DrawingStyle, parse_style};
use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDrawing {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub symbol: String,
    pub owner_source: String,
    /// Numeric fields pass through as sent; `Null` when absent.
    pub server_update_time: Option<Value>,
    pub points: Vec<Point>,
    pub zorder: Value,
    pub link_key: String,
    pub sharing_mode: Value,
    pub style: DrawingStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub title: String,
    pub text: String,
    pub interval: String,
    pub visible: bool,
    pub frozen: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGroup {
    #[serde(default, deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub symbol: String,
    #[serde(default)]
    pub server_update_time: Option<Value>,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub success: bool,
    pub drawings: Vec<ParsedDrawing>,
    pub groups: Vec<ParsedGroup>,
    /// The envelope exactly as received.
    pub raw: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingSummary {
    pub total: usize,
    pub visible: usize,
    pub frozen: usize,
    pub grouped: usize,
    pub type_count: BTreeMap<String, usize>,
    pub symbol_count: BTreeMap<String, usize>,
    pub group_count: BTreeMap<String, usize>,
}

// Outer drawing fields; `state` is read separately so its absence gets a precise error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDrawing {
    #[serde(default, deserialize_with = "loose_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    owner_source: Option<String>,
    #[serde(default)]
    server_update_time: Option<Value>,
    #[serde(default, deserialize_with = "loose_text")]
    group_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawState {
    #[serde(default, rename = "type", deserialize_with = "loose_text")]
    kind: Option<String>,
    #[serde(default)]
    points: Option<Vec<Value>>,
    #[serde(default)]
    zorder: Option<Value>,
    #[serde(default, deserialize_with = "loose_text")]
    link_key: Option<String>,
    #[serde(default)]
    sharing_mode: Option<Value>,
    #[serde(default)]
    state: Option<Map<String, Value>>,
}

pub fn parse(raw: &Value) -> Result<ParsedResponse, Error> {
    if !raw.is_object() {
        return Err(parse_error("invalid response: response must be an object"));
    }
    if raw.get("success") != Some(&Value::Bool(true)) {
        return Err(parse_error("response indicates failure"));
    }
    let payload = match raw.get("payload") {
        Some(payload) if !payload.is_null() => payload,
        _ => return Err(parse_error("no payload in response")),
    };

    let drawings = parse_drawings(&object_field(payload, "sources")?)?;
    let groups = parse_drawing_groups(&object_field(payload, "drawing_groups")?)?;
    tracing::debug!(
        drawings = drawings.len(),
        groups = groups.len(),
        "parsed drawings response"
    );
    Ok(ParsedResponse {
        success: true,
        drawings,
        groups,
        raw: raw.clone(),
    })
}

pub fn parse_drawings(sources: &Map<String, Value>) -> Result<Vec<ParsedDrawing>, Error> {
    sources.values().map(parse_drawing).collect()
}

pub fn parse_drawing(raw: &Value) -> Result<ParsedDrawing, Error> {
    let state = match raw.get("state") {
        Some(state) if !state.is_null() => state,
        _ => return Err(parse_error("invalid drawing: missing state")),
    };
    let outer: RawDrawing = decode(raw, "invalid drawing")?;
    let inner: RawState = decode(state, "invalid drawing state")?;

    let kind = ToolKind::from_tag(inner.kind.as_deref().unwrap_or_default());
    let blob = inner.state.unwrap_or_default();
    let style = parse_style(&kind, &blob);
    let points = parse_points(inner.points.as_deref().unwrap_or_default())?;

    Ok(ParsedDrawing {
        id: outer.id.unwrap_or_default(),
        kind,
        symbol: outer.symbol.unwrap_or_default(),
        owner_source: outer.owner_source.unwrap_or_default(),
        server_update_time: outer.server_update_time,
        points,
        zorder: inner.zorder.unwrap_or_default(),
        link_key: inner.link_key.unwrap_or_default(),
        sharing_mode: inner.sharing_mode.unwrap_or_default(),
        group_id: outer.group_id.filter(|id| !id.is_empty()),
        title: text_field(&blob, "title"),
        text: text_field(&blob, "text"),
        interval: text_field(&blob, "interval"),
        visible: style.base.visible,
        frozen: style.base.frozen,
        style,
    })
}

/// Points in order; a missing `offset` reads as 0.
pub fn parse_points(points: &[Value]) -> Result<Vec<Point>, Error> {
    points
        .iter()
        .map(|point| decode(point, "invalid drawing point"))
        .collect()
}

pub fn parse_drawing_groups(groups: &Map<String, Value>) -> Result<Vec<ParsedGroup>, Error> {
    groups
        .values()
        .map(|group| decode(group, "invalid drawing group"))
        .collect()
}

pub fn filter_by_type<'a, I>(drawings: I, kind: &ToolKind) -> Vec<&'a ParsedDrawing>
where
    I: IntoIterator<Item = &'a ParsedDrawing>,
{
    drawings
        .into_iter()
        .filter(|drawing| &drawing.kind == kind)
        .collect()
}

pub fn filter_by_symbol<'a, I>(drawings: I, symbol: &str) -> Vec<&'a ParsedDrawing>
where
    I: IntoIterator<Item = &'a ParsedDrawing>,
{
    drawings
        .into_iter()
        .filter(|drawing| drawing.symbol == symbol)
        .collect()
}

pub fn filter_by_group<'a, I>(drawings: I, group_id: &str) -> Vec<&'a ParsedDrawing>
where
    I: IntoIterator<Item = &'a ParsedDrawing>,
{
    drawings
        .into_iter()
        .filter(|drawing| drawing.group_id.as_deref() == Some(group_id))
        .collect()
}

/// Counts in a single pass. `group_count` only has keys for groups actually referenced.
pub fn get_summary<'a, I>(drawings: I) -> DrawingSummary
where
    I: IntoIterator<Item = &'a ParsedDrawing>,
{
    let mut summary = DrawingSummary::default();
    for drawing in drawings {
        summary.total += 1;
        summary.visible += usize::from(drawing.visible);
        summary.frozen += usize::from(drawing.frozen);
        *summary
            .type_count
            .entry(drawing.kind.as_str().to_string())
            .or_default() += 1;
        *summary
            .symbol_count
            .entry(drawing.symbol.clone())
            .or_default() += 1;
        if let Some(group_id) = &drawing.group_id {
            summary.grouped += 1;
            *summary.group_count.entry(group_id.clone()).or_default() += 1;
        }
    }
    summary
}

fn object_field(payload: &Value, key: &str) -> Result<Map<String, Value>, Error> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(parse_error(format!("invalid response: {key} must be an object"))),
    }
}

fn text_field(blob: &Map<String, Value>, key: &str) -> String {
    blob.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// Strings pass; numbers are rendered as text; anything else reads as absent.
fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(loose_text(deserializer)?.unwrap_or_default())
}

fn decode<T: DeserializeOwned>(value: &Value, message: &str) -> Result<T, Error> {
    T::deserialize(value).map_err(|err| parse_error(message).with_source(err))
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Parse).with_message(message)
}
