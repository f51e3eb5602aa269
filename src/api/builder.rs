//! Purpose: Construct outbound drawings, groups and bundles for the save endpoint.
//! Exports: `DrawingOptions`, `GroupOptions`, `BundleOptions`, `create_*`, group helpers.
//! Role: Pure, local half of the drawing workflow; no transport access.
//! Invariants: Inputs are never mutated; helpers return fresh values or copies.
//! Invariants: Trend lines and rectangles require exactly two points.
//! Invariants: Removing a group clears `groupId` on its drawings; dangling ids are tolerated.

use super::ids::{generate_client_id, generate_drawing_id, generate_link_key};
use super::model::{DrawingBundle, DrawingGroup, DrawingSource, OWNER_SOURCE, Point, SourceState, ToolKind};
use super::style::{default_style, merge_style};
use crate::core::error::{Error, ErrorKind, validation};
use serde_json::{Map, Value, json};

pub const TREND_LINE_ZORDER: i64 = -625;
pub const RECTANGLE_ZORDER: i64 = -313;
pub const DEFAULT_INTERVAL: &str = "5";
const SHARING_MODE: i64 = 1;
const REQUIRED_POINTS: usize = 2;

/// Inputs for a two-point drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawingOptions {
    /// Drawing id; must be non-empty. See `generate_drawing_id`.
    pub id: String,
    /// Instrument, e.g. `BINANCE:BTCUSDT`; must be non-empty.
    pub symbol: String,
    /// Exactly two anchor points, copied into the drawing as given.
    pub points: Vec<Point>,
    /// Style overrides layered over the tool's defaults, key by key.
    pub style: Map<String, Value>,
    /// Group to place the drawing in; unset leaves it ungrouped.
    pub group_id: Option<String>,
}

impl DrawingOptions {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            points,
            style: Map::new(),
            group_id: None,
        }
    }

    pub fn with_style(mut self, key: impl Into<String>, value: Value) -> Self {
        self.style.insert(key.into(), value);
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupOptions {
    /// Generated when unset.
    pub id: Option<String>,
    pub name: String,
    pub symbol: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BundleOptions {
    pub drawings: Option<Vec<DrawingSource>>,
    pub groups: Option<Vec<DrawingGroup>>,
}

impl BundleOptions {
    pub fn new(drawings: Vec<DrawingSource>) -> Self {
        Self {
            drawings: Some(drawings),
            groups: None,
        }
    }

    pub fn with_groups(mut self, groups: Vec<DrawingGroup>) -> Self {
        self.groups = Some(groups);
        self
    }
}

pub fn create_trend_line(options: &DrawingOptions) -> Result<DrawingSource, Error> {
    build_drawing(options, ToolKind::TrendLine, TREND_LINE_ZORDER)
}

pub fn create_rectangle(options: &DrawingOptions) -> Result<DrawingSource, Error> {
    build_drawing(options, ToolKind::Rectangle, RECTANGLE_ZORDER)
}

pub fn create_drawing_group(options: &GroupOptions) -> Result<DrawingGroup, Error> {
    if options.name.is_empty() {
        return Err(validation("name", "group name is required"));
    }
    if options.symbol.is_empty() {
        return Err(validation("symbol", "symbol is required"));
    }
    let id = match options.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => generate_drawing_id()?,
    };
    Ok(DrawingGroup {
        id,
        name: options.name.clone(),
        symbol: options.symbol.clone(),
        server_update_time: None,
        currency_id: None,
        unit_id: None,
    })
}

pub fn create_drawing_sources(options: BundleOptions) -> Result<DrawingBundle, Error> {
    let Some(drawings) = options.drawings else {
        return Err(validation("drawings", "drawings array is required"));
    };
    let sources = drawings
        .into_iter()
        .map(|drawing| (drawing.id.clone(), drawing))
        .collect();
    let drawing_groups = options
        .groups
        .unwrap_or_default()
        .into_iter()
        .map(|group| (group.id.clone(), group))
        .collect();
    Ok(DrawingBundle {
        sources,
        drawing_groups,
        client_id: Some(generate_client_id()?),
    })
}

/// Copy of `drawing` placed in `group_id`.
pub fn add_drawing_to_group(drawing: &DrawingSource, group_id: &str) -> Result<DrawingSource, Error> {
    require_group_id(group_id)?;
    let mut grouped = drawing.clone();
    grouped.group_id = Some(group_id.to_string());
    Ok(grouped)
}

pub fn get_drawings_by_group<'a>(
    bundle: &'a DrawingBundle,
    group_id: &str,
) -> Result<Vec<&'a DrawingSource>, Error> {
    require_group_id(group_id)?;
    Ok(bundle
        .sources
        .values()
        .filter(|drawing| drawing.group_id.as_deref() == Some(group_id))
        .collect())
}

pub fn get_drawing_groups(bundle: &DrawingBundle) -> Vec<&DrawingGroup> {
    bundle.drawing_groups.values().collect()
}

/// New bundle without `group_id`; its drawings stay, ungrouped.
pub fn remove_drawing_group(bundle: &DrawingBundle, group_id: &str) -> Result<DrawingBundle, Error> {
    require_group_id(group_id)?;
    let mut updated = bundle.clone();
    updated.drawing_groups.remove(group_id);
    for drawing in updated.sources.values_mut() {
        if drawing.group_id.as_deref() == Some(group_id) {
            drawing.group_id = None;
        }
    }
    Ok(updated)
}

fn require_group_id(group_id: &str) -> Result<(), Error> {
    if group_id.is_empty() {
        return Err(validation("groupId", "group id is required"));
    }
    Ok(())
}

fn validate_options(options: &DrawingOptions) -> Result<(), Error> {
    if options.id.is_empty() {
        return Err(validation("id", "drawing id is required"));
    }
    if options.symbol.is_empty() {
        return Err(validation("symbol", "symbol is required"));
    }
    if options.points.len() != REQUIRED_POINTS {
        return Err(validation("points", "exactly 2 points are required"));
    }
    Ok(())
}

fn build_drawing(options: &DrawingOptions, kind: ToolKind, zorder: i64) -> Result<DrawingSource, Error> {
    validate_options(options)?;
    let defaults = default_style(&kind).ok_or_else(|| {
        Error::new(ErrorKind::Internal).with_message(format!("no default style for {kind}"))
    })?;

    let mut state = merge_style(defaults, &options.style);
    let interval = options
        .points
        .first()
        .map(|point| point.interval.as_str())
        .filter(|interval| !interval.is_empty())
        .unwrap_or(DEFAULT_INTERVAL);
    let (now_ms, now_secs) = now();
    state.insert("symbol".to_string(), json!(options.symbol));
    state.insert("currencyId".to_string(), Value::Null);
    state.insert("unitId".to_string(), Value::Null);
    state.insert("interval".to_string(), json!(interval));
    state.insert("lastUpdateTime".to_string(), json!(now_ms));
    state.insert("adjustedToSplitTime".to_string(), json!(now_secs));
    if kind == ToolKind::TrendLine {
        state.insert(
            "intervalsVisibilities".to_string(),
            json!({"seconds": false, "daysTo": 5, "months": false}),
        );
    }

    Ok(DrawingSource {
        id: options.id.clone(),
        owner_source: OWNER_SOURCE.to_string(),
        state: SourceState {
            kind,
            id: options.id.clone(),
            state,
            points: options.points.clone(),
            zorder,
            owner_source: OWNER_SOURCE.to_string(),
            link_key: generate_link_key()?,
            sharing_mode: SHARING_MODE,
        },
        symbol: options.symbol.clone(),
        currency_id: None,
        unit_id: None,
        group_id: options.group_id.clone(),
    })
}

/// Current time as (epoch milliseconds, epoch seconds) from one clock reading.
fn now() -> (i64, f64) {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    ((nanos / 1_000_000) as i64, nanos as f64 / 1e9)
}
