//! Purpose: Per-tool style schemas: builder defaults, field-level merge, parser whitelists.
//! Exports: `DrawingStyle`, `StyleVariant`, the per-tool style views, `default_style`,
//! `merge_style`, `parse_style`, and the `*_FIELDS` whitelists.
//! Role: Single home for "which style keys exist for which tool kind".
//! Invariants: Known kinds expose exactly their whitelisted keys plus the base keys.
//! Invariants: Unknown kinds keep the whole raw style blob, layered over the base keys.
//! Invariants: Values are copied through unchanged; a value's JSON type is never checked.
//! Invariants: Nested style objects merge key-by-key; overrides never erase sibling defaults.

use super::model::ToolKind;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

pub const BASE_FIELDS: [&str; 4] = ["visible", "frozen", "symbolStateVersion", "zOrderVersion"];

pub const RECTANGLE_FIELDS: [&str; 16] = [
    "color",
    "fillBackground",
    "backgroundColor",
    "linewidth",
    "transparency",
    "showLabel",
    "horzLabelsAlign",
    "vertLabelsAlign",
    "textColor",
    "fontSize",
    "bold",
    "italic",
    "extendLeft",
    "extendRight",
    "middleLine",
    "linestyle",
];

pub const TREND_LINE_FIELDS: [&str; 29] = [
    "linecolor",
    "linewidth",
    "linestyle",
    "extendLeft",
    "extendRight",
    "leftEnd",
    "rightEnd",
    "showLabel",
    "horzLabelsAlign",
    "vertLabelsAlign",
    "textcolor",
    "fontsize",
    "bold",
    "italic",
    "alwaysShowStats",
    "showMiddlePoint",
    "showPriceLabels",
    "showPriceRange",
    "showPercentPriceRange",
    "showPipsPriceRange",
    "showBarsRange",
    "showDateTimeRange",
    "showDistance",
    "showAngle",
    "statsPosition",
    "snapTo45Degrees",
    "fixedSize",
    "adjustedToSplitTime",
    "intervalsVisibilities",
];

pub const PATH_FIELDS: [&str; 7] = [
    "lineColor",
    "lineWidth",
    "lineStyle",
    "leftEnd",
    "rightEnd",
    "adjustedToSplitTime",
    "intervalsVisibilities",
];

pub const TABLE_FIELDS: [&str; 11] = [
    "backgroundColor",
    "borderColor",
    "textColor",
    "fontSize",
    "horzAlign",
    "anchored",
    "rowsCount",
    "colsCount",
    "cells",
    "columnWidths",
    "rowHeights",
];

/// Whitelisted style keys for a tool kind; `None` means the blob passes through untouched.
pub fn whitelist(kind: &ToolKind) -> Option<&'static [&'static str]> {
    match kind {
        ToolKind::Rectangle => Some(&RECTANGLE_FIELDS),
        ToolKind::TrendLine => Some(&TREND_LINE_FIELDS),
        ToolKind::Path => Some(&PATH_FIELDS),
        ToolKind::Table => Some(&TABLE_FIELDS),
        _ => None,
    }
}

/// Default style the builder starts from, for the kinds it can construct.
pub fn default_style(kind: &ToolKind) -> Option<Map<String, Value>> {
    let value = match kind {
        ToolKind::TrendLine => json!({
            "linecolor": "rgba(242, 54, 69, 1)",
            "linewidth": 1,
            "linestyle": 0,
            "extendLeft": false,
            "extendRight": false,
            "leftEnd": 0,
            "rightEnd": 0,
            "showLabel": true,
            "horzLabelsAlign": "left",
            "vertLabelsAlign": "middle",
            "textcolor": "rgba(255, 235, 59, 1)",
            "fontsize": 16,
            "bold": false,
            "italic": false,
            "alwaysShowStats": true,
            "showMiddlePoint": true,
            "showPriceLabels": true,
            "showPriceRange": false,
            "showPercentPriceRange": false,
            "showPipsPriceRange": false,
            "showBarsRange": false,
            "showDateTimeRange": false,
            "showDistance": false,
            "showAngle": false,
            "statsPosition": 3,
            "snapTo45Degrees": true,
            "fixedSize": true,
            "symbolStateVersion": 2,
            "zOrderVersion": 2,
            "visible": true,
            "frozen": false,
            "text": "",
            "title": "",
        }),
        ToolKind::Rectangle => json!({
            "color": "rgba(8, 153, 129, 1)",
            "fillBackground": true,
            "backgroundColor": "rgba(248, 187, 208, 0.1939)",
            "linewidth": 1,
            "transparency": 50,
            "showLabel": true,
            "horzLabelsAlign": "center",
            "vertLabelsAlign": "top",
            "textColor": "rgba(255, 235, 59, 1)",
            "fontSize": 18,
            "bold": false,
            "italic": false,
            "extendLeft": false,
            "extendRight": false,
            "middleLine": {
                "showLine": true,
                "lineWidth": 1,
                "lineColor": "#9c27b0",
                "lineStyle": 2,
            },
            "linestyle": 0,
            "symbolStateVersion": 2,
            "zOrderVersion": 2,
            "frozen": false,
            "visible": true,
            "text": "",
            "title": "",
        }),
        _ => return None,
    };
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Layers `overrides` over `defaults`. Object-valued keys present on both sides are
/// merged one level deep instead of replaced.
pub fn merge_style(defaults: Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults;
    for (key, value) in overrides {
        if let (Some(Value::Object(base)), Value::Object(patch)) = (merged.get_mut(key), value) {
            base.extend(patch.clone());
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Keys every parsed style carries regardless of tool kind.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseStyle {
    pub visible: bool,
    pub frozen: bool,
    /// Passed through as sent; `None` when the server omitted it.
    pub symbol_state_version: Option<Value>,
    pub z_order_version: Option<Value>,
}

impl BaseStyle {
    fn from_blob(blob: &Map<String, Value>) -> Self {
        Self {
            visible: blob.get("visible") != Some(&Value::Bool(false)),
            frozen: blob.get("frozen").and_then(Value::as_bool).unwrap_or(false),
            symbol_state_version: blob.get("symbolStateVersion").cloned(),
            z_order_version: blob.get("zOrderVersion").cloned(),
        }
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("visible".to_string(), Value::Bool(self.visible));
        map.insert("frozen".to_string(), Value::Bool(self.frozen));
        map.insert(
            "symbolStateVersion".to_string(),
            self.symbol_state_version.clone().unwrap_or(Value::Null),
        );
        map.insert(
            "zOrderVersion".to_string(),
            self.z_order_version.clone().unwrap_or(Value::Null),
        );
        map
    }
}

// Each per-kind style keeps its whitelisted keys exactly as received; accessors only read.
macro_rules! style_fields {
    ($(#[$doc:meta])* $name:ident, $fields:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Default, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name {
            fields: Map<String, Value>,
        }

        impl $name {
            fn from_blob(blob: &Map<String, Value>) -> Self {
                Self {
                    fields: pick(blob, &$fields),
                }
            }

            pub fn fields(&self) -> &Map<String, Value> {
                &self.fields
            }

            pub fn get(&self, key: &str) -> Option<&Value> {
                self.fields.get(key)
            }
        }
    };
}

style_fields!(RectangleStyle, RECTANGLE_FIELDS);
style_fields!(TrendLineStyle, TREND_LINE_FIELDS);
style_fields!(PathStyle, PATH_FIELDS);
style_fields!(
    /// Table cells, widths and heights stay raw: cells may hold numbers or nulls.
    TableStyle,
    TABLE_FIELDS
);

impl RectangleStyle {
    pub fn color(&self) -> Option<&str> {
        text(&self.fields, "color")
    }

    pub fn background_color(&self) -> Option<&str> {
        text(&self.fields, "backgroundColor")
    }

    pub fn fill_background(&self) -> Option<bool> {
        flag(&self.fields, "fillBackground")
    }

    pub fn linewidth(&self) -> Option<f64> {
        number(&self.fields, "linewidth")
    }

    /// `{showLine, lineWidth, lineColor, lineStyle}` as sent.
    pub fn middle_line(&self) -> Option<&Map<String, Value>> {
        self.fields.get("middleLine").and_then(Value::as_object)
    }
}

impl TrendLineStyle {
    pub fn linecolor(&self) -> Option<&str> {
        text(&self.fields, "linecolor")
    }

    pub fn linewidth(&self) -> Option<f64> {
        number(&self.fields, "linewidth")
    }

    pub fn always_show_stats(&self) -> Option<bool> {
        flag(&self.fields, "alwaysShowStats")
    }

    pub fn snap_to_45_degrees(&self) -> Option<bool> {
        flag(&self.fields, "snapTo45Degrees")
    }

    pub fn adjusted_to_split_time(&self) -> Option<f64> {
        number(&self.fields, "adjustedToSplitTime")
    }

    pub fn intervals_visibilities(&self) -> Option<&Map<String, Value>> {
        self.fields.get("intervalsVisibilities").and_then(Value::as_object)
    }
}

impl PathStyle {
    pub fn line_color(&self) -> Option<&str> {
        text(&self.fields, "lineColor")
    }

    pub fn line_width(&self) -> Option<f64> {
        number(&self.fields, "lineWidth")
    }

    pub fn intervals_visibilities(&self) -> Option<&Map<String, Value>> {
        self.fields.get("intervalsVisibilities").and_then(Value::as_object)
    }
}

impl TableStyle {
    pub fn background_color(&self) -> Option<&str> {
        text(&self.fields, "backgroundColor")
    }

    pub fn rows_count(&self) -> Option<u64> {
        self.fields.get("rowsCount").and_then(Value::as_u64)
    }

    pub fn cols_count(&self) -> Option<u64> {
        self.fields.get("colsCount").and_then(Value::as_u64)
    }

    /// Rows of cells; each row is a JSON array.
    pub fn cells(&self) -> Option<&[Value]> {
        array(&self.fields, "cells")
    }

    pub fn column_widths(&self) -> Option<&[Value]> {
        array(&self.fields, "columnWidths")
    }

    pub fn row_heights(&self) -> Option<&[Value]> {
        array(&self.fields, "rowHeights")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StyleVariant {
    Rectangle(RectangleStyle),
    TrendLine(TrendLineStyle),
    Path(PathStyle),
    Table(TableStyle),
    /// Raw style blob of a tool kind without a whitelist.
    Other(Map<String, Value>),
}

/// Normalized style of a parsed drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingStyle {
    pub base: BaseStyle,
    pub variant: StyleVariant,
}

impl DrawingStyle {
    /// Flattened key/value view: base keys first, then the variant's keys on top.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.base.to_map();
        let variant = match &self.variant {
            StyleVariant::Rectangle(style) => style.fields(),
            StyleVariant::TrendLine(style) => style.fields(),
            StyleVariant::Path(style) => style.fields(),
            StyleVariant::Table(style) => style.fields(),
            StyleVariant::Other(raw) => raw,
        };
        map.extend(variant.clone());
        map
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.to_map().remove(key)
    }

    pub fn rectangle(&self) -> Option<&RectangleStyle> {
        match &self.variant {
            StyleVariant::Rectangle(style) => Some(style),
            _ => None,
        }
    }

    pub fn trend_line(&self) -> Option<&TrendLineStyle> {
        match &self.variant {
            StyleVariant::TrendLine(style) => Some(style),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&PathStyle> {
        match &self.variant {
            StyleVariant::Path(style) => Some(style),
            _ => None,
        }
    }

    pub fn table(&self) -> Option<&TableStyle> {
        match &self.variant {
            StyleVariant::Table(style) => Some(style),
            _ => None,
        }
    }
}

impl Serialize for DrawingStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Builds the normalized style for a drawing of `kind` from its raw `state.state` blob.
/// Never fails: values are copied through whatever their JSON type.
pub fn parse_style(kind: &ToolKind, blob: &Map<String, Value>) -> DrawingStyle {
    let base = BaseStyle::from_blob(blob);
    let variant = match kind {
        ToolKind::Rectangle => StyleVariant::Rectangle(RectangleStyle::from_blob(blob)),
        ToolKind::TrendLine => StyleVariant::TrendLine(TrendLineStyle::from_blob(blob)),
        ToolKind::Path => StyleVariant::Path(PathStyle::from_blob(blob)),
        ToolKind::Table => StyleVariant::Table(TableStyle::from_blob(blob)),
        _ => {
            tracing::debug!(kind = %kind, "passing through style of unrecognized tool kind");
            StyleVariant::Other(blob.clone())
        }
    };
    DrawingStyle { base, variant }
}

fn pick(blob: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|key| blob.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

fn text<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn flag(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key).and_then(Value::as_bool)
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

fn array<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    fields.get(key).and_then(Value::as_array).map(Vec::as_slice)
}
