//! Purpose: Define the stable public Rust API boundary for chart drawings.
//! Exports: Drawing model, builder operations, parser operations, client and transport.
//! Role: Public, additive-only surface; submodules stay private behind these re-exports.
//! Invariants: Builder and parser share only data shapes, never state.
//! Invariants: Only `DrawingsClient` (through a `Transport`) touches the network.

mod builder;
mod client;
mod ids;
mod model;
mod parser;
mod style;
mod transport;

pub use builder::{
    BundleOptions, DEFAULT_INTERVAL, DrawingOptions, GroupOptions, RECTANGLE_ZORDER,
    TREND_LINE_ZORDER, add_drawing_to_group, create_drawing_group, create_drawing_sources,
    create_rectangle, create_trend_line, get_drawing_groups, get_drawings_by_group,
    remove_drawing_group,
};
pub use client::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_CHART_ID, DEFAULT_TOKEN_URL, DrawingsClient,
};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
#[doc(hidden)]
pub use crate::json::parse::from_str as decode_json;
pub use crate::core::error::{Error, ErrorKind};
pub use ids::{
    DRAWING_ID_LEN, LINK_KEY_LEN, generate_client_id, generate_drawing_id, generate_link_key,
};
pub use model::{
    Credentials, DrawingBundle, DrawingGroup, DrawingSource, OWNER_SOURCE, Point, SourceState,
    ToolKind,
};
pub use parser::{
    DrawingSummary, ParsedDrawing, ParsedGroup, ParsedResponse, filter_by_group,
    filter_by_symbol, filter_by_type, get_summary, parse, parse_drawing, parse_drawing_groups,
    parse_drawings, parse_points,
};
pub use style::{
    BASE_FIELDS, BaseStyle, DrawingStyle, PATH_FIELDS, PathStyle, RECTANGLE_FIELDS,
    RectangleStyle, StyleVariant, TABLE_FIELDS, TREND_LINE_FIELDS, TableStyle, TrendLineStyle,
    default_style, merge_style, parse_style, whitelist,
};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
