// Parser contract tests against a captured four-drawing layout response.
use std::collections::BTreeMap;

use chart_drawings::api::{
    BASE_FIELDS, ErrorKind, PATH_FIELDS, ParsedDrawing, Point, RECTANGLE_FIELDS, TABLE_FIELDS,
    TREND_LINE_FIELDS, ToolKind, filter_by_group, filter_by_symbol, filter_by_type, get_summary,
    parse, parse_drawing, parse_drawing_groups,
};
use serde_json::{Value, json};

fn sample() -> Value {
    serde_json::from_str(include_str!("fixtures/layout_sources.json")).expect("fixture json")
}

fn drawing<'a>(drawings: &'a [ParsedDrawing], id: &str) -> &'a ParsedDrawing {
    drawings
        .iter()
        .find(|drawing| drawing.id == id)
        .unwrap_or_else(|| panic!("missing drawing {id}"))
}

fn style_keys(drawing: &ParsedDrawing) -> Vec<String> {
    let mut keys: Vec<String> = drawing.style.to_map().keys().cloned().collect();
    keys.sort();
    keys
}

fn expected_keys(fields: &[&str]) -> Vec<String> {
    let mut keys: Vec<String> = BASE_FIELDS
        .iter()
        .chain(fields.iter())
        .map(|key| key.to_string())
        .collect();
    keys.sort();
    keys
}

#[test]
fn parses_every_source_and_group() {
    let raw = sample();
    let parsed = parse(&raw).expect("parsed");
    assert!(parsed.success);
    assert_eq!(parsed.drawings.len(), 4);
    assert_eq!(parsed.groups.len(), 1);
    assert_eq!(parsed.raw, raw);

    let mut ids: Vec<&str> = parsed.drawings.iter().map(|d| d.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["25FuOW", "5Eg8Ci", "I66Yuv", "dUMWzJ"]);
}

#[test]
fn known_kinds_expose_exactly_their_whitelist() {
    let parsed = parse(&sample()).expect("parsed");
    let cases = [
        ("25FuOW", &RECTANGLE_FIELDS[..]),
        ("I66Yuv", &TREND_LINE_FIELDS[..]),
        ("5Eg8Ci", &PATH_FIELDS[..]),
        ("dUMWzJ", &TABLE_FIELDS[..]),
    ];
    for (id, fields) in cases {
        let drawing = drawing(&parsed.drawings, id);
        assert_eq!(style_keys(drawing), expected_keys(fields), "style keys of {id}");
        assert!(drawing.style.get("symbol").is_none());
        assert!(drawing.style.get("interval").is_none());
    }
}

#[test]
fn rectangle_fields() {
    let parsed = parse(&sample()).expect("parsed");
    let rectangle = drawing(&parsed.drawings, "25FuOW");
    assert_eq!(rectangle.kind, ToolKind::Rectangle);
    assert_eq!(rectangle.symbol, "BINANCE:UNIUSDT.P");
    assert_eq!(rectangle.owner_source, "_seriesId");
    assert_eq!(rectangle.server_update_time, Some(json!(1749106516920_i64)));
    assert_eq!(rectangle.zorder, json!(-35180));
    assert_eq!(rectangle.link_key, "vrPTpq4C3Ml3");
    assert_eq!(rectangle.sharing_mode, json!(1));
    assert_eq!(rectangle.interval, "5");
    assert!(rectangle.visible);
    assert!(!rectangle.frozen);
    assert_eq!(rectangle.points.len(), 2);
    assert_eq!(
        rectangle.points[0],
        Point {
            time_t: 1748526300,
            offset: 13,
            price: 7.009,
            interval: "5".to_string(),
        }
    );

    let style = rectangle.style.rectangle().expect("rectangle style");
    assert_eq!(style.color(), Some("rgba(8, 153, 129, 1)"));
    assert_eq!(style.fill_background(), Some(true));
    let middle = style.middle_line().expect("middle line");
    assert_eq!(middle["lineColor"], json!("#9c27b0"));
    assert_eq!(middle["lineStyle"], json!(2));
    assert_eq!(rectangle.style.base.symbol_state_version, Some(json!(2)));
}

#[test]
fn integer_style_values_stay_integers() {
    let parsed = parse(&sample()).expect("parsed");
    let rectangle = drawing(&parsed.drawings, "25FuOW");
    let style = serde_json::to_value(&rectangle.style).expect("encode");
    assert_eq!(style["linewidth"], json!(1));
    assert_eq!(style["fontSize"], json!(18));
    assert_eq!(style["transparency"], json!(50));
    assert_eq!(style["linewidth"].to_string(), "1");

    let encoded = serde_json::to_value(rectangle).expect("encode drawing");
    assert_eq!(encoded["zorder"], json!(-35180));
    assert_eq!(encoded["style"]["middleLine"]["lineWidth"], json!(1));
}

#[test]
fn loosely_typed_style_values_pass_through() {
    let mut raw = sample();
    raw["payload"]["sources"]["I66Yuv"]["state"]["state"]["linestyle"] = json!(1.0);
    raw["payload"]["sources"]["dUMWzJ"]["state"]["state"]["cells"] =
        json!([["a", 1.5], ["b", null]]);
    raw["payload"]["sources"]["25FuOW"]["state"]["zorder"] = json!(-35180.5);

    let parsed = parse(&raw).expect("parsed");
    assert_eq!(parsed.drawings.len(), 4);
    let line = drawing(&parsed.drawings, "I66Yuv");
    assert_eq!(line.style.get("linestyle"), Some(json!(1.0)));
    let table = drawing(&parsed.drawings, "dUMWzJ");
    let cells = table.style.table().and_then(|style| style.cells()).expect("cells");
    assert_eq!(cells[0], json!(["a", 1.5]));
    assert_eq!(cells[1], json!(["b", null]));
    assert_eq!(drawing(&parsed.drawings, "25FuOW").zorder, json!(-35180.5));
}

#[test]
fn trend_line_fields() {
    let parsed = parse(&sample()).expect("parsed");
    let line = drawing(&parsed.drawings, "I66Yuv");
    assert_eq!(line.kind, ToolKind::TrendLine);
    let style = line.style.trend_line().expect("trend style");
    assert_eq!(style.linecolor(), Some("rgba(242, 54, 69, 1)"));
    assert_eq!(style.always_show_stats(), Some(true));
    assert_eq!(style.snap_to_45_degrees(), Some(true));
    assert_eq!(style.adjusted_to_split_time(), Some(1749188291.887));
    assert_eq!(line.style.get("snapTo45Degrees"), Some(json!(true)));
}

#[test]
fn path_fields_and_group() {
    let parsed = parse(&sample()).expect("parsed");
    let path = drawing(&parsed.drawings, "5Eg8Ci");
    assert_eq!(path.kind, ToolKind::Path);
    assert_eq!(path.group_id.as_deref(), Some("9dPnET"));
    assert_eq!(path.interval, "240");
    let style = path.style.path().expect("path style");
    assert_eq!(style.line_color(), Some("rgba(255, 235, 59, 0.8408)"));
    assert_eq!(
        path.style.get("intervalsVisibilities"),
        Some(json!({
            "seconds": false,
            "hoursTo": 4,
            "days": false,
            "daysTo": 3,
            "weeks": false,
            "months": false
        }))
    );
}

#[test]
fn table_fields() {
    let parsed = parse(&sample()).expect("parsed");
    let table = drawing(&parsed.drawings, "dUMWzJ");
    assert_eq!(table.kind, ToolKind::Table);
    assert_eq!(table.points.len(), 1);
    let style = table.style.table().expect("table style");
    assert_eq!(style.background_color(), Some("#0F0F0F"));
    assert_eq!(style.rows_count(), Some(3));
    assert_eq!(style.cols_count(), Some(4));
    let cells = style.cells().expect("cells");
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0], json!(["3D笔趋势", "下跌中,3D笔HL破了", "3D趋势", "下跌中"]));
    assert_eq!(style.row_heights(), Some(&[json!(50.2), json!(32), json!(68.4)][..]));
}

#[test]
fn groups_are_projected() {
    let raw = sample();
    let groups = raw["payload"]["drawing_groups"].as_object().expect("groups");
    let parsed = parse_drawing_groups(groups).expect("groups");
    assert_eq!(parsed.len(), 1);
    assert_eq!(
        serde_json::to_value(&parsed[0]).expect("encode"),
        json!({
            "id": "9dPnET",
            "symbol": "BINANCE:UNIUSDT.P",
            "serverUpdateTime": 1749182472504_i64,
            "name": "4H笔"
        })
    );
    assert!(parse_drawing_groups(&serde_json::Map::new()).expect("empty").is_empty());
}

#[test]
fn unknown_kind_keeps_raw_state() {
    let drawing = parse_drawing(&json!({
        "id": "unknown",
        "symbol": "TEST:SYMBOL",
        "ownerSource": "test",
        "serverUpdateTime": 123456789,
        "state": {
            "type": "UnknownDrawingType",
            "id": "unknown",
            "state": {"customProperty": "value"},
            "points": [],
            "zorder": 0,
            "linkKey": "test",
            "sharingMode": 1
        }
    }))
    .expect("drawing");
    assert_eq!(drawing.kind, ToolKind::Other("UnknownDrawingType".to_string()));
    assert_eq!(drawing.style.get("customProperty"), Some(json!("value")));
    assert_eq!(
        serde_json::to_value(&drawing).expect("encode")["type"],
        json!("UnknownDrawingType")
    );
}

#[test]
fn minimal_known_drawing_defaults() {
    let drawing = parse_drawing(&json!({
        "id": "test",
        "symbol": "TEST:SYMBOL",
        "state": {"type": "LineToolRectangle", "id": "test", "state": {}, "points": []}
    }))
    .expect("drawing");
    assert_eq!(drawing.kind, ToolKind::Rectangle);
    assert!(drawing.points.is_empty());
    assert_eq!(drawing.title, "");
    assert_eq!(drawing.text, "");
    assert!(drawing.visible);
    assert_eq!(style_keys(&drawing), expected_keys(&[]));
}

#[test]
fn bad_source_fails_the_whole_parse() {
    let mut raw = sample();
    raw["payload"]["sources"]["broken"] = json!({"id": "broken"});
    let err = parse(&raw).expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.message(), Some("invalid drawing: missing state"));
}

#[test]
fn filters_select_by_predicate() {
    let parsed = parse(&sample()).expect("parsed");
    let drawings = &parsed.drawings;

    let rectangles = filter_by_type(drawings, &ToolKind::Rectangle);
    assert_eq!(rectangles.len(), 1);
    assert_eq!(rectangles[0].kind, ToolKind::Rectangle);
    assert_eq!(filter_by_type(drawings, &ToolKind::Ellipse).len(), 0);

    assert_eq!(filter_by_symbol(drawings, "BINANCE:UNIUSDT.P").len(), 4);
    assert!(filter_by_symbol(drawings, "OTHER:SYMBOL").is_empty());

    let grouped = filter_by_group(drawings, "9dPnET");
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].group_id.as_deref(), Some("9dPnET"));
    assert!(filter_by_group(drawings, "nonexistent").is_empty());

    // Filters compose over already-filtered selections.
    let narrowed = filter_by_group(filter_by_symbol(drawings, "BINANCE:UNIUSDT.P"), "9dPnET");
    assert_eq!(narrowed.len(), 1);
}

#[test]
fn summary_counts() {
    let parsed = parse(&sample()).expect("parsed");
    let summary = get_summary(&parsed.drawings);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.visible, 4);
    assert_eq!(summary.frozen, 0);
    assert_eq!(summary.grouped, 1);

    let types: BTreeMap<String, usize> = [
        ("LineToolPath", 1),
        ("LineToolRectangle", 1),
        ("LineToolTable", 1),
        ("LineToolTrendLine", 1),
    ]
    .into_iter()
    .map(|(kind, count)| (kind.to_string(), count))
    .collect();
    assert_eq!(summary.type_count, types);
    assert_eq!(summary.symbol_count.get("BINANCE:UNIUSDT.P"), Some(&4));
    assert_eq!(summary.group_count.len(), 1);
    assert_eq!(summary.group_count.get("9dPnET"), Some(&1));

    let value = serde_json::to_value(&summary).expect("encode");
    assert_eq!(value["typeCount"]["LineToolTable"], json!(1));
    assert_eq!(value["groupCount"], json!({"9dPnET": 1}));
}
