//! Generate an HTML/SVG visualization of the lard61 keymap.
//! Each physical key is a rectangle in its row-staggered position, labelled
//! with its code on each layer.

use lard61_matrix::{KeyIndex, Keycode, Layer, Row, FN_KEY, ROWS};

/// Physical key position and size for SVG rendering.
struct Key {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    index: KeyIndex,
}

/// Key unit size in SVG pixels.
const U: f64 = 54.0;
/// Gap between keys.
const GAP: f64 = 4.0;
/// Step: key + gap.
const S: f64 = U + GAP;
/// Key corner radius.
const R: f64 = 4.0;
/// Margin around the SVG content.
const MARGIN: f64 = 20.0;

/// Key widths in units, left to right, for the physical keys of each row.
/// Every row adds up to 15u.
const WIDTHS: [&[f64]; ROWS] = [
    &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0],
    &[1.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.5],
    &[1.75, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.25],
    &[2.25, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.75],
    &[1.25, 1.25, 1.25, 6.25, 1.25, 1.25, 1.25, 1.25],
];

/// Width in pixels of a key `units` wide, including the gaps it spans.
fn span(units: f64) -> f64 {
    units * S - GAP
}

/// Build all physical key positions, row by row.
fn build_keys() -> Vec<Key> {
    let mut keys = Vec::new();

    for row in Row::all() {
        let physical = KeyIndex::all().filter(|k| k.row() == row && k.is_physical());
        let mut x = 0.0;
        for (index, &units) in physical.zip(WIDTHS[row.index()]) {
            keys.push(Key {
                x,
                y: row.index() as f64 * S,
                w: span(units),
                h: U,
                index,
            });
            x += units * S;
        }
    }

    keys
}

/// Compute the bounding box of all keys: (max_x + w, max_y + h).
fn bbox(keys: &[Key]) -> (f64, f64) {
    let mut max_x: f64 = 0.0;
    let mut max_y: f64 = 0.0;
    for k in keys {
        max_x = max_x.max(k.x + k.w);
        max_y = max_y.max(k.y + k.h);
    }
    (max_x, max_y)
}

fn layer_title(layer: Layer) -> &'static str {
    match layer {
        Layer::Base => "Layer 0 (Base)",
        Layer::Function => "Layer 1 (Fn held)",
    }
}

/// Render a single layer as an SVG group.
fn render_layer(keys: &[Key], layer: Layer, y_offset: f64) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<g transform="translate({MARGIN}, {y_offset})">"#
    ));
    svg.push_str(&format!(
        r#"<text x="0" y="-10" class="layer-title">{}</text>"#,
        layer_title(layer)
    ));

    for key in keys {
        let kc = lard61_matrix::keymap::map(key.index, layer);
        let base = lard61_matrix::keymap::map(key.index, Layer::Base);

        let label = if key.index == FN_KEY { "Fn" } else { kc.display_name() };

        let key_class = if key.index == FN_KEY {
            "key layer"
        } else if kc == Keycode::No {
            "key unused"
        } else if layer != Layer::Base && kc == base {
            "key same"
        } else if kc.is_modifier() {
            "key modifier"
        } else {
            "key"
        };

        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{R}" class="{key_class}" data-key="{}"/>"#,
            key.x,
            key.y,
            key.w,
            key.h,
            key.index.index(),
        ));

        if !label.is_empty() {
            let font_class = if label.len() > 3 { " small" } else { "" };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" class="label{font_class}">{}</text>"#,
                key.x + key.w / 2.0,
                key.y + key.h / 2.0 + 1.0,
                html_escape(label),
            ));
        }
    }

    svg.push_str("</g>");
    svg
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Generate the complete HTML document with inline SVG.
pub fn generate_html() -> String {
    let keys = build_keys();
    let (content_w, content_h) = bbox(&keys);
    let layer_height = content_h + 60.0;
    let total_width = content_w + 2.0 * MARGIN;
    let total_height = Layer::ALL.len() as f64 * layer_height + 2.0 * MARGIN;

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>lard61 keymap</title>
<style>
  :root {{ --case: #f4f1ea; --cap: #fffdf8; --edge: #b9b2a3; --ink: #2b2a27; --accent: #c2410c; }}
  body {{ margin: 0; padding: 2em; background: var(--case); color: var(--ink); font: 14px system-ui, sans-serif; }}
  .key {{ fill: var(--cap); stroke: var(--edge); stroke-width: 1.2; }}
  .key:hover {{ stroke: var(--accent); stroke-width: 2; }}
  .key.unused {{ fill: none; stroke-dasharray: 4 3; }}
  .key.same {{ fill: #ece8df; }}
  .key.layer {{ fill: #fde3d3; stroke: var(--accent); stroke-width: 2; }}
  .key.modifier {{ fill: #e6e1d6; }}
  .label {{ fill: var(--ink); font: 13px ui-monospace, monospace; text-anchor: middle; dominant-baseline: middle; pointer-events: none; }}
  .label.small {{ font-size: 10px; }}
  .layer-title {{ fill: var(--accent); font-size: 16px; font-weight: 600; }}
</style>
</head>
<body>
<svg width="{total_width}" height="{total_height}" xmlns="http://www.w3.org/2000/svg">
"#
    );

    for (i, layer) in Layer::ALL.into_iter().enumerate() {
        let y_offset = MARGIN + i as f64 * layer_height + 30.0;
        html.push_str(&render_layer(&keys, layer, y_offset));
        html.push('\n');
    }

    html.push_str("</svg>\n</body>\n</html>\n");
    html
}
