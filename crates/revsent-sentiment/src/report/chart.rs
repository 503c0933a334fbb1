//! Pie chart of a [`SentimentSummary`] as an embeddable SVG image.

use std::f64::consts::PI;
use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::types::SentimentSummary;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const RADIUS: f64 = 180.0;
const START_DEGREES: f64 = 90.0;

/// Matplotlib's `tab10` cycle.
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Render `summary` as an SVG pie chart.
///
/// Wedges are ordered by descending count, starting at 12 o'clock and
/// running counter-clockwise. Each wedge carries its percentage (`{:.1}%`)
/// inside and its label outside.
#[must_use]
pub fn pie_chart_svg(summary: &SentimentSummary) -> String {
    let cx = f64::from(WIDTH) / 2.0;
    let cy = f64::from(HEIGHT) / 2.0;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="14">"#
    );
    svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
    let _ = write!(
        svg,
        r#"<text x="{cx}" y="28" text-anchor="middle" font-size="18">Sentiment Distribution</text>"#
    );

    if summary.is_empty() {
        let _ = write!(
            svg,
            r#"<text x="{cx}" y="{cy}" text-anchor="middle">no data</text></svg>"#
        );
        return svg;
    }

    let ranked = summary.ranked();
    let mut start = START_DEGREES;

    for (i, (label, _count)) in ranked.iter().enumerate() {
        let share = summary.proportion(label);
        let sweep = share * 360.0;
        let end = start + sweep;
        let color = PALETTE[i % PALETTE.len()];

        if ranked.len() == 1 {
            let _ = write!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{RADIUS}" fill="{color}"/>"#
            );
        } else if sweep > 0.0 {
            let (x0, y0) = point(cx, cy, RADIUS, start);
            let (x1, y1) = point(cx, cy, RADIUS, end);
            let large_arc = u8::from(sweep > 180.0);
            let _ = write!(
                svg,
                r##"<path d="M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {RADIUS} {RADIUS} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{color}" stroke="#ffffff"/>"##
            );
        }

        let mid = start + sweep / 2.0;
        let (px, py) = point(cx, cy, RADIUS * 0.6, mid);
        let _ = write!(
            svg,
            r#"<text x="{px:.2}" y="{py:.2}" text-anchor="middle" dominant-baseline="middle">{:.1}%</text>"#,
            share * 100.0
        );
        let (lx, ly) = point(cx, cy, RADIUS * 1.12, mid);
        let anchor = if lx < cx - 1.0 {
            "end"
        } else if lx > cx + 1.0 {
            "start"
        } else {
            "middle"
        };
        let _ = write!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="{anchor}" dominant-baseline="middle">{}</text>"#,
            escape_xml(label.as_str())
        );

        start = end;
    }

    svg.push_str("</svg>");
    svg
}

/// The chart as an HTML `<img>` tag with a base64 data URI.
///
/// The image is vector (`image/svg+xml`), not a PNG raster. Browsers render
/// it the same way inside an `<img>` element.
#[must_use]
pub fn pie_chart_img_tag(summary: &SentimentSummary) -> String {
    let encoded = STANDARD.encode(pie_chart_svg(summary));
    format!(r#"<img src="data:image/svg+xml;base64,{encoded}" alt="Sentiment Distribution"/>"#)
}

/// Point on the circle at `degrees`, measured counter-clockwise from 3 o'clock.
fn point(cx: f64, cy: f64, r: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees * PI / 180.0;
    (cx + r * rad.cos(), cy - r * rad.sin())
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReviewRecord, SentimentLabel};

    fn summary(labels: &[&str]) -> SentimentSummary {
        let records: Vec<ReviewRecord> = labels
            .iter()
            .enumerate()
            .map(|(position, label)| ReviewRecord {
                position,
                review: "r".to_string(),
                sentiment: SentimentLabel::new(*label),
            })
            .collect();
        SentimentSummary::from_records(&records)
    }

    #[test]
    fn wedges_carry_one_decimal_percentages() {
        let svg = pie_chart_svg(&summary(&["positive", "positive", "negative"]));
        assert!(svg.contains(">66.7%<"));
        assert!(svg.contains(">33.3%<"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(">positive<") && svg.contains(">negative<"));
    }

    #[test]
    fn first_wedge_starts_at_twelve_o_clock() {
        let svg = pie_chart_svg(&summary(&["a", "b"]));
        assert!(svg.contains("L 320.00 60.00"), "{svg}");
    }

    #[test]
    fn single_label_is_a_full_circle() {
        let svg = pie_chart_svg(&summary(&["neutral", "neutral"]));
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<path"));
        assert!(svg.contains(">100.0%<"));
    }

    #[test]
    fn empty_summary_renders_placeholder() {
        let svg = pie_chart_svg(&SentimentSummary::default());
        assert!(svg.contains("no data"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = pie_chart_svg(&summary(&["<b>&", "x"]));
        assert!(svg.contains("&lt;b&gt;&amp;"));
    }

    #[test]
    fn img_tag_declares_svg_media_type() {
        let tag = pie_chart_img_tag(&summary(&["positive"]));
        assert!(tag.contains("data:image/svg+xml;base64,"));
        assert!(!tag.contains("image/png"));
    }

    #[test]
    fn img_tag_embeds_decodable_svg() {
        let s = summary(&["positive", "negative"]);
        let tag = pie_chart_img_tag(&s);
        let prefix = r#"<img src="data:image/svg+xml;base64,"#;
        assert!(tag.starts_with(prefix));
        let encoded = tag[prefix.len()..].split('"').next().unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, pie_chart_svg(&s));
    }
}
