//! Bar chart rendering for report time series.

use serde::Serialize;

/// One labeled value of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// A labeled data series with its axis title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub title: String,
    pub y_title: String,
    pub points: Vec<SeriesPoint>,
}

/// Renderable chart produced from a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    pub mime: &'static str,
    pub body: String,
}

/// Turns a series into a chart artifact.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &Series) -> ChartArtifact;
}

/// Inline SVG bar chart.
pub struct SvgBarChart {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgBarChart {
    fn default() -> Self {
        Self {
            width: 400,
            height: 230,
        }
    }
}

const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_TOP: f64 = 25.0;
const MARGIN_BOTTOM: f64 = 30.0;

impl ChartRenderer for SvgBarChart {
    fn render(&self, series: &Series) -> ChartArtifact {
        let width = self.width as f64;
        let height = self.height as f64;
        let plot_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let baseline = MARGIN_TOP + plot_h;

        let max = series
            .points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        let scale = if max > 0.0 { plot_h / max } else { 0.0 };

        let slot = plot_w / series.points.len().max(1) as f64;
        let bar_w = slot * 0.6;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        svg.push_str(&format!(
            r#"<text x="{x}" y="16" text-anchor="middle" font-size="12">{t}</text>"#,
            x = width / 2.0,
            t = escape(&series.title)
        ));
        svg.push_str(&format!(
            r#"<text x="12" y="{y}" transform="rotate(-90 12 {y})" text-anchor="middle" font-size="11">{t}</text>"#,
            y = MARGIN_TOP + plot_h / 2.0,
            t = escape(&series.y_title)
        ));
        svg.push_str(&format!(
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            r = MARGIN_LEFT + plot_w,
            t = MARGIN_TOP,
            b = baseline
        ));

        for (i, point) in series.points.iter().enumerate() {
            let value = if point.value.is_finite() {
                point.value.max(0.0)
            } else {
                0.0
            };
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            svg.push_str(&bar(x, bar_w, value * scale, baseline, point));
        }

        svg.push_str("</svg>");

        ChartArtifact {
            mime: "image/svg+xml",
            body: svg,
        }
    }
}

/// One bar with its value above and its label below the baseline.
fn bar(x: f64, width: f64, height: f64, baseline: f64, point: &SeriesPoint) -> String {
    let center = x + width / 2.0;
    let top = baseline - height;
    format!(
        concat!(
            r#"<rect x="{x:.1}" y="{top:.1}" width="{width:.1}" height="{height:.1}" fill="steelblue"/>"#,
            r#"<text x="{center:.1}" y="{value_y:.1}" text-anchor="middle" font-size="9">{value}</text>"#,
            r#"<text x="{center:.1}" y="{label_y:.1}" text-anchor="middle" font-size="10">{label}</text>"#,
        ),
        x = x,
        top = top,
        width = width,
        height = height,
        center = center,
        value_y = top - 3.0,
        value = point.value,
        label_y = baseline + 14.0,
        label = escape(&point.label),
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Series {
        Series {
            title: "Stored bytes".into(),
            y_title: "GB".into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    label: format!("05-0{}", i + 1),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn renders_one_bar_per_point() {
        let chart = SvgBarChart::default().render(&series(&[1.0, 2.5, 0.0]));

        assert_eq!(chart.mime, "image/svg+xml");
        assert!(chart.body.starts_with("<svg"));
        assert!(chart.body.ends_with("</svg>"));
        assert_eq!(chart.body.matches("<rect").count(), 3);
        assert!(chart.body.contains("05-02"));
        assert!(chart.body.contains(">GB<"));
    }

    #[test]
    fn tallest_bar_fills_plot_height() {
        let chart = SvgBarChart::default().render(&series(&[4.0]));
        // 230 - 25 - 30
        assert!(chart.body.contains(r#"height="175.0""#));
    }

    #[test]
    fn all_zero_series_renders_flat() {
        let chart = SvgBarChart::default().render(&series(&[0.0, 0.0]));
        assert_eq!(chart.body.matches(r#"height="0.0""#).count(), 2);
    }

    #[test]
    fn bar_carries_value_and_label() {
        let point = SeriesPoint {
            label: "05-10".into(),
            value: 2.5,
        };
        let markup = bar(60.0, 20.0, 100.0, 200.0, &point);

        assert!(markup.starts_with(r#"<rect x="60.0" y="100.0" width="20.0" height="100.0""#));
        assert!(markup.contains(r#"<text x="70.0" y="97.0" text-anchor="middle" font-size="9">2.5</text>"#));
        assert!(markup.ends_with(r#"y="214.0" text-anchor="middle" font-size="10">05-10</text>"#));
    }

    #[test]
    fn empty_series_and_markup_in_titles() {
        let mut s = series(&[]);
        s.title = "<b>&job</b>".into();
        let chart = SvgBarChart::default().render(&s);

        assert!(chart.body.contains("&lt;b&gt;&amp;job&lt;/b&gt;"));
        assert_eq!(chart.body.matches("<rect").count(), 0);
    }
}
