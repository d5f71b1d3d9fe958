//! SVG report adapter implementing ReportPort.
//!
//! Writes one `strategy_performance_<TICKER>.svg` per ticker with one equity
//! line per strategy. Charts are built as plain SVG strings.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::batch::TickerRun;
use crate::domain::error::BacktestError;
use crate::ports::report_port::ReportPort;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const PAD_LEFT: f64 = 110.0;
const PAD_RIGHT: f64 = 30.0;
const PAD_TOP: f64 = 60.0;
const PAD_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 5;

const PALETTE: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

/// One labelled line on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine<'a> {
    pub label: String,
    pub dates: &'a [NaiveDate],
    pub values: &'a [f64],
}

pub struct SvgReportAdapter;

impl SvgReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn file_name(ticker: &str) -> String {
        format!("strategy_performance_{}.svg", ticker)
    }
}

impl Default for SvgReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for SvgReportAdapter {
    fn write_ticker(&self, run: &TickerRun, output_dir: &Path) -> Result<PathBuf, BacktestError> {
        let parts: Vec<(String, Vec<NaiveDate>, Vec<f64>)> = run
            .results
            .iter()
            .map(|r| {
                let (dates, values) = r.equity.to_parts();
                (r.strategy.clone(), dates, values)
            })
            .collect();

        let lines: Vec<ChartLine> = parts
            .iter()
            .map(|(name, dates, values)| {
                let (dates, values) = align_series(dates, values);
                let final_value = values.last().copied().unwrap_or(0.0);
                ChartLine {
                    label: format!("{}: {}", name, format_currency(final_value)),
                    dates,
                    values,
                }
            })
            .collect();

        let svg = render_chart(&format!("Strategy Performance for {}", run.ticker), &lines);

        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(Self::file_name(&run.ticker));
        fs::write(&path, svg)?;
        info!(ticker = %run.ticker, path = %path.display(), "chart written");
        Ok(path)
    }
}

/// Truncate both series to the shorter length, keeping the leading elements.
pub fn align_series<'a, A, B>(dates: &'a [A], values: &'a [B]) -> (&'a [A], &'a [B]) {
    if dates.len() != values.len() {
        warn!(
            dates = dates.len(),
            values = values.len(),
            "date/value length mismatch, truncating"
        );
    }
    let n = dates.len().min(values.len());
    (&dates[..n], &values[..n])
}

/// `$1,234,567.89` style, two decimals with thousands separators.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("${}", value);
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

pub fn render_chart(title: &str, lines: &[ChartLine]) -> String {
    let plot_w = WIDTH - PAD_LEFT - PAD_RIGHT;
    let plot_h = HEIGHT - PAD_TOP - PAD_BOTTOM;
    let bottom = HEIGHT - PAD_BOTTOM;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">
<rect width="100%" height="100%" fill="white"/>
<text x="{:.1}" y="30" font-size="20" text-anchor="middle">{}</text>
"#,
        WIDTH / 2.0,
        escape_xml(title)
    );
    svg.push_str(&format!(
        r##"<line x1="{PAD_LEFT}" y1="{PAD_TOP}" x2="{PAD_LEFT}" y2="{bottom}" stroke="#333"/>
<line x1="{PAD_LEFT}" y1="{bottom}" x2="{:.1}" y2="{bottom}" stroke="#333"/>
<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">Date</text>
<text x="20" y="{:.1}" font-size="13" text-anchor="middle" transform="rotate(-90 20 {:.1})">Total Return</text>
"##,
        WIDTH - PAD_RIGHT,
        PAD_LEFT + plot_w / 2.0,
        HEIGHT - 15.0,
        PAD_TOP + plot_h / 2.0,
        PAD_TOP + plot_h / 2.0,
    ));

    let mut bounds: Option<(NaiveDate, NaiveDate, f64, f64)> = None;
    for line in lines {
        for (&d, &v) in line.dates.iter().zip(line.values) {
            if !v.is_finite() {
                continue;
            }
            bounds = Some(match bounds {
                None => (d, d, v, v),
                Some((d0, d1, lo, hi)) => (d0.min(d), d1.max(d), lo.min(v), hi.max(v)),
            });
        }
    }

    let Some((first, last, lo, hi)) = bounds else {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">No equity data</text>
</svg>
"#,
            WIDTH / 2.0,
            HEIGHT / 2.0
        ));
        return svg;
    };

    let span_days = (last - first).num_days().max(1) as f64;
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, hi + 1.0) };
    let x_of = |d: NaiveDate| PAD_LEFT + (d - first).num_days() as f64 / span_days * plot_w;
    let y_of = |v: f64| bottom - (v - lo) / (hi - lo) * plot_h;

    for i in 0..=Y_TICKS {
        let v = lo + (hi - lo) * i as f64 / Y_TICKS as f64;
        let y = y_of(v);
        svg.push_str(&format!(
            r##"<line x1="{PAD_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#ddd"/>
<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{}</text>
"##,
            WIDTH - PAD_RIGHT,
            PAD_LEFT - 6.0,
            y + 4.0,
            format_currency(v)
        ));
    }
    for (d, anchor) in [(first, "start"), (last, "end")] {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"{anchor}\">{d}</text>\n",
            x_of(d),
            bottom + 18.0
        ));
    }

    for (i, line) in lines.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let points: Vec<String> = line
            .dates
            .iter()
            .zip(line.values)
            .filter(|(_, v)| v.is_finite())
            .map(|(&d, &v)| format!("{:.1},{:.1}", x_of(d), y_of(v)))
            .collect();

        // Legend sits in the top-left corner of the plot.
        let ly = PAD_TOP + 18.0 * i as f64 + 8.0;
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{}"/>
<line x1="{:.1}" y1="{ly:.1}" x2="{:.1}" y2="{ly:.1}" stroke="{color}" stroke-width="3"/>
<text x="{:.1}" y="{:.1}" font-size="12">{}</text>
"#,
            points.join(" "),
            PAD_LEFT + 12.0,
            PAD_LEFT + 32.0,
            PAD_LEFT + 38.0,
            ly + 4.0,
            escape_xml(&line.label)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}
