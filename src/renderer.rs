// src/renderer.rs

use crate::error::{Error, Result};
use crate::model::*;
use chrono::NaiveDate;
use palette::{FromColor, Lch, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use tracing::info;

/// GitHub dark theme background, used for both the canvas and the plot area
pub const BACKGROUND: &str = "#0d1117";
const FOREGROUND: &str = "white";
const GRID: &str = "#30363d";
const LINE: &str = "#58a6ff";
const FONT: &str = "font-family='DejaVu Sans, Helvetica, sans-serif'";

const ACTIVITY_WIDTH: f64 = 1000.0;
const ACTIVITY_HEIGHT: f64 = 400.0;
const MAX_DATE_TICKS: i64 = 8;
const MAX_COUNT_TICKS: usize = 5;

const PIE_SIZE: f64 = 800.0;
const PIE_RADIUS: f64 = 260.0;

/// Commit counts per calendar day (UTC), ascending. Days without commits are absent.
pub fn daily_activity(commits: &[CommitRecord]) -> Vec<(NaiveDate, usize)> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for commit in commits {
        *days.entry(commit.timestamp.date_naive()).or_insert(0) += 1;
    }
    days.into_iter().collect()
}

/// Writes the commit activity line chart. Returns `false` without touching
/// `path` when there is nothing to plot.
pub fn render_commit_activity(commits: &[CommitRecord], path: &Path) -> Result<bool> {
    let series = daily_activity(commits);
    if series.is_empty() {
        info!("No commits to generate activity chart.");
        return Ok(false);
    }
    write_svg(path, &activity_svg(&series))?;
    info!("Generated commit activity chart: {}", path.display());
    Ok(true)
}

/// Writes the language pie chart. Returns `false` without touching `path`
/// when there are no languages.
pub fn render_language_chart(languages: &LanguageShares, path: &Path) -> Result<bool> {
    if languages.values().all(|&share| share <= 0.0) {
        info!("No language data to generate chart.");
        return Ok(false);
    }
    write_svg(path, &language_svg(languages))?;
    info!("Generated language chart: {}", path.display());
    Ok(true)
}

fn write_svg(path: &Path, svg: &str) -> Result<()> {
    fs::write(path, svg).map_err(|e| Error::io(path, e))
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}' viewBox='0 0 {width} {height}'>\n  <rect width='{width}' height='{height}' fill='{BACKGROUND}'/>\n"
    )
}

fn activity_svg(series: &[(NaiveDate, usize)]) -> String {
    let (left, right, top, bottom) = (70.0, ACTIVITY_WIDTH - 30.0, 50.0, ACTIVITY_HEIGHT - 90.0);

    let first = series[0].0;
    let span = (series[series.len() - 1].0 - first).num_days();
    let x_of = |day: NaiveDate| {
        if span == 0 {
            (left + right) / 2.0
        } else {
            left + (day - first).num_days() as f64 / span as f64 * (right - left)
        }
    };

    let peak = series.iter().map(|&(_, n)| n).max().unwrap_or(1).max(1);
    let step = peak.div_ceil(MAX_COUNT_TICKS).max(1);
    let y_max = (peak.div_ceil(step) * step) as f64;
    let y_of = |count: usize| bottom - count as f64 / y_max * (bottom - top);

    let mut svg = svg_open(ACTIVITY_WIDTH, ACTIVITY_HEIGHT);
    svg.push_str(&format!(
        "  <rect x='{left}' y='{top}' width='{}' height='{}' fill='{BACKGROUND}' stroke='{FOREGROUND}' stroke-width='1'/>\n",
        right - left,
        bottom - top
    ));
    svg.push_str(&format!(
        "  <text x='{}' y='30' fill='{FOREGROUND}' {FONT} font-size='16' text-anchor='middle'>Commit Activity (Last Year)</text>\n",
        (left + right) / 2.0
    ));

    for tick in (0..=y_max as usize).step_by(step) {
        let y = y_of(tick);
        svg.push_str(&format!(
            "  <line x1='{left}' y1='{y:.1}' x2='{right}' y2='{y:.1}' stroke='{GRID}' stroke-width='0.5'/>\n  <text x='{:.1}' y='{:.1}' fill='{FOREGROUND}' {FONT} font-size='11' text-anchor='end'>{tick}</text>\n",
            left - 6.0,
            y + 4.0
        ));
    }

    for day in date_ticks(first, span) {
        let x = x_of(day);
        let y = bottom + 14.0;
        svg.push_str(&format!(
            "  <line x1='{x:.1}' y1='{bottom}' x2='{x:.1}' y2='{:.1}' stroke='{FOREGROUND}' stroke-width='1'/>\n  <text x='{x:.1}' y='{y:.1}' fill='{FOREGROUND}' {FONT} font-size='11' text-anchor='end' transform='rotate(-45 {x:.1} {y:.1})'>{}</text>\n",
            bottom + 4.0,
            day.format("%b %d")
        ));
    }

    let points: Vec<String> = series
        .iter()
        .map(|&(day, count)| format!("{:.1},{:.1}", x_of(day), y_of(count)))
        .collect();
    svg.push_str(&format!(
        "  <polyline points='{}' fill='none' stroke='{LINE}' stroke-width='1.5'/>\n",
        points.join(" ")
    ));
    for &(day, count) in series {
        svg.push_str(&format!(
            "  <circle cx='{:.1}' cy='{:.1}' r='3' fill='{LINE}'><title>{}: {count}</title></circle>\n",
            x_of(day),
            y_of(count),
            day.format("%Y-%m-%d")
        ));
    }

    svg.push_str(&format!(
        "  <text x='{}' y='{}' fill='{FOREGROUND}' {FONT} font-size='13' text-anchor='middle'>Date</text>\n",
        (left + right) / 2.0,
        ACTIVITY_HEIGHT - 8.0
    ));
    svg.push_str(&format!(
        "  <text x='18' y='{0}' fill='{FOREGROUND}' {FONT} font-size='13' text-anchor='middle' transform='rotate(-90 18 {0})'>Commits</text>\n",
        (top + bottom) / 2.0
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Evenly spaced tick days from `first` over `span` days, ends included.
fn date_ticks(first: NaiveDate, span: i64) -> Vec<NaiveDate> {
    if span == 0 {
        return vec![first];
    }
    let intervals = span.min(MAX_DATE_TICKS - 1);
    (0..=intervals)
        .map(|i| first + chrono::Duration::days(span * i / intervals))
        .collect()
}

fn language_svg(languages: &LanguageShares) -> String {
    let (cx, cy) = (PIE_SIZE / 2.0, PIE_SIZE / 2.0 + 20.0);
    let wedges: Vec<(&str, f64)> = languages
        .iter()
        .filter(|&(_, &share)| share > 0.0)
        .map(|(name, &share)| (name.as_str(), share))
        .collect();
    let total: f64 = wedges.iter().map(|&(_, share)| share).sum();
    let colors = wedge_colors(wedges.len());

    // Angles in degrees, counter-clockwise from 3 o'clock with y pointing up
    let point = |angle: f64, radius: f64| {
        let rad = angle * PI / 180.0;
        (cx + radius * rad.cos(), cy - radius * rad.sin())
    };

    let mut svg = svg_open(PIE_SIZE, PIE_SIZE);
    svg.push_str(&format!(
        "  <text x='{cx}' y='50' fill='{FOREGROUND}' {FONT} font-size='20' text-anchor='middle'>Top Languages</text>\n"
    ));

    let mut start = 90.0;
    for ((name, share), color) in wedges.iter().zip(&colors) {
        let fraction = share / total;
        let sweep = fraction * 360.0;
        let end = start + sweep;

        if fraction >= 1.0 - 1e-9 {
            svg.push_str(&format!(
                "  <circle cx='{cx}' cy='{cy}' r='{PIE_RADIUS}' fill='{color}'/>\n"
            ));
        } else {
            let (x1, y1) = point(start, PIE_RADIUS);
            let (x2, y2) = point(end, PIE_RADIUS);
            let large_arc = u8::from(sweep > 180.0);
            svg.push_str(&format!(
                "  <path d='M {cx} {cy} L {x1:.2} {y1:.2} A {PIE_RADIUS} {PIE_RADIUS} 0 {large_arc} 0 {x2:.2} {y2:.2} Z' fill='{color}'/>\n"
            ));
        }

        let middle = start + sweep / 2.0;
        let (px, py) = point(middle, PIE_RADIUS * 0.6);
        let (lx, ly) = point(middle, PIE_RADIUS * 1.1);
        let anchor = if (middle * PI / 180.0).cos() >= 0.0 { "start" } else { "end" };
        svg.push_str(&format!(
            "  <text x='{px:.1}' y='{py:.1}' fill='{FOREGROUND}' {FONT} font-size='14' text-anchor='middle' dominant-baseline='middle'>{:.1}%</text>\n  <text x='{lx:.1}' y='{ly:.1}' fill='{FOREGROUND}' {FONT} font-size='15' text-anchor='{anchor}' dominant-baseline='middle'>{}</text>\n",
            fraction * 100.0,
            escape_xml(name)
        ));

        start = end;
    }

    svg.push_str("</svg>\n");
    svg
}

/// Bright, well separated wedge colors. Seeded so every run looks the same.
fn wedge_colors(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    let offset = rng.gen_range(0.0f32..360.0f32);
    (0..count)
        .map(|i| {
            let hue = (offset + i as f32 * 137.5f32) % 360.0f32;
            let color = Lch::new(70.0f32, 80.0f32, hue);
            let srgb: Srgb<f32> = Srgb::from_color(color);
            let (r, g, b) = srgb.into_components();
            let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0f32).round() as u8;
            format!("#{:02x}{:02x}{:02x}", to_u8(r), to_u8(g), to_u8(b))
        })
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
