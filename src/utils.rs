//! Utility functions

use crate::constants::APP_NAME;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::PathBuf;

// Wide mark with wordmark room, for the sidebar header
pub const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 240 160"><circle cx="92" cy="80" r="64" fill="#312e81" stroke="#09090b" stroke-width="2"/><circle cx="148" cy="80" r="64" fill="#a78bfa" fill-opacity="0.92" stroke="#09090b" stroke-width="2"/><path d="M148 44v72M130 56h26a12 12 0 0 1 0 24h-20a12 12 0 0 0 0 24h28" fill="none" stroke="#09090b" stroke-width="10" stroke-linecap="round" stroke-linejoin="round"/></svg>"##;

// Square, no outline, for window/taskbar icons
pub const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 128 128"><circle cx="64" cy="64" r="60" fill="#a78bfa"/><path d="M64 26v76M46 40h26a12 12 0 0 1 0 24H56a12 12 0 0 0 0 24h28" fill="none" stroke="#1e1b4b" stroke-width="10" stroke-linecap="round" stroke-linejoin="round"/></svg>"##;

/// Rasterize SVG source at `width` pixels wide, keeping its aspect ratio.
/// Returns straight-alpha RGBA pixels, or `None` if the SVG does not parse.
pub fn rasterize_svg(svg: &[u8], width: u32) -> Option<(Vec<u8>, u32, u32)> {
    let tree = resvg::usvg::Tree::from_data(svg, &resvg::usvg::Options::default()).ok()?;
    let svg_size = tree.size();
    let scale = width as f32 / svg_size.width();
    let height = (svg_size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width.max(1), height)?;
    resvg::render(
        &tree,
        resvg::usvg::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Some((premul_to_straight(&pixmap), width.max(1), height))
}

pub fn rasterize_logo(width: u32) -> Option<(Vec<u8>, u32, u32)> {
    rasterize_svg(LOGO_SVG.as_bytes(), width)
}

pub fn rasterize_icon(size: u32) -> Option<(Vec<u8>, u32, u32)> {
    rasterize_svg(ICON_SVG.as_bytes(), size)
}

fn premul_to_straight(pixmap: &resvg::tiny_skia::Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let a = p.alpha();
            if a == 0 {
                [0, 0, 0, 0]
            } else {
                let r = (p.red() as u16 * 255 / a as u16) as u8;
                let g = (p.green() as u16 * 255 / a as u16) as u8;
                let b = (p.blue() as u16 * 255 / a as u16) as u8;
                [r, g, b, a]
            }
        })
        .collect()
}

/// Per-user data directory (settings, logs)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Cache directory for downloaded logos
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

// ============================================================================
// NUMBER / DATE FORMATTING
// ============================================================================

/// Insert thousands separators into a plain decimal string like "1234567.5".
fn group_thousands(plain: &str) -> String {
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format with at most `max_decimals`, dropping trailing zeros down to
/// `min_decimals`.
fn format_decimal(value: f64, min_decimals: usize, max_decimals: usize) -> String {
    let mut s = format!("{:.*}", max_decimals, value);
    if let Some(dot) = s.find('.') {
        let keep = dot + 1 + min_decimals;
        while s.len() > keep && s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    group_thousands(&s)
}

/// Card and detail price: more decimals for sub-dollar tokens
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p > 0.0 && p < 0.01 => format!("${:.8}", p),
        Some(p) if p > 0.0 && p < 1.0 => format!("${:.6}", p),
        Some(p) if p > 0.0 => format!("${}", format_decimal(p, 2, 2)),
        _ => "N/A".to_string(),
    }
}

/// Table price: currency with 2 to 8 decimals
pub fn format_usd(price: Option<f64>) -> String {
    match price {
        Some(p) if p != 0.0 => format!("${}", format_decimal(p, 2, 8)),
        _ => "-".to_string(),
    }
}

/// Abbreviated supply ("21.00M") with `decimals` after the point
pub fn format_supply(supply: Option<f64>, decimals: usize) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    let Some(s) = supply.filter(|s| *s != 0.0) else {
        return "N/A".to_string();
    };
    for (unit, suffix) in UNITS {
        if s >= unit {
            return format!("{:.*}{}", decimals, s / unit, suffix);
        }
    }
    format_decimal(s, 0, 3)
}

/// Full number with separators, "-" when absent
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => format_decimal(v, 0, 3),
        _ => "-".to_string(),
    }
}

/// Large currency totals, abbreviated ("$1.25B")
pub fn format_market_cap(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format!("${}", format_supply(Some(v), 2)),
        _ => "N/A".to_string(),
    }
}

/// "March 1, 2024, 10:00 AM"
pub fn format_date_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%B %-d, %Y, %I:%M %p").to_string()
}

/// "3/1/2024"
pub fn format_short_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%-m/%-d/%Y").to_string()
}
