//! Color handling for the terminal timeline.

use ratatui::style::Color;

/// Bar color for synthetic group rows.
pub const GROUP_BAR: Color = Color::Rgb(90, 90, 110);
/// Fallback bar color when a hex string fails to parse.
pub const DEFAULT_BAR: Color = Color::Rgb(149, 165, 166);
/// Progress fill drawn over the base bar.
pub const PROGRESS_FILL: Color = Color::Rgb(236, 240, 241);
/// Today marker in the timeline header and grid.
pub const TODAY_MARK: Color = Color::Rgb(231, 76, 60);

/// Parse "#rrggbb" into a terminal color.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Bar color for a row, falling back to a neutral gray.
pub fn bar_color(hex: &str) -> Color {
    parse_hex(hex).unwrap_or(DEFAULT_BAR)
}
