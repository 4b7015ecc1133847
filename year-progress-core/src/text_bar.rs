/// Glyph used for the elapsed part of the bar.
pub const FILLED_GLYPH: char = '▓';
/// Glyph used for the remaining part of the bar.
pub const EMPTY_GLYPH: char = '░';
/// Bar length, in glyphs, of the posted text.
pub const DEFAULT_BAR_LENGTH: usize = 20;

/// Percentage with two decimals and a trailing `%`, e.g. `45.23%`.
pub fn format_percentage(progress: f64) -> String {
    format!("{progress:.2}%")
}

/// Render `progress` as `bar_length` glyphs followed by the formatted percentage.
///
/// `progress` is not clamped. A value outside `0..=100` yields more filled
/// glyphs than `bar_length`, or none; a negative glyph count renders as zero
/// glyphs of that kind.
pub fn render_text_bar(progress: f64, bar_length: usize) -> String {
    let filled = (bar_length as f64 * progress / 100.0).floor() as i64;
    let empty = bar_length as i64 - filled;

    let mut bar = String::with_capacity((bar_length + 1) * FILLED_GLYPH.len_utf8() + 8);
    bar.extend(std::iter::repeat(FILLED_GLYPH).take(glyph_count(filled)));
    bar.extend(std::iter::repeat(EMPTY_GLYPH).take(glyph_count(empty)));
    bar.push(' ');
    bar.push_str(&format_percentage(progress));
    bar
}

fn glyph_count(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}
