//! Pure formatting for one line of the status block.

/// Columns reserved beyond the name: the `"> "` separator, room for the
/// ellipsis and one spare column so a full line never wraps.
pub const DECORATION_WIDTH: usize = 6;

/// Prefix marking a line whose beginning was cut off.
pub const ELLIPSIS: &str = "...";

/// How many characters of a stream's last line fit beside a name column of
/// `name_width` in a terminal `terminal_width` columns wide.
pub fn max_content_width(terminal_width: usize, name_width: usize) -> usize {
    terminal_width.saturating_sub(name_width + DECORATION_WIDTH)
}

/// Right-aligns `name` in `width` columns. Names that are too long (added after
/// the width was frozen) keep their first `width` characters.
pub fn fit_name(name: &str, width: usize) -> String {
    let truncated: String = name.chars().take(width).collect();
    format!("{truncated:>width$}")
}

/// Keeps the trailing `max_width` characters of an over-long line behind an
/// [ELLIPSIS]. A cut line is therefore always `max_width + 3` characters.
pub fn ellipsize(line: &str, max_width: usize) -> String {
    let len = line.chars().count();
    if len <= max_width {
        return line.to_string();
    }
    let tail: String = line.chars().skip(len - max_width).collect();
    format!("{ELLIPSIS}{tail}")
}

/// One row of the block: `<name>> <line>\n`.
pub fn format_line(name: &str, line: &str, name_width: usize, max_width: usize) -> String {
    format!("{}> {}\n", fit_name(name, name_width), ellipsize(line, max_width))
}

/// Width of the name column: the longest name, measured in characters.
pub fn name_column_width<'a>(names: impl IntoIterator<Item = &'a str>) -> usize {
    names
        .into_iter()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
}
