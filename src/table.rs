//! Plain-text tables for previews and profile summaries.

use std::{borrow::Cow, fmt::Write as _};

const GUTTER: &str = "  ";
const MIN_RULE_WIDTH: usize = 3;

/// Render `rows` under `headers`, every column padded to its widest cell.
/// Cells beyond the header count are dropped; missing cells render blank.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(MIN_RULE_WIDTH)))
        .collect::<Vec<_>>();
    let rule_widths = widths
        .iter()
        .map(|w| (*w).max(MIN_RULE_WIDTH))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let _ = writeln!(output, "{}", format_row(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(idx, &width)| {
            let cell = cells.get(idx).map(|c| flatten(c)).unwrap_or_default();
            let padding = width.saturating_sub(cell_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(GUTTER);
    line.trim_end().to_string()
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}

/// Line breaks and tabs would wreck the alignment; show them as spaces.
fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn pads_columns_to_widest_cell() {
        let rendered = render_table(
            &strings(&["id", "name"]),
            &[strings(&["1", "Ada Lovelace"]), strings(&["22"])],
        );
        assert_eq!(
            rendered,
            "id  name\n---  ------------\n1   Ada Lovelace\n22\n"
        );
    }

    #[test]
    fn embedded_newlines_are_flattened() {
        let rendered = render_table(&strings(&["v"]), &[strings(&["a\nb"])]);
        assert!(rendered.ends_with("a b\n"));
    }
}
