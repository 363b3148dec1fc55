use client_core::{CategoryColumn, TablePage};
use shared::domain::CategoryId;

/// Lays out one table page as aligned text, with a selection marker column
/// and a pagination footer.
pub fn render_page(page: &TablePage, selected: &[CategoryId]) -> String {
    let mut header = vec![" ".to_string(), "#".to_string()];
    header.extend(page.columns.iter().map(|column| column.header().to_string()));

    let mut lines = vec![header];
    for row in &page.rows {
        let marker = if selected.contains(&row.id) { "x" } else { " " };
        let mut line = vec![marker.to_string(), row.id.to_string()];
        line.extend(page.columns.iter().map(|column| truncate(column, column.display(row))));
        lines.push(line);
    }

    let widths = (0..lines[0].len())
        .map(|index| {
            lines
                .iter()
                .map(|line| line[index].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    let mut out = String::new();
    for (position, line) in lines.iter().enumerate() {
        let cells = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
        if position == 0 {
            let rule = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>();
            out.push_str(&rule.join("  "));
            out.push('\n');
        }
    }

    if page.rows.is_empty() {
        out.push_str("No categories.\n");
    }
    out.push_str(&format!(
        "{} of {} row(s) selected. Page {} of {} ({} per page)\n",
        page.selected_rows,
        page.filtered_rows,
        page.page_index + 1,
        page.page_count,
        page.page_size
    ));
    out
}

fn truncate(column: &CategoryColumn, value: String) -> String {
    let limit = match column {
        CategoryColumn::Description => 40,
        CategoryColumn::Household => 24,
        _ => return value,
    };
    if value.chars().count() <= limit {
        return value;
    }
    let mut shortened = value.chars().take(limit - 1).collect::<String>();
    shortened.push('…');
    shortened
}
