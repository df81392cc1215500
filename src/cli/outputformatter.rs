use terminal_size::{terminal_size, Height, Width};

use crate::models::{AccessGrant, HierarchyLevel, UserLevel};

// Cap so one long church name does not blow out the table.
const MAX_COL_WIDTH: usize = 60;
const FALLBACK_TERM_WIDTH: usize = 80;

/// Render rows as an ASCII table fitted to the terminal. Returns `None` when there are no rows to show.
pub fn render_table(cols: &[&str], rows: &[Vec<String>]) -> Option<String> {
    render_table_within(cols, rows, terminal_width())
}

/// Same as [`render_table`] with an explicit line width.
pub fn render_table_within(cols: &[&str], rows: &[Vec<String>], termw: usize) -> Option<String> {
    if rows.is_empty() || cols.is_empty() { return None; }
    crate::tprintln!("[cli.outputformatter] table width limit={} columns", termw);
    let cap = MAX_COL_WIDTH.min(termw.max(1));

    let mut widths: Vec<usize> = cols.iter().map(|c| display_len(c).min(cap)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(cap); }
        }
    }

    let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
    let sep = build_separator(&widths);
    let mut out = Vec::with_capacity(rows.len() + 5);
    out.push(sep.clone());
    out.push(build_row(&header, &widths));
    out.push(sep.clone());
    for r in rows { out.push(build_row(r, &widths)); }
    out.push(sep);
    out.push(format!("rows: {}", rows.len()));
    Some(out.into_iter().map(|l| truncate(&l, termw)).collect::<Vec<_>>().join("\n"))
}

pub fn levels_table(levels: &[UserLevel]) -> Option<String> {
    let rows: Vec<Vec<String>> = levels.iter().enumerate()
        .map(|(i, l)| vec![
            (i + 1).to_string(),
            l.selection_code().to_string(),
            l.level_code.clone(),
            l.display_name().to_string(),
        ])
        .collect();
    render_table(&["#", "select code", "level", "church level"], &rows)
}

pub fn hierarchy_table(levels: &[&HierarchyLevel]) -> Option<String> {
    let rows: Vec<Vec<String>> = levels.iter()
        .map(|l| vec![
            l.level_code.clone(),
            l.level_no.map(|n| n.to_string()).unwrap_or_default(),
            l.church_level_code.clone().unwrap_or_default(),
            l.display_name().to_string(),
        ])
        .collect();
    render_table(&["level", "no", "code", "church level"], &rows)
}

pub fn access_table(grants: &[AccessGrant]) -> Option<String> {
    let cell = |v: &Option<String>| v.clone().unwrap_or_default();
    let rows: Vec<Vec<String>> = grants.iter()
        .map(|g| vec![
            cell(&g.usercode),
            cell(&g.level_code),
            cell(&g.church_level),
            cell(&g.role_code),
            cell(&g.module_code),
            cell(&g.access_type),
        ])
        .collect();
    render_table(&["user", "level", "church level", "role", "module", "access"], &rows)
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_))) if w > 4 => (w - 4) as usize,
        _ => FALLBACK_TERM_WIDTH,
    }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        let pad = " ".repeat(w.saturating_sub(display_len(&text)));
        s.push(' ');
        if is_numeric_like(&cell) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if display_len(s) <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().all(|c| c.is_ascii_digit())
}
