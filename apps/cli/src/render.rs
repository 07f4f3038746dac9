//! Plain-text views of the list and of the active form.

use client_core::SessionMode;
use shared::domain::{UserDraft, UserRecord};

const HEADERS: [&str; 5] = ["ID", "NAME", "EMAIL", "GENDER", "STATUS"];

pub fn table(records: &[&UserRecord]) -> String {
    if records.is_empty() {
        return "(no users)\n".to_string();
    }

    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                r.name.clone(),
                r.email.clone(),
                r.gender.to_string(),
                r.status.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn draft(mode: SessionMode, draft: &UserDraft, last_error: Option<&str>) -> String {
    let title = match mode {
        SessionMode::Idle => return "no active session\n".to_string(),
        SessionMode::Editing(id) => format!("Edit user {id}"),
        SessionMode::Creating => "Create user".to_string(),
    };

    let mut out = format!(
        "{title}\n  name:   {}\n  email:  {}\n  gender: {}\n  status: {}\n",
        draft.name, draft.email, draft.gender, draft.status
    );
    if let Some(err) = last_error {
        out.push_str(&format!("  last error: {err}\n"));
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
