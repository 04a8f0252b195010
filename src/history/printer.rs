use super::model::{HistoryEntry, Outcome};
use super::storage::get_storage;
use crate::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

pub fn list_history(limit: usize) -> Result<()> {
    let entries = get_storage().tail(limit)?;
    if entries.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    println!("{}", history_table(&entries));
    Ok(())
}

/// 最新的在前
pub fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ID", "Time", "Method", "URL", "Hops", "Status", "Outcome", "Duration",
    ]);

    for entry in entries.iter().rev() {
        let status = match entry.final_status {
            Some(code) => Cell::new(code).fg(status_color(code)),
            None => Cell::new("-").add_attribute(Attribute::Dim),
        };
        let outcome = match &entry.outcome {
            Outcome::End => Cell::new("end").fg(Color::Green),
            Outcome::Error(message) => Cell::new(message).fg(Color::Red),
        };

        table.add_row(vec![
            Cell::new(entry.short_id()),
            Cell::new(entry.timestamp.format("%H:%M:%S")),
            Cell::new(&entry.method),
            Cell::new(&entry.url).add_attribute(Attribute::Dim),
            Cell::new(entry.hops.len()),
            status,
            outcome,
            Cell::new(format!("{}ms", entry.duration_ms)),
        ]);
    }

    table
}

fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Yellow,
        _ => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::model::HopRecord;

    fn entry(id: &str, status: Option<u16>, outcome: Outcome) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            timestamp: chrono::Utc::now(),
            duration_ms: 42,
            method: "GET".to_string(),
            url: "http://localhost/hello".to_string(),
            hops: vec![HopRecord {
                request: "GET /hello HTTP/1.1\r\n".to_string(),
                response: None,
            }],
            outcome,
            final_status: status,
        }
    }

    #[test]
    fn test_table_lists_newest_first() {
        let entries = vec![
            entry("aaaaaaaa-1", Some(200), Outcome::End),
            entry("bbbbbbbb-2", None, Outcome::Error("Redirect limit of 1 exceeded".to_string())),
        ];
        let rendered = history_table(&entries).to_string();

        let newest = rendered.find("bbbbbbbb").unwrap();
        let oldest = rendered.find("aaaaaaaa").unwrap();
        assert!(newest < oldest);
        assert!(rendered.contains("Redirect limit of 1 exceeded"));
        assert!(rendered.contains("42ms"));
    }
}
