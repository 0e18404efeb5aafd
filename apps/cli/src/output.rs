//! # Command Output
//!
//! Every command returns an [`Output`] holding both renderings of its
//! result. `main` picks one based on `--json`.

use serde::Serialize;

use crate::error::{CliError, CliResult};

/// A command result, ready to print.
#[derive(Debug, Clone)]
pub struct Output {
    json: serde_json::Value,
    text: String,
}

impl Output {
    /// Captures `value` for JSON output alongside its human-readable text.
    pub fn new<T: Serialize>(value: &T, text: impl Into<String>) -> CliResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| CliError::internal(format!("Failed to serialize output: {e}")))?;

        Ok(Output {
            json,
            text: text.into(),
        })
    }

    /// Pretty JSON when `json` is set, plain text otherwise.
    pub fn render(&self, json: bool) -> String {
        if json {
            serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| self.json.to_string())
        } else {
            self.text.clone()
        }
    }
}

/// Left-aligned columns sized to their widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = vec![pad_row(headers, &widths)];
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(pad_row(&cells, &widths));
    }
    out.join("\n")
}

fn pad_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_switches_on_json_flag() {
        let output = Output::new(&serde_json::json!({ "id": "o-1" }), "Order o-1").unwrap();
        assert_eq!(output.render(false), "Order o-1");
        assert!(output.render(true).contains("\"id\": \"o-1\""));
    }

    #[test]
    fn test_table_aligns_columns() {
        let rendered = table(
            &["ID", "NAME"],
            &[
                vec!["1".to_string(), "Pen".to_string()],
                vec!["22".to_string(), "Notebook".to_string()],
            ],
        );
        assert_eq!(rendered, "ID  NAME\n1   Pen\n22  Notebook");
    }
}
