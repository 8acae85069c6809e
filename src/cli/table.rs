//! Table formatting for CLI list commands
//!
//! Each list command fills a [`Table`] with display rows and hands it to
//! [`print_list`] together with the raw records; structured formats
//! (JSON/YAML) serialize the records, tabular formats render the rows.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

/// Display rows for a list of records
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
    ids: Vec<String>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
            ids: Vec::new(),
        }
    }

    /// Add a row; `id` is what `--format id` prints for it
    pub fn row(&mut self, id: impl Into<String>, cells: Vec<String>) {
        self.ids.push(id.into());
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Aligned columns for the terminal
    pub fn render_columns(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| style(format!("{:<w$}", h.to_uppercase(), w = w)).bold().to_string())
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');

        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<w$}", cell, w = w))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        out
    }

    pub fn render_csv(&self) -> std::result::Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.headers.iter().map(|h| h.to_lowercase().replace(' ', "_")))?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn render_markdown(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().copied());
        for row in &self.rows {
            builder.push_record(row);
        }
        builder.build().with(Style::markdown()).to_string()
    }
}

/// Print records in the requested format.
///
/// `noun` names the record kind in the summary line ("risk" → "3 risk(s) found").
pub fn print_list<T: Serialize>(
    records: &[T],
    table: &Table,
    format: OutputFormat,
    noun: &str,
    quiet: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(records).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            if records.is_empty() {
                println!("[]");
            } else {
                let yaml = serde_yml::to_string(records).into_diagnostic()?;
                print!("{}", yaml);
            }
        }
        OutputFormat::Id => {
            for id in &table.ids {
                println!("{}", id);
            }
        }
        OutputFormat::Csv => {
            print!("{}", table.render_csv().into_diagnostic()?);
        }
        OutputFormat::Md => {
            println!("{}", table.render_markdown());
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            if table.is_empty() {
                if !quiet {
                    println!("No {}s found.", noun);
                }
                return Ok(());
            }
            print!("{}", table.render_columns());
            if !quiet {
                println!();
                println!("{} {}(s) found.", style(table.len()).cyan(), noun);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(&["ID", "Name", "Risk level"]);
        table.row("EMP001", vec!["EMP001".into(), "Matriz, Lucas".into(), "High".into()]);
        table.row("EMP002", vec!["EMP002".into(), "Sinop".into(), "Low".into()]);
        table
    }

    #[test]
    fn test_csv_quotes_and_header_names() {
        let csv = sample().render_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("id,name,risk_level"));
        assert_eq!(lines.next(), Some("EMP001,\"Matriz, Lucas\",High"));
    }

    #[test]
    fn test_markdown_has_separator_row() {
        let md = sample().render_markdown();
        assert!(md.lines().next().unwrap().starts_with("| ID"));
        assert!(md.lines().nth(1).unwrap().starts_with("|--"));
        assert!(md.contains("Sinop"));
    }

    #[test]
    fn test_columns_are_aligned() {
        let out = sample().render_columns();
        let rows: Vec<&str> = out.lines().skip(2).collect();
        assert_eq!(rows.len(), 2);
        let name_col = rows[0].find("Matriz").unwrap();
        assert_eq!(rows[1].find("Sinop").unwrap(), name_col);
    }
}
