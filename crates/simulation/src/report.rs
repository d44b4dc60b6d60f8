//! Plain text tables

use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct Table {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }
        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        writeln!(f, "== {} ==", self.title)?;

        let line = |cells: &[String], f: &mut fmt::Formatter<'_>| -> fmt::Result {
            for (cell, width) in cells.iter().zip(&widths) {
                write!(f, "{cell:>width$}  ")?;
            }
            writeln!(f)
        };

        line(&self.headers, f)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        line(&rule, f)?;
        for row in &self.rows {
            line(row, f)?;
        }
        Ok(())
    }
}

/// Format a WAD-scaled price as a decimal with four places
pub fn wad(value: u128) -> String {
    let scale = bootstrap_core::PRICE_SCALE;
    format!("{}.{:04}", value / scale, (value % scale) / (scale / 10_000))
}

/// Format basis points as a percentage
pub fn pct(bps: u128) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_columns() {
        let mut table = Table::new("demo", &["a", "long"]);
        table.row(vec!["12345".to_string(), "1".to_string()]);
        let text = table.to_string();

        assert!(text.starts_with("== demo =="));
        assert!(text.contains("    a  long"));
        assert!(text.contains("12345     1"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(wad(bootstrap_core::PRICE_SCALE / 4), "0.2500");
        assert_eq!(pct(1_234), "12.34%");
        assert_eq!(pct(5), "0.05%");
    }
}
