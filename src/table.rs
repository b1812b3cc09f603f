// 📋 Raw Table - untyped rows with provenance
// Shared by both statement layouts before any typing happens

use crate::detect::strip_bom;
use crate::error::{ConvertError, Result};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

/// One physical CSV row, all cells kept as text
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based line in the original file
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn get(&self, column: usize) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Parse `text` as a headed table.
    ///
    /// `line_offset` is the number of physical lines that precede `text` in
    /// the file, so row line numbers still point at the original input.
    pub fn parse(text: &str, delimiter: u8, line_offset: usize) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            // blank lines are skipped by csv itself; rows of empty cells are not
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(0)
                + line_offset;
            rows.push(RawRow {
                line,
                fields: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(RawTable { headers, rows })
    }

    /// Rename columns found under an accepted alias to their canonical name.
    ///
    /// `aliases` is a static `(alias, canonical)` table; a canonical name
    /// already present is never overwritten.
    pub fn resolve_aliases(&mut self, aliases: &[(&str, &str)]) {
        for (alias, canonical) in aliases {
            if self.headers.iter().any(|h| h == canonical) {
                continue;
            }
            if let Some(h) = self.headers.iter_mut().find(|h| h.as_str() == *alias) {
                *h = canonical.to_string();
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Positions of every required column, in the order asked.
    /// Fails listing all missing columns at once.
    pub fn require(&self, required: &[&str]) -> Result<Vec<usize>> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ConvertError::missing_columns(missing, &self.headers));
        }

        Ok(required.iter().filter_map(|name| self.column(name)).collect())
    }
}

/// Read an input file as UTF-8, without a byte-order mark
pub fn read_input(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(strip_bom(&text).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_keeps_line_numbers() {
        let text = "Data,Categoria\n2024-01-01 10:00:00,Depósito\n\n2024-01-02 10:00:00,Saque/Retirada\n";
        let table = RawTable::parse(text, b',', 0).unwrap();

        assert_eq!(table.headers, vec!["Data", "Categoria"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 4);
        assert_eq!(table.rows[1].get(1), "Saque/Retirada");
        assert_eq!(table.rows[1].get(7), "");
    }

    #[test]
    fn test_parse_with_offset_and_semicolon() {
        let text = "Ativo;Operação Tipo\nBTC;TRADING-IN\n";
        let table = RawTable::parse(text, b';', 3).unwrap();

        assert_eq!(table.rows[0].line, 5);
        assert_eq!(table.rows[0].get(0), "BTC");
    }

    #[test]
    fn test_resolve_aliases() {
        let mut table = RawTable::parse("data,categoria,Moeda\n", b',', 0).unwrap();
        table.resolve_aliases(&[("data", "Data"), ("categoria", "Categoria"), ("moeda", "Moeda")]);

        assert_eq!(table.headers, vec!["Data", "Categoria", "Moeda"]);
    }

    #[test]
    fn test_require_lists_all_missing() {
        let table = RawTable::parse("Data,Moeda\n", b',', 0).unwrap();
        let err = table.require(&["Data", "Categoria", "Moeda", "Saldo"]).unwrap_err();

        match err {
            ConvertError::MissingColumns { columns, found } => {
                assert_eq!(columns, vec!["Categoria", "Saldo"]);
                assert_eq!(found, vec!["Data", "Moeda"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_require_returns_positions() {
        let table = RawTable::parse("Saldo,Data,Moeda\n", b',', 0).unwrap();
        assert_eq!(table.require(&["Data", "Moeda", "Saldo"]).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_read_input_strips_bom() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all("\u{feff}Data,Categoria\n".as_bytes()).unwrap();

        let text = read_input(tmp.path()).unwrap();
        assert!(text.starts_with("Data"));
    }
}
