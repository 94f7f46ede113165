use std::path::Path;

/// How a source file is read, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited(u8),
    Spreadsheet,
}

impl SourceFormat {
    ///  - `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` → spreadsheet (first sheet)
    ///  - `.tsv` / `.tab` → tab-delimited
    ///  - anything else → comma-delimited
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => SourceFormat::Spreadsheet,
            "tsv" | "tab" => SourceFormat::Delimited(b'\t'),
            _ => SourceFormat::Delimited(b','),
        }
    }
}

/// Trim surrounding whitespace. CSV quoting is already undone by the reader,
/// so quote characters left in a cell are data and stay.
pub fn clean_str(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("data/raw/unified.XLSX")),
            SourceFormat::Spreadsheet
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("codes.tsv")),
            SourceFormat::Delimited(b'\t')
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("no_extension")),
            SourceFormat::Delimited(b',')
        );
    }

    #[test]
    fn clean_str_trims_but_keeps_quotes() {
        assert_eq!(clean_str("  Telebirr launch "), "Telebirr launch");
        assert_eq!(clean_str(" \"Digital ID\" "), "\"Digital ID\"");
        assert_eq!(clean_str("\""), "\"");
    }
}
