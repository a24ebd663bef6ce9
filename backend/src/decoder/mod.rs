//! Byte-level decoding of uploaded files into text rows.
//!
//! Submissions arrive as untrusted byte buffers in whatever encoding the
//! authoring spreadsheet tool produced. Decoding tries a fixed
//! priority-ordered candidate list and keeps the first encoding that decodes
//! every byte without a replacement character; the winning label is carried
//! into the import report. No statistical charset detection.

use csv::ReaderBuilder;
use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};

use crate::error::{DecodeError, DecodeResult};

/// Candidate encodings, in trial order. UTF-8 first (with BOM removal),
/// then the Latin-1 family, then the Windows Western code page.
const CANDIDATES: [(&str, &Encoding); 3] = [
    ("utf-8", UTF_8),
    ("iso-8859-15", ISO_8859_15),
    ("windows-1252", WINDOWS_1252),
];

/// A decoded submission: ordered rows of string cells plus decode metadata.
///
/// Immutable once produced; the rest of the pipeline only reads it.
#[derive(Debug, Clone)]
pub struct DecodedTable {
    /// Header cells, trimmed.
    pub header: Vec<String>,
    /// Data rows in file order, cells untrimmed.
    pub rows: Vec<Vec<String>>,
    /// Label of the encoding that decoded the bytes.
    pub encoding: &'static str,
    /// Delimiter used to split cells.
    pub delimiter: char,
}

/// Decode raw bytes with the fixed candidate list.
///
/// Returns the decoded text and the label of the winning encoding.
pub fn decode_bytes(bytes: &[u8]) -> DecodeResult<(String, &'static str)> {
    for (label, encoding) in CANDIDATES {
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        if !had_errors {
            return Ok((text.into_owned(), label));
        }
    }

    Err(DecodeError::UnsupportedEncoding {
        attempted: CANDIDATES.iter().map(|(label, _)| label.to_string()).collect(),
    })
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Comma wins ties, matching the canonical export format.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Decode raw bytes into a [`DecodedTable`].
///
/// `delimiter` overrides auto-detection when given.
pub fn decode_table(bytes: &[u8], delimiter: Option<char>) -> DecodeResult<DecodedTable> {
    let (text, encoding) = decode_bytes(bytes)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&text));

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        match header {
            None => header = Some(cells.iter().map(|c| c.trim().to_string()).collect()),
            Some(_) => rows.push(cells),
        }
    }

    let header = header.ok_or(DecodeError::EmptyFile)?;

    Ok(DecodedTable {
        header,
        rows,
        encoding,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_plain() {
        let (text, label) = decode_bytes("SKU,Name\nA,B".as_bytes()).unwrap();
        assert_eq!(label, "utf-8");
        assert!(text.starts_with("SKU"));
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"SKU,Name\n");
        let (text, label) = decode_bytes(&bytes).unwrap();
        assert_eq!(label, "utf-8");
        assert!(text.starts_with("SKU"));
    }

    #[test]
    fn test_latin_fallback() {
        // "Café" with 0xE9 is invalid UTF-8, valid in the Latin-1 family.
        let bytes: &[u8] = &[b'C', b'a', b'f', 0xE9];
        let (text, label) = decode_bytes(bytes).unwrap();
        assert_eq!(label, "iso-8859-15");
        assert!(text.starts_with("Caf"));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        // No delimiter at all: comma default
        assert_eq!(detect_delimiter("justoneword"), ',');
    }

    #[test]
    fn test_decode_table() {
        let table = decode_table(b"SKU,Name\nA-1,Widget\nA-2,Gadget", None).unwrap();
        assert_eq!(table.header, vec!["SKU", "Name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["A-1", "Widget"]);
        assert_eq!(table.encoding, "utf-8");
        assert_eq!(table.delimiter, ',');
    }

    #[test]
    fn test_decode_table_quoted_cells() {
        let table = decode_table(b"SKU,Name\n\"A-1\",\"Widget, large\"", None).unwrap();
        assert_eq!(table.rows[0][1], "Widget, large");
    }

    #[test]
    fn test_decode_table_header_trimmed() {
        let table = decode_table(b" SKU , Name \nA-1,Widget", None).unwrap();
        assert_eq!(table.header, vec!["SKU", "Name"]);
    }

    #[test]
    fn test_empty_file() {
        let result = decode_table(b"", None);
        assert!(matches!(result, Err(DecodeError::EmptyFile)));
    }

    #[test]
    fn test_explicit_delimiter_override() {
        let table = decode_table(b"SKU;Name\nA-1;Widget", Some(';')).unwrap();
        assert_eq!(table.rows[0], vec!["A-1", "Widget"]);
    }
}
