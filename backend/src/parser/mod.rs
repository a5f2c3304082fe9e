//! Text source reader with encoding and delimiter auto-detection.
//!
//! Turns delimited text into [`RawRow`]s. Cells come out as `Text` or `Empty`
//! only: a CSV cell has no type, and guessing one here would eat the leading
//! zeros of barcodes. Upstream readers that do know cell types can hand their
//! rows over as JSON instead (see [`rows_from_json`]).

use serde_json::Value;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{raw_row_from_json, CellValue, RawRow};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Data rows, header → cell
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, blank and repeated ones dropped
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is taken as is; anything else goes through chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => chardet::charset2encoding(&charset).to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Latin-1 is decoded as Windows-1252, its superset. Bytes labelled UTF-8
/// that fail to decode fall back to Windows-1252 too, which is what legacy
/// spreadsheet exports almost always are.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => std::str::from_utf8(bytes).map(str::to_string).map_err(|_| {
                CsvError::EncodingError(format!("unsupported encoding '{}'", encoding))
            })?,
        },
    };

    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Detect the delimiter by counting occurrences in the first non-blank line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
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

/// Display name of a delimiter for logs.
pub fn delimiter_name(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_str(&content, delimiter, encoding)
}

/// Parse CSV text with an explicit delimiter.
///
/// The first non-blank line holds the headers. Short rows are padded with
/// empty cells, extra cells are dropped, and blank or repeated headers are
/// skipped (first occurrence wins).
///
/// Blank lines come back as empty rows so that a row's index plus 2 is its
/// line in the file.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<ParseResult> {
    let delimiter_byte = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 0,
        message: format!("unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let raw_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut headers: Vec<String> = Vec::with_capacity(raw_headers.len());
    for header in &raw_headers {
        if !header.is_empty() && !headers.contains(header) {
            headers.push(header.clone());
        }
    }
    if headers.is_empty() {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if let Some(line) = record.position().map(|p| p.line()) {
            for _ in (rows.len() as u64 + 2)..line {
                rows.push(RawRow::new());
            }
        }

        let mut row = RawRow::with_capacity(headers.len());

        for (i, header) in raw_headers.iter().enumerate() {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            let value = record.get(i).unwrap_or("");
            let cell = if value.is_empty() {
                CellValue::Empty
            } else {
                CellValue::text(value)
            };
            row.insert(header.clone(), cell);
        }

        rows.push(row);
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Convert a JSON array of row objects into [`RawRow`]s.
///
/// Numbers stay numbers, so day-serials from an upstream spreadsheet reader
/// reach the date coercer intact.
pub fn rows_from_json(value: &Value) -> CsvResult<Vec<RawRow>> {
    let items = value
        .as_array()
        .ok_or_else(|| CsvError::JsonRows("expected an array of row objects".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if item.is_object() {
                Ok(raw_row_from_json(item))
            } else {
                Err(CsvError::JsonRows(format!("row {} is not an object", i + 1)))
            }
        })
        .collect()
}

/// Parse a JSON document holding an array of row objects.
pub fn rows_from_json_str(json: &str) -> CsvResult<Vec<RawRow>> {
    let value: Value = serde_json::from_str(json).map_err(|e| CsvError::JsonRows(e.to_string()))?;
    rows_from_json(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(csv: &str, delimiter: char) -> ParseResult {
        parse_str(csv, delimiter, "utf-8".to_string()).unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let result = parse("Produto;Validade\nLeite;31/12/2025\nArroz;2026-01-10", ';');

        assert_eq!(result.headers, vec!["Produto", "Validade"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["Produto"], CellValue::text("Leite"));
        assert_eq!(result.rows[1]["Validade"], CellValue::text("2026-01-10"));
    }

    #[test]
    fn test_header_order_preserved() {
        let result = parse("Validade,Produto,Qtd\n31/12/2025,Leite,2", ',');
        let keys: Vec<&String> = result.rows[0].keys().collect();
        assert_eq!(keys, vec!["Validade", "Produto", "Qtd"]);
    }

    #[test]
    fn test_quoted_values() {
        let result = parse("Produto,Local\n\"Leite, integral\",\"Geladeira\"", ',');
        assert_eq!(result.rows[0]["Produto"], CellValue::text("Leite, integral"));
        assert_eq!(result.rows[0]["Local"], CellValue::text("Geladeira"));
    }

    #[test]
    fn test_cells_stay_text() {
        let result = parse("Produto;EAN;Qtd\nLeite;0789123;3", ';');
        assert_eq!(result.rows[0]["EAN"], CellValue::text("0789123"));
        assert_eq!(result.rows[0]["Qtd"], CellValue::text("3"));
    }

    #[test]
    fn test_missing_and_extra_values() {
        let result = parse("a;b;c\n1;;\n1;2;3;4", ';');

        assert_eq!(result.rows[0]["a"], CellValue::text("1"));
        assert_eq!(result.rows[0]["b"], CellValue::Empty);
        assert_eq!(result.rows[0]["c"], CellValue::Empty);
        assert_eq!(result.rows[1].len(), 3);
    }

    #[test]
    fn test_short_row_is_padded() {
        let result = parse("a;b;c\n1", ';');
        assert_eq!(result.rows[0]["c"], CellValue::Empty);
    }

    #[test]
    fn test_blank_and_repeated_headers_skipped() {
        let result = parse("Produto;;Produto;Validade\nLeite;x;Outro;31/12/2025", ';');

        assert_eq!(result.headers, vec!["Produto", "Validade"]);
        assert_eq!(result.rows[0]["Produto"], CellValue::text("Leite"));
        assert_eq!(result.rows[0].len(), 2);
    }

    #[test]
    fn test_separator_only_rows_are_kept() {
        let result = parse("Produto;Validade\nLeite;31/12/2025\n;;\n", ';');
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows[1].values().all(CellValue::is_blank));
    }

    #[test]
    fn test_blank_lines_keep_line_numbers() {
        let result = parse("Produto;Validade\nLeite;31/12/2025\n\n\nPao;abc\n", ';');

        assert_eq!(result.rows.len(), 4);
        assert!(result.rows[1].is_empty());
        assert!(result.rows[2].is_empty());
        assert_eq!(result.rows[3]["Produto"], CellValue::text("Pao"));
    }

    #[test]
    fn test_no_headers() {
        let result = parse_str(";;\n1;2;3", ';', "utf-8".to_string());
        assert!(matches!(result, Err(CsvError::NoHeaders)));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b" \n\n "), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_detect_delimiter_skips_blank_lines() {
        assert_eq!(detect_delimiter("\n\na,b\n1,2"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto("Produto,Validade\nLeite,31/12/2025".as_bytes()).unwrap();

        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.delimiter, ',');
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let bytes = "\u{feff}Produto;Validade\nLeite;31/12/2025".as_bytes();
        let result = parse_bytes_auto(bytes).unwrap();
        assert_eq!(result.headers[0], "Produto");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Pão" in ISO-8859-1
        let bytes: &[u8] = &[0x50, 0xE3, 0x6F];
        assert_eq!(decode_content(bytes, "iso-8859-1").unwrap(), "Pão");
    }

    #[test]
    fn test_invalid_utf8_falls_back() {
        let bytes: &[u8] = &[0x50, 0xE3, 0x6F];
        assert_eq!(decode_content(bytes, "utf-8").unwrap(), "Pão");
    }

    #[test]
    fn test_latin1_file_parses() {
        let mut bytes = b"Produto;Validade\nP".to_vec();
        bytes.push(0xE3);
        bytes.extend_from_slice(b"o de forma;31/12/2025\n");

        let result = parse_bytes_auto(&bytes).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["Validade"], CellValue::text("31/12/2025"));
    }

    #[test]
    fn test_parse_file_auto() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Nome;Vencimento;Qtd\nDipirona;10/05/2026;2\n").unwrap();

        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.headers, vec!["Nome", "Vencimento", "Qtd"]);
        assert_eq!(result.rows[0]["Qtd"], CellValue::text("2"));
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_file_auto("/nonexistent/estoque.csv");
        assert!(matches!(result, Err(CsvError::IoError(_))));
    }

    #[test]
    fn test_rows_from_json() {
        let rows = rows_from_json(&json!([
            {"Produto": "Leite", "Validade": 46022, "Qtd": null},
            {"Produto": "Arroz", "Validade": "2026-01-10"}
        ]))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Validade"], CellValue::Number(46022.0));
        assert_eq!(rows[0]["Qtd"], CellValue::Empty);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["Produto", "Validade", "Qtd"]);
    }

    #[test]
    fn test_rows_from_json_rejects_non_objects() {
        assert!(matches!(rows_from_json(&json!({"a": 1})), Err(CsvError::JsonRows(_))));
        assert!(matches!(rows_from_json(&json!([1, 2])), Err(CsvError::JsonRows(_))));
        assert!(matches!(rows_from_json_str("not json"), Err(CsvError::JsonRows(_))));
    }
}
