//! Delimited-text input: decoding, parsing, and missing-value detection.

use crate::error::ReconError;
use crate::model::RawTable;

/// Cell values read as "no value", in addition to the empty string.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True when a cell carries no value. Whitespace-only cells are values.
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

/// Decode file bytes to text. Tries UTF-8 first and falls back to
/// Windows-1252, which is what spreadsheet exports usually are.
pub fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse CSV text with a header row into a [`RawTable`].
///
/// Rows may be ragged: short rows are padded with empty cells and cells past
/// the header width are dropped.
pub fn parse_csv(source: &str, text: &str) -> Result<RawTable, ReconError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let csv_err = |e: csv::Error| ReconError::Csv {
        source: source.to_string(),
        message: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let width = headers.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let mut row: Vec<String> = record.iter().take(width).map(|c| c.to_string()).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    log::debug!("{source}: parsed {} row(s), {} column(s)", rows.len(), width);
    Ok(RawTable { headers, rows })
}
