use csv::ReaderBuilder;

use super::SourceError;
use crate::types::RawTable;

/// Read delimited text into a [`RawTable`]. Ragged rows are accepted; the
/// normalizer treats missing trailing cells as absent.
pub fn parse_csv(text: &str) -> Result<RawTable, SourceError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_with_quotes_and_ragged_rows() {
        let text = "Open Time,Symbol,PnL,Reason\n\
                    2024-03-07 10:00,BTCUSDT,12.5,\"TP, trailing\"\n\
                    2024-03-08 21:00,,FRIDAY_CLOSE\n";

        let table = parse_csv(text).unwrap();
        assert_eq!(table.headers, vec!["Open Time", "Symbol", "PnL", "Reason"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][3], "TP, trailing");
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = parse_csv("Open Time,PnL,Running\n").unwrap();
        assert_eq!(table.headers.len(), 3);
        assert!(table.is_empty());
    }

    #[test]
    fn test_blank_input_is_empty_table() {
        let table = parse_csv("").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }
}
