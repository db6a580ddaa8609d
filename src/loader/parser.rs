use serde::de::DeserializeOwned;
use std::fs;

use crate::api::traffic_dto::FlowDto;
use crate::error::{Error, Result};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b' '];

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path).map_err(Error::IoError)?;

    let parsed_data: T = serde_json::from_str(&data).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

/// Reads the traffic matrix CSV at `file_path`.
pub fn parse_traffic_file(file_path: &str) -> Result<Vec<FlowDto>> {
    let data = fs::read_to_string(file_path).map_err(Error::IoError)?;
    parse_traffic_str(&data)
}

/// Parses a traffic matrix with a header row containing at least `src`, `dst`, `tos` and `rate`.
///
/// The delimiter is taken from the header line: the first of `,` `;` tab or space that occurs in it.
/// Additional columns are ignored.
pub fn parse_traffic_str(data: &str) -> Result<Vec<FlowDto>> {
    let header = data.lines().find(|line| !line.trim().is_empty()).unwrap_or_default();
    let delimiter = sniff_delimiter(header)?;

    let mut reader = csv::ReaderBuilder::new().delimiter(delimiter).trim(csv::Trim::All).from_reader(data.as_bytes());

    let mut flows = Vec::new();
    for record in reader.deserialize::<FlowDto>() {
        flows.push(record?);
    }

    log::info!("Traffic matrix parsed: {} flows.", flows.len());
    Ok(flows)
}

fn sniff_delimiter(header: &str) -> Result<u8> {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .find(|delimiter| header.as_bytes().contains(delimiter))
        .ok_or_else(|| Error::ConfigurationError(format!("Cannot detect delimiter of traffic matrix header '{}'", header)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_matrix_with_extra_columns() {
        let data = "src,dst,sport,dport,protocol,tos,rate\nh1,h8,5000,5001,udp,128,4M\nh2,h7,5000,5001,udp,32,1.5M\n";

        let flows = parse_traffic_str(data).unwrap();

        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].src, "h1");
        assert_eq!(flows[0].tos, "128");
        assert_eq!(flows[1].rate, "1.5M");
    }

    #[test]
    fn sniffs_semicolon_delimiter() {
        let flows = parse_traffic_str("src;dst;tos;rate\nh3;h4;64;2M\n").unwrap();

        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].dst, "h4");
    }

    #[test]
    fn rejects_header_without_delimiter() {
        assert!(matches!(parse_traffic_str("src\nh1\n"), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        assert!(matches!(parse_traffic_str("src,dst,tos\nh1,h2,128\n"), Err(Error::CsvError(_))));
    }
}
