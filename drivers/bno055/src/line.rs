// Text line protocol emitted by the BNO055 bridge firmware.
//
// One record per line, single-space separated:
//   Xe <angle_x> deg <angle_y> deg <angle_z> deg <acc_x> m/s2 <acc_y> m/s2 <acc_z>
// The numeric fields sit at the odd token positions.

use imu_traits::{Float, Sample, SAMPLE_WIDTH};
use log::warn;
use thiserror::Error;

/// Marker of a combined orientation + acceleration record.
pub const RECORD_MARKER: &str = "Xe";

const FIELD_UNITS: [&str; SAMPLE_WIDTH - 1] = ["deg", "deg", "deg", "m/s2", "m/s2"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected} numeric fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field {index} is not a number: {token:?}")]
    InvalidNumber { index: usize, token: String },

    /// The bridge prints `nan`/`inf` for readings the sensor could not make.
    #[error("field {index} is not finite: {token:?}")]
    NonFinite { index: usize, token: String },
}

/// Parses one raw line into the six sample values.
///
/// Lines without the record marker are not records at all and yield
/// `Ok(None)`. Marked lines that do not carry six numbers are a `ParseError`.
pub fn parse_line(line: &str) -> Result<Option<[Float; SAMPLE_WIDTH]>, ParseError> {
    if !line.contains(RECORD_MARKER) {
        return Ok(None);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let last = tokens.len().saturating_sub(1);
    let fields: Vec<&str> = tokens
        .iter()
        .copied()
        .enumerate()
        .skip(1)
        .step_by(2)
        .map(|(i, token)| if i == last { strip_artifacts(token) } else { token })
        .collect();

    if fields.len() != SAMPLE_WIDTH {
        return Err(ParseError::FieldCount {
            expected: SAMPLE_WIDTH,
            found: fields.len(),
        });
    }

    let mut values = [0.0; SAMPLE_WIDTH];
    for (index, (slot, token)) in values.iter_mut().zip(&fields).enumerate() {
        let value = token
            .parse::<Float>()
            .map_err(|_| ParseError::InvalidNumber {
                index,
                token: token.to_string(),
            })?;
        if !value.is_finite() {
            return Err(ParseError::NonFinite {
                index,
                token: token.to_string(),
            });
        }
        *slot = value;
    }

    Ok(Some(values))
}

/// Removes line terminators and quoting left over from a stringified byte
/// line, both as real characters and as their escaped text (`\r\n'`).
fn strip_artifacts(token: &str) -> &str {
    let mut current = token;
    loop {
        let trimmed = current.trim_end_matches(['\r', '\n', '\'', '"']);
        let trimmed = trimmed
            .strip_suffix("\\n")
            .or_else(|| trimmed.strip_suffix("\\r"))
            .unwrap_or(trimmed);
        if trimmed.len() == current.len() {
            return trimmed;
        }
        current = trimmed;
    }
}

/// Renders six values in the wire format, the inverse of [`parse_line`].
pub fn format_line(values: &[Float; SAMPLE_WIDTH]) -> String {
    let mut line = String::from(RECORD_MARKER);
    for (i, value) in values.iter().enumerate() {
        line.push(' ');
        line.push_str(&value.to_string());
        if let Some(unit) = FIELD_UNITS.get(i) {
            line.push(' ');
            line.push_str(unit);
        }
    }
    line
}

/// Stateful parser that tags accepted records with a sequence number.
#[derive(Debug, Default)]
pub struct LineParser {
    next_seq: u64,
    rejected: u64,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a line; accepted records consume the next sequence number.
    pub fn parse(&mut self, line: &str) -> Result<Option<Sample>, ParseError> {
        match parse_line(line) {
            Ok(Some(values)) => {
                let sample = Sample::new(self.next_seq, values);
                self.next_seq += 1;
                Ok(Some(sample))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.rejected += 1;
                warn!("Discarding malformed record {:?}: {}", line, e);
                Err(e)
            }
        }
    }

    /// Number of records accepted so far.
    pub fn accepted(&self) -> u64 {
        self.next_seq
    }

    /// Number of marked lines that failed to parse.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_combined_record() {
        let line = "Xe 12.5 deg -3.25 deg 359.0 deg 0.01 m/s2 -0.02 m/s2 9.81";
        let values = parse_line(line).unwrap().unwrap();
        assert_eq!(values, [12.5, -3.25, 359.0, 0.01, -0.02, 9.81]);
    }

    #[test]
    fn unmarked_lines_are_skipped() {
        assert_eq!(parse_line("Calibration: sys=3 gyro=3"), Ok(None));
        assert_eq!(parse_line(""), Ok(None));
    }

    #[test]
    fn acceleration_only_records_are_not_accepted() {
        assert_eq!(parse_line("Xa 0.1 m/s2 0.2 m/s2 9.8"), Ok(None));
    }

    #[test]
    fn strips_terminators_and_quotes_from_last_field() {
        let escaped = "b'Xe 1 deg 2 deg 3 deg 4 m/s2 5 m/s2 6\\r\\n'";
        assert_eq!(
            parse_line(escaped).unwrap(),
            Some([1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );

        let raw = "Xe 1 deg 2 deg 3 deg 4 m/s2 5 m/s2 6\r\n";
        assert_eq!(
            parse_line(raw).unwrap(),
            Some([1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
    }

    #[test]
    fn wrong_field_count_is_an_error() {
        let err = parse_line("Xe 1 deg 2 deg 3").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCount {
                expected: 6,
                found: 3
            }
        );
    }

    #[test]
    fn non_numeric_field_is_an_error() {
        let err = parse_line("Xe 1 deg 2 deg abc deg 4 m/s2 5 m/s2 6").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                index: 2,
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn invalid_readings_are_an_error() {
        let err = parse_line("Xe nan deg 2 deg 3 deg 4 m/s2 5 m/s2 6").unwrap_err();
        assert_eq!(
            err,
            ParseError::NonFinite {
                index: 0,
                token: "nan".to_string()
            }
        );

        let err = parse_line("Xe 1 deg 2 deg 3 deg 4 m/s2 -inf m/s2 6").unwrap_err();
        assert!(matches!(err, ParseError::NonFinite { index: 4, .. }));

        let mut parser = LineParser::new();
        assert!(parser.parse("Xe 1 deg NaN deg 3 deg 4 m/s2 5 m/s2 6").is_err());
        assert_eq!(parser.accepted(), 0);
        assert_eq!(parser.rejected(), 1);
    }

    #[test]
    fn trailing_unit_token_is_tolerated() {
        let twelve = "Xe 1 deg 2 deg 3 deg 4 m/s2 5 m/s2 6";
        let thirteen = "Xe 1 deg 2 deg 3 deg 4 m/s2 5 m/s2 6 m/s2";
        assert_eq!(twelve.split_whitespace().count(), 12);
        assert_eq!(thirteen.split_whitespace().count(), 13);

        let expected = Some([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(parse_line(twelve).unwrap(), expected);
        assert_eq!(parse_line(thirteen).unwrap(), expected);

        // A fourteenth token starts a seventh field
        let err = parse_line("Xe 1 deg 2 deg 3 deg 4 m/s2 5 m/s2 6 m/s2 7").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCount {
                expected: 6,
                found: 7
            }
        );
    }

    #[test]
    fn formatted_line_parses_back() {
        let values = [-179.9375, 0.0625, 181.5, -0.37, 0.0, 9.80665];
        let line = format_line(&values);
        let parsed = parse_line(&line).unwrap().unwrap();
        for (a, b) in parsed.iter().zip(values.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
        assert_eq!(parse_line(&line).unwrap(), Some(parsed));
    }

    #[test]
    fn parser_numbers_accepted_records_only() {
        let mut parser = LineParser::new();
        let good = format_line(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(parser.parse(&good).unwrap().unwrap().seq, 0);
        assert!(parser.parse("noise").unwrap().is_none());
        assert!(parser.parse("Xe broken").is_err());
        assert_eq!(parser.parse(&good).unwrap().unwrap().seq, 1);
        assert_eq!(parser.accepted(), 2);
        assert_eq!(parser.rejected(), 1);
    }
}
