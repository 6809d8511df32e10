//! Reader for the comma-separated point format.
//!
//! Each non-blank line holds one record: numeric features followed by one
//! integer label, separated by commas. Errors name the 1-based line number.

use std::{
    io::{self, BufRead},
    str::FromStr,
};

use kdsearch_core::Point;
use thiserror::Error;

/// Errors raised while reading point records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The underlying reader failed.
    #[error("failed to read line {line}: {source}")]
    Read {
        /// Line being read when the failure occurred.
        line: usize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A record held a label but no features.
    #[error("line {line}: expected at least one feature followed by a label")]
    MissingFeatures {
        /// Offending line.
        line: usize,
    },
    /// A feature field was not a number.
    #[error("line {line}, field {field}: `{value}` is not a number")]
    InvalidFeature {
        /// Offending line.
        line: usize,
        /// 1-based field position within the line.
        field: usize,
        /// Raw field contents.
        value: String,
    },
    /// The trailing label field was not an integer.
    #[error("line {line}: label `{value}` is not an integer")]
    InvalidLabel {
        /// Offending line.
        line: usize,
        /// Raw field contents.
        value: String,
    },
}

/// Reads every record from `reader`, skipping blank lines.
///
/// # Errors
/// Returns the first [`RecordError`] encountered.
///
/// # Examples
/// ```
/// use kdsearch_cli::records::read_points;
///
/// let points = read_points("1.0,2.0,0\n\n3.5,-1,1\n".as_bytes())?;
/// assert_eq!(points.len(), 2);
/// assert_eq!(points[1].features(), &[3.5, -1.0]);
/// assert_eq!(points[1].label(), 1);
/// # Ok::<(), kdsearch_cli::records::RecordError>(())
/// ```
pub fn read_points(reader: impl BufRead) -> Result<Vec<Point>, RecordError> {
    let mut points = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.map_err(|source| RecordError::Read {
            line: number,
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        points.push(parse_record(&line, number)?);
    }
    Ok(points)
}

/// Parses one record found on line `number`.
///
/// # Errors
/// Returns [`RecordError::MissingFeatures`] for a lone label and the
/// field-specific variants for unparsable values.
pub fn parse_record(line: &str, number: usize) -> Result<Point, RecordError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let Some((label, features)) = fields.split_last() else {
        return Err(RecordError::MissingFeatures { line: number });
    };
    if features.is_empty() {
        return Err(RecordError::MissingFeatures { line: number });
    }

    let features = features
        .iter()
        .enumerate()
        .map(|(position, raw)| {
            raw.parse::<f64>().map_err(|_| RecordError::InvalidFeature {
                line: number,
                field: position + 1,
                value: (*raw).to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let label = label.parse().map_err(|_| RecordError::InvalidLabel {
        line: number,
        value: (*label).to_owned(),
    })?;
    Ok(Point::new(features, label))
}

/// A query target given on the command line as comma-separated coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Target(Vec<f64>);

impl Target {
    /// Returns the coordinates.
    #[must_use]
    pub fn coordinates(&self) -> &[f64] {
        &self.0
    }
}

/// Errors raised while parsing a [`Target`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetParseError {
    /// No coordinates were supplied.
    #[error("target must list at least one coordinate")]
    Empty,
    /// A coordinate was not a number.
    #[error("target coordinate {position} `{value}` is not a number")]
    InvalidCoordinate {
        /// 1-based position of the coordinate.
        position: usize,
        /// Raw text.
        value: String,
    },
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() {
            return Err(TargetParseError::Empty);
        }
        raw.split(',')
            .map(str::trim)
            .enumerate()
            .map(|(index, value)| {
                value
                    .parse()
                    .map_err(|_| TargetParseError::InvalidCoordinate {
                        position: index + 1,
                        value: value.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use rstest::rstest;

    use super::{RecordError, Target, TargetParseError, parse_record, read_points};

    #[rstest]
    #[case::integers("1,2,0", &[1.0, 2.0], 0)]
    #[case::spaced(" 0.5 , -3e2 , 7 ", &[0.5, -300.0], 7)]
    #[case::single_feature("4.25,-1", &[4.25], -1)]
    fn parses_well_formed_records(
        #[case] line: &str,
        #[case] features: &[f64],
        #[case] label: i64,
    ) {
        let point = parse_record(line, 1).expect("record must parse");
        assert_eq!(point.features(), features);
        assert_eq!(point.label(), label);
    }

    #[test]
    fn reports_line_numbers_past_blank_lines() {
        let err = read_points("1,1,0\n\n2,x,1\n".as_bytes()).expect_err("field 2 is malformed");
        assert!(matches!(
            err,
            RecordError::InvalidFeature { line: 3, field: 2, ref value } if value == "x"
        ));
    }

    #[rstest]
    #[case::lone_label("3", 1)]
    #[case::empty_field_list(",", 1)]
    fn rejects_records_without_features(#[case] line: &str, #[case] expected_field: usize) {
        let err = parse_record(line, 4).expect_err("record must be rejected");
        match err {
            RecordError::MissingFeatures { line } => assert_eq!(line, 4),
            RecordError::InvalidFeature { line, field, .. } => {
                assert_eq!((line, field), (4, expected_field));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_fractional_labels() {
        let err = parse_record("1,2,0.5", 9).expect_err("labels are integers");
        assert!(matches!(err, RecordError::InvalidLabel { line: 9, ref value } if value == "0.5"));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unavailable"))
        }
    }

    #[test]
    fn surfaces_read_failures() {
        let err = read_points(io::BufReader::new(FailingReader)).expect_err("the reader fails");
        assert!(matches!(err, RecordError::Read { line: 1, .. }));
    }

    #[rstest]
    #[case::pair("2,3", Ok(vec![2.0, 3.0]))]
    #[case::spaced(" 1.5 , -2 ", Ok(vec![1.5, -2.0]))]
    #[case::empty("  ", Err(TargetParseError::Empty))]
    #[case::bad("1,,2", Err(TargetParseError::InvalidCoordinate { position: 2, value: String::new() }))]
    fn parses_targets(#[case] raw: &str, #[case] expected: Result<Vec<f64>, TargetParseError>) {
        let parsed = raw.parse::<Target>().map(|target| target.coordinates().to_vec());
        assert_eq!(parsed, expected);
    }
}
