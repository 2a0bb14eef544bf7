//! Gain-correction and ADC calibration tables.
//!
//! Both tables are comma-separated text files shipped with each probe. The first line holds the
//! probe serial number, which must be identical in the two files. Every following line starts
//! with a label (ignored) and carries one channel (gain file) or one converter (ADC file).
//!
//! Parsing ([`parse_gain_row`], [`parse_converter_row`]) and validation
//! ([`ConverterCalibration::validate`]) are separate steps. [`Calibration::parse`] runs both on
//! every row before returning, so a single bad converter rejects the whole set.

use crate::configuration::Gain;

const GAINS_PER_BAND: usize = 8;
const GAIN_ROW_LENGTH: usize = 2 * GAINS_PER_BAND;
const CONVERTER_ROW_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Gain,
    Adc,
}

impl std::fmt::Display for Source {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Gain => write!(formatter, "gain correction"),
            Source::Adc => write!(formatter, "ADC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDefect {
    Missing,
    FieldCount { expected: usize, count: usize },
    NotANumber { field: usize, value: String },
}

impl std::fmt::Display for RowDefect {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowDefect::Missing => write!(formatter, "the row is missing"),
            RowDefect::FieldCount { expected, count } => {
                write!(formatter, "expected {expected} values, got {count}")
            }
            RowDefect::NotANumber { field, value } => {
                write!(formatter, "value {field} (\"{value}\") is not a number")
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The {0} calibration source was not provided")]
    MissingSource(Source),

    #[error("Reading the {kind} calibration file {path:?} failed")]
    Io {
        kind: Source,
        path: std::path::PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("The {kind} calibration serial number \"{line}\" is not an unsigned 64-bit integer")]
    MalformedSerial { kind: Source, line: String },

    #[error("Calibration serial numbers do not match (gain correction: {gain}, ADC: {adc})")]
    SerialMismatch { gain: u64, adc: u64 },

    #[error("Gain correction row {row} is malformed ({defect})")]
    MalformedGainRow { row: usize, defect: RowDefect },

    #[error("ADC calibration row {row} is malformed ({defect})")]
    MalformedConverterRow { row: usize, defect: RowDefect },

    #[error("ADC {converter} parameter {field} is {value} (expected a value in [0, {maximum}])")]
    OutOfRange {
        converter: usize,
        field: &'static str,
        value: i32,
        maximum: i32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    pub serial_number: u64,
    pub ap_gain: Gain,  // column selected for ap_gain_correction
    pub lfp_gain: Gain, // column selected for lfp_gain_correction
    pub ap_gain_correction: Vec<f64>,
    pub lfp_gain_correction: Vec<f64>,
}

impl CalibrationRecord {
    pub fn channel_count(&self) -> usize {
        self.ap_gain_correction.len()
    }
}

/// A converter row as read from the file, before range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawConverterRow {
    pub comp_p: i32,
    pub comp_n: i32,
    pub slope: i32,
    pub coarse: i32,
    pub fine: i32,
    pub cfix: i32,
    pub offset: i32,
    pub threshold: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterCalibration {
    pub comp_p: u8,    // in [0, 31]
    pub comp_n: u8,    // in [0, 31]
    pub slope: u8,     // in [0, 7]
    pub coarse: u8,    // in [0, 3]
    pub fine: u8,      // in [0, 3]
    pub cfix: u8,      // in [0, 15]
    pub offset: i32,
    pub threshold: i32,
}

fn bounded(converter: usize, field: &'static str, value: i32, maximum: i32) -> Result<u8, Error> {
    if (0..=maximum).contains(&value) {
        Ok(value as u8)
    } else {
        Err(Error::OutOfRange {
            converter,
            field,
            value,
            maximum,
        })
    }
}

impl ConverterCalibration {
    pub fn validate(converter: usize, row: &RawConverterRow) -> Result<Self, Error> {
        let comp_p = bounded(converter, "CompP", row.comp_p, 0x1F)?;
        let comp_n = bounded(converter, "CompN", row.comp_n, 0x1F)?;
        let cfix = bounded(converter, "Cfix", row.cfix, 0xF)?;
        let slope = bounded(converter, "Slope", row.slope, 0x7)?;
        let coarse = bounded(converter, "Coarse", row.coarse, 0x3)?;
        let fine = bounded(converter, "Fine", row.fine, 0x3)?;
        Ok(Self {
            comp_p,
            comp_n,
            slope,
            coarse,
            fine,
            cfix,
            offset: row.offset,
            threshold: row.threshold,
        })
    }
}

fn values<T: std::str::FromStr>(line: &str, expected: usize) -> Result<Vec<T>, RowDefect> {
    let fields: Vec<&str> = line.split(',').skip(1).map(str::trim).collect();
    if fields.len() != expected {
        return Err(RowDefect::FieldCount {
            expected,
            count: fields.len(),
        });
    }
    fields
        .iter()
        .enumerate()
        .map(|(field, value)| {
            value.parse::<T>().map_err(|_| RowDefect::NotANumber {
                field,
                value: (*value).to_owned(),
            })
        })
        .collect()
}

/// Splits a gain correction line into its 16 coefficients (8 AP gains then 8 LFP gains).
pub fn parse_gain_row(line: &str) -> Result<[f64; GAIN_ROW_LENGTH], RowDefect> {
    let values = values::<f64>(line, GAIN_ROW_LENGTH)?;
    let mut row = [0.0; GAIN_ROW_LENGTH];
    row.copy_from_slice(&values);
    Ok(row)
}

pub fn parse_converter_row(line: &str) -> Result<RawConverterRow, RowDefect> {
    let values = values::<i32>(line, CONVERTER_ROW_LENGTH)?;
    Ok(RawConverterRow {
        comp_p: values[0],
        comp_n: values[1],
        slope: values[2],
        coarse: values[3],
        fine: values[4],
        cfix: values[5],
        offset: values[6],
        threshold: values[7],
    })
}

fn parse_serial(kind: Source, line: Option<&str>) -> Result<u64, Error> {
    let line = line.unwrap_or_default();
    line.trim()
        .parse::<u64>()
        .map_err(|_| Error::MalformedSerial {
            kind,
            line: line.to_owned(),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub record: CalibrationRecord,
    pub converters: Vec<ConverterCalibration>,
}

impl Calibration {
    pub fn serial_number(&self) -> u64 {
        self.record.serial_number
    }

    pub fn parse(
        gain_source: Option<&str>,
        adc_source: Option<&str>,
        ap_gain: Gain,
        lfp_gain: Gain,
        channel_count: usize,
        converter_count: usize,
    ) -> Result<Self, Error> {
        let gain_source = gain_source.ok_or(Error::MissingSource(Source::Gain))?;
        let adc_source = adc_source.ok_or(Error::MissingSource(Source::Adc))?;
        let mut gain_lines = gain_source.lines();
        let mut adc_lines = adc_source.lines();
        let gain_serial = parse_serial(Source::Gain, gain_lines.next())?;
        let adc_serial = parse_serial(Source::Adc, adc_lines.next())?;
        if gain_serial != adc_serial {
            return Err(Error::SerialMismatch {
                gain: gain_serial,
                adc: adc_serial,
            });
        }

        let mut ap_gain_correction = Vec::with_capacity(channel_count);
        let mut lfp_gain_correction = Vec::with_capacity(channel_count);
        for row in 0..channel_count {
            let line = gain_lines.next().ok_or_else(|| Error::MalformedGainRow {
                row,
                defect: RowDefect::Missing,
            })?;
            let values =
                parse_gain_row(line).map_err(|defect| Error::MalformedGainRow { row, defect })?;
            ap_gain_correction.push(values[ap_gain.index() as usize]);
            lfp_gain_correction.push(values[GAINS_PER_BAND + lfp_gain.index() as usize]);
        }

        let mut converters = Vec::with_capacity(converter_count);
        for row in 0..converter_count {
            let line = adc_lines.next().ok_or_else(|| Error::MalformedConverterRow {
                row,
                defect: RowDefect::Missing,
            })?;
            let raw = parse_converter_row(line)
                .map_err(|defect| Error::MalformedConverterRow { row, defect })?;
            converters.push(ConverterCalibration::validate(row, &raw)?);
        }

        Ok(Self {
            record: CalibrationRecord {
                serial_number: gain_serial,
                ap_gain,
                lfp_gain,
                ap_gain_correction,
                lfp_gain_correction,
            },
            converters,
        })
    }

    pub fn from_files(
        gain_path: Option<&std::path::Path>,
        adc_path: Option<&std::path::Path>,
        ap_gain: Gain,
        lfp_gain: Gain,
        channel_count: usize,
        converter_count: usize,
    ) -> Result<Self, Error> {
        let read = |kind: Source, path: Option<&std::path::Path>| -> Result<String, Error> {
            let path = path.ok_or(Error::MissingSource(kind))?;
            std::fs::read_to_string(path).map_err(|error| Error::Io {
                kind,
                path: path.to_path_buf(),
                error,
            })
        };
        let gain_source = read(Source::Gain, gain_path)?;
        let adc_source = read(Source::Adc, adc_path)?;
        Self::parse(
            Some(gain_source.as_str()),
            Some(adc_source.as_str()),
            ap_gain,
            lfp_gain,
            channel_count,
            converter_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn coefficient(channel: usize, column: usize) -> f64 {
        1.0 + column as f64 / 100.0 + channel as f64
    }

    fn gain_source(serial: u64, channel_count: usize) -> String {
        let mut source = format!("{serial}\n");
        for channel in 0..channel_count {
            source.push_str(&format!("{channel}"));
            for column in 0..GAIN_ROW_LENGTH {
                source.push_str(&format!(",{}", coefficient(channel, column)));
            }
            source.push('\n');
        }
        source
    }

    fn adc_source(serial: u64, converter_count: usize) -> String {
        let mut source = format!("{serial}\n");
        for converter in 0..converter_count {
            source.push_str(&format!("{converter},16,15,3,2,1,9,12,300\n"));
        }
        source
    }

    #[test]
    fn parses_valid_sources() {
        let calibration = Calibration::parse(
            Some(gain_source(18005106831, 4).as_str()),
            Some(adc_source(18005106831, 6).as_str()),
            Gain::X250,
            Gain::X1500,
            4,
            6,
        )
        .unwrap();
        assert_eq!(calibration.serial_number(), 18005106831);
        assert_eq!(calibration.record.channel_count(), 4);
        assert_eq!(calibration.converters.len(), 6);
        assert_eq!(calibration.record.ap_gain_correction[0], coefficient(0, 2));
        assert_eq!(calibration.record.lfp_gain_correction[0], coefficient(0, 13));
        assert_eq!(calibration.record.ap_gain_correction[3], coefficient(3, 2));
        assert_eq!(
            calibration.converters[5],
            ConverterCalibration {
                comp_p: 16,
                comp_n: 15,
                slope: 3,
                coarse: 2,
                fine: 1,
                cfix: 9,
                offset: 12,
                threshold: 300,
            }
        );
    }

    #[test]
    fn missing_sources() {
        let adc = adc_source(1, 2);
        assert_matches!(
            Calibration::parse(None, Some(adc.as_str()), Gain::X50, Gain::X50, 2, 2),
            Err(Error::MissingSource(Source::Gain))
        );
        let gain = gain_source(1, 2);
        assert_matches!(
            Calibration::parse(Some(gain.as_str()), None, Gain::X50, Gain::X50, 2, 2),
            Err(Error::MissingSource(Source::Adc))
        );
    }

    #[test]
    fn serial_mismatch() {
        assert_matches!(
            Calibration::parse(
                Some(gain_source(1, 2).as_str()),
                Some(adc_source(2, 2).as_str()),
                Gain::X50,
                Gain::X50,
                2,
                2
            ),
            Err(Error::SerialMismatch { gain: 1, adc: 2 })
        );
    }

    #[test]
    fn malformed_serial() {
        assert_matches!(
            Calibration::parse(Some(""), Some("1\n"), Gain::X50, Gain::X50, 0, 0),
            Err(Error::MalformedSerial {
                kind: Source::Gain,
                ..
            })
        );
        assert_matches!(
            Calibration::parse(Some("1\n"), Some("-1\n"), Gain::X50, Gain::X50, 0, 0),
            Err(Error::MalformedSerial {
                kind: Source::Adc,
                ..
            })
        );
    }

    #[test]
    fn short_gain_row() {
        let gain = "7\n0,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1\n";
        assert_matches!(
            Calibration::parse(Some(gain), Some(adc_source(7, 0).as_str()), Gain::X50, Gain::X50, 1, 0),
            Err(Error::MalformedGainRow {
                row: 0,
                defect: RowDefect::FieldCount {
                    expected: 16,
                    count: 15
                }
            })
        );
    }

    #[test]
    fn missing_gain_row() {
        assert_matches!(
            Calibration::parse(
                Some(gain_source(7, 1).as_str()),
                Some(adc_source(7, 0).as_str()),
                Gain::X50,
                Gain::X50,
                2,
                0
            ),
            Err(Error::MalformedGainRow {
                row: 1,
                defect: RowDefect::Missing
            })
        );
    }

    #[test]
    fn short_converter_row() {
        let adc = "7\n0,1,2,3,1,1,4,5\n";
        assert_matches!(
            Calibration::parse(Some(gain_source(7, 0).as_str()), Some(adc), Gain::X50, Gain::X50, 0, 1),
            Err(Error::MalformedConverterRow {
                row: 0,
                defect: RowDefect::FieldCount {
                    expected: 8,
                    count: 7
                }
            })
        );
    }

    #[test]
    fn converter_row_with_text() {
        assert_eq!(
            parse_converter_row("0,1,2,3,1,one,4,5,6"),
            Err(RowDefect::NotANumber {
                field: 4,
                value: "one".to_owned()
            })
        );
    }

    #[test]
    fn out_of_range_rejects_the_whole_set() {
        let adc = "7\n0,1,2,3,1,1,4,5,6\n1,32,2,3,1,1,4,5,6\n";
        assert_matches!(
            Calibration::parse(Some(gain_source(7, 0).as_str()), Some(adc), Gain::X50, Gain::X50, 0, 2),
            Err(Error::OutOfRange {
                converter: 1,
                field: "CompP",
                value: 32,
                maximum: 31
            })
        );
    }

    #[test]
    fn validation_bounds() {
        let row = RawConverterRow {
            comp_p: 31,
            comp_n: 31,
            slope: 7,
            coarse: 3,
            fine: 3,
            cfix: 15,
            offset: -4,
            threshold: 1 << 20,
        };
        assert!(ConverterCalibration::validate(0, &row).is_ok());
        for (field, row) in [
            ("CompN", RawConverterRow { comp_n: -1, ..row }),
            ("Cfix", RawConverterRow { cfix: 16, ..row }),
            ("Slope", RawConverterRow { slope: 8, ..row }),
            ("Coarse", RawConverterRow { coarse: 4, ..row }),
            ("Fine", RawConverterRow { fine: 4, ..row }),
        ] {
            assert_matches!(
                ConverterCalibration::validate(3, &row),
                Err(Error::OutOfRange { converter: 3, field: name, .. }) if name == field
            );
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("neuropixels-drivers-missing-calibration.csv");
        assert_matches!(
            Calibration::from_files(
                Some(path.as_path()),
                Some(path.as_path()),
                Gain::X50,
                Gain::X50,
                1,
                1
            ),
            Err(Error::Io {
                kind: Source::Gain,
                ..
            })
        );
        assert_matches!(
            Calibration::from_files(None, Some(path.as_path()), Gain::X50, Gain::X50, 1, 1),
            Err(Error::MissingSource(Source::Gain))
        );
    }

    #[test]
    fn reads_files() {
        let directory = std::env::temp_dir();
        let gain_path = directory.join(format!(
            "neuropixels-drivers-gain-{}.csv",
            std::process::id()
        ));
        let adc_path = directory.join(format!(
            "neuropixels-drivers-adc-{}.csv",
            std::process::id()
        ));
        std::fs::write(&gain_path, gain_source(42, 2)).unwrap();
        std::fs::write(&adc_path, adc_source(42, 2)).unwrap();
        let calibration = Calibration::from_files(
            Some(gain_path.as_path()),
            Some(adc_path.as_path()),
            Gain::X50,
            Gain::X3000,
            2,
            2,
        );
        let _ = std::fs::remove_file(&gain_path);
        let _ = std::fs::remove_file(&adc_path);
        let calibration = calibration.unwrap();
        assert_eq!(calibration.serial_number(), 42);
        assert_eq!(calibration.record.lfp_gain_correction[1], coefficient(1, 15));
    }
}
