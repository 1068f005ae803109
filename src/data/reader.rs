use crate::data::measurement_set::MeasurementSet;
use crate::error::DataError;

use itertools::{Itertools, process_results};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Read `time error` lines into a [MeasurementSet]
///
/// Every line holds two whitespace-separated floating-point fields, further fields are
/// ignored. If `size` is given only the first `size` lines are read. A line with fewer than two
/// fields, with an unparsable number or with invalid UTF-8 aborts the read, the error carries its
/// 1-based number.
pub fn read_measurements<R>(
    reader: R,
    size: Option<usize>,
) -> Result<MeasurementSet<'static>, DataError>
where
    R: BufRead,
{
    let iter = reader
        .lines()
        .take(size.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(i, line)| {
            let line = line.map_err(|source| DataError::ReadLine {
                line: i + 1,
                source,
            })?;
            parse_line(i + 1, &line)
        });
    let (times, uncertainties): (Vec<_>, Vec<_>) =
        process_results(iter, |iter| iter.multiunzip())?;
    MeasurementSet::from_vecs(times, uncertainties)
}

/// Read a measurement file, see [read_measurements]
pub fn read_measurements_from_path(
    path: impl AsRef<Path>,
    size: Option<usize>,
) -> Result<MeasurementSet<'static>, DataError> {
    let file = File::open(path)?;
    read_measurements(BufReader::new(file), size)
}

/// Write a [MeasurementSet] in the format accepted by [read_measurements]
///
/// Floats are written in the shortest form that parses back to the same value.
pub fn write_measurements<W>(writer: W, set: &MeasurementSet) -> Result<(), DataError>
where
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    for (time, uncertainty) in set.iter() {
        writeln!(writer, "{time} {uncertainty}")?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_line(line_number: usize, line: &str) -> Result<(f64, f64), DataError> {
    let mut fields = line.split_whitespace();
    let (time, uncertainty) = match (fields.next(), fields.next()) {
        (Some(time), Some(uncertainty)) => (time, uncertainty),
        (time, _) => {
            return Err(DataError::MissingField {
                line: line_number,
                found: time.map_or(0, |_| 1),
            });
        }
    };
    Ok((
        parse_field(line_number, time)?,
        parse_field(line_number, uncertainty)?,
    ))
}

fn parse_field(line_number: usize, token: &str) -> Result<f64, DataError> {
    token.parse().map_err(|_| DataError::InvalidNumber {
        line: line_number,
        token: token.to_owned(),
    })
}
