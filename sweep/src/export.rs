//! Row-oriented persistence of finished results.

use crate::calibrator::HomeReference;
use crate::coverage::Extremes;
use crate::error::Result;
use imu_traits::Float;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Accepts one row of numbers at a time.
pub trait RowSink {
    fn append_row(&mut self, row: &[Float]) -> Result<()>;
}

impl RowSink for Vec<Vec<Float>> {
    fn append_row(&mut self, row: &[Float]) -> Result<()> {
        self.push(row.to_vec());
        Ok(())
    }
}

/// Appends rows to a CSV stream. Rows may differ in length.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvRowSink<File> {
    /// Opens `path` for appending, creating it if needed.
    pub fn append_to<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(csv::Error::from)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvRowSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .flexible(true)
                .has_headers(false)
                .from_writer(writer),
        }
    }
}

impl<W: Write> RowSink for CsvRowSink<W> {
    fn append_row(&mut self, row: &[Float]) -> Result<()> {
        self.writer.write_record(row.iter().map(|v| v.to_string()))?;
        // Each row is a finished result; do not leave it in the buffer.
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// `[angle_x, angle_y, angle_z, acc_x, acc_y, acc_z]` of the home pose.
pub fn home_row(home: &HomeReference) -> Vec<Float> {
    home.values().to_vec()
}

/// `[min, max, span]` for X, then Y, then Z.
pub fn extremes_row(extremes: &Extremes) -> Vec<Float> {
    extremes
        .iter()
        .flat_map(|e| [e.min, e.max, e.extremes_diff])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{Axis, AxisExtremes};
    use std::fs;

    #[test]
    fn csv_rows_append_across_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut sink = CsvRowSink::append_to(&path).unwrap();
        sink.append_row(&[50.0, 5.0, 49.5, 49.75]).unwrap();
        drop(sink);

        let mut sink = CsvRowSink::append_to(&path).unwrap();
        sink.append_row(&[1.5, -2.0]).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "50,5,49.5,49.75\n1.5,-2\n");
    }

    #[test]
    fn extremes_flatten_per_axis() {
        let e = |axis, v: &[Float]| AxisExtremes::classify(axis, v).unwrap();
        let extremes = [
            e(Axis::X, &[-10.0, 10.0]),
            e(Axis::Y, &[350.0, 2.0]),
            e(Axis::Z, &[-5.0, 5.0]),
        ];
        let mut rows: Vec<Vec<Float>> = Vec::new();
        rows.append_row(&extremes_row(&extremes)).unwrap();
        assert_eq!(
            rows,
            vec![vec![-10.0, 10.0, 20.0, 350.0, 2.0, 12.0, -5.0, 5.0, 10.0]]
        );
    }

    #[test]
    fn home_row_keeps_layout() {
        let home = HomeReference::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(home_row(&home), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
