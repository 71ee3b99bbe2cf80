//! File-backed storage for locations, tours and matrix artifacts.
//!
//! Locations are read from a CSV with a name column and latitude/longitude
//! columns. Tours are plain text: one location name per line, or a single
//! permutation of indices such as `0 4 2 1 3` or `[0, 4, 2, 1, 3]`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{PlannerError, Result};
use crate::location::{Location, LocationSet};
use crate::matrix::{Distance, DistanceMatrix, MatrixMode};
use crate::tour::{StoredTour, Tour};
use crate::traits::{LocationRepository, ResponseRecorder};

const STREAM: &str = "<stream>";

#[derive(Debug, Deserialize)]
struct LocationRecord {
    #[serde(alias = "Name", alias = "Park Name")]
    name: String,
    #[serde(alias = "Latitude")]
    latitude: f64,
    #[serde(alias = "Longitude")]
    longitude: f64,
}

/// Read a location set from CSV.
pub fn read_locations_csv<R: Read>(reader: R) -> Result<LocationSet> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut locations = Vec::new();

    for record in reader.deserialize() {
        let record: LocationRecord = record.map_err(|err| PlannerError::storage(STREAM, err))?;
        locations.push(Location::new(record.name, record.latitude, record.longitude)?);
    }

    LocationSet::new(locations)
}

/// Parse a stored tour from its text form.
pub fn parse_stored_tour(text: &str) -> Result<StoredTour> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);

    let tokens: Vec<&str> = inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(PlannerError::validation("tour is empty"));
    }

    let indices: Option<Vec<usize>> = tokens.iter().map(|token| token.parse().ok()).collect();
    if let Some(indices) = indices {
        return Ok(StoredTour::Permutation(indices));
    }

    Ok(StoredTour::Names(
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Write a matrix as CSV keyed by location name.
///
/// The header row is an empty corner cell followed by the names; each row
/// starts with its name. Unreachable cells are left empty.
pub fn write_matrix_csv<W: Write>(matrix: &DistanceMatrix, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let storage = |err: csv::Error| PlannerError::storage(STREAM, err);

    let header = std::iter::once("").chain(matrix.names().iter().map(String::as_str));
    writer.write_record(header).map_err(storage)?;

    for (name, row) in matrix.names().iter().zip(matrix.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(name.clone());
        record.extend(row.iter().map(|cell| match cell {
            Distance::Miles(miles) => miles.to_string(),
            Distance::Unreachable => String::new(),
        }));
        writer.write_record(&record).map_err(storage)?;
    }

    writer
        .flush()
        .map_err(|err| PlannerError::storage(STREAM, err))
}

/// Read a matrix written by [`write_matrix_csv`].
///
/// Empty and `NaN` cells read as unreachable.
pub fn read_matrix_csv<R: Read>(reader: R, mode: MatrixMode) -> Result<DistanceMatrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or_else(|| PlannerError::storage(STREAM, "matrix file is empty"))?
        .map_err(|err| PlannerError::storage(STREAM, err))?;
    let names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::with_capacity(names.len());
    for (i, record) in records.enumerate() {
        let record = record.map_err(|err| PlannerError::storage(STREAM, err))?;
        let row_name = record.get(0).unwrap_or_default();
        if names.get(i).map(String::as_str) != Some(row_name) {
            return Err(PlannerError::storage(
                STREAM,
                format!("row {} is labelled {row_name:?}, expected the header order", i + 1),
            ));
        }
        let row = record
            .iter()
            .skip(1)
            .map(parse_cell)
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    if rows.len() != names.len() {
        return Err(PlannerError::storage(
            STREAM,
            format!("{} rows for {} columns", rows.len(), names.len()),
        ));
    }

    DistanceMatrix::from_rows(mode, names, rows).map_err(|err| match err {
        PlannerError::Validation(message) => PlannerError::storage(STREAM, message),
        other => other,
    })
}

fn parse_cell(field: &str) -> Result<Distance> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Ok(Distance::Unreachable);
    }
    field
        .parse::<f64>()
        .map(Distance::Miles)
        .map_err(|err| PlannerError::storage(STREAM, format!("bad matrix cell {field:?}: {err}")))
}

/// Point a stream-level storage error at `path`.
fn at_path(path: &Path, err: PlannerError) -> PlannerError {
    match err {
        PlannerError::Storage { message, .. } => PlannerError::storage(path.display().to_string(), message),
        other => other,
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| PlannerError::storage(path.display().to_string(), err))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|err| PlannerError::storage(path.display().to_string(), err))
}

/// Locations CSV plus tour text file on local disk.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    locations_path: PathBuf,
    tour_path: PathBuf,
}

impl CsvRepository {
    pub fn new(locations_path: impl Into<PathBuf>, tour_path: impl Into<PathBuf>) -> Self {
        Self {
            locations_path: locations_path.into(),
            tour_path: tour_path.into(),
        }
    }

    /// Store `tour` as one location name per line.
    pub fn save_tour(&self, tour: &Tour) -> Result<()> {
        let mut writer = create(&self.tour_path)?;
        for name in tour.names() {
            writeln!(writer, "{name}")
                .map_err(|err| PlannerError::storage(self.tour_path.display().to_string(), err))?;
        }
        writer
            .flush()
            .map_err(|err| PlannerError::storage(self.tour_path.display().to_string(), err))
    }

    pub fn save_matrix(&self, matrix: &DistanceMatrix, path: &Path) -> Result<()> {
        write_matrix_csv(matrix, create(path)?).map_err(|err| at_path(path, err))
    }

    pub fn load_matrix(&self, path: &Path, mode: MatrixMode) -> Result<DistanceMatrix> {
        read_matrix_csv(open(path)?, mode).map_err(|err| at_path(path, err))
    }
}

impl LocationRepository for CsvRepository {
    fn load_locations(&self) -> Result<LocationSet> {
        let locations = read_locations_csv(open(&self.locations_path)?)
            .map_err(|err| at_path(&self.locations_path, err))?;
        debug!(
            path = %self.locations_path.display(),
            locations = locations.len(),
            "loaded locations"
        );
        Ok(locations)
    }

    fn load_tour(&self) -> Result<StoredTour> {
        let text = fs::read_to_string(&self.tour_path)
            .map_err(|err| PlannerError::storage(self.tour_path.display().to_string(), err))?;
        parse_stored_tour(&text).map_err(|err| match err {
            PlannerError::Validation(message) => {
                PlannerError::storage(self.tour_path.display().to_string(), message)
            }
            other => other,
        })
    }
}

/// Writes each raw provider response to `<dir>/osrm_<service>_response.json`.
#[derive(Debug, Clone)]
pub struct JsonFileRecorder {
    dir: PathBuf,
}

impl JsonFileRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, service: &str) -> PathBuf {
        self.dir.join(format!("osrm_{service}_response.json"))
    }
}

impl ResponseRecorder for JsonFileRecorder {
    fn record(&self, service: &str, body: &serde_json::Value) -> Result<()> {
        let path = self.path_for(service);
        let mut writer = create(&path)?;
        serde_json::to_writer_pretty(&mut writer, body)
            .map_err(|err| PlannerError::storage(path.display().to_string(), err))?;
        writer
            .flush()
            .map_err(|err| PlannerError::storage(path.display().to_string(), err))
    }
}
