//! Catalog ingest.
//!
//! Turns a delimited earthquake catalog into `SeismicEvent`s in file order.
//!
//! Design goals:
//! - **Flexible headers**: common aliases (`mag`, `lat`, `Depth/Km`, ...) resolve
//!   to the same column; a bare five-column file maps positionally.
//! - **Loud failures**: a row without a parseable timestamp or magnitude aborts
//!   the load with its line number. Partial catalogs would silently shift the
//!   mainshock and the daily counts.
//! - **Separation of concerns**: no filtering or bucketing here.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;

use crate::domain::SeismicEvent;
use crate::error::CatalogError;

const TIME_ALIASES: [&str; 5] = ["time", "timestamp", "datetime", "origin_time", "date"];
const LATITUDE_ALIASES: [&str; 2] = ["latitude", "lat"];
const LONGITUDE_ALIASES: [&str; 3] = ["longitude", "lon", "lng"];
const DEPTH_ALIASES: [&str; 4] = ["depth/km", "depth_km", "depth", "depth (km)"];
const MAGNITUDE_ALIASES: [&str; 4] = ["magnitude", "mag", "ml", "mw"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub time: usize,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    pub depth_km: Option<usize>,
    pub magnitude: usize,
    /// True when the header names were not recognized and the standard
    /// five-column order was assumed.
    pub positional: bool,
}

/// Ingest output: events in catalog order plus how the columns were read.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub events: Vec<SeismicEvent>,
    pub columns: ColumnMap,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest and latest timestamp in the catalog.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let min = self.events.iter().map(|e| e.timestamp).min()?;
        let max = self.events.iter().map(|e| e.timestamp).max()?;
        Some((min, max))
    }
}

/// Open and parse the catalog at `path`.
pub fn load_catalog(path: &Path, delimiter: u8) -> Result<Catalog, CatalogError> {
    let file = File::open(path).map_err(|e| CatalogError::FileAccess {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    read_catalog(file, delimiter)
}

/// Parse a catalog from any reader (header row required).
pub fn read_catalog<R: Read>(reader: R, delimiter: u8) -> Result<Catalog, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| CatalogError::Header(e.to_string()))?
        .clone();

    let columns = resolve_columns(&headers)?;
    log::debug!("catalog columns: {columns:?}");

    let mut events = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| CatalogError::InvalidRow {
            line,
            message: format!("CSV parse error: {e}"),
        })?;
        let event = parse_row(&record, &columns)
            .map_err(|message| CatalogError::InvalidRow { line, message })?;
        events.push(event);
    }

    Ok(Catalog { events, columns })
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, CatalogError> {
    let header_map = build_header_map(headers);
    let find = |aliases: &[&str]| find_column(&header_map, aliases);

    let time = find(TIME_ALIASES.as_slice());
    let magnitude = find(MAGNITUDE_ALIASES.as_slice());

    match (time, magnitude) {
        (Some(time), Some(magnitude)) => Ok(ColumnMap {
            time,
            latitude: find(LATITUDE_ALIASES.as_slice()),
            longitude: find(LONGITUDE_ALIASES.as_slice()),
            depth_km: find(DEPTH_ALIASES.as_slice()),
            magnitude,
            positional: false,
        }),
        // Unrecognized names on a five-column file: assume
        // Time, Latitude, Longitude, Depth_Km, Magnitude.
        _ if headers.len() == 5 => Ok(ColumnMap {
            time: 0,
            latitude: Some(1),
            longitude: Some(2),
            depth_km: Some(3),
            magnitude: 4,
            positional: true,
        }),
        (None, _) => Err(CatalogError::MissingColumn("time")),
        (_, None) => Err(CatalogError::MissingColumn("magnitude")),
    }
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins on duplicated names.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<SeismicEvent, String> {
    let raw_time = get_required(record, columns.time, "time")?;
    let timestamp = parse_timestamp(raw_time)?;

    let raw_mag = get_required(record, columns.magnitude, "magnitude")?;
    let magnitude = parse_f64(raw_mag).ok_or_else(|| format!("Invalid magnitude '{raw_mag}'."))?;

    Ok(SeismicEvent {
        timestamp,
        latitude: parse_optional(record, columns.latitude, "latitude")?,
        longitude: parse_optional(record, columns.longitude, "longitude")?,
        depth_km: parse_optional(record, columns.depth_km, "depth")?,
        magnitude,
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_optional(record: &StringRecord, idx: Option<usize>, name: &str) -> Result<Option<f64>, String> {
    let Some(raw) = idx.and_then(|i| record.get(i)).map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    parse_f64(raw)
        .map(Some)
        .ok_or_else(|| format!("Invalid {name} '{raw}'."))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Parse an absolute timestamp, assuming UTC when no offset is given.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    const FMTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y/%m/%d %H:%M:%S%.f"];
    for fmt in FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!(
        "Invalid timestamp '{s}'. Expected RFC 3339 or YYYY-MM-DD HH:MM:SS[.fff]."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reads_named_columns_in_any_order() {
        let csv = "\u{feff}Mag,Time,Lat,Lon,Depth/Km\n\
                   6.0,2016-08-24 01:36:32.000,42.70,13.23,8.1\n\
                   2.4,2016-08-24T02:00:00Z,42.71,13.20,\n";
        let catalog = read_catalog(csv.as_bytes(), b',').unwrap();
        assert!(!catalog.columns.positional);
        assert_eq!(catalog.len(), 2);

        let first = &catalog.events[0];
        assert_eq!(first.magnitude, 6.0);
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2016, 8, 24, 1, 36, 32).unwrap()
        );
        assert_eq!(first.depth_km, Some(8.1));
        assert_eq!(catalog.events[1].depth_km, None);
    }

    #[test]
    fn unknown_five_column_header_maps_positionally() {
        let csv = "a|b|c|d|e\n2016-08-24 01:36:32|42.7|13.2|8.0|-0.3\n";
        let catalog = read_catalog(csv.as_bytes(), b'|').unwrap();
        assert!(catalog.columns.positional);
        assert_eq!(catalog.events[0].magnitude, -0.3);
        assert_eq!(catalog.events[0].latitude, Some(42.7));
    }

    #[test]
    fn missing_magnitude_fails_with_line_number() {
        let csv = "time,magnitude\n2016-08-24 01:36:32,6.0\n2016-08-24 02:00:00,\n";
        let err = read_catalog(csv.as_bytes(), b',').unwrap_err();
        match err {
            CatalogError::InvalidRow { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("magnitude"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_timestamp_is_fatal() {
        let csv = "time,magnitude\nyesterday,3.0\n";
        assert!(matches!(
            read_catalog(csv.as_bytes(), b',').unwrap_err(),
            CatalogError::InvalidRow { line: 2, .. }
        ));
    }

    #[test]
    fn missing_time_column_is_reported() {
        let csv = "when,magnitude\n2016-08-24 01:36:32,6.0\n";
        assert!(matches!(
            read_catalog(csv.as_bytes(), b',').unwrap_err(),
            CatalogError::MissingColumn("time")
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("no/such/dir/catalog.csv");
        let err = load_catalog(path, b',').unwrap_err();
        assert!(matches!(err, CatalogError::FileAccess { .. }));
        assert!(err.to_string().contains("no/such/dir/catalog.csv"));
    }

    #[test]
    fn empty_catalog_parses_to_no_events() {
        let csv = "time,magnitude\n";
        let catalog = read_catalog(csv.as_bytes(), b',').unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.time_span().is_none());
    }
}
