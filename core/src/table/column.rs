use crate::feed::AircraftRecord;
use crate::table::ordering::{
    compare_by_altitude, compare_by_heading, compare_by_range, compare_by_signal,
    compare_by_speed, SortDirection,
};
use std::cmp::Ordering;
use std::fmt;

/// Value a column reads out of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Absent,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            CellValue::Absent => 0,
            CellValue::Integer(_) | CellValue::Float(_) => 1,
            CellValue::Text(_) => 2,
        }
    }

    /// Absent first, then numbers, then text.
    pub fn natural_cmp(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Float(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Float(a), CellValue::Integer(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (CellValue::Float(a), CellValue::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Absent => Ok(()),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value:.1}"),
            CellValue::Text(value) => f.write_str(value),
        }
    }
}

pub type Accessor = fn(&AircraftRecord) -> CellValue;
pub type Comparator = fn(&AircraftRecord, &AircraftRecord, SortDirection) -> Ordering;

/// Declarative column: a field accessor plus an optional ordering override.
#[derive(Clone)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
    pub accessor: Accessor,
    pub comparator: Option<Comparator>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("custom_comparator", &self.comparator.is_some())
            .finish()
    }
}

impl Column {
    pub fn new(key: &'static str, title: &'static str, accessor: Accessor) -> Self {
        Self {
            key,
            title,
            accessor,
            comparator: None,
        }
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn cell(&self, record: &AircraftRecord) -> CellValue {
        (self.accessor)(record)
    }

    /// Uses the override when present, else natural ordering of the cell values
    /// reversed wholesale for a descending sort.
    pub fn compare(
        &self,
        a: &AircraftRecord,
        b: &AircraftRecord,
        direction: SortDirection,
    ) -> Ordering {
        match self.comparator {
            Some(comparator) => comparator(a, b, direction),
            None => direction.apply(self.cell(a).natural_cmp(&self.cell(b))),
        }
    }
}

fn int_cell(value: Option<i32>) -> CellValue {
    value.map_or(CellValue::Absent, |v| CellValue::Integer(i64::from(v)))
}

fn float_cell(value: Option<f64>) -> CellValue {
    value.map_or(CellValue::Absent, CellValue::Float)
}

/// ICAO, Call, Range, Heading, Altitude, Squawk, Speed, RSSI.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new("icao", "ICAO", |r| CellValue::Text(r.icao.to_string())),
        Column::new("call", "Call", |r| {
            r.callsign
                .clone()
                .map_or(CellValue::Absent, CellValue::Text)
        }),
        Column::new("rng", "Range (nm)", |r| float_cell(r.range)).with_comparator(compare_by_range),
        Column::new("hdg", "Heading", |r| int_cell(r.heading)).with_comparator(compare_by_heading),
        Column::new("alt", "Altitude", |r| int_cell(r.altitude))
            .with_comparator(compare_by_altitude),
        Column::new("xpdr", "Squawk", |r| {
            r.squawk
                .map_or(CellValue::Absent, |s| CellValue::Text(s.to_string()))
        }),
        Column::new("spd", "Speed", |r| int_cell(r.ground_speed)).with_comparator(compare_by_speed),
        Column::new("rssi", "RSSI", |r| float_cell(r.signal_strength))
            .with_comparator(compare_by_signal),
    ]
}
