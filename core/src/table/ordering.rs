use crate::feed::AircraftRecord;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Null-aware ordering for optional numeric columns.
///
/// An absent value sorts after every present value in both directions and two
/// absent values are equal. Only the present-vs-present branch honours
/// `direction`.
pub fn compare_optional<T: PartialOrd>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => direction.apply(a.partial_cmp(&b).unwrap_or(Ordering::Equal)),
    }
}

pub fn compare_by_range(a: &AircraftRecord, b: &AircraftRecord, direction: SortDirection) -> Ordering {
    compare_optional(a.range, b.range, direction)
}

pub fn compare_by_altitude(
    a: &AircraftRecord,
    b: &AircraftRecord,
    direction: SortDirection,
) -> Ordering {
    compare_optional(a.altitude, b.altitude, direction)
}

pub fn compare_by_heading(
    a: &AircraftRecord,
    b: &AircraftRecord,
    direction: SortDirection,
) -> Ordering {
    compare_optional(a.heading, b.heading, direction)
}

pub fn compare_by_speed(a: &AircraftRecord, b: &AircraftRecord, direction: SortDirection) -> Ordering {
    compare_optional(a.ground_speed, b.ground_speed, direction)
}

pub fn compare_by_signal(
    a: &AircraftRecord,
    b: &AircraftRecord,
    direction: SortDirection,
) -> Ordering {
    compare_optional(a.signal_strength, b.signal_strength, direction)
}
