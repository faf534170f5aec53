//! LiveTableModel: the renderable, sortable, selectable view of the latest snapshot.

pub mod column;
pub mod model;
pub mod ordering;

pub use column::{default_columns, Accessor, CellValue, Column, Comparator};
pub use model::{LiveTableModel, SnapshotApplied, SortState};
pub use ordering::{compare_by_range, compare_optional, SortDirection};
