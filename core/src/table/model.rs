use crate::feed::{AircraftRecord, FeedMetrics, IcaoAddress, Snapshot};
use crate::prelude::{TableError, TableResult};
use crate::table::column::{default_columns, Column};
use crate::table::ordering::SortDirection;
use log::debug;

/// Active ordering of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// What one [`LiveTableModel::on_snapshot`] call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotApplied {
    pub rows: usize,
    pub selection_cleared: bool,
}

/// Renderable state derived from the latest snapshot plus the local
/// selection and ordering. Only the latest snapshot is retained.
#[derive(Debug, Clone)]
pub struct LiveTableModel {
    columns: Vec<Column>,
    rows: Vec<AircraftRecord>,
    metrics: Option<FeedMetrics>,
    selection: Option<IcaoAddress>,
    sort: Option<SortState>,
    updates: u64,
}

impl Default for LiveTableModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTableModel {
    pub fn new() -> Self {
        Self::with_columns(default_columns())
    }

    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            metrics: None,
            selection: None,
            sort: None,
            updates: 0,
        }
    }

    /// Replaces rows and metrics in one step and reconciles the selection:
    /// kept if its aircraft is still present, cleared otherwise.
    pub fn on_snapshot(&mut self, snapshot: Snapshot) -> SnapshotApplied {
        let metrics = snapshot.metrics();
        let mut rows = snapshot.aircraft;
        if let Some(sort) = self.sort {
            sort_rows(&self.columns, sort, &mut rows);
        }
        let selection_cleared = self
            .selection
            .is_some_and(|icao| !rows.iter().any(|record| record.icao == icao));

        self.rows = rows;
        self.metrics = Some(metrics);
        if selection_cleared {
            self.selection = None;
        }
        self.updates += 1;

        debug!(
            "table update #{}: {} rows, selection cleared: {}",
            self.updates,
            self.rows.len(),
            selection_cleared
        );
        SnapshotApplied {
            rows: self.rows.len(),
            selection_cleared,
        }
    }

    pub fn select_row(&mut self, icao: IcaoAddress) -> TableResult<()> {
        if !self.rows.iter().any(|record| record.icao == icao) {
            return Err(TableError::SelectionNotFound(icao));
        }
        self.selection = Some(icao);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn sort_by(&mut self, column: &str, direction: SortDirection) -> TableResult<()> {
        let key = self
            .column(column)
            .map(|c| c.key)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;
        let sort = SortState {
            column: key,
            direction,
        };
        sort_rows(&self.columns, sort, &mut self.rows);
        self.sort = Some(sort);
        Ok(())
    }

    /// Ascending on a new column, flips direction on the active one.
    pub fn toggle_sort(&mut self, column: &str) -> TableResult<SortDirection> {
        let direction = match self.sort {
            Some(sort) if sort.column == column => sort.direction.flip(),
            _ => SortDirection::Ascending,
        };
        self.sort_by(column, direction)?;
        Ok(direction)
    }

    pub fn rows(&self) -> &[AircraftRecord] {
        &self.rows
    }

    pub fn metrics(&self) -> Option<&FeedMetrics> {
        self.metrics.as_ref()
    }

    pub fn selection(&self) -> Option<IcaoAddress> {
        self.selection
    }

    pub fn selected(&self) -> Option<&AircraftRecord> {
        let icao = self.selection?;
        self.rows.iter().find(|record| record.icao == icao)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Number of snapshots applied so far.
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    pub fn render_row(&self, record: &AircraftRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.cell(record).to_string())
            .collect()
    }
}

fn sort_rows(columns: &[Column], sort: SortState, rows: &mut [AircraftRecord]) {
    if let Some(column) = columns.iter().find(|column| column.key == sort.column) {
        rows.sort_by(|a, b| column.compare(a, b, sort.direction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use std::collections::HashSet;

    fn icao(text: &str) -> IcaoAddress {
        text.parse().unwrap()
    }

    fn snapshot(raw: &str) -> Snapshot {
        codec::decode(raw).unwrap()
    }

    fn order(model: &LiveTableModel) -> Vec<String> {
        model.rows().iter().map(|r| r.icao.to_string()).collect()
    }

    #[test]
    fn snapshot_replaces_rows_and_metrics() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(
            r#"{"good":5,"bad":1,"aircraft":[{"icao":"000001"},{"icao":"000002"},{"icao":"000003"}]}"#,
        ));
        let incoming = snapshot(r#"{"good":9,"bad":2,"modea":4,"aircraft":[{"icao":"000004"},{"icao":"000002"}]}"#);
        let expected: HashSet<IcaoAddress> = incoming.aircraft.iter().map(|r| r.icao).collect();

        let applied = model.on_snapshot(incoming);

        assert_eq!(applied.rows, 2);
        let actual: HashSet<IcaoAddress> = model.rows().iter().map(|r| r.icao).collect();
        assert_eq!(actual, expected);
        let metrics = model.metrics().unwrap();
        assert_eq!((metrics.good, metrics.bad, metrics.mode_a_count), (9, 2, 4));
        assert_eq!(metrics.total, 2);
        assert_eq!(model.update_count(), 2);
    }

    #[test]
    fn selection_survives_when_aircraft_still_present() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(r#"{"good":1,"bad":0,"aircraft":[{"icao":"abcdef"},{"icao":"000001"}]}"#));
        model.select_row(icao("abcdef")).unwrap();

        let applied =
            model.on_snapshot(snapshot(r#"{"good":1,"bad":0,"aircraft":[{"icao":"abcdef","alt":1000}]}"#));
        assert!(!applied.selection_cleared);
        assert_eq!(model.selection(), Some(icao("abcdef")));
        assert_eq!(model.selected().unwrap().altitude, Some(1000));
    }

    #[test]
    fn selection_clears_when_aircraft_leaves() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(r#"{"good":1,"bad":0,"aircraft":[{"icao":"abcdef"}]}"#));
        model.select_row(icao("abcdef")).unwrap();

        let applied = model.on_snapshot(snapshot(r#"{"good":1,"bad":0,"aircraft":[{"icao":"000001"}]}"#));
        assert!(applied.selection_cleared);
        assert_eq!(model.selection(), None);
        assert!(model.selected().is_none());
    }

    #[test]
    fn selecting_unknown_row_is_reported_and_keeps_selection() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(r#"{"good":1,"bad":0,"aircraft":[{"icao":"000001"}]}"#));
        model.select_row(icao("000001")).unwrap();
        assert_eq!(
            model.select_row(icao("ffffff")),
            Err(TableError::SelectionNotFound(icao("ffffff")))
        );
        assert_eq!(model.selection(), Some(icao("000001")));
        model.clear_selection();
        assert_eq!(model.selection(), None);
    }

    #[test]
    fn absent_range_stays_last_in_both_directions() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(
            r#"{"good":1,"bad":0,"aircraft":[{"icao":"00000a","rng":""},{"icao":"00000b","rng":12.4}]}"#,
        ));

        model.sort_by("rng", SortDirection::Ascending).unwrap();
        assert_eq!(order(&model), vec!["00000b", "00000a"]);

        model.sort_by("rng", SortDirection::Descending).unwrap();
        assert_eq!(order(&model), vec!["00000b", "00000a"]);
    }

    #[test]
    fn descending_range_orders_present_values_and_keeps_absent_last() {
        let mut model = LiveTableModel::new();
        model.sort_by("rng", SortDirection::Descending).unwrap();
        model.on_snapshot(snapshot(
            r#"{"good":1,"bad":0,"aircraft":[
                {"icao":"000001","rng":5.0},{"icao":"000002"},{"icao":"000003","rng":40.2},{"icao":"000004","rng":0.3}]}"#,
        ));
        assert_eq!(order(&model), vec!["000003", "000001", "000004", "000002"]);
    }

    #[test]
    fn toggle_sort_flips_direction_on_same_column() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(
            r#"{"good":1,"bad":0,"aircraft":[{"icao":"000002","call":"BAW1"},{"icao":"000001","call":"AAL7"}]}"#,
        ));
        assert_eq!(model.toggle_sort("call").unwrap(), SortDirection::Ascending);
        assert_eq!(order(&model), vec!["000001", "000002"]);
        assert_eq!(model.toggle_sort("call").unwrap(), SortDirection::Descending);
        assert_eq!(order(&model), vec!["000002", "000001"]);
        assert_eq!(model.toggle_sort("icao").unwrap(), SortDirection::Ascending);
        assert_eq!(
            model.sort_state(),
            Some(SortState {
                column: "icao",
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn unknown_column_is_rejected() {
        let mut model = LiveTableModel::new();
        assert_eq!(
            model.sort_by("lat", SortDirection::Ascending),
            Err(TableError::UnknownColumn("lat".into()))
        );
        assert_eq!(model.sort_state(), None);
    }

    #[test]
    fn unsorted_table_keeps_producer_order() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(
            r#"{"good":1,"bad":0,"aircraft":[{"icao":"00000c"},{"icao":"00000a"},{"icao":"00000b"}]}"#,
        ));
        assert_eq!(order(&model), vec!["00000c", "00000a", "00000b"]);
    }

    #[test]
    fn render_row_follows_column_order() {
        let mut model = LiveTableModel::new();
        model.on_snapshot(snapshot(
            r#"{"good":1,"bad":0,"aircraft":[{"icao":"a1b2c3","call":"N123","rng":3.24,"hdg":270,"alt":4500,"xpdr":0,"spd":110,"rssi":-12.3}]}"#,
        ));
        let row = model.render_row(&model.rows()[0]);
        assert_eq!(
            row,
            vec!["a1b2c3", "N123", "3.2", "270", "4500", "----", "110", "-12.3"]
        );
    }
}
