//! Instrumentation for planning runs, collected into column-oriented tables.
//!
//! A `tracing` subscriber turns every event into a row of the table named by
//! its target, and every closed span into a row of the [`PERFORMANCE_TABLE`]
//! (`function`, `elapsed_us`). Schema emerges from the recorded fields.
//!
//! # Usage
//!
//! ```ignore
//! // In engine code:
//! tracing::info!(target: "feasible_path", length, expected_value);
//!
//! // In a test:
//! let (outcome, recorder) = instrument::record(|| max_value_path(&graph, &query));
//! let paths = &recorder.tables["feasible_path"];
//! let timings = instrument::performance_summary(&recorder)?;
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// Table receiving one row per closed span.
pub const PERFORMANCE_TABLE: &str = "performance";

/// A column of typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extend with default values up to `len` rows.
    fn pad_to(&mut self, len: usize) {
        let missing = len.saturating_sub(self.len());
        match self {
            TypedColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TypedColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TypedColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// A table with dynamically-typed columns, kept rectangular.
#[derive(Debug, Clone, Default)]
pub struct DynamicTable {
    pub columns: HashMap<String, TypedColumn>,
    pub row_count: usize,
}

impl DynamicTable {
    /// Start a row, fill it through `fill`, then pad columns the row skipped.
    fn push_row(&mut self, fill: impl FnOnce(&mut RowWriter<'_>)) {
        let row = self.row_count;
        fill(&mut RowWriter { table: self, row });
        self.row_count += 1;
        let rows = self.row_count;
        for col in self.columns.values_mut() {
            col.pad_to(rows);
        }
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.get(name)
    }
}

/// Writes fields of a single row; new columns are back-filled with defaults.
struct RowWriter<'a> {
    table: &'a mut DynamicTable,
    row: usize,
}

impl RowWriter<'_> {
    fn column(&mut self, name: &str, empty: fn() -> TypedColumn) -> &mut TypedColumn {
        let row = self.row;
        let col = self
            .table
            .columns
            .entry(name.to_string())
            .or_insert_with(empty);
        col.pad_to(row);
        col
    }

    fn u64(&mut self, name: &str, value: u64) {
        if let TypedColumn::U64(v) = self.column(name, || TypedColumn::U64(Vec::new())) {
            v.push(value);
        }
    }

    fn i64(&mut self, name: &str, value: i64) {
        if let TypedColumn::I64(v) = self.column(name, || TypedColumn::I64(Vec::new())) {
            v.push(value);
        }
    }

    fn f64(&mut self, name: &str, value: f64) {
        if let TypedColumn::F64(v) = self.column(name, || TypedColumn::F64(Vec::new())) {
            v.push(value);
        }
    }

    fn bool(&mut self, name: &str, value: bool) {
        if let TypedColumn::Bool(v) = self.column(name, || TypedColumn::Bool(Vec::new())) {
            v.push(value);
        }
    }

    fn str(&mut self, name: &str, value: &str) {
        if let TypedColumn::Str(v) = self.column(name, || TypedColumn::Str(Vec::new())) {
            v.push(value.to_string());
        }
    }
}

impl Visit for RowWriter<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.u64(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.i64(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.f64(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.bool(field.name(), value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.str(field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.str(field.name(), &format!("{:?}", value));
    }
}

/// Collection of tables, keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: HashMap<String, DynamicTable>,
}

impl Recorder {
    pub fn rows(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |t| t.row_count)
    }
}

/// Busy time of an open span
struct SpanTiming {
    name: &'static str,
    entered: Option<Instant>,
    busy: Duration,
    /// Live handles; the row is written when the last one closes
    refs: usize,
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
    static SPANS: RefCell<HashMap<u64, SpanTiming>> = RefCell::default();
}

static NEXT_SPAN_ID: AtomicU64 = AtomicU64::new(1);

/// Tracing subscriber that collects planning events and span timings.
pub struct PlanningSubscriber;

impl Subscriber for PlanningSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        // Spans and info-or-more-severe events; debug/trace are dropped
        *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, span: &Attributes<'_>) -> Id {
        let id = NEXT_SPAN_ID.fetch_add(1, Ordering::Relaxed);
        SPANS.with(|s| {
            s.borrow_mut().insert(
                id,
                SpanTiming {
                    name: span.metadata().name(),
                    entered: None,
                    busy: Duration::ZERO,
                    refs: 1,
                },
            )
        });
        Id::from_u64(id)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {
        // Span fields are not tabulated
    }

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();
        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            let table = recorder.tables.entry(target).or_default();
            table.push_row(|row| event.record(row));
        });
    }

    fn enter(&self, span: &Id) {
        SPANS.with(|s| {
            if let Some(timing) = s.borrow_mut().get_mut(&span.into_u64()) {
                timing.entered = Some(Instant::now());
            }
        });
    }

    fn exit(&self, span: &Id) {
        SPANS.with(|s| {
            if let Some(timing) = s.borrow_mut().get_mut(&span.into_u64()) {
                if let Some(entered) = timing.entered.take() {
                    timing.busy += entered.elapsed();
                }
            }
        });
    }

    fn clone_span(&self, span: &Id) -> Id {
        SPANS.with(|s| {
            if let Some(timing) = s.borrow_mut().get_mut(&span.into_u64()) {
                timing.refs += 1;
            }
        });
        span.clone()
    }

    fn try_close(&self, span: Id) -> bool {
        let closed = SPANS.with(|s| {
            let mut spans = s.borrow_mut();
            let timing = spans.get_mut(&span.into_u64())?;
            timing.refs -= 1;
            if timing.refs > 0 {
                return None;
            }
            spans.remove(&span.into_u64())
        });
        let Some(timing) = closed else {
            return false;
        };
        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            let table = recorder
                .tables
                .entry(PERFORMANCE_TABLE.to_string())
                .or_default();
            table.push_row(|row| {
                row.str("function", timing.name);
                row.u64("elapsed_us", timing.busy.as_micros() as u64);
            });
        });
        true
    }
}

/// Run `f` with the planning subscriber installed on this thread.
/// Returns the closure's result and everything it recorded.
pub fn record<T>(f: impl FnOnce() -> T) -> (T, Recorder) {
    clear();
    let result = tracing::subscriber::with_default(PlanningSubscriber, f);
    (result, drain())
}

/// Drain all recorded data from the thread-local recorder.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

/// Clear all recorded data without returning it.
pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

// === Polars Integration ===

use polars::prelude::*;

impl DynamicTable {
    /// Convert this table to a polars DataFrame.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|(name, col)| match col {
                TypedColumn::U64(v) => Column::new(name.into(), v),
                TypedColumn::I64(v) => Column::new(name.into(), v),
                TypedColumn::F64(v) => Column::new(name.into(), v),
                TypedColumn::Bool(v) => Column::new(name.into(), v),
                TypedColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();

        DataFrame::new(columns)
    }
}

impl Recorder {
    /// Convert all tables to polars DataFrames.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}

/// Per-function call count and total / mean busy time, slowest first.
pub fn performance_summary(recorder: &Recorder) -> PolarsResult<DataFrame> {
    let Some(table) = recorder.tables.get(PERFORMANCE_TABLE) else {
        return DataFrame::new(Vec::new());
    };

    table
        .to_dataframe()?
        .lazy()
        .group_by([col("function")])
        .agg([
            col("elapsed_us").count().alias("calls"),
            col("elapsed_us").sum().alias("total_us"),
            col("elapsed_us").mean().alias("mean_us"),
        ])
        .sort(["total_us"], SortMultipleOptions::default().with_order_descending(true))
        .collect()
}
