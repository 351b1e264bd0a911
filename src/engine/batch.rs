//! Пакетная обработка таблицы событий

use chrono::{DateTime, NaiveDateTime};
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::engine::{bucket, distributor, duration};
use crate::error::{AoristicError, Result};
use crate::types::{
    AoristicResponse, BatchOptions, ColumnSpec, Diagnostics, Event, OutputRow, WeightVector,
};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Результат пакета: строки в порядке входа и счётчики диагностики
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub rows: Vec<OutputRow>,
    pub diagnostics: Diagnostics,
}

impl OutputTable {
    pub fn skipped_rows(&self) -> Vec<usize> {
        self.rows.iter().filter(|r| r.skipped()).map(|r| r.row).collect()
    }

    pub fn into_payload(self) -> AoristicResponse {
        AoristicResponse {
            skipped_rows: self.skipped_rows(),
            rows: self.rows.iter().map(OutputRow::to_record).collect(),
            diagnostics: self.diagnostics,
        }
    }
}

pub fn run(table: &[Value], columns: &ColumnSpec) -> Result<OutputTable> {
    run_with(table, columns, &BatchOptions::default())
}

pub fn run_with(table: &[Value], columns: &ColumnSpec, options: &BatchOptions) -> Result<OutputTable> {
    let events = parse_events(table, columns)?;

    let processed: Vec<(OutputRow, Diagnostics)> = if options.parallel {
        events.into_par_iter().map(process_event).collect()
    } else {
        events.into_iter().map(process_event).collect()
    };

    let diagnostics: Diagnostics = processed.iter().map(|(_, d)| *d).sum();
    let rows: Vec<OutputRow> = processed.into_iter().map(|(row, _)| row).collect();

    tracing::info!(
        rows = rows.len(),
        missing_end = diagnostics.missing_end,
        logic_error = diagnostics.logic_error,
        rogue_na = diagnostics.rogue_na,
        unfixable = diagnostics.unfixable,
        skipped = diagnostics.skipped,
        "Aoristic batch done: {} missing end, {} end before start, {} repaired by one-second nudge, {} unfixable",
        diagnostics.missing_end,
        diagnostics.logic_error,
        diagnostics.rogue_na,
        diagnostics.unfixable,
    );

    Ok(OutputTable { rows, diagnostics })
}

/// Одна строка: ремонт длительности, затем распределение весов
pub fn process_event(event: Event) -> (OutputRow, Diagnostics) {
    let Some(start) = event.start else {
        tracing::warn!(row = event.row, "Start timestamp missing, row {} skipped with zero weights", event.row);
        return (
            OutputRow {
                row: event.row,
                fields: event.fields,
                duration_minutes: None,
                classification: None,
                weights: WeightVector::zeros(),
            },
            Diagnostics::skipped_row(),
        );
    };

    let record = duration::classify(&start, event.end.as_ref());
    let position = bucket::index_of(&record.start);
    let weights = distributor::distribute(Some(&position), &record);

    tracing::trace!(
        row = event.row,
        bucket = position.bucket.get(),
        duration = record.duration_minutes,
        classification = ?record.classification(),
        "Event weighted"
    );

    (
        OutputRow {
            row: event.row,
            fields: event.fields,
            duration_minutes: Some(record.duration_minutes),
            classification: Some(record.classification()),
            weights,
        },
        Diagnostics::from_flags(&record.flags),
    )
}

/// Проверка структуры таблицы и разбор меток; ошибки фатальны
pub fn parse_events(table: &[Value], columns: &ColumnSpec) -> Result<Vec<Event>> {
    for (role, name) in [
        ("x", &columns.x_col),
        ("y", &columns.y_col),
        ("start", &columns.start_col),
        ("end", &columns.end_col),
    ] {
        if name.trim().is_empty() {
            return Err(AoristicError::EmptyColumnName { role });
        }
    }

    let records: Vec<&Map<String, Value>> = table
        .iter()
        .enumerate()
        .map(|(row, value)| value.as_object().ok_or(AoristicError::NotTabular { row }))
        .collect::<Result<_>>()?;

    if !records.is_empty() {
        for column in [&columns.start_col, &columns.end_col] {
            if !records.iter().any(|r| r.contains_key(column.as_str())) {
                return Err(AoristicError::UnknownColumn {
                    column: column.clone(),
                });
            }
        }
    }

    records
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            Ok(Event {
                row,
                start: timestamp_cell(record, &columns.start_col, row)?,
                end: timestamp_cell(record, &columns.end_col, row)?,
                fields: record.clone(),
            })
        })
        .collect()
}

fn timestamp_cell(record: &Map<String, Value>, column: &str, row: usize) -> Result<Option<NaiveDateTime>> {
    match record.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| AoristicError::NotTimestamp {
                row,
                column: column.to_string(),
                value: text.clone(),
            }),
        Some(other) => Err(AoristicError::NotTimestamp {
            row,
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

/// RFC 3339 (смещение отбрасывается) или наивная дата-время
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
