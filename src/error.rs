//! Ошибки структуры входной таблицы

use thiserror::Error;

/// Фатальные ошибки; проверяются до обработки первой строки
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AoristicError {
    #[error("row {row} is not an object; input must be a table of records")]
    NotTabular { row: usize },
    #[error("column name for {role} is empty")]
    EmptyColumnName { role: &'static str },
    #[error("column `{column}` is not present in any row")]
    UnknownColumn { column: String },
    #[error("row {row}, column `{column}`: `{value}` is not a timestamp")]
    NotTimestamp {
        row: usize,
        column: String,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, AoristicError>;
