// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Column transform engine.
//!
//! Applies the per-column transform chains of a pipeline to a frame, cell by
//! cell, and projects the frame onto the pipeline's columns in declaration
//! order. Nulls pass through every transform unchanged.
//!

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::NodeError;
use crate::model::{Cell, Column, ColumnType, Frame, Transform};

/// A compiled transform, ready to apply to cells.
enum Op {
    Cast(ColumnType),
    Trim,
    Upper,
    Lower,
    RegexReplace(Regex, String),
    Split(String, i64),
    Substring(i64, Option<i64>),
    DateFormat(String),
}

impl Op {
    fn compile(transform: &Transform) -> Result<Self, String> {
        Ok(match transform {
            Transform::Cast { target_type } => Op::Cast(*target_type),
            Transform::Trim => Op::Trim,
            Transform::Upper => Op::Upper,
            Transform::Lower => Op::Lower,
            Transform::RegexReplace {
                pattern,
                replacement,
            } => {
                let regex = Regex::new(pattern)
                    .map_err(|error| format!("invalid pattern {}: {}", pattern, error))?;
                Op::RegexReplace(regex, replacement.clone())
            }
            Transform::Split { delimiter, index } => Op::Split(delimiter.clone(), *index),
            Transform::Substring { start, length } => Op::Substring(*start, *length),
            Transform::DateFormat { input_format } => Op::DateFormat(input_format.clone()),
        })
    }

    fn apply(&self, cell: Cell) -> Result<Cell, String> {
        if cell.is_null() {
            return Ok(Cell::Null);
        }
        match self {
            Op::Cast(target) => cast(cell, *target),
            Op::Trim => string_op(cell, |s| Cell::Str(s.trim().to_owned())),
            Op::Upper => string_op(cell, |s| Cell::Str(s.to_uppercase())),
            Op::Lower => string_op(cell, |s| Cell::Str(s.to_lowercase())),
            Op::RegexReplace(regex, replacement) => string_op(cell, |s| {
                Cell::Str(regex.replace_all(s, replacement.as_str()).into_owned())
            }),
            Op::Split(delimiter, index) => {
                let (delimiter, index) = (delimiter.clone(), *index);
                try_string_op(cell, |s| {
                    let parts: Vec<&str> = s.split(delimiter.as_str()).collect();
                    Ok(match resolve_index(index, parts.len()) {
                        Some(idx) => Cell::Str(parts[idx].to_owned()),
                        None => Cell::Null,
                    })
                })
            }
            Op::Substring(start, length) => {
                let (start, length) = (*start, *length);
                try_string_op(cell, |s| {
                    let chars: Vec<char> = s.chars().collect();
                    let begin = if start < 0 {
                        chars.len().saturating_sub(start.unsigned_abs() as usize)
                    } else {
                        (start as usize).min(chars.len())
                    };
                    let end = match length {
                        Some(len) if len >= 0 => (begin + len as usize).min(chars.len()),
                        Some(_) => return Err("negative length".to_owned()),
                        None => chars.len(),
                    };
                    Ok(Cell::Str(chars[begin..end].iter().collect()))
                })
            }
            Op::DateFormat(format) => try_string_op(cell, |s| {
                if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
                    return Ok(Cell::Timestamp(ts));
                }
                let date = NaiveDate::parse_from_str(s, format)
                    .map_err(|error| format!("cannot parse {:?} with {}: {}", s, format, error))?;
                Ok(Cell::Timestamp(midnight(date)))
            }),
        }
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let idx = if index < 0 {
        (len as i64).checked_add(index)?
    } else {
        index
    };
    if idx < 0 || idx as usize >= len {
        None
    } else {
        Some(idx as usize)
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

fn string_op(cell: Cell, op: impl Fn(&str) -> Cell) -> Result<Cell, String> {
    try_string_op(cell, |s| Ok(op(s)))
}

fn try_string_op(cell: Cell, op: impl Fn(&str) -> Result<Cell, String>) -> Result<Cell, String> {
    match cell {
        Cell::Str(s) => op(&s),
        other => Err(format!("expected a string cell, got {:?}", other)),
    }
}

fn cast(cell: Cell, target: ColumnType) -> Result<Cell, String> {
    // Empty strings become null for every non-string target.
    if let Cell::Str(s) = &cell {
        if target != ColumnType::String && s.trim().is_empty() {
            return Ok(Cell::Null);
        }
    }
    match target {
        ColumnType::String => Ok(match cell {
            Cell::Str(_) => cell,
            other => other
                .to_param()
                .map(Cell::Str)
                .unwrap_or(Cell::Null),
        }),
        ColumnType::Integer => match cell {
            Cell::Int(_) => Ok(cell),
            Cell::Bool(b) => Ok(Cell::Int(i64::from(b))),
            Cell::Float(f) if f.is_finite() => Ok(Cell::Int(f.trunc() as i64)),
            Cell::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Cell::Int)
                .map_err(|_| format!("cannot cast {:?} to integer", s)),
            other => Err(format!("cannot cast {:?} to integer", other)),
        },
        ColumnType::Float => match cell {
            Cell::Float(_) => Ok(cell),
            Cell::Int(i) => Ok(Cell::Float(i as f64)),
            Cell::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Cell::Float)
                .map_err(|_| format!("cannot cast {:?} to float", s)),
            other => Err(format!("cannot cast {:?} to float", other)),
        },
        ColumnType::Boolean => match cell {
            Cell::Bool(_) => Ok(cell),
            Cell::Int(0) => Ok(Cell::Bool(false)),
            Cell::Int(1) => Ok(Cell::Bool(true)),
            Cell::Str(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(Cell::Bool(true)),
                "false" | "0" => Ok(Cell::Bool(false)),
                _ => Err(format!("cannot cast {:?} to boolean", s)),
            },
            other => Err(format!("cannot cast {:?} to boolean", other)),
        },
        ColumnType::Date => match cell {
            Cell::Date(_) => Ok(cell),
            Cell::Timestamp(ts) => Ok(Cell::Date(ts.date())),
            Cell::Str(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Cell::Date)
                .map_err(|_| format!("cannot cast {:?} to date", s)),
            other => Err(format!("cannot cast {:?} to date", other)),
        },
        ColumnType::Timestamp => match cell {
            Cell::Timestamp(_) => Ok(cell),
            Cell::Date(d) => Ok(Cell::Timestamp(midnight(d))),
            Cell::Str(s) => parse_timestamp(s.trim())
                .map(Cell::Timestamp)
                .ok_or_else(|| format!("cannot cast {:?} to timestamp", s)),
            other => Err(format!("cannot cast {:?} to timestamp", other)),
        },
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(midnight))
}

/// Engine applying pipeline transform chains to frames.
pub struct TransformEngine;

impl TransformEngine {
    /// Project the frame onto the pipeline columns, in order, and apply each
    /// column's transform chain to every cell.
    ///
    /// # Errors
    ///
    /// * `NodeError::Transform` - Missing column, invalid pattern, or a cell
    ///   a transform cannot be applied to.
    pub fn apply(frame: &Frame, columns: &[Column]) -> Result<Frame, NodeError> {
        let mut indices = Vec::with_capacity(columns.len());
        let mut chains = Vec::with_capacity(columns.len());
        for column in columns {
            let idx = frame.column_index(&column.name).ok_or_else(|| {
                NodeError::Transform(format!("column {} not found in fetched data", column.name))
            })?;
            let ops: Vec<Op> = column
                .transforms
                .iter()
                .map(Op::compile)
                .collect::<Result<_, _>>()
                .map_err(|error| {
                    NodeError::Transform(format!("column {}: {}", column.name, error))
                })?;
            indices.push(idx);
            chains.push(ops);
        }

        let names = columns.iter().map(|c| c.name.clone()).collect();
        let mut rows = Vec::with_capacity(frame.num_rows());
        for (row_idx, row) in frame.rows().iter().enumerate() {
            let mut out = Vec::with_capacity(columns.len());
            for (pos, column) in columns.iter().enumerate() {
                let mut cell = row[indices[pos]].clone();
                for op in &chains[pos] {
                    cell = op.apply(cell).map_err(|error| {
                        NodeError::Transform(format!(
                            "column {} row {}: {}",
                            column.name, row_idx, error
                        ))
                    })?;
                }
                out.push(cell);
            }
            rows.push(out);
        }

        Frame::new(names, rows).map_err(NodeError::Transform)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn str_cell(s: &str) -> Cell {
        Cell::Str(s.to_owned())
    }

    fn apply_one(transform: Transform, cell: Cell) -> Result<Cell, String> {
        Op::compile(&transform).unwrap().apply(cell)
    }

    #[test]
    fn test_cast_string_to_integer() {
        let out = apply_one(
            Transform::Cast {
                target_type: ColumnType::Integer,
            },
            str_cell("42"),
        )
        .unwrap();
        assert_eq!(out, Cell::Int(42));
    }

    #[test]
    fn test_cast_empty_string_to_null() {
        let out = apply_one(
            Transform::Cast {
                target_type: ColumnType::Float,
            },
            str_cell("  "),
        )
        .unwrap();
        assert_eq!(out, Cell::Null);
    }

    #[test]
    fn test_cast_invalid_integer_fails() {
        let result = apply_one(
            Transform::Cast {
                target_type: ColumnType::Integer,
            },
            str_cell("abc"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cast_string_to_date_and_timestamp() {
        let out = apply_one(
            Transform::Cast {
                target_type: ColumnType::Date,
            },
            str_cell("2024-03-01"),
        )
        .unwrap();
        assert_eq!(out, Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));

        let out = apply_one(
            Transform::Cast {
                target_type: ColumnType::Timestamp,
            },
            str_cell("2024-03-01 10:30:00"),
        )
        .unwrap();
        let Cell::Timestamp(ts) = out else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.to_string(), "2024-03-01 10:30:00");
    }

    #[test]
    fn test_trim_upper_lower() {
        assert_eq!(apply_one(Transform::Trim, str_cell("  hello  ")).unwrap(), str_cell("hello"));
        assert_eq!(apply_one(Transform::Upper, str_cell("World")).unwrap(), str_cell("WORLD"));
        assert_eq!(apply_one(Transform::Lower, str_cell("HELLO")).unwrap(), str_cell("hello"));
    }

    #[test]
    fn test_regex_replace() {
        let transform = Transform::RegexReplace {
            pattern: r"\d+".to_owned(),
            replacement: "X".to_owned(),
        };
        assert_eq!(
            apply_one(transform.clone(), str_cell("abc123def")).unwrap(),
            str_cell("abcXdef")
        );
        assert_eq!(
            apply_one(transform, str_cell("no numbers")).unwrap(),
            str_cell("no numbers")
        );
    }

    #[test]
    fn test_regex_invalid_pattern() {
        let result = Op::compile(&Transform::RegexReplace {
            pattern: "(".to_owned(),
            replacement: String::new(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_split_in_and_out_of_bounds() {
        let at = |index| Transform::Split {
            delimiter: ",".to_owned(),
            index,
        };
        assert_eq!(apply_one(at(0), str_cell("a,b,c")).unwrap(), str_cell("a"));
        assert_eq!(apply_one(at(1), str_cell("a,b,c")).unwrap(), str_cell("b"));
        assert_eq!(apply_one(at(-1), str_cell("a,b,c")).unwrap(), str_cell("c"));
        // Out of bounds yields null.
        assert_eq!(apply_one(at(5), str_cell("a,b")).unwrap(), Cell::Null);
        assert_eq!(apply_one(at(1), str_cell("single")).unwrap(), Cell::Null);
    }

    #[test]
    fn test_substring() {
        let sub = |start, length| Transform::Substring { start, length };
        assert_eq!(apply_one(sub(2, None), str_cell("hello")).unwrap(), str_cell("llo"));
        assert_eq!(apply_one(sub(1, Some(3)), str_cell("hello")).unwrap(), str_cell("ell"));
        assert_eq!(apply_one(sub(2, None), str_cell("hi")).unwrap(), str_cell(""));
        assert_eq!(apply_one(sub(-3, Some(2)), str_cell("hello")).unwrap(), str_cell("ll"));
    }

    #[test]
    fn test_date_format() {
        let transform = Transform::DateFormat {
            input_format: "%d/%m/%Y".to_owned(),
        };
        let out = apply_one(transform, str_cell("01/03/2024")).unwrap();
        let Cell::Timestamp(ts) = out else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(apply_one(Transform::Upper, Cell::Null).unwrap(), Cell::Null);
        assert_eq!(
            apply_one(
                Transform::Cast {
                    target_type: ColumnType::Integer
                },
                Cell::Null
            )
            .unwrap(),
            Cell::Null
        );
    }

    #[test]
    fn test_string_transform_on_non_string_fails() {
        assert!(apply_one(Transform::Trim, Cell::Int(5)).is_err());
    }

    #[test]
    fn test_engine_applies_chains_and_projects_columns() {
        let frame = Frame::from_records(
            vec!["extra".to_owned(), "name".to_owned(), "age".to_owned()],
            vec![
                vec!["x".to_owned(), "  john  ".to_owned(), "25".to_owned()],
                vec!["y".to_owned(), "  JANE  ".to_owned(), "30".to_owned()],
            ],
        );
        let columns = vec![
            Column {
                name: "name".to_owned(),
                kind: ColumnType::String,
                transforms: vec![Transform::Trim, Transform::Upper],
            },
            Column {
                name: "age".to_owned(),
                kind: ColumnType::Integer,
                transforms: vec![Transform::Cast {
                    target_type: ColumnType::Integer,
                }],
            },
        ];

        let out = TransformEngine::apply(&frame, &columns).unwrap();

        assert_eq!(out.columns(), ["name".to_owned(), "age".to_owned()]);
        assert_eq!(out.rows()[0], vec![str_cell("JOHN"), Cell::Int(25)]);
        assert_eq!(out.rows()[1], vec![str_cell("JANE"), Cell::Int(30)]);
    }

    #[test]
    fn test_engine_missing_column() {
        let frame = Frame::from_records(vec!["a".to_owned()], vec![]);
        let columns = vec![Column {
            name: "b".to_owned(),
            kind: ColumnType::String,
            transforms: vec![],
        }];
        let result = TransformEngine::apply(&frame, &columns);
        assert!(matches!(result, Err(NodeError::Transform(_))));
    }

    #[test]
    fn test_engine_error_names_column_and_row() {
        let frame = Frame::from_records(
            vec!["age".to_owned()],
            vec![vec!["25".to_owned()], vec!["oops".to_owned()]],
        );
        let columns = vec![Column {
            name: "age".to_owned(),
            kind: ColumnType::Integer,
            transforms: vec![Transform::Cast {
                target_type: ColumnType::Integer,
            }],
        }];
        let Err(NodeError::Transform(message)) = TransformEngine::apply(&frame, &columns) else {
            panic!("expected transform error");
        };
        assert!(message.contains("age"));
        assert!(message.contains("row 1"));
    }
}
