//! Columnar Table
//!
//! Rectangular, immutable container addressed as `value(column, row)` with
//! parallel column and row name lists. Sizes are given columns first: a
//! 5x2 table has 5 columns and 2 rows. Storage is column-major because the
//! engine keeps every column homogeneous while rows carry no type
//! guarantee, and engine vectors are cheap to walk by column.

use crate::error::{Axis, HeadmapError, Result};
use crate::source::{RawTable, RawVector, CLASS_ATTR, DATA_FRAME_CLASS, NAMES_ATTR, ROW_NAMES_ATTR};
use indexmap::IndexMap;

/// Table of engine strings; `None` cells are missing values
pub type StringTable = Table<Option<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    columns: Vec<Vec<T>>,
    column_names: Vec<String>,
    row_names: Vec<String>,
}

impl<T> Table<T> {
    /// Builds a table from column vectors and both name lists.
    ///
    /// Fails with [`HeadmapError::DimensionMismatch`] when the data has no
    /// column or no row, when a name list disagrees with the data, or when
    /// the columns are ragged.
    pub fn from_columns(
        columns: Vec<Vec<T>>,
        column_names: Vec<String>,
        row_names: Vec<String>,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(HeadmapError::DimensionMismatch {
                axis: Axis::Column,
                names: column_names.len(),
                data: 0,
            });
        }
        if column_names.len() != columns.len() {
            return Err(HeadmapError::DimensionMismatch {
                axis: Axis::Column,
                names: column_names.len(),
                data: columns.len(),
            });
        }
        let rows = columns[0].len();
        if rows == 0 || row_names.len() != rows {
            return Err(HeadmapError::DimensionMismatch {
                axis: Axis::Row,
                names: row_names.len(),
                data: rows,
            });
        }
        if let Some(ragged) = columns.iter().find(|c| c.len() != rows) {
            return Err(HeadmapError::DimensionMismatch {
                axis: Axis::Row,
                names: row_names.len(),
                data: ragged.len(),
            });
        }

        Ok(Self {
            columns,
            column_names,
            row_names,
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    /// All column vectors, column-major
    pub fn columns(&self) -> &[Vec<T>] {
        &self.columns
    }

    /// Borrows one column without copying
    pub fn column(&self, index: usize) -> Result<&[T]> {
        self.check(Axis::Column, index)?;
        Ok(&self.columns[index])
    }

    pub fn value(&self, column: usize, row: usize) -> Result<&T> {
        self.check(Axis::Column, column)?;
        self.check(Axis::Row, row)?;
        Ok(&self.columns[column][row])
    }

    /// Column name -> (row name -> value), both in table order
    pub fn to_nested_map(&self) -> IndexMap<&str, IndexMap<&str, &T>> {
        self.column_names
            .iter()
            .zip(&self.columns)
            .map(|(column_name, column)| {
                let cells = self
                    .row_names
                    .iter()
                    .map(String::as_str)
                    .zip(column.iter())
                    .collect();
                (column_name.as_str(), cells)
            })
            .collect()
    }

    fn check(&self, axis: Axis, index: usize) -> Result<()> {
        let len = match axis {
            Axis::Column => self.column_count(),
            Axis::Row => self.row_count(),
        };
        if index >= len {
            return Err(HeadmapError::OutOfRange { axis, index, len });
        }
        Ok(())
    }
}

impl<T: Clone> Table<T> {
    /// Table of the given name shape with `default` in every cell
    pub fn filled(default: T, column_names: Vec<String>, row_names: Vec<String>) -> Self {
        let columns = vec![vec![default; row_names.len()]; column_names.len()];
        Self {
            columns,
            column_names,
            row_names,
        }
    }

    /// Copies one row out of every column. Costs one read per column,
    /// unlike [`Table::column`].
    pub fn row(&self, index: usize) -> Result<Vec<T>> {
        self.check(Axis::Row, index)?;
        Ok(self.columns.iter().map(|c| c[index].clone()).collect())
    }
}

impl<T: Clone + Default> Table<T> {
    /// Empty `columns` x `rows` table named `var0`, `var1`, ... on both axes
    pub fn empty(columns: usize, rows: usize) -> Self {
        Self::filled(T::default(), placeholder_names(columns), placeholder_names(rows))
    }
}

impl StringTable {
    /// Validates an engine result as a named data frame of string columns
    /// and copies it into a table.
    pub fn from_source(raw: &RawTable) -> Result<Self> {
        let class = string_attribute(raw, CLASS_ATTR, "class")?;
        let is_data_frame = class
            .iter()
            .flatten()
            .any(|c| c.to_lowercase().contains(DATA_FRAME_CLASS));
        if !is_data_frame {
            return Err(HeadmapError::ShapeMismatch(format!(
                "expected a {DATA_FRAME_CLASS}, engine returned class {class:?}"
            )));
        }

        let column_names = name_list(string_attribute(raw, NAMES_ATTR, "column names")?);
        let row_names = name_list(string_attribute(raw, ROW_NAMES_ATTR, "row names")?);

        if raw.columns.len() != column_names.len() {
            return Err(HeadmapError::ShapeMismatch(format!(
                "{} column names for {} columns",
                column_names.len(),
                raw.columns.len()
            )));
        }

        let mut columns = Vec::with_capacity(raw.columns.len());
        for (name, vector) in column_names.iter().zip(&raw.columns) {
            let RawVector::Strings(cells) = vector else {
                return Err(HeadmapError::ShapeMismatch(format!(
                    "column `{name}` holds {} values, only character columns are supported",
                    vector.type_name()
                )));
            };
            if cells.len() != row_names.len() {
                return Err(HeadmapError::ShapeMismatch(format!(
                    "column `{name}` has {} cells for {} row names",
                    cells.len(),
                    row_names.len()
                )));
            }
            columns.push(cells.clone());
        }

        Ok(Self {
            columns,
            column_names,
            row_names,
        })
    }
}

fn string_attribute<'a>(
    raw: &'a RawTable,
    position: usize,
    what: &str,
) -> Result<&'a [Option<String>]> {
    let vector = raw.attribute(position).ok_or_else(|| {
        HeadmapError::ShapeMismatch(format!("missing {what} attribute at position {position}"))
    })?;
    vector.as_strings().ok_or_else(|| {
        HeadmapError::ShapeMismatch(format!(
            "{what} attribute holds {} values",
            vector.type_name()
        ))
    })
}

fn name_list(names: &[Option<String>]) -> Vec<String> {
    names.iter().map(|n| n.clone().unwrap_or_default()).collect()
}

fn placeholder_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("var{i}")).collect()
}
