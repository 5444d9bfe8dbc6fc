//! External Statistical Engine Results
//!
//! The engine is consumed only as "produces tabular results or fails".
//! A result is a [`RawTable`]: an ordered attribute list (for a data frame:
//! `names`, `row.names`, `class`) plus one homogeneous vector per column.
//!
//! Two sources ship with the crate:
//! - [`MemoryTableSource`] keeps results in memory and can simulate engine failures
//! - [`CsvTableSource`] reads data frames the engine exported as CSV files

use crate::error::EngineError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Position of the column names in a data frame's attribute list
pub const NAMES_ATTR: usize = 0;
/// Position of the row names in a data frame's attribute list
pub const ROW_NAMES_ATTR: usize = 1;
/// Position of the class tag in a data frame's attribute list
pub const CLASS_ATTR: usize = 2;

/// Class tag the engine puts on two-dimensional named tables
pub const DATA_FRAME_CLASS: &str = "data.frame";

/// One engine vector. `None` is the engine's missing value (NA).
#[derive(Debug, Clone, PartialEq)]
pub enum RawVector {
    Strings(Vec<Option<String>>),
    Doubles(Vec<f64>),
    Integers(Vec<i32>),
    Logicals(Vec<Option<bool>>),
}

impl RawVector {
    /// Builds a string vector with no missing values
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawVector::Strings(values.into_iter().map(|s| Some(s.into())).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            RawVector::Strings(v) => v.len(),
            RawVector::Doubles(v) => v.len(),
            RawVector::Integers(v) => v.len(),
            RawVector::Logicals(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Engine-side type name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawVector::Strings(_) => "character",
            RawVector::Doubles(_) => "double",
            RawVector::Integers(_) => "integer",
            RawVector::Logicals(_) => "logical",
        }
    }

    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match self {
            RawVector::Strings(v) => Some(v),
            _ => None,
        }
    }
}

/// A tabular result as returned by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Ordered `(name, value)` metadata attributes
    pub attributes: Vec<(String, RawVector)>,
    /// Column vectors in engine order
    pub columns: Vec<RawVector>,
}

impl RawTable {
    /// Builds a well-formed data frame of string columns
    pub fn data_frame<C, R>(
        column_names: C,
        row_names: R,
        columns: Vec<Vec<Option<String>>>,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            attributes: vec![
                ("names".to_string(), RawVector::strings(column_names)),
                ("row.names".to_string(), RawVector::strings(row_names)),
                ("class".to_string(), RawVector::strings([DATA_FRAME_CLASS])),
            ],
            columns: columns.into_iter().map(RawVector::Strings).collect(),
        }
    }

    /// Attribute at a fixed position of the metadata list
    pub fn attribute(&self, position: usize) -> Option<&RawVector> {
        self.attributes.get(position).map(|(_, v)| v)
    }
}

/// The external statistical engine, reduced to one call
pub trait TableSource {
    /// Runs the engine function and returns its tabular result
    fn fetch(&mut self, function: &str) -> Result<RawTable, EngineError>;
}

impl<T: TableSource + ?Sized> TableSource for Box<T> {
    fn fetch(&mut self, function: &str) -> Result<RawTable, EngineError> {
        (**self).fetch(function)
    }
}

/// What a [`MemoryTableSource`] answers for one function
#[derive(Debug, Clone)]
enum Canned {
    Table(RawTable),
    Failure(EngineError),
}

/// In-memory engine keyed by function name
#[derive(Debug, Clone, Default)]
pub struct MemoryTableSource {
    results: HashMap<String, Canned>,
    calls: Vec<String>,
}

impl MemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: impl Into<String>, table: RawTable) -> &mut Self {
        self.results.insert(function.into(), Canned::Table(table));
        self
    }

    /// Makes every fetch of `function` fail with `error`
    pub fn fail_with(&mut self, function: impl Into<String>, error: EngineError) -> &mut Self {
        self.results.insert(function.into(), Canned::Failure(error));
        self
    }

    /// Function names fetched so far, in call order
    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

impl TableSource for MemoryTableSource {
    fn fetch(&mut self, function: &str) -> Result<RawTable, EngineError> {
        self.calls.push(function.to_string());
        match self.results.get(function) {
            Some(Canned::Table(table)) => Ok(table.clone()),
            Some(Canned::Failure(error)) => Err(error.clone()),
            None => Err(EngineError::Execution {
                function: function.to_string(),
                message: "no such function".to_string(),
            }),
        }
    }
}

/// Reads data frames exported by the engine as `<dir>/<function>.csv`.
///
/// Layout is the engine's default CSV export: a header with an empty corner
/// cell followed by the column names, then one record per row starting with
/// the row name. Empty cells are missing values.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    dir: PathBuf,
}

impl CsvTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, function: &str) -> PathBuf {
        self.dir.join(format!("{function}.csv"))
    }

    fn read(&self, function: &str, path: &Path) -> Result<RawTable, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(path)?;

        let column_names: Vec<String> = reader.headers()?.iter().skip(1).map(String::from).collect();
        let mut row_names = Vec::new();
        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); column_names.len()];

        for record in reader.records() {
            let record = record?;
            let mut cells = record.iter();
            row_names.push(cells.next().unwrap_or_default().to_string());
            for (column, cell) in columns.iter_mut().zip(cells) {
                column.push(if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                });
            }
        }

        debug!(
            function,
            columns = column_names.len(),
            rows = row_names.len(),
            "Read engine export"
        );
        Ok(RawTable::data_frame(column_names, row_names, columns))
    }
}

impl TableSource for CsvTableSource {
    fn fetch(&mut self, function: &str) -> Result<RawTable, EngineError> {
        if !self.dir.is_dir() {
            return Err(EngineError::Startup(format!(
                "export directory {} does not exist",
                self.dir.display()
            )));
        }

        let path = self.path_for(function);
        self.read(function, &path)
            .map_err(|e| EngineError::Execution {
                function: function.to_string(),
                message: format!("{}: {e}", path.display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_frame_attribute_positions() {
        let raw = RawTable::data_frame(["a", "b"], ["r1"], vec![vec![None], vec![None]]);
        assert_eq!(raw.attribute(NAMES_ATTR), Some(&RawVector::strings(["a", "b"])));
        assert_eq!(raw.attribute(ROW_NAMES_ATTR), Some(&RawVector::strings(["r1"])));
        assert_eq!(
            raw.attribute(CLASS_ATTR),
            Some(&RawVector::strings([DATA_FRAME_CLASS]))
        );
        assert_eq!(raw.attributes[CLASS_ATTR].0, "class");
        assert!(raw.attribute(3).is_none());
    }

    #[test]
    fn test_memory_source_records_calls_and_failures() {
        let mut source = MemoryTableSource::new();
        source
            .insert("ok", RawTable::default())
            .fail_with("broken", EngineError::LibraryNotFound("libengine.so".into()));

        assert!(source.fetch("ok").is_ok());
        assert!(matches!(
            source.fetch("broken"),
            Err(EngineError::LibraryNotFound(name)) if name == "libengine.so"
        ));
        assert!(matches!(
            source.fetch("missing"),
            Err(EngineError::Execution { .. })
        ));
        assert_eq!(source.calls(), ["ok", "broken", "missing"]);
    }

    #[test]
    fn test_vector_type_names() {
        assert_eq!(RawVector::Doubles(vec![1.0]).type_name(), "double");
        assert_eq!(RawVector::Integers(vec![]).type_name(), "integer");
        assert!(RawVector::Logicals(vec![]).is_empty());
        assert!(RawVector::Doubles(vec![]).as_strings().is_none());
    }
}
