use serde::Serialize;
use std::hash::{Hash, Hasher};

/// One measurement site of a head (a surface 10-20 electrode, a Brodmann
/// area, ...) with its optional number and optional dominant band.
///
/// Identity is the name alone: equality and hashing ignore the value
/// fields. Non-finite numbers are never observable; they read back as
/// absent.
#[derive(Debug, Clone, Serialize)]
pub struct HeadCell {
    name: String,
    #[serde(rename = "value")]
    number: Option<f64>,
    #[serde(rename = "band")]
    dominant_band: Option<String>,
}

impl HeadCell {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: None,
            dominant_band: None,
        }
    }

    pub fn with_value(name: impl Into<String>, number: Option<f64>) -> Self {
        let mut cell = Self::new(name);
        cell.set_number(number);
        cell
    }

    pub fn with_value_and_band(
        name: impl Into<String>,
        number: Option<f64>,
        dominant_band: impl Into<String>,
    ) -> Self {
        let mut cell = Self::with_value(name, number);
        cell.dominant_band = Some(dominant_band.into());
        cell
    }

    /// For cells whose dominant band never changes
    pub fn with_band(name: impl Into<String>, permanent_band: impl Into<String>) -> Self {
        let mut cell = Self::new(name);
        cell.dominant_band = Some(permanent_band.into());
        cell
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> Option<f64> {
        self.number.filter(|n| n.is_finite())
    }

    pub fn set_number(&mut self, number: Option<f64>) {
        self.number = number.filter(|n| n.is_finite());
    }

    pub fn dominant_band(&self) -> Option<&str> {
        self.dominant_band.as_deref()
    }

    pub fn set_dominant_band(&mut self, band: Option<String>) {
        self.dominant_band = band;
    }
}

impl PartialEq for HeadCell {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for HeadCell {}

impl Hash for HeadCell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
