//! Head Data
//!
//! A [`HeadData`] is the ordered, name-keyed set of [`HeadCell`]s of one
//! head: a symptom, a network, a lobe, or a synthesized composite.
//! Collections are stored and consumed through the [`SiteMap`] trait, so
//! callers never depend on a concrete collection type.
//!
//! Population is pluggable via [`HeadDataStrategy`]. There are three
//! construction paths:
//! - [`HeadData::new`]: no strategy, filled by [`SiteMap::set_cell`]
//! - [`HeadData::with_strategy`]: empty until [`SiteMap::load`] runs
//! - [`HeadData::prefilled`]: one valueless cell per site, ready at once

use crate::error::{HeadmapError, Result};
use crate::head_cell::HeadCell;
use core::fmt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use clap::ValueEnum;

/// Surface 10-20 electrode sites, in montage order
pub const SURFACE_1020_SITES: [&str; 19] = [
    "Fp1", "Fp2", "F7", "F3", "Fz", "F4", "F8", "T3", "C3", "Cz", "C4", "T4", "T5", "P3", "Pz",
    "P4", "T6", "O1", "O2",
];

/// Kind of head: a frequency band, a band ratio, or a composite view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum HeadType {
    Delta1,
    Delta,
    Theta,
    Theta1,
    Theta2,
    Alpha,
    Alpha1,
    Alpha2,
    LowBeta,
    Beta,
    Beta1,
    Beta2,
    Beta3,
    Beta4,
    Beta5,
    Beta6,
    HighBeta,
    Gamma,
    Plus,
    Minus,
    Training,
    SlowWaves,
    FastWaves,
    Rewards,
    DeltaBeta,
    ThetaBeta,
    AlphaBeta,
}

impl HeadType {
    pub const ALL: [HeadType; 27] = [
        HeadType::Delta1,
        HeadType::Delta,
        HeadType::Theta,
        HeadType::Theta1,
        HeadType::Theta2,
        HeadType::Alpha,
        HeadType::Alpha1,
        HeadType::Alpha2,
        HeadType::LowBeta,
        HeadType::Beta,
        HeadType::Beta1,
        HeadType::Beta2,
        HeadType::Beta3,
        HeadType::Beta4,
        HeadType::Beta5,
        HeadType::Beta6,
        HeadType::HighBeta,
        HeadType::Gamma,
        HeadType::Plus,
        HeadType::Minus,
        HeadType::Training,
        HeadType::SlowWaves,
        HeadType::FastWaves,
        HeadType::Rewards,
        HeadType::DeltaBeta,
        HeadType::ThetaBeta,
        HeadType::AlphaBeta,
    ];

    /// Display label shown to users
    pub fn label(self) -> &'static str {
        match self {
            HeadType::Delta1 => "Delta 1",
            HeadType::Delta => "Delta",
            HeadType::Theta => "Theta",
            HeadType::Theta1 => "Theta 1",
            HeadType::Theta2 => "Theta 2",
            HeadType::Alpha => "Alpha",
            HeadType::Alpha1 => "Alpha 1",
            HeadType::Alpha2 => "Alpha 2",
            HeadType::LowBeta => "Low Beta",
            HeadType::Beta => "Beta",
            HeadType::Beta1 => "Beta 1",
            HeadType::Beta2 => "Beta 2",
            HeadType::Beta3 => "Beta 3",
            HeadType::Beta4 => "Beta 4",
            HeadType::Beta5 => "Beta 5",
            HeadType::Beta6 => "Beta 6",
            HeadType::HighBeta => "High Beta",
            HeadType::Gamma => "Gamma",
            HeadType::Plus => "Plus Head",
            HeadType::Minus => "Minus Head",
            HeadType::Training => "Training Head",
            HeadType::SlowWaves => "Slow Waves",
            HeadType::FastWaves => "Fast Waves",
            HeadType::Rewards => "Rewards",
            HeadType::DeltaBeta => "D/B",
            HeadType::ThetaBeta => "T/B",
            HeadType::AlphaBeta => "A/B",
        }
    }

    /// Short band code as it appears in engine band tables ("D", "T1", "B3", ...)
    pub fn abbreviation(self) -> &'static str {
        match self {
            HeadType::Delta1 => "D1",
            HeadType::Delta => "D",
            HeadType::Theta => "T",
            HeadType::Theta1 => "T1",
            HeadType::Theta2 => "T2",
            HeadType::Alpha => "A",
            HeadType::Alpha1 => "A1",
            HeadType::Alpha2 => "A2",
            HeadType::LowBeta => "LoB",
            HeadType::Beta => "B",
            HeadType::Beta1 => "B1",
            HeadType::Beta2 => "B2",
            HeadType::Beta3 => "B3",
            HeadType::Beta4 => "B4",
            HeadType::Beta5 => "B5",
            HeadType::Beta6 => "B6",
            HeadType::HighBeta => "HiB",
            HeadType::Gamma => "G",
            HeadType::Plus => "PLUS",
            HeadType::Minus => "MINUS",
            HeadType::Training => "TRAINING",
            HeadType::SlowWaves => "SLOW_WAVES",
            HeadType::FastWaves => "FAST_WAVES",
            HeadType::Rewards => "REWARDS",
            HeadType::DeltaBeta => "DeltaBeta",
            HeadType::ThetaBeta => "ThetaBeta",
            HeadType::AlphaBeta => "AlphaBeta",
        }
    }

    /// Case-insensitive lookup by band code
    pub fn from_abbreviation(code: &str) -> Option<HeadType> {
        Self::ALL
            .into_iter()
            .find(|t| t.abbreviation().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for HeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uniform access to a name-keyed set of sites
pub trait SiteMap: fmt::Debug {
    fn kind(&self) -> HeadType;

    fn sites(&self) -> &IndexMap<String, HeadCell>;

    fn sites_mut(&mut self) -> &mut IndexMap<String, HeadCell>;

    /// Rebuilds the whole site map from the configured population strategy
    fn load(&mut self) -> Result<()>;

    fn cell(&self, site: &str) -> Option<&HeadCell> {
        self.sites().get(site)
    }

    /// Inserts or overwrites the cell of `site`
    fn set_cell(&mut self, site: &str, cell: HeadCell) {
        self.sites_mut().insert(site.to_string(), cell);
    }
}

/// Populates a freshly created site map. Implementations must fill `cells`
/// and never replace it.
pub trait HeadDataStrategy: fmt::Debug {
    fn populate(&self, cells: &mut IndexMap<String, HeadCell>) -> Result<()>;
}

/// The empty-head strategy: one valueless cell per listed site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteListStrategy {
    sites: Vec<String>,
}

impl SiteListStrategy {
    pub fn new<I, S>(sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sites: sites.into_iter().map(Into::into).collect(),
        }
    }

    pub fn surface_1020() -> Self {
        Self::new(SURFACE_1020_SITES)
    }

    fn fill(&self, cells: &mut IndexMap<String, HeadCell>) {
        for site in &self.sites {
            cells.insert(site.clone(), HeadCell::new(site.as_str()));
        }
    }
}

impl HeadDataStrategy for SiteListStrategy {
    fn populate(&self, cells: &mut IndexMap<String, HeadCell>) -> Result<()> {
        self.fill(cells);
        Ok(())
    }
}

/// All the cells of a single head
#[derive(Debug)]
pub struct HeadData {
    kind: HeadType,
    strategy: Option<Box<dyn HeadDataStrategy>>,
    cells: IndexMap<String, HeadCell>,
}

impl HeadData {
    /// Collection without a strategy, populated through [`SiteMap::set_cell`].
    /// Calling [`SiteMap::load`] on it is a misuse.
    pub fn new(kind: HeadType) -> Self {
        Self {
            kind,
            strategy: None,
            cells: IndexMap::new(),
        }
    }

    /// Collection that stays empty until [`SiteMap::load`] runs `strategy`
    pub fn with_strategy(strategy: Box<dyn HeadDataStrategy>, kind: HeadType) -> Self {
        Self {
            kind,
            strategy: Some(strategy),
            cells: IndexMap::new(),
        }
    }

    /// Collection holding one valueless cell per site, loaded on construction
    pub fn prefilled(sites: SiteListStrategy, kind: HeadType) -> Self {
        let mut cells = IndexMap::with_capacity(sites.sites.len());
        sites.fill(&mut cells);
        Self {
            kind,
            strategy: Some(Box::new(sites)),
            cells,
        }
    }

    pub fn has_strategy(&self) -> bool {
        self.strategy.is_some()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl SiteMap for HeadData {
    fn kind(&self) -> HeadType {
        self.kind
    }

    fn sites(&self) -> &IndexMap<String, HeadCell> {
        &self.cells
    }

    fn sites_mut(&mut self) -> &mut IndexMap<String, HeadCell> {
        &mut self.cells
    }

    fn load(&mut self) -> Result<()> {
        let strategy = self.strategy.as_ref().ok_or_else(|| {
            HeadmapError::Misuse(format!(
                "load called on a {} head without a population strategy",
                self.kind
            ))
        })?;

        let mut cells = IndexMap::with_capacity(self.cells.len());
        strategy.populate(&mut cells)?;
        self.cells = cells;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Broken;

    impl HeadDataStrategy for Broken {
        fn populate(&self, cells: &mut IndexMap<String, HeadCell>) -> Result<()> {
            cells.insert("F3".into(), HeadCell::new("F3"));
            Err(HeadmapError::Misuse("engine went away".into()))
        }
    }

    #[test]
    fn test_load_without_strategy_is_misuse() {
        let mut data = HeadData::new(HeadType::Training);
        assert!(matches!(data.load(), Err(HeadmapError::Misuse(_))));
    }

    #[test]
    fn test_load_replaces_previous_cells() {
        let mut data =
            HeadData::with_strategy(Box::new(SiteListStrategy::new(["F3", "O1"])), HeadType::Alpha);
        assert!(data.is_empty());

        data.load().unwrap();
        data.set_cell("T5", HeadCell::with_value("T5", Some(2.0)));
        data.sites_mut()["F3"].set_number(Some(1.0));
        data.load().unwrap();

        assert_eq!(data.sites().keys().collect::<Vec<_>>(), ["F3", "O1"]);
        assert_eq!(data.cell("F3").and_then(HeadCell::number), None);
    }

    #[test]
    fn test_failed_load_keeps_previous_cells() {
        let mut data = HeadData::with_strategy(Box::new(Broken), HeadType::Beta);
        data.set_cell("O2", HeadCell::with_value("O2", Some(4.0)));
        assert!(data.load().is_err());
        assert_eq!(data.len(), 1);
        assert_eq!(data.cell("O2").and_then(HeadCell::number), Some(4.0));
    }

    #[test]
    fn test_prefilled_keeps_site_order() {
        let data = HeadData::prefilled(SiteListStrategy::surface_1020(), HeadType::Training);
        assert!(data.has_strategy());
        assert_eq!(data.len(), 19);
        assert_eq!(data.sites().get_index(0).map(|(k, _)| k.as_str()), Some("Fp1"));
        assert_eq!(data.sites().get_index(18).map(|(k, _)| k.as_str()), Some("O2"));
    }

    #[test]
    fn test_set_cell_overwrites() {
        let mut data = HeadData::new(HeadType::Training);
        data.set_cell("Cz", HeadCell::with_value("Cz", Some(1.0)));
        data.set_cell("Cz", HeadCell::with_value("Cz", Some(3.0)));
        assert_eq!(data.len(), 1);
        assert_eq!(data.cell("Cz").and_then(HeadCell::number), Some(3.0));
    }

    #[test]
    fn test_head_type_labels() {
        assert_eq!(HeadType::LowBeta.to_string(), "Low Beta");
        assert_eq!(HeadType::ThetaBeta.label(), "T/B");
        assert_eq!(HeadType::from_abbreviation("d"), Some(HeadType::Delta));
        assert_eq!(HeadType::from_abbreviation("hib"), Some(HeadType::HighBeta));
        assert_eq!(HeadType::from_abbreviation("X"), None);
    }
}
