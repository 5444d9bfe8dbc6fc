//! User-Symptom Aggregation
//!
//! Loads the surface power symptom tables of one head type (slow waves,
//! fast waves, rewards) into the symptom head data of a registry, then
//! folds every symptom into the synthesized "user symptom":
//! - Slow/Fast waves: per site, the highest value of any symptom wins
//! - Rewards: per site, the lowest value wins; a few fixed sites and
//!   delta-dominant sites never take part
//!
//! Each head type needs two engine tables, one of numbers and one of
//! dominant bands. In both, column = symptom, row 0 = symptom name, last
//! row = a fixed trailer, and the rows in between are sites.
//!
//! A table is parsed completely before anything is written, so a failing
//! table leaves every symptom untouched.

use crate::conditions::{CategoryMaps, ConditionMap, ConditionsProcessor};
use crate::config::AggregationRules;
use crate::error::{Axis, HeadmapError, Result};
use crate::head_cell::HeadCell;
use crate::head_data::{HeadData, HeadType, SiteMap};
use crate::source::{RawTable, TableSource};
use crate::table::StringTable;
use core::fmt;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Name reported in errors and logs
pub const PROCESSOR: &str = "surface power symptom data";

/// Which of the two tables of a head type is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Numbers,
    Bands,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Numbers => write!(f, "numbers"),
            TableKind::Bands => write!(f, "bands"),
        }
    }
}

/// Comparison rule of the user-symptom fold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldRule {
    /// Highest value per site
    Maximum,
    /// Lowest value per site, skipping excluded sites and bands
    RewardsMinimum,
    /// No rule defined; the fold changes nothing
    Identity,
}

impl FoldRule {
    pub fn for_head_type(head_type: HeadType) -> Self {
        match head_type {
            HeadType::FastWaves | HeadType::SlowWaves => FoldRule::Maximum,
            HeadType::Rewards => FoldRule::RewardsMinimum,
            _ => FoldRule::Identity,
        }
    }

    /// Whether `cell` of `site` may take part in the fold at all
    pub fn admits(&self, site: &str, cell: &HeadCell, rules: &AggregationRules) -> bool {
        match self {
            FoldRule::Maximum => true,
            FoldRule::RewardsMinimum => {
                !rules.is_rewards_excluded_site(site)
                    && !rules.is_rewards_excluded_band(cell.dominant_band())
            }
            FoldRule::Identity => false,
        }
    }

    /// Whether `candidate` replaces the value kept so far
    pub fn prefers(&self, candidate: f64, kept: Option<f64>) -> bool {
        match (self, kept) {
            (FoldRule::Identity, _) => false,
            (_, None) => true,
            (FoldRule::Maximum, Some(kept)) => candidate > kept,
            (FoldRule::RewardsMinimum, Some(kept)) => candidate < kept,
        }
    }

    /// Human-readable name for logging/debugging
    pub fn name(&self) -> &'static str {
        match self {
            FoldRule::Maximum => "maximum",
            FoldRule::RewardsMinimum => "rewards-minimum",
            FoldRule::Identity => "identity",
        }
    }
}

/// Engine number cell: anything that does not parse is absent
pub fn parse_number(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
}

/// Engine band cell: missing, `NA`, `inf` and `-inf` mean "no band"
pub fn parse_band(cell: Option<&str>) -> String {
    match cell {
        Some(c)
            if !(c.eq_ignore_ascii_case("NA")
                || c.eq_ignore_ascii_case("inf")
                || c.eq_ignore_ascii_case("-inf")) =>
        {
            c.to_string()
        }
        _ => String::new(),
    }
}

#[derive(Debug, Clone)]
enum CellUpdate {
    Number(Option<f64>),
    Band(String),
}

#[derive(Debug)]
struct SymptomUpdate {
    symptom: String,
    cells: Vec<(String, CellUpdate)>,
}

/// Parses one engine table against the declared symptoms, without writing
fn parse_symptom_table(
    raw: &RawTable,
    kind: TableKind,
    rules: &AggregationRules,
    symptoms: &ConditionMap,
    request: &str,
) -> Result<Vec<SymptomUpdate>> {
    let table = StringTable::from_source(raw)?;
    let sites: Vec<&str> = table
        .row_names()
        .iter()
        .map(String::as_str)
        .filter(|row| rules.is_site_row(row))
        .collect();

    let mut updates = Vec::with_capacity(table.column_count());
    for (column_name, column) in table.column_names().iter().zip(table.columns()) {
        let symptom = match column.first() {
            Some(Some(name)) => name.to_lowercase(),
            _ => {
                return Err(HeadmapError::ShapeMismatch(format!(
                    "column `{column_name}` does not start with a symptom name"
                )))
            }
        };
        if !symptoms.contains_key(&symptom) {
            return Err(HeadmapError::UnexpectedSymptom {
                processor: PROCESSOR.to_string(),
                request: request.to_string(),
                symptom,
            });
        }

        let last = column.len().saturating_sub(1);
        let mut cells = Vec::with_capacity(last.saturating_sub(1));
        for (row, cell) in column.iter().enumerate().take(last).skip(1) {
            let site = sites.get(row - 1).ok_or(HeadmapError::OutOfRange {
                axis: Axis::Row,
                index: row - 1,
                len: sites.len(),
            })?;
            let update = match kind {
                TableKind::Numbers => CellUpdate::Number(parse_number(cell.as_deref())),
                TableKind::Bands => CellUpdate::Band(parse_band(cell.as_deref())),
            };
            cells.push((site.to_string(), update));
        }
        updates.push(SymptomUpdate { symptom, cells });
    }
    Ok(updates)
}

fn apply_updates(updates: Vec<SymptomUpdate>, symptoms: &mut ConditionMap) {
    for SymptomUpdate { symptom, cells } in updates {
        let Some(head) = symptoms.get_mut(&symptom) else {
            continue;
        };
        for (site, update) in cells {
            let cell = head
                .sites_mut()
                .entry(site)
                .or_insert_with_key(|site| HeadCell::new(site.as_str()));
            match update {
                CellUpdate::Number(number) => cell.set_number(number),
                CellUpdate::Band(band) => cell.set_dominant_band(Some(band)),
            }
        }
    }
}

/// Folds every symptom into the user symptom under the rule of `head_type`.
///
/// The user symptom is created when missing and never cleared. A winning
/// cell replaces the whole user-symptom cell, band included. Returns the
/// number of replacements.
pub fn fold_user_symptom(
    symptoms: &mut ConditionMap,
    head_type: HeadType,
    rules: &AggregationRules,
) -> usize {
    let user_symptom = rules.user_symptom.as_str();
    if !symptoms.contains_key(user_symptom) {
        symptoms.insert(
            user_symptom.to_string(),
            Box::new(HeadData::new(HeadType::Training)),
        );
    }

    let rule = FoldRule::for_head_type(head_type);
    if rule == FoldRule::Identity {
        warn!(head_type = %head_type, "No user symptom rule for head type");
        return 0;
    }

    let mut winners: IndexMap<String, HeadCell> = IndexMap::new();
    let mut replaced = 0;
    if let Some(user) = symptoms.get(user_symptom) {
        for (_, head) in symptoms.iter().filter(|(name, _)| name.as_str() != user_symptom) {
            for (site, cell) in head.sites() {
                let Some(value) = cell.number() else {
                    continue;
                };
                if !rule.admits(site, cell, rules) {
                    continue;
                }
                let kept = winners
                    .get(site)
                    .or_else(|| user.cell(site))
                    .and_then(HeadCell::number);
                if rule.prefers(value, kept) {
                    winners.insert(site.clone(), cell.clone());
                    replaced += 1;
                }
            }
        }
    }

    if let Some(user) = symptoms.get_mut(user_symptom) {
        for (site, cell) in winners {
            user.set_cell(&site, cell);
        }
    }

    info!(
        head_type = %head_type,
        rule = rule.name(),
        replaced,
        "User symptom folded"
    );
    replaced
}

/// Loads slow waves, fast waves or rewards symptom data from the engine
/// and refreshes the user symptom. Symptom names must already exist from
/// the structural phase.
#[derive(Debug)]
pub struct SurfacePowerProcessor<S> {
    head_type: HeadType,
    rules: AggregationRules,
    source: S,
}

impl<S: TableSource> SurfacePowerProcessor<S> {
    pub fn new(head_type: HeadType, source: S) -> Self {
        Self::with_rules(head_type, AggregationRules::default(), source)
    }

    pub fn with_rules(head_type: HeadType, rules: AggregationRules, source: S) -> Self {
        Self {
            head_type,
            rules,
            source,
        }
    }

    pub fn head_type(&self) -> HeadType {
        self.head_type
    }

    pub fn rules(&self) -> &AggregationRules {
        &self.rules
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn process_table(
        &mut self,
        function: &str,
        kind: TableKind,
        symptoms: &mut ConditionMap,
    ) -> Result<()> {
        debug!(function, kind = %kind, "Fetching symptom table");
        let raw = self
            .source
            .fetch(function)
            .map_err(|e| HeadmapError::engine(PROCESSOR, function, e))?;
        let updates = parse_symptom_table(&raw, kind, &self.rules, symptoms, function)
            .map_err(|e| e.at_boundary(PROCESSOR, function))?;

        debug!(
            function,
            kind = %kind,
            symptoms = updates.len(),
            "Symptom table parsed"
        );
        apply_updates(updates, symptoms);
        Ok(())
    }
}

impl<S: TableSource> ConditionsProcessor for SurfacePowerProcessor<S> {
    fn load_data(&mut self, maps: &mut CategoryMaps) -> Result<()> {
        match self.rules.requests.for_head_type(self.head_type).cloned() {
            Some(request) => {
                self.process_table(&request.numbers, TableKind::Numbers, &mut maps.symptoms)?;
                self.process_table(&request.bands, TableKind::Bands, &mut maps.symptoms)?;
            }
            None => warn!(head_type = %self.head_type, "No engine script for head type"),
        }

        fold_user_symptom(&mut maps.symptoms, self.head_type, &self.rules);
        Ok(())
    }

    fn name(&self) -> &str {
        PROCESSOR
    }
}

/// Runs several processors in order, stopping at the first failure. Head
/// types share the user symptom, so they are loaded one after another.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn ConditionsProcessor>>,
}

impl fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.processors.iter().map(|p| p.name()))
            .finish()
    }
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, processor: impl ConditionsProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }
}

impl ConditionsProcessor for ProcessorChain {
    fn load_data(&mut self, maps: &mut CategoryMaps) -> Result<()> {
        for processor in &mut self.processors {
            processor.load_data(maps)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "processor chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symptom(cells: &[(&str, Option<f64>, &str)]) -> Box<dyn SiteMap> {
        let mut head = HeadData::new(HeadType::Training);
        for (site, value, band) in cells {
            head.set_cell(site, HeadCell::with_value_and_band(*site, *value, *band));
        }
        Box::new(head)
    }

    fn user_value(symptoms: &ConditionMap, site: &str) -> Option<f64> {
        symptoms["user symptom"].cell(site).and_then(HeadCell::number)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some("1.5")), Some(1.5));
        assert_eq!(parse_number(Some(" -2 ")), Some(-2.0));
        assert_eq!(parse_number(Some("NA")), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_parse_band_normalizes_missing_markers() {
        for missing in [None, Some("NA"), Some("na"), Some("inf"), Some("-INF")] {
            assert_eq!(parse_band(missing), "", "{missing:?}");
        }
        assert_eq!(parse_band(Some("B3")), "B3");
        assert_eq!(parse_band(Some("Inferior")), "Inferior");
    }

    #[test]
    fn test_fold_rules() {
        assert_eq!(FoldRule::for_head_type(HeadType::SlowWaves), FoldRule::Maximum);
        assert_eq!(FoldRule::for_head_type(HeadType::Rewards), FoldRule::RewardsMinimum);
        assert_eq!(FoldRule::for_head_type(HeadType::Gamma), FoldRule::Identity);

        assert!(FoldRule::Maximum.prefers(1.0, None));
        assert!(FoldRule::Maximum.prefers(2.0, Some(1.0)));
        assert!(!FoldRule::Maximum.prefers(1.0, Some(1.0)));
        assert!(FoldRule::RewardsMinimum.prefers(-1.0, Some(1.0)));
        assert!(!FoldRule::RewardsMinimum.prefers(1.0, Some(1.0)));
        assert!(!FoldRule::Identity.prefers(1.0, None));
    }

    #[test]
    fn test_fast_waves_fold_keeps_maximum() {
        let mut symptoms = ConditionMap::new();
        symptoms.insert("a".into(), symptom(&[("F3", Some(5.0), "B1"), ("O1", None, "")]));
        symptoms.insert("b".into(), symptom(&[("F3", Some(8.0), "B2"), ("O1", Some(0.5), "A")]));

        let replaced = fold_user_symptom(&mut symptoms, HeadType::FastWaves, &AggregationRules::default());

        assert_eq!(replaced, 3);
        assert_eq!(user_value(&symptoms, "F3"), Some(8.0));
        assert_eq!(user_value(&symptoms, "O1"), Some(0.5));
        let band = symptoms["user symptom"].cell("F3").and_then(HeadCell::dominant_band);
        assert_eq!(band, Some("B2"), "winning cell carries its band");
    }

    #[test]
    fn test_rewards_fold_excludes_sites_and_delta() {
        let mut symptoms = ConditionMap::new();
        symptoms.insert(
            "a".into(),
            symptom(&[("F3", Some(-9.0), "D"), ("O1", Some(2.0), "A"), ("P3", Some(-5.0), "A")]),
        );
        symptoms.insert(
            "b".into(),
            symptom(&[("F3", Some(1.0), "d"), ("O1", Some(-1.0), "A1"), ("t5", Some(-5.0), "B")]),
        );

        fold_user_symptom(&mut symptoms, HeadType::Rewards, &AggregationRules::default());

        let user = &symptoms["user symptom"];
        assert!(user.cell("F3").is_none());
        assert!(user.cell("P3").is_none());
        assert!(user.cell("t5").is_none());
        assert_eq!(user_value(&symptoms, "O1"), Some(-1.0));
    }

    #[test]
    fn test_unknown_head_type_only_ensures_user_symptom() {
        let mut symptoms = ConditionMap::new();
        symptoms.insert("a".into(), symptom(&[("F3", Some(5.0), "B1")]));

        let replaced = fold_user_symptom(&mut symptoms, HeadType::Gamma, &AggregationRules::default());

        assert_eq!(replaced, 0);
        assert!(symptoms["user symptom"].sites().is_empty());
    }

    #[test]
    fn test_fold_keeps_existing_user_symptom() {
        let mut symptoms = ConditionMap::new();
        symptoms.insert("user symptom".into(), symptom(&[("F3", Some(10.0), "G")]));
        symptoms.insert("a".into(), symptom(&[("F3", Some(5.0), "B1"), ("C3", Some(1.0), "B")]));

        fold_user_symptom(&mut symptoms, HeadType::SlowWaves, &AggregationRules::default());

        assert_eq!(user_value(&symptoms, "F3"), Some(10.0));
        assert_eq!(user_value(&symptoms, "C3"), Some(1.0));
    }
}
