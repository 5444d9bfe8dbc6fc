//! Conditions Registry
//!
//! Holds the head data of every condition, split into four categories
//! (symptoms, triple network, other networks, lobes). The registry has a
//! two-phase lifecycle:
//!
//! 1. [`ConditionsMaps::initialize_structure`] declares the names of every
//!    condition, with placeholder head data and no values.
//! 2. [`ConditionsMaps::load_data`] fills in the values, in place.
//!
//! Both phases delegate to a [`ConditionsProcessor`]. Out-of-order calls are
//! rejected with [`HeadmapError::Misuse`].

use crate::config::ConditionNames;
use crate::error::{HeadmapError, Result};
use crate::head_data::{HeadData, HeadType, SiteListStrategy, SiteMap};
use core::fmt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(feature = "cli")]
use clap::ValueEnum;

/// Condition name -> head data, in declaration order
pub type ConditionMap = IndexMap<String, Box<dyn SiteMap>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum ConditionCategory {
    Symptoms,
    TripleNetwork,
    OtherNetworks,
    Lobes,
}

impl ConditionCategory {
    pub const ALL: [ConditionCategory; 4] = [
        ConditionCategory::Symptoms,
        ConditionCategory::TripleNetwork,
        ConditionCategory::OtherNetworks,
        ConditionCategory::Lobes,
    ];
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConditionCategory::Symptoms => "symptoms",
            ConditionCategory::TripleNetwork => "triple network",
            ConditionCategory::OtherNetworks => "other networks",
            ConditionCategory::Lobes => "lobes",
        })
    }
}

/// The four category maps, handed to processors for in-place population
#[derive(Debug, Default)]
pub struct CategoryMaps {
    pub symptoms: ConditionMap,
    pub triple_network: ConditionMap,
    pub other_networks: ConditionMap,
    pub lobes: ConditionMap,
}

impl CategoryMaps {
    pub fn with_capacities() -> Self {
        Self {
            symptoms: IndexMap::with_capacity(100),
            triple_network: IndexMap::with_capacity(3),
            other_networks: IndexMap::with_capacity(20),
            lobes: IndexMap::with_capacity(20),
        }
    }

    pub fn get(&self, category: ConditionCategory) -> &ConditionMap {
        match category {
            ConditionCategory::Symptoms => &self.symptoms,
            ConditionCategory::TripleNetwork => &self.triple_network,
            ConditionCategory::OtherNetworks => &self.other_networks,
            ConditionCategory::Lobes => &self.lobes,
        }
    }

    pub fn get_mut(&mut self, category: ConditionCategory) -> &mut ConditionMap {
        match category {
            ConditionCategory::Symptoms => &mut self.symptoms,
            ConditionCategory::TripleNetwork => &mut self.triple_network,
            ConditionCategory::OtherNetworks => &mut self.other_networks,
            ConditionCategory::Lobes => &mut self.lobes,
        }
    }
}

/// Fills the category maps of a registry, either with names (structural
/// phase) or with values (data phase).
pub trait ConditionsProcessor {
    fn load_data(&mut self, maps: &mut CategoryMaps) -> Result<()>;

    /// Human-readable name for logging/debugging
    fn name(&self) -> &str;
}

impl<P: ConditionsProcessor + ?Sized> ConditionsProcessor for Box<P> {
    fn load_data(&mut self, maps: &mut CategoryMaps) -> Result<()> {
        (**self).load_data(maps)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    StructureLoaded,
    DataLoaded,
}

/// Every condition and how it maps onto heads
pub struct ConditionsMaps {
    maps: CategoryMaps,
    state: RegistryState,
    initializer: Box<dyn ConditionsProcessor>,
    data_filler: Box<dyn ConditionsProcessor>,
}

impl fmt::Debug for ConditionsMaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionsMaps")
            .field("state", &self.state)
            .field("initializer", &self.initializer.name())
            .field("data_filler", &self.data_filler.name())
            .field("maps", &self.maps)
            .finish()
    }
}

impl ConditionsMaps {
    pub fn new(
        initializer: Box<dyn ConditionsProcessor>,
        data_filler: Box<dyn ConditionsProcessor>,
    ) -> Self {
        Self {
            maps: CategoryMaps::default(),
            state: RegistryState::Uninitialized,
            initializer,
            data_filler,
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Declares every condition name, without values. Calling it again
    /// discards all loaded data.
    pub fn initialize_structure(&mut self) -> Result<()> {
        let mut maps = CategoryMaps::with_capacities();
        self.initializer.load_data(&mut maps)?;
        self.maps = maps;
        self.state = RegistryState::StructureLoaded;

        info!(
            initializer = self.initializer.name(),
            symptoms = self.maps.symptoms.len(),
            triple_network = self.maps.triple_network.len(),
            other_networks = self.maps.other_networks.len(),
            lobes = self.maps.lobes.len(),
            "Condition structure initialized"
        );
        Ok(())
    }

    /// Loads the values of every declared condition in place
    pub fn load_data(&mut self) -> Result<()> {
        if self.state == RegistryState::Uninitialized {
            warn!(
                filler = self.data_filler.name(),
                "Condition data requested before structure"
            );
            return Err(HeadmapError::Misuse(
                "load_data called before initialize_structure".to_string(),
            ));
        }

        self.data_filler.load_data(&mut self.maps)?;
        self.state = RegistryState::DataLoaded;
        info!(filler = self.data_filler.name(), "Condition data loaded");
        Ok(())
    }

    pub fn names(&self, category: ConditionCategory) -> impl Iterator<Item = &str> {
        self.maps.get(category).keys().map(String::as_str)
    }

    pub fn count(&self, category: ConditionCategory) -> usize {
        self.maps.get(category).len()
    }

    pub fn get(&self, category: ConditionCategory, name: &str) -> Option<&dyn SiteMap> {
        self.maps.get(category).get(name).map(|m| &**m)
    }

    pub fn symptom(&self, name: &str) -> Option<&dyn SiteMap> {
        self.get(ConditionCategory::Symptoms, name)
    }

    pub fn symptom_names(&self) -> impl Iterator<Item = &str> {
        self.names(ConditionCategory::Symptoms)
    }

    pub fn triple_network_names(&self) -> impl Iterator<Item = &str> {
        self.names(ConditionCategory::TripleNetwork)
    }

    pub fn other_network_names(&self) -> impl Iterator<Item = &str> {
        self.names(ConditionCategory::OtherNetworks)
    }

    pub fn lobe_names(&self) -> impl Iterator<Item = &str> {
        self.names(ConditionCategory::Lobes)
    }

    /// Site names shared by every condition. All categories use the same
    /// site universe, so the first symptom stands in for all of them.
    pub fn site_names(&self) -> Option<Vec<&str>> {
        self.maps
            .symptoms
            .values()
            .next()
            .map(|head| head.sites().keys().map(String::as_str).collect())
    }

    pub fn maps(&self) -> &CategoryMaps {
        &self.maps
    }
}

/// Structural-phase processor declaring names from configuration. Every
/// declared condition gets one valueless cell per configured site.
#[derive(Debug, Clone)]
pub struct StaticMapsInitializer {
    names: ConditionNames,
}

impl StaticMapsInitializer {
    pub fn new(names: ConditionNames) -> Self {
        Self { names }
    }

    fn declare(&self, map: &mut ConditionMap, names: &[String]) {
        for name in names {
            let head = HeadData::prefilled(
                SiteListStrategy::new(self.names.sites.iter().cloned()),
                HeadType::Training,
            );
            // Symptom names from the engine are matched lowercased
            map.insert(name.to_lowercase(), Box::new(head));
        }
    }
}

impl ConditionsProcessor for StaticMapsInitializer {
    fn load_data(&mut self, maps: &mut CategoryMaps) -> Result<()> {
        self.declare(&mut maps.symptoms, &self.names.symptoms);
        self.declare(&mut maps.triple_network, &self.names.triple_network);
        self.declare(&mut maps.other_networks, &self.names.other_networks);
        self.declare(&mut maps.lobes, &self.names.lobes);
        Ok(())
    }

    fn name(&self) -> &str {
        "static condition names"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head_cell::HeadCell;

    #[derive(Debug, Default)]
    struct MarkEverySymptom;

    impl ConditionsProcessor for MarkEverySymptom {
        fn load_data(&mut self, maps: &mut CategoryMaps) -> Result<()> {
            for head in maps.symptoms.values_mut() {
                head.set_cell("Cz", HeadCell::with_value("Cz", Some(1.0)));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "mark"
        }
    }

    fn names() -> ConditionNames {
        ConditionNames {
            symptoms: vec!["Anxiety".into(), "fatigue".into()],
            sites: vec!["F3".into(), "Cz".into()],
            ..ConditionNames::default()
        }
    }

    fn registry() -> ConditionsMaps {
        ConditionsMaps::new(
            Box::new(StaticMapsInitializer::new(names())),
            Box::new(MarkEverySymptom),
        )
    }

    #[test]
    fn test_data_before_structure_is_misuse() {
        let mut maps = registry();
        assert!(matches!(maps.load_data(), Err(HeadmapError::Misuse(_))));
        assert_eq!(maps.state(), RegistryState::Uninitialized);
    }

    #[test]
    fn test_two_phase_lifecycle() {
        let mut maps = registry();
        maps.initialize_structure().unwrap();
        assert_eq!(maps.state(), RegistryState::StructureLoaded);
        assert_eq!(maps.symptom_names().collect::<Vec<_>>(), ["anxiety", "fatigue"]);
        assert_eq!(maps.count(ConditionCategory::TripleNetwork), 3);
        assert_eq!(maps.count(ConditionCategory::Lobes), 4);
        assert_eq!(maps.count(ConditionCategory::OtherNetworks), 0);
        assert_eq!(maps.site_names(), Some(vec!["F3", "Cz"]));
        assert_eq!(
            maps.symptom("anxiety").and_then(|s| s.cell("Cz")).and_then(HeadCell::number),
            None
        );

        maps.load_data().unwrap();
        assert_eq!(maps.state(), RegistryState::DataLoaded);
        assert_eq!(
            maps.symptom("fatigue").and_then(|s| s.cell("Cz")).and_then(HeadCell::number),
            Some(1.0)
        );
        assert!(maps.get(ConditionCategory::Lobes, "frontal").is_some());
        assert_eq!(maps.triple_network_names().count(), 3);
        assert_eq!(maps.lobe_names().next(), Some("frontal"));
        assert_eq!(maps.other_network_names().count(), 0);
    }

    #[test]
    fn test_reinitializing_discards_data() {
        let mut maps = registry();
        maps.initialize_structure().unwrap();
        maps.load_data().unwrap();
        maps.initialize_structure().unwrap();
        assert_eq!(maps.state(), RegistryState::StructureLoaded);
        assert_eq!(
            maps.symptom("fatigue").and_then(|s| s.cell("Cz")).and_then(HeadCell::number),
            None
        );
    }

    #[test]
    fn test_site_names_absent_without_symptoms() {
        let maps = registry();
        assert_eq!(maps.site_names(), None);
    }
}
