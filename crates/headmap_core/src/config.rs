use crate::head_data::{HeadType, SURFACE_1020_SITES};
use serde::{Deserialize, Serialize};

/// Pair of engine functions answering one head type: one table of numbers
/// and one table of dominant bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRequest {
    pub numbers: String,
    pub bands: String,
}

impl TableRequest {
    pub fn new(numbers: impl Into<String>, bands: impl Into<String>) -> Self {
        Self {
            numbers: numbers.into(),
            bands: bands.into(),
        }
    }
}

/// Engine functions per head type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequests {
    #[serde(default = "default_slow_waves")]
    pub slow_waves: TableRequest,
    #[serde(default = "default_fast_waves")]
    pub fast_waves: TableRequest,
    #[serde(default = "default_rewards")]
    pub rewards: TableRequest,
}

fn default_slow_waves() -> TableRequest {
    // Bands: D, T1, T2, T, A1, A
    TableRequest::new("swih.data.numbers", "swih.data.bands")
}

fn default_fast_waves() -> TableRequest {
    // Bands: A2, B1..B6, B, G
    TableRequest::new("fwih.data.numbers", "fwih.data.bands")
}

fn default_rewards() -> TableRequest {
    TableRequest::new("rewardsh.data.numbers", "rewardsh.data.bands")
}

impl Default for ScriptRequests {
    fn default() -> Self {
        Self {
            slow_waves: default_slow_waves(),
            fast_waves: default_fast_waves(),
            rewards: default_rewards(),
        }
    }
}

impl ScriptRequests {
    /// Functions for `head_type`; `None` when the engine has no script for it
    pub fn for_head_type(&self, head_type: HeadType) -> Option<&TableRequest> {
        match head_type {
            HeadType::SlowWaves => Some(&self.slow_waves),
            HeadType::FastWaves => Some(&self.fast_waves),
            HeadType::Rewards => Some(&self.rewards),
            _ => None,
        }
    }
}

/// Domain constants of the symptom tables and of the user-symptom fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRules {
    /// Name of the synthesized symptom
    #[serde(default = "default_user_symptom")]
    pub user_symptom: String,

    /// Row names containing any of these (case-insensitive) are not sites
    #[serde(default = "default_row_markers")]
    pub excluded_row_markers: Vec<String>,

    /// Sites the rewards fold never considers
    #[serde(default = "default_rewards_sites")]
    pub rewards_excluded_sites: Vec<String>,

    /// Dominant band that keeps a site out of the rewards fold
    #[serde(default = "default_rewards_band")]
    pub rewards_excluded_band: String,

    #[serde(default)]
    pub requests: ScriptRequests,
}

fn default_user_symptom() -> String {
    "user symptom".to_string()
}

fn default_row_markers() -> Vec<String> {
    vec!["symptoms".to_string(), "category".to_string()]
}

fn default_rewards_sites() -> Vec<String> {
    // Only meaningful for the "weak delta" symptom
    ["P3", "F7", "T3", "T5"].map(String::from).to_vec()
}

fn default_rewards_band() -> String {
    HeadType::Delta.abbreviation().to_string()
}

impl Default for AggregationRules {
    fn default() -> Self {
        Self {
            user_symptom: default_user_symptom(),
            excluded_row_markers: default_row_markers(),
            rewards_excluded_sites: default_rewards_sites(),
            rewards_excluded_band: default_rewards_band(),
            requests: ScriptRequests::default(),
        }
    }
}

impl AggregationRules {
    /// Whether a row name of an engine table names a site
    pub fn is_site_row(&self, row_name: &str) -> bool {
        let row_name = row_name.to_lowercase();
        !self
            .excluded_row_markers
            .iter()
            .any(|marker| row_name.contains(&marker.to_lowercase()))
    }

    pub fn is_rewards_excluded_site(&self, site: &str) -> bool {
        self.rewards_excluded_sites
            .iter()
            .any(|s| s.eq_ignore_ascii_case(site))
    }

    pub fn is_rewards_excluded_band(&self, band: Option<&str>) -> bool {
        band.is_some_and(|b| b.eq_ignore_ascii_case(&self.rewards_excluded_band))
    }
}

/// Names declared by the structural phase of the conditions registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionNames {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub triple_network: Vec<String>,
    #[serde(default)]
    pub other_networks: Vec<String>,
    #[serde(default)]
    pub lobes: Vec<String>,
    /// Site universe shared by every condition
    #[serde(default = "default_sites")]
    pub sites: Vec<String>,
}

fn default_sites() -> Vec<String> {
    SURFACE_1020_SITES.map(String::from).to_vec()
}

impl Default for ConditionNames {
    fn default() -> Self {
        Self {
            symptoms: Vec::new(),
            triple_network: vec![
                "salience".to_string(),
                "default mode".to_string(),
                "central executive".to_string(),
            ],
            other_networks: Vec::new(),
            lobes: vec![
                "frontal".to_string(),
                "temporal".to_string(),
                "parietal".to_string(),
                "occipital".to_string(),
            ],
            sites: default_sites(),
        }
    }
}
