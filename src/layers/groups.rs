//! Thematic layer groups of the base map and their on/off state

use crate::prelude::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LAYER_GROUP_BUILDING: &str = "building";
pub const LAYER_GROUP_TRANSIT: &str = "transit";
pub const LAYER_GROUP_BICYCLE: &str = "bike";
pub const LAYER_GROUP_TRAFFIC: &str = "ctt";
pub const LAYER_GROUP_CADASTRAL: &str = "landparcel";
pub const LAYER_GROUP_MOUNTAIN: &str = "mountain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerGroup {
    Building,
    Transit,
    Bicycle,
    Traffic,
    Cadastral,
    Mountain,
}

impl LayerGroup {
    pub const ALL: [LayerGroup; 6] = [
        LayerGroup::Building,
        LayerGroup::Transit,
        LayerGroup::Bicycle,
        LayerGroup::Traffic,
        LayerGroup::Cadastral,
        LayerGroup::Mountain,
    ];

    /// Name the rendering engine uses for the group
    pub fn name(&self) -> &'static str {
        match self {
            LayerGroup::Building => LAYER_GROUP_BUILDING,
            LayerGroup::Transit => LAYER_GROUP_TRANSIT,
            LayerGroup::Bicycle => LAYER_GROUP_BICYCLE,
            LayerGroup::Traffic => LAYER_GROUP_TRAFFIC,
            LayerGroup::Cadastral => LAYER_GROUP_CADASTRAL,
            LayerGroup::Mountain => LAYER_GROUP_MOUNTAIN,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.name() == name)
    }

    pub fn enabled_by_default(&self) -> bool {
        matches!(self, LayerGroup::Building)
    }
}

impl std::fmt::Display for LayerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Enabled state of every layer group, known or custom
#[derive(Debug, Clone)]
pub struct LayerGroups {
    states: HashMap<String, bool>,
}

impl LayerGroups {
    pub fn new() -> Self {
        let states = LayerGroup::ALL
            .iter()
            .map(|group| (group.name().to_string(), group.enabled_by_default()))
            .collect();
        Self { states }
    }

    /// Sets a group's state; returns whether it changed
    pub fn set(&mut self, name: &str, enabled: bool) -> bool {
        if LayerGroup::from_name(name).is_none() && !self.states.contains_key(name) {
            log::debug!("tracking custom layer group {}", name);
        }
        let previous = self.states.insert(name.to_string(), enabled);
        previous != Some(enabled)
    }

    /// Unknown groups are disabled
    pub fn is_enabled(&self, name: &str) -> bool {
        self.states.get(name).copied().unwrap_or(false)
    }

    pub fn set_group(&mut self, group: LayerGroup, enabled: bool) -> bool {
        self.set(group.name(), enabled)
    }

    pub fn is_group_enabled(&self, group: LayerGroup) -> bool {
        self.is_enabled(group.name())
    }

    /// Names of the enabled groups, sorted
    pub fn enabled(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .states
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Applies a batch of overrides
    pub fn apply(&mut self, overrides: &BTreeMap<String, bool>) {
        for (name, enabled) in overrides {
            self.set(name, *enabled);
        }
    }

    /// Every tracked group and its state, sorted by name
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.states
            .iter()
            .map(|(name, enabled)| (name.clone(), *enabled))
            .collect()
    }
}

impl Default for LayerGroups {
    fn default() -> Self {
        Self::new()
    }
}
