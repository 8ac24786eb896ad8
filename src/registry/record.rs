//! Registry data model. The snapshot serializes as a JSON object keyed by
//! ninja name; each record keeps only the fields that were ever written.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NinjaRecord {
    /// Filled from the snapshot key on load; not stored inside the record.
    #[serde(skip)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl NinjaRecord {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// An absent seal flag reads as unsealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.unwrap_or(false)
    }
}

/// Flattened record for display: name inline, seal flag resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NinjaView {
    pub name: String,
    pub affinities: Vec<String>,
    pub sealed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl From<NinjaRecord> for NinjaView {
    fn from(record: NinjaRecord) -> Self {
        let sealed = record.is_sealed();
        Self {
            name: record.name,
            affinities: record.affinities,
            sealed,
            updated_at: record.updated_at,
        }
    }
}

/// Full registry state, loaded and saved wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrySnapshot {
    records: BTreeMap<String, NinjaRecord>,
}

impl RegistrySnapshot {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut snapshot: Self = serde_json::from_str(raw)?;
        for (name, record) in &mut snapshot.records {
            record.name.clone_from(name);
        }
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn get(&self, name: &str) -> Option<&NinjaRecord> {
        self.records.get(name)
    }

    /// Get-or-create: inserts an empty record under `name` when absent.
    pub fn entry(&mut self, name: &str) -> &mut NinjaRecord {
        self.records
            .entry(name.to_string())
            .or_insert_with(|| NinjaRecord::named(name))
    }

    /// Records sorted by name.
    pub fn records(&self) -> impl Iterator<Item = &NinjaRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Closed elemental vocabulary used by the command layers. The registry
/// itself stores plain tags and never validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Affinity {
    Katon,
    Suiton,
    Fuuton,
    Doton,
    Raiton,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown affinity '{0}' (expected katon, suiton, fuuton, doton or raiton)")]
pub struct UnknownAffinity(pub String);

impl Affinity {
    pub const ALL: [Self; 5] = [
        Self::Katon,
        Self::Suiton,
        Self::Fuuton,
        Self::Doton,
        Self::Raiton,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Katon => "Katon",
            Self::Suiton => "Suiton",
            Self::Fuuton => "Fuuton",
            Self::Doton => "Doton",
            Self::Raiton => "Raiton",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Katon => "🔥",
            Self::Suiton => "💧",
            Self::Fuuton => "🌪️",
            Self::Doton => "🗿",
            Self::Raiton => "⚡",
        }
    }

    pub const fn element(self) -> &'static str {
        match self {
            Self::Katon => "fire",
            Self::Suiton => "water",
            Self::Fuuton => "wind",
            Self::Doton => "earth",
            Self::Raiton => "lightning",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Affinity {
    type Err = UnknownAffinity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.tag().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownAffinity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_parses_case_insensitively() {
        assert_eq!("katon".parse::<Affinity>(), Ok(Affinity::Katon));
        assert_eq!(" RAITON ".parse::<Affinity>(), Ok(Affinity::Raiton));
        assert_eq!(
            "mokuton".parse::<Affinity>(),
            Err(UnknownAffinity("mokuton".to_string()))
        );
    }

    #[test]
    fn snapshot_load_fills_names_from_keys() {
        let raw = r#"{
            "Naruto": { "affinities": ["Fuuton"], "updated_at": 10 },
            "Sasuke": { "sealed": true }
        }"#;
        let snapshot = RegistrySnapshot::from_json(raw).expect("valid snapshot");
        let naruto = snapshot.get("Naruto").expect("present");
        assert_eq!(naruto.name, "Naruto");
        assert_eq!(naruto.affinities, vec!["Fuuton".to_string()]);
        assert!(!naruto.is_sealed());
        let sasuke = snapshot.get("Sasuke").expect("present");
        assert!(sasuke.is_sealed());
        assert_eq!(sasuke.updated_at, None);
    }

    #[test]
    fn unset_fields_are_not_written() {
        let mut snapshot = RegistrySnapshot::default();
        snapshot.entry("Lee").sealed = Some(false);
        let json = snapshot.to_json_pretty().expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["Lee"], serde_json::json!({ "sealed": false }));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut snapshot = RegistrySnapshot::default();
        snapshot.entry("kakashi");
        snapshot.entry("Kakashi");
        assert_eq!(snapshot.len(), 2);
    }
}
