//! Status summary over the whole registry: how many ninjas carry each
//! affinity and how many are sealed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::record::{Affinity, RegistrySnapshot};

/// Bucket for records that never had affinities written.
pub const UNALIGNED_TAG: &str = "Unaligned";
const SUMMARY_TITLE: &str = "📊 Ninja Status Summary 📊";
const UNKNOWN_EMOJI: &str = "❔";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinityCount {
    pub tag: String,
    pub emoji: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub total: usize,
    pub sealed: usize,
    pub unsealed: usize,
    /// Sorted by tag.
    pub affinities: Vec<AffinityCount>,
}

impl RegistrySummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn to_text(&self) -> String {
        if self.is_empty() {
            return "No ninjas have been registered yet.".to_string();
        }
        let mut lines = vec![SUMMARY_TITLE.to_string(), "By affinity:".to_string()];
        lines.extend(
            self.affinities
                .iter()
                .map(|a| format!("{} {}: {}", a.emoji, a.tag, a.count)),
        );
        lines.push("Seal status:".to_string());
        lines.push(format!("🔒 Sealed: {}", self.sealed));
        lines.push(format!("🔓 Unsealed: {}", self.unsealed));
        lines.push(format!("{} ninja(s) registered in total.", self.total));
        lines.join("\n")
    }
}

/// A record counts once per distinct tag it carries, so repeated tags in one
/// record do not inflate the bucket.
pub fn summarize(snapshot: &RegistrySnapshot) -> RegistrySummary {
    let mut buckets: BTreeMap<&str, usize> = BTreeMap::new();
    let mut sealed = 0;

    for record in snapshot.records() {
        if record.affinities.is_empty() {
            *buckets.entry(UNALIGNED_TAG).or_default() += 1;
        } else {
            let mut seen: Vec<&str> = Vec::with_capacity(record.affinities.len());
            for tag in &record.affinities {
                if !seen.contains(&tag.as_str()) {
                    seen.push(tag.as_str());
                    *buckets.entry(tag.as_str()).or_default() += 1;
                }
            }
        }
        if record.is_sealed() {
            sealed += 1;
        }
    }

    RegistrySummary {
        total: snapshot.len(),
        sealed,
        unsealed: snapshot.len() - sealed,
        affinities: buckets
            .into_iter()
            .map(|(tag, count)| AffinityCount {
                tag: tag.to_string(),
                emoji: Affinity::from_tag(tag).map_or(UNKNOWN_EMOJI, Affinity::emoji),
                count,
            })
            .collect(),
    }
}
