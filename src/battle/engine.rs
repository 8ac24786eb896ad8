//! Round-by-round damage resolution.
//!
//! A rotation is one ordered pass over the hit list. Rotations repeat until the
//! running health drops to zero or below; the check runs after every hit, so
//! the fight can end mid-rotation. Damage values are not sanitized: a
//! non-positive hit is applied as-is, which means a negative hit heals.

use serde::{Deserialize, Serialize};

/// One slot in the rotation. `index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleHit {
    pub index: usize,
    pub damage: i64,
}

impl BattleHit {
    pub fn rotation(damages: &[i64]) -> Vec<Self> {
        damages
            .iter()
            .enumerate()
            .map(|(i, &damage)| Self {
                index: i + 1,
                damage,
            })
            .collect()
    }
}

/// A resolved hit. `health_after` is floored at zero for display; the running
/// total that decides termination is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u64,
    pub hit: usize,
    pub damage: i64,
    pub health_before: i64,
    pub health_after: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Defeated { terminal_round: u64 },
    /// The rotation's total damage is not positive.
    NeverDefeated,
    /// Starting health was already zero or below.
    AlreadyDefeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub initial_health: i64,
    pub per_rotation_total: i64,
    pub rounds_executed: u64,
    pub termination: Termination,
    pub events: Vec<BattleEvent>,
}

impl BattleOutcome {
    pub fn terminal_round(&self) -> Option<u64> {
        match self.termination {
            Termination::Defeated { terminal_round } => Some(terminal_round),
            Termination::NeverDefeated | Termination::AlreadyDefeated => None,
        }
    }

    fn short_circuit(
        initial_health: i64,
        per_rotation_total: i128,
        termination: Termination,
    ) -> Self {
        Self {
            initial_health,
            per_rotation_total: saturate(per_rotation_total),
            rounds_executed: 0,
            termination,
            events: Vec::new(),
        }
    }
}

fn rotation_total(damages: &[i64]) -> i128 {
    damages.iter().map(|&d| i128::from(d)).sum()
}

fn saturate(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Round in which the fight ends, without generating events.
///
/// With `S` the rotation total and `P` the largest prefix sum of the rotation,
/// health after hit `k` of round `r` is `H - (r - 1) * S - prefix(k)`, so the
/// first round that can reach zero is `1` if `H <= P`, else
/// `ceil((H - P) / S) + 1`. Returns `None` for the two short-circuit outcomes.
pub fn projected_terminal_round(damages: &[i64], health: i64) -> Option<u64> {
    let total = rotation_total(damages);
    if total <= 0 || health <= 0 {
        return None;
    }

    let mut prefix = 0_i128;
    let mut best_prefix = i128::MIN;
    for &damage in damages {
        prefix += i128::from(damage);
        best_prefix = best_prefix.max(prefix);
    }

    let health = i128::from(health);
    if health <= best_prefix {
        return Some(1);
    }
    let full_rounds = (health - best_prefix + total - 1) / total;
    u64::try_from(full_rounds + 1).ok()
}

/// Resolve the fight hit by hit.
///
/// Checks run in a fixed order: a non-positive rotation total short-circuits
/// to [`Termination::NeverDefeated`] before the health check, so
/// `simulate(&[0], 0)` reports "never defeated".
pub fn simulate(damages: &[i64], health: i64) -> BattleOutcome {
    let total = rotation_total(damages);
    if total <= 0 {
        return BattleOutcome::short_circuit(health, total, Termination::NeverDefeated);
    }
    if health <= 0 {
        return BattleOutcome::short_circuit(health, total, Termination::AlreadyDefeated);
    }
    let Some(last_round) = projected_terminal_round(damages, health) else {
        return BattleOutcome::short_circuit(health, total, Termination::NeverDefeated);
    };

    let hits = BattleHit::rotation(damages);
    let mut events = Vec::with_capacity(hits.len().saturating_mul(last_round.min(4096) as usize));
    let mut current = i128::from(health);

    for round in 1..=last_round {
        for hit in &hits {
            let before = current;
            current -= i128::from(hit.damage);
            events.push(BattleEvent {
                round,
                hit: hit.index,
                damage: hit.damage,
                health_before: saturate(before),
                health_after: saturate(current.max(0)),
            });
            if current <= 0 {
                return BattleOutcome {
                    initial_health: health,
                    per_rotation_total: saturate(total),
                    rounds_executed: round,
                    termination: Termination::Defeated {
                        terminal_round: round,
                    },
                    events,
                };
            }
        }
    }

    // The projection is exact, so the last projected round always ends the fight.
    BattleOutcome {
        initial_health: health,
        per_rotation_total: saturate(total),
        rounds_executed: last_round,
        termination: Termination::Defeated {
            terminal_round: last_round,
        },
        events,
    }
}
