//! Structured rotation result handed to the presentation layer, plus the
//! event exports used by the CLI.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::chunker::{chunk_lines, LogBlock, MAX_BLOCK_CHARS};
use crate::battle::engine::{
    projected_terminal_round, simulate, BattleEvent, BattleOutcome, Termination,
};
use crate::battle::input::{parse_rotation_input, InputError};
use crate::battle::render::{render_event_lines, result_line};

pub const DEFAULT_MAX_ROUNDS: u64 = 1000;
pub const DEFAULT_MAX_EVENTS: u64 = 100_000;

const CSV_HEADER: [&str; 5] = ["round", "hit", "damage", "health_before", "health_after"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    #[error("invalid rotation input: {0}")]
    Input(#[from] InputError),
    #[error("the fight would last {projected} rotations, above the limit of {limit}")]
    TooManyRounds { projected: u64, limit: u64 },
    #[error("the fight would log up to {projected} hits, above the limit of {limit}")]
    TooManyEvents { projected: u64, limit: u64 },
}

/// Upper bounds a rotation request must project under before it is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationLimits {
    pub max_rounds: u64,
    /// Caps rounds times hits per rotation, which bounds the event log.
    pub max_events: u64,
}

impl Default for RotationLimits {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl RotationLimits {
    /// `Ok` for the short-circuit outcomes, which generate no events.
    pub fn check(&self, damages: &[i64], health: i64) -> Result<(), RotationError> {
        let Some(rounds) = projected_terminal_round(damages, health) else {
            return Ok(());
        };
        if rounds > self.max_rounds {
            return Err(RotationError::TooManyRounds {
                projected: rounds,
                limit: self.max_rounds,
            });
        }
        let hits = u64::try_from(damages.len()).unwrap_or(u64::MAX);
        let events = rounds.saturating_mul(hits);
        if events > self.max_events {
            return Err(RotationError::TooManyEvents {
                projected: events,
                limit: self.max_events,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub initial_health: i64,
    pub per_rotation_total: i64,
    pub termination: Termination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_round: Option<u64>,
    pub result: String,
    pub blocks: Vec<LogBlock>,
}

impl BattleReport {
    /// Full plain-text report: header, result line, then each log block.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "⚔️ Rotation Damage Simulation ⚔️");
        let _ = writeln!(out, "Target HP: {}", self.initial_health);
        let _ = writeln!(out, "Damage per Rotation: {}", self.per_rotation_total);
        let _ = writeln!(out, "{}", self.result);
        for block in &self.blocks {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", block.title);
            out.push_str(&block.text);
        }
        out
    }
}

pub fn build_report(outcome: &BattleOutcome, max_block_chars: usize) -> BattleReport {
    let lines = render_event_lines(&outcome.events);
    BattleReport {
        initial_health: outcome.initial_health,
        per_rotation_total: outcome.per_rotation_total,
        termination: outcome.termination,
        terminal_round: outcome.terminal_round(),
        result: result_line(outcome),
        blocks: chunk_lines(&lines, max_block_chars),
    }
}

/// Parse, bound-check and simulate a raw rotation command.
///
/// Limits are checked against the closed-form projection, so an oversized
/// request is rejected before any event is generated.
pub fn simulate_bounded(raw: &str, limits: RotationLimits) -> Result<BattleOutcome, RotationError> {
    let input = parse_rotation_input(raw)?;
    limits.check(&input.damages, input.health)?;
    Ok(simulate(&input.damages, input.health))
}

pub fn run_rotation(raw: &str, limits: RotationLimits) -> Result<BattleReport, RotationError> {
    let outcome = simulate_bounded(raw, limits)?;
    Ok(build_report(&outcome, MAX_BLOCK_CHARS))
}

/// Serialize events as CSV. The header row is written even when the fight
/// produced no events.
pub fn events_to_csv(events: &[BattleEvent]) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for event in events {
        writer.serialize(event)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::chunker::BlockLabel;

    #[test]
    fn report_carries_header_values() {
        let report =
            run_rotation("100 50 200 1500", RotationLimits::default()).expect("valid rotation");
        assert_eq!(report.initial_health, 1500);
        assert_eq!(report.per_rotation_total, 350);
        assert_eq!(report.terminal_round, Some(5));
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].label, BlockLabel::Primary);
    }

    #[test]
    fn short_circuits_produce_no_blocks() {
        let never = run_rotation("0 0 100", RotationLimits::default()).expect("valid rotation");
        assert_eq!(never.termination, Termination::NeverDefeated);
        assert!(never.blocks.is_empty());
        assert_eq!(never.terminal_round, None);

        let already = run_rotation("10 -5", RotationLimits::default()).expect("valid rotation");
        assert_eq!(already.termination, Termination::AlreadyDefeated);
        assert!(already.blocks.is_empty());
    }

    #[test]
    fn round_limit_rejects_before_simulating() {
        let limits = RotationLimits {
            max_rounds: 10,
            ..RotationLimits::default()
        };
        let err = run_rotation("1 1000000", limits).expect_err("should exceed limit");
        assert_eq!(
            err,
            RotationError::TooManyRounds {
                projected: 1_000_000,
                limit: 10
            }
        );
    }

    #[test]
    fn event_limit_counts_hits_per_rotation() {
        // 2000 hits of 1 against 2_000_000 HP: 1000 rounds, 2_000_000 events.
        let mut raw = "1 ".repeat(2000);
        raw.push_str("2000000");
        let err = simulate_bounded(&raw, RotationLimits::default()).expect_err("too many events");
        assert_eq!(
            err,
            RotationError::TooManyEvents {
                projected: 2_000_000,
                limit: DEFAULT_MAX_EVENTS
            }
        );
    }

    #[test]
    fn short_circuits_pass_any_limit() {
        let limits = RotationLimits {
            max_rounds: 1,
            max_events: 1,
        };
        assert!(simulate_bounded("-1 -1 -1 100", limits).is_ok());
        assert!(simulate_bounded("5 5 5 0", limits).is_ok());
    }

    #[test]
    fn input_errors_pass_through() {
        assert!(matches!(
            run_rotation("x 10", RotationLimits::default()),
            Err(RotationError::Input(InputError::NotAnInteger { .. }))
        ));
    }

    #[test]
    fn text_report_lists_blocks_in_order() {
        let report = run_rotation("5 5 15", RotationLimits::default()).expect("valid rotation");
        let text = report.to_text();
        assert!(text.contains("Target HP: 15"));
        assert!(text.contains("Damage per Rotation: 10"));
        assert!(text.contains("📜 Battle Log 📜"));
        let first = text.find("Starting Rotation 1").expect("round 1 marker");
        let second = text.find("Starting Rotation 2").expect("round 2 marker");
        assert!(first < second);
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let outcome = simulate(&[1000], 999);
        let csv = events_to_csv(&outcome.events).expect("csv export");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("round,hit,damage,health_before,health_after"));
        assert_eq!(lines.next(), Some("1,1,1000,999,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_export_keeps_header_without_events() {
        let csv = events_to_csv(&simulate(&[0], 100).events).expect("csv export");
        assert_eq!(csv, "round,hit,damage,health_before,health_after\n");
    }
}
