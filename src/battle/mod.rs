//! Rotation battle simulator: deterministic hit-by-hit resolution against a
//! fixed health pool, plus the line rendering and size-bounded chunking of the
//! resulting battle log.

pub mod chunker;
pub mod engine;
pub mod input;
pub mod render;
pub mod report;

pub use chunker::{chunk_lines, BlockLabel, LogBlock, MAX_BLOCK_CHARS};
pub use engine::{
    projected_terminal_round, simulate, BattleEvent, BattleHit, BattleOutcome, Termination,
};
pub use input::{parse_rotation_input, InputError, RotationInput};
pub use render::{render_event_lines, result_line};
pub use report::{
    build_report, events_to_csv, run_rotation, simulate_bounded, BattleReport, RotationError,
    RotationLimits, DEFAULT_MAX_EVENTS, DEFAULT_MAX_ROUNDS,
};
