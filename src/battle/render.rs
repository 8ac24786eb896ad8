//! Plain-text rendering of battle events. Markup for a specific chat platform
//! is left to the presentation layer.

use crate::battle::engine::{BattleEvent, BattleOutcome, Termination};

pub fn round_marker(round: u64) -> String {
    format!("🌀 Starting Rotation {round}")
}

pub fn hit_line(event: &BattleEvent) -> String {
    format!(
        " ┕ 🗡️ Hit {} ({} damage): {} HP ➔ {} HP",
        event.hit, event.damage, event.health_before, event.health_after
    )
}

/// One marker line whenever a new round starts, then one line per hit.
pub fn render_event_lines(events: &[BattleEvent]) -> Vec<String> {
    let mut lines = Vec::with_capacity(events.len() + events.len() / 2 + 1);
    let mut current_round = None;
    for event in events {
        if current_round != Some(event.round) {
            current_round = Some(event.round);
            lines.push(round_marker(event.round));
        }
        lines.push(hit_line(event));
    }
    lines
}

pub fn result_line(outcome: &BattleOutcome) -> String {
    match outcome.termination {
        Termination::Defeated { terminal_round } => {
            format!("The target was defeated in Rotation {terminal_round}.")
        }
        Termination::NeverDefeated => "🤔 The target will never be defeated.".to_string(),
        Termination::AlreadyDefeated => "✅ The target is already defeated!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::engine::simulate;

    #[test]
    fn markers_precede_each_round() {
        let outcome = simulate(&[5, 5], 15);
        let lines = render_event_lines(&outcome.events);
        assert_eq!(
            lines,
            vec![
                "🌀 Starting Rotation 1".to_string(),
                " ┕ 🗡️ Hit 1 (5 damage): 15 HP ➔ 10 HP".to_string(),
                " ┕ 🗡️ Hit 2 (5 damage): 10 HP ➔ 5 HP".to_string(),
                "🌀 Starting Rotation 2".to_string(),
                " ┕ 🗡️ Hit 1 (5 damage): 5 HP ➔ 0 HP".to_string(),
            ]
        );
    }

    #[test]
    fn no_events_render_no_lines() {
        assert!(render_event_lines(&[]).is_empty());
    }

    #[test]
    fn result_line_names_terminal_round() {
        assert_eq!(
            result_line(&simulate(&[100, 50, 200], 1500)),
            "The target was defeated in Rotation 5."
        );
        assert!(result_line(&simulate(&[0], 10)).contains("never"));
        assert!(result_line(&simulate(&[10], 0)).contains("already"));
    }
}
