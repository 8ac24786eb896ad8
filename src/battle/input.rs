//! Parsing of the rotation command: every value but the last is a per-hit
//! damage, the last is the target's starting health.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("expected damage values followed by the target health, got {found} value(s)")]
    TooFewValues { found: usize },
    #[error("'{token}' is not an integer")]
    NotAnInteger { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationInput {
    pub damages: Vec<i64>,
    pub health: i64,
}

/// Parse e.g. `"100 50 200 1500"`. Any token that is not an `i64` rejects the
/// whole request; the token check runs before the count check.
pub fn parse_rotation_input(raw: &str) -> Result<RotationInput, InputError> {
    let mut values = raw
        .split_whitespace()
        .map(|token| {
            token.parse::<i64>().map_err(|_| InputError::NotAnInteger {
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() < 2 {
        return Err(InputError::TooFewValues {
            found: values.len(),
        });
    }

    let health = values.pop().unwrap_or_default();
    Ok(RotationInput {
        damages: values,
        health,
    })
}
