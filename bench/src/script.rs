use std::{num::ParseIntError, time::Duration};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDurationError {
    #[error("missing unit in `{0}`, expected one of ms, s, m or h")]
    MissingUnit(String),
    #[error("unknown unit `{unit}` in `{input}`, expected one of ms, s, m or h")]
    UnknownUnit { input: String, unit: String },
    #[error("invalid number in `{0}`")]
    InvalidNumber(String, #[source] ParseIntError),
}

/// Parses durations such as `250ms`, `90s`, `25m` or `6h`.
///
/// # Errors
///
/// Returns an error if the number or the unit is missing or malformed.
pub fn parse_duration(input: &str) -> Result<Duration, ParseDurationError> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    if unit.is_empty() {
        return Err(ParseDurationError::MissingUnit(input.to_owned()));
    }

    let number = number
        .parse::<u64>()
        .map_err(|err| ParseDurationError::InvalidNumber(input.to_owned(), err))?;

    let millis = match unit.trim() {
        "ms" => number,
        "s" => number.saturating_mul(1000),
        "m" => number.saturating_mul(60 * 1000),
        "h" => number.saturating_mul(60 * 60 * 1000),
        unit => {
            return Err(ParseDurationError::UnknownUnit {
                input: input.to_owned(),
                unit: unit.to_owned(),
            });
        }
    };

    Ok(Duration::from_millis(millis))
}

/// One button press, in milliseconds since boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Press {
    at: u64,
    release: u64,
}

/// Raw button level over time for a list of presses.
///
/// Contacts chatter for `bounce` after both the press and the release, flipping every
/// millisecond and starting on the new level.
#[derive(Clone, Debug, Default)]
pub struct ButtonScript {
    presses: Vec<Press>,
    bounce: u64,
}

impl ButtonScript {
    pub fn new<I>(presses: I, hold: Duration, bounce: Duration) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let hold = millis(hold);
        let mut presses = presses
            .into_iter()
            .map(|at| {
                let at = millis(at);
                Press {
                    at,
                    release: at.saturating_add(hold),
                }
            })
            .collect::<Vec<_>>();
        presses.sort_unstable_by_key(|press| press.at);

        Self {
            presses,
            bounce: millis(bounce),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presses.is_empty()
    }

    /// Raw level at `now` milliseconds since boot, `true` meaning pressed.
    #[must_use]
    pub fn level(&self, now: u64) -> bool {
        self.presses.iter().any(|press| {
            if now < press.at {
                return false;
            }

            let pressed = now < press.release;
            let since_edge = if pressed {
                now - press.at
            } else {
                now - press.release
            };

            if since_edge < self.bounce {
                // Flips every millisecond, starting on the new level.
                pressed == (since_edge % 2 == 0)
            } else {
                pressed
            }
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
