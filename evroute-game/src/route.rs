//! Route script parsing and replay.
//!
//! A route is a linear script, one event per line:
//!
//! ```text
//! # comments run to the end of the line
//! force 12          # candies until level 12
//! candy 2           # exactly two level-ups
//! starly 7          # trainer battle against a level 7 starly
//! mr. mime 20 shared
//! ```
//!
//! Lines that cannot be understood are reported as diagnostics and skipped;
//! they never abort the rest of the route.
use thiserror::Error;

use crate::constants::{
    ABBREVIATION_MARK, COMMENT_MARKER, KEYWORD_CANDY, KEYWORD_FORCE, KEYWORD_SHARED, MAX_LEVEL,
    MIN_LEVEL,
};
use crate::curve::ExperienceCurve;
use crate::state::{CreatureState, SimError};
use crate::yields::YieldTable;

/// One simulation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCommand {
    Force {
        target_level: u32,
    },
    Candy {
        count: u32,
    },
    Battle {
        opponent: String,
        opponent_level: u32,
        shared: bool,
    },
}

impl std::fmt::Display for RouteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Force { target_level } => write!(f, "{KEYWORD_FORCE} {target_level}"),
            Self::Candy { count } => write!(f, "{KEYWORD_CANDY} {count}"),
            Self::Battle {
                opponent,
                opponent_level,
                shared,
            } => {
                write!(f, "{opponent} {opponent_level}")?;
                if *shared {
                    write!(f, " {KEYWORD_SHARED}")?;
                }
                Ok(())
            }
        }
    }
}

/// A command together with the script line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStep {
    pub line: usize,
    pub command: RouteCommand,
}

/// Why a route line was skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteLineError {
    #[error("unknown opponent `{0}`")]
    UnknownOpponent(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("{field} `{token}` is not a whole number")]
    InvalidNumber { field: &'static str, token: String },
    #[error("{field} {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// A skipped line and the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDiagnostic {
    pub line: usize,
    pub text: String,
    pub error: RouteLineError,
}

impl std::fmt::Display for RouteDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {} (`{}`)", self.line, self.error, self.text)
    }
}

/// Parsed commands plus every line that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRoute {
    pub steps: Vec<RouteStep>,
    pub diagnostics: Vec<RouteDiagnostic>,
}

impl ParsedRoute {
    #[must_use]
    pub fn commands(&self) -> Vec<&RouteCommand> {
        self.steps.iter().map(|step| &step.command).collect()
    }
}

/// Line parser validating opponents against a yield table.
#[derive(Debug, Clone, Copy)]
pub struct RouteParser<'a> {
    table: &'a YieldTable,
}

impl<'a> RouteParser<'a> {
    #[must_use]
    pub const fn new(table: &'a YieldTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn parse(&self, script: &str) -> ParsedRoute {
        let mut route = ParsedRoute::default();
        for (index, raw) in script.lines().enumerate() {
            let line = index + 1;
            match self.parse_line(raw) {
                Ok(Some(command)) => route.steps.push(RouteStep { line, command }),
                Ok(None) => {}
                Err(error) => {
                    log::warn!("skipping route line {line}: {error}");
                    route.diagnostics.push(RouteDiagnostic {
                        line,
                        text: raw.trim().to_string(),
                        error,
                    });
                }
            }
        }
        route
    }

    /// Parse a single line. Blank and comment-only lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the reason the line cannot become a command.
    pub fn parse_line(&self, raw: &str) -> Result<Option<RouteCommand>, RouteLineError> {
        let code = raw
            .split_once(COMMENT_MARKER)
            .map_or(raw, |(code, _comment)| code)
            .to_lowercase();
        let tokens: Vec<&str> = code.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Ok(None);
        };

        let command = match *first {
            KEYWORD_FORCE => {
                let token = tokens.get(1).ok_or(RouteLineError::Missing("target level"))?;
                let target_level = parse_number(token, "target level")?;
                if target_level > MAX_LEVEL {
                    return Err(RouteLineError::OutOfRange {
                        field: "target level",
                        value: target_level,
                        min: MIN_LEVEL,
                        max: MAX_LEVEL,
                    });
                }
                RouteCommand::Force { target_level }
            }
            KEYWORD_CANDY => {
                let count = match tokens.get(1) {
                    Some(token) => parse_number(token, "candy count")?,
                    None => 1,
                };
                if count == 0 {
                    return Err(RouteLineError::OutOfRange {
                        field: "candy count",
                        value: count,
                        min: 1,
                        max: u32::MAX,
                    });
                }
                RouteCommand::Candy { count }
            }
            _ => self.parse_battle(&tokens)?,
        };
        Ok(Some(command))
    }

    fn parse_battle(&self, tokens: &[&str]) -> Result<RouteCommand, RouteLineError> {
        let (opponent, consumed) = self.resolve_identifier(tokens);
        if !self.table.contains(&opponent) {
            return Err(RouteLineError::UnknownOpponent(opponent));
        }
        let token = match tokens.get(consumed) {
            Some(&KEYWORD_SHARED) if consumed + 1 == tokens.len() => None,
            token => token,
        }
        .ok_or(RouteLineError::Missing("opponent level"))?;
        let opponent_level = parse_level(token, "opponent level")?;
        let shared = tokens.len() > consumed + 1 && tokens.last() == Some(&KEYWORD_SHARED);
        Ok(RouteCommand::Battle {
            opponent,
            opponent_level,
            shared,
        })
    }

    /// Pick the longest run of leading tokens naming a known species, so
    /// names such as `mr. mime` or `mime jr.` survive tokenization.
    fn resolve_identifier(&self, tokens: &[&str]) -> (String, usize) {
        let longest = self
            .table
            .max_identifier_words()
            .min(tokens.len())
            .max(1);
        for words in (1..=longest).rev() {
            let candidate = tokens[..words].join(" ");
            if self.table.contains(&candidate) {
                return (candidate, words);
            }
        }
        // Unknown abbreviated names still get reported as one identifier.
        if tokens.len() > 2
            && (tokens[0].ends_with(ABBREVIATION_MARK) || tokens[1].ends_with(ABBREVIATION_MARK))
        {
            return (format!("{} {}", tokens[0], tokens[1]), 2);
        }
        (tokens[0].to_string(), 1)
    }
}

/// Parse `script` against `table`.
#[must_use]
pub fn parse_route(script: &str, table: &YieldTable) -> ParsedRoute {
    RouteParser::new(table).parse(script)
}

/// Apply every step of `route` to `state` in order.
///
/// Opponents the state cannot resolve are reported and skipped. Any other
/// simulation error stops the replay.
///
/// # Errors
///
/// Returns the first fatal [`SimError`], such as a non-progressing curve.
pub fn replay<C>(
    state: &mut CreatureState<'_, C>,
    route: &ParsedRoute,
) -> Result<Vec<RouteDiagnostic>, SimError>
where
    C: ExperienceCurve,
{
    let mut diagnostics = Vec::new();
    for step in &route.steps {
        let outcome = match &step.command {
            RouteCommand::Force { target_level } => state.force(*target_level),
            RouteCommand::Candy { count } => {
                let mut gained = 0;
                for _ in 0..*count {
                    gained += state.candy()?;
                }
                Ok(gained)
            }
            RouteCommand::Battle {
                opponent,
                opponent_level,
                shared,
            } => state.battle(opponent, *opponent_level, *shared),
        };
        match outcome {
            Ok(_) => {}
            Err(SimError::UnknownOpponent { opponent }) => {
                log::warn!("skipping route line {}: unknown opponent `{opponent}`", step.line);
                diagnostics.push(RouteDiagnostic {
                    line: step.line,
                    text: step.command.to_string(),
                    error: RouteLineError::UnknownOpponent(opponent),
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(diagnostics)
}

fn parse_number(token: &str, field: &'static str) -> Result<u32, RouteLineError> {
    token
        .parse::<u32>()
        .map_err(|_| RouteLineError::InvalidNumber {
            field,
            token: token.to_string(),
        })
}

fn parse_level(token: &str, field: &'static str) -> Result<u32, RouteLineError> {
    let value = parse_number(token, field)?;
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&value) {
        return Err(RouteLineError::OutOfRange {
            field,
            value,
            min: MIN_LEVEL,
            max: MAX_LEVEL,
        });
    }
    Ok(value)
}
