//! UCI command parsing.

use std::time::Duration;

use kestrel_core::{Game, GameError};

use crate::error::UciError;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches to the configured depth cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<i32>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search until `stop` (no time limit).
    pub infinite: bool,
}

/// An option set through `setoption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciOption {
    /// Transposition table size in megabytes.
    Hash(usize),
    /// Default depth cap for searches without a `depth` limit.
    MaxDepth(i32),
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- set up a game with optional moves applied.
    Position(Game),
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    /// `setoption name <id> value <x>`.
    SetOption(UciOption),
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// `print` -- log the current position.
    Print,
    /// Unrecognized command (silently ignored per the UCI protocol).
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "print" => Ok(Command::Print),
        "position" => parse_position(args),
        "go" => parse_go(args),
        "setoption" => parse_setoption(args, line),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
///
/// Any illegal move rejects the whole command.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let (mut game, rest) = match tokens.first() {
        Some(&"startpos") => (Game::startpos(), &tokens[1..]),
        Some(&"fen") => {
            // FEN is 6 space-separated fields
            if tokens.len() < 7 {
                return Err(UciError::InvalidFen {
                    fen: tokens[1..].join(" "),
                    reason: "expected 6 fields".to_string(),
                });
            }
            let fen = tokens[1..7].join(" ");
            let game = Game::from_fen(&fen).map_err(|e| match e {
                GameError::InvalidFen { fen, reason } => UciError::InvalidFen { fen, reason },
                other => UciError::InvalidFen {
                    fen: fen.clone(),
                    reason: other.to_string(),
                },
            })?;
            (game, &tokens[7..])
        }
        _ => return Err(UciError::MalformedPosition),
    };

    // Apply moves if present: "moves e2e4 d7d5 ..."
    if let Some((&"moves", moves)) = rest.split_first() {
        for uci_move in moves {
            game.play_uci(uci_move).map_err(|_| UciError::InvalidMove {
                uci_move: uci_move.to_string(),
            })?;
        }
    }

    Ok(Command::Position(game))
}

/// Parse the `go` command arguments.
///
/// Supports: wtime, btime, winc, binc, movestogo, depth, movetime,
/// infinite. Unknown tokens are silently skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1);
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movestogo" => params.movestogo = Some(parse_int(value, "movestogo")?),
            "depth" => params.depth = Some(parse_int(value, "depth")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            // Unknown token -- skip per UCI convention
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(params))
}

/// Parse `setoption name <id> value <x>`.
fn parse_setoption(tokens: &[&str], line: &str) -> Result<Command, UciError> {
    let unknown = || UciError::UnknownOption {
        line: line.trim().to_string(),
    };

    let name_at = tokens.iter().position(|t| *t == "name").ok_or_else(unknown)?;
    let value_at = tokens.iter().position(|t| *t == "value").ok_or_else(unknown)?;
    if value_at <= name_at {
        return Err(unknown());
    }
    let name = tokens[name_at + 1..value_at].join(" ");
    let value = tokens.get(value_at + 1).ok_or_else(unknown)?;

    if name.eq_ignore_ascii_case("hash") {
        let mb = value.parse::<usize>().map_err(|_| unknown())?;
        Ok(Command::SetOption(UciOption::Hash(mb.max(1))))
    } else if name.eq_ignore_ascii_case("maxdepth") {
        let depth = value.parse::<i32>().map_err(|_| unknown())?;
        Ok(Command::SetOption(UciOption::MaxDepth(depth.max(1))))
    } else {
        Err(unknown())
    }
}

/// Parse a millisecond value from a token.
fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    // Some GUIs send negative clock values when flagging; treat them as 0.
    let ms: i64 = parse_int(token, param)?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

/// Parse an integer value from a token.
fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}
