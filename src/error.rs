use thiserror::Error;

use crate::board::{Side, Square};

/// Input validation failures. Reported per side plus a shared gameplay slot,
/// matching the shape of the setup report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("invalid board coordinates '{0}' (must be xy, x=a-h, y=1-8)")]
    InvalidCoordinates(String),

    #[error("invalid piece '{0}'")]
    InvalidPiece(String),

    #[error("invalid pawn position '{0}'")]
    InvalidPawnPosition(String),

    #[error("two pieces in same position {0}")]
    DuplicateSquare(Square),

    #[error("{count} King pieces for {side} player")]
    KingCount { side: Side, count: usize },

    #[error("{count} pawns for {side} player")]
    TooManyPawns { side: Side, count: usize },

    #[error("{pawns} pawns {promoted} promoted pieces, too many for {side} player")]
    TooManyPromoted { side: Side, pawns: usize, promoted: usize },

    #[error("two Bishops on same-colored squares for {side} player")]
    BishopsSameColor { side: Side },

    #[error("invalid last move '{0}' (should be of the form 'e2e4')")]
    MalformedLastMove(String),

    #[error("last move '{0}' in conflict with existing pieces, or turn")]
    LastMoveConflict(String),
}

/// The starting position parsed cleanly but is not a legal game state.
/// All variants are fatal before the search begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("invalid scenario: both players are under check simultaneously")]
    BothSidesInCheck,

    #[error("invalid scenario: player {to_move} will move next -> player {waiting} can't be in check")]
    WaitingSideInCheck { to_move: Side, waiting: Side },

    #[error("more than 2 checks simultaneously on the {side} King ({checks})")]
    TooManyChecks { side: Side, checks: u8 },
}

/// A position generated during the search violates an invariant that legal
/// play cannot violate. This means a move-generation or transition bug, so
/// the run aborts instead of tolerating it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("game #{num} at depth {depth}: {checks} simultaneous checks on the {side} King")]
    InvariantViolation {
        num: u64,
        depth: u16,
        side: Side,
        checks: u8,
    },
}
