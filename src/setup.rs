use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::board::{Board, Piece, PieceKind, Side, Square};
use crate::error::SetupError;
use crate::moves::Move;
use crate::position::Position;

static PIECE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([KQRNB]?)([a-h][1-8])$").unwrap());
static LAST_MOVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-h][1-8][a-h][1-8]$").unwrap());

/// Top-level JSON document: `{"chess-game": {...}}`.
#[derive(Debug, Deserialize)]
pub struct GameFile {
    #[serde(rename = "chess-game")]
    pub game: GameSetup,
}

/// The game description consumed by the board model. Placements are one
/// token per piece: a piece letter plus coordinates ("Ke1", "Qd8"), or bare
/// coordinates for a pawn ("e4"). `lastMove` is origin plus destination
/// ("d7d5") and only matters for en-passant eligibility in the very first
/// position.
#[derive(Debug, Default, Deserialize)]
pub struct GameSetup {
    pub turn: Option<String>,
    #[serde(default)]
    pub wpcs: Vec<String>,
    #[serde(default)]
    pub bpcs: Vec<String>,
    #[serde(rename = "lastMove")]
    pub last_move: Option<String>,
}

/// Per-side validation failures plus the shared gameplay slot, each
/// independent of the others. Any entry makes the whole setup invalid.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub white: Option<SetupError>,
    pub black: Option<SetupError>,
    pub gameplay: Option<SetupError>,
}

impl SetupReport {
    pub fn is_valid(&self) -> bool {
        self.white.is_none() && self.black.is_none() && self.gameplay.is_none()
    }
}

impl Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = |slot: &Option<SetupError>| match slot {
            None => String::from("OK"),
            Some(err) => format!("ERROR: {err}"),
        };
        writeln!(f, "Whites  : {}", line(&self.white))?;
        writeln!(f, "Blacks  : {}", line(&self.black))?;
        writeln!(f, "Gameplay: {}", line(&self.gameplay))?;
        write!(
            f,
            "Overall : {}",
            if self.is_valid() { "OK" } else { "INVALID" }
        )
    }
}

/// Builds the root Position from a parsed description, or the full report
/// of what is wrong with it. The search never starts on an invalid setup.
pub fn build_position(setup: &GameSetup) -> Result<Position, SetupReport> {
    let to_move = match setup.turn.as_deref().map(str::to_lowercase).as_deref() {
        Some("b") => Side::Black,
        _ => Side::White,
    };

    let mut report = SetupReport::default();
    let mut board = Board::default();

    let white = match place_side(Side::White, &setup.wpcs, &mut board) {
        Ok(pieces) => pieces,
        Err(err) => {
            route_error(&mut report, Side::White, err);
            Vec::new()
        }
    };
    let black = match place_side(Side::Black, &setup.bpcs, &mut board) {
        Ok(pieces) => pieces,
        Err(err) => {
            route_error(&mut report, Side::Black, err);
            Vec::new()
        }
    };

    let mut last_move = None;
    if report.is_valid() {
        if let Some(text) = setup.last_move.as_deref() {
            if !text.is_empty() {
                match parse_last_move(text, &board, to_move.opponent()) {
                    Ok(mv) => last_move = Some(mv),
                    Err(err) => report.gameplay = Some(err),
                }
            }
        }
    }

    if !report.is_valid() {
        return Err(report);
    }
    Ok(Position::from_pieces(to_move, white, black, last_move))
}

/// Parse errors concern the token text rather than the side's army, so they
/// land in the gameplay slot; count and placement problems stay with the
/// side that caused them.
fn route_error(report: &mut SetupReport, side: Side, err: SetupError) {
    let token_shaped = matches!(
        err,
        SetupError::InvalidCoordinates(_)
            | SetupError::InvalidPiece(_)
            | SetupError::InvalidPawnPosition(_)
    );
    if token_shaped {
        report.gameplay = Some(err);
        return;
    }
    match side {
        Side::White => report.white = Some(err),
        Side::Black => report.black = Some(err),
    }
}

/// Places one side's tokens on the shared board, enforcing the army-level
/// invariants: no duplicate occupancy, exactly one king, at most 8 pawns,
/// no more promoted pieces than missing pawns allow, and no two bishops
/// confined to same-colored squares.
fn place_side(
    side: Side,
    tokens: &[String],
    board: &mut Board,
) -> Result<Vec<(Piece, Square)>, SetupError> {
    let mut pieces = Vec::with_capacity(tokens.len());
    let mut counts: HashMap<PieceKind, usize> = HashMap::new();
    let mut bishop_colors = [false; 2];
    let mut promoted = 0usize;

    for token in tokens {
        let (kind, sq) = parse_piece_token(token)?;
        let entry = counts.entry(kind).or_insert(0);
        *entry += 1;

        if matches!(
            kind,
            PieceKind::Queen | PieceKind::Rook | PieceKind::Knight | PieceKind::Bishop
        ) {
            let normal = if kind == PieceKind::Queen { 1 } else { 2 };
            if *entry > normal {
                promoted += 1;
            }
        }

        if !board.is_empty(sq) {
            return Err(SetupError::DuplicateSquare(sq));
        }

        if kind == PieceKind::Bishop {
            let color = ((sq.file() + sq.rank()) % 2) as usize;
            if bishop_colors[color] {
                // Technically reachable through promotion, but nobody
                // promotes to a bishop, so flag it as a typo.
                return Err(SetupError::BishopsSameColor { side });
            }
            bishop_colors[color] = true;
        }

        let piece = Piece::new(kind, side);
        board.set(sq, Some(piece));
        pieces.push((piece, sq));
    }

    let kings = counts.get(&PieceKind::King).copied().unwrap_or(0);
    if kings != 1 {
        return Err(SetupError::KingCount { side, count: kings });
    }
    let pawns = counts.get(&PieceKind::Pawn).copied().unwrap_or(0);
    if pawns > 8 {
        return Err(SetupError::TooManyPawns { side, count: pawns });
    }
    if promoted > 8 - pawns {
        return Err(SetupError::TooManyPromoted {
            side,
            pawns,
            promoted,
        });
    }

    Ok(pieces)
}

fn parse_piece_token(token: &str) -> Result<(PieceKind, Square), SetupError> {
    let Some(caps) = PIECE_TOKEN_RE.captures(token) else {
        return Err(classify_bad_token(token));
    };
    let kind = match caps.get(1).map(|m| m.as_str()) {
        Some("") | None => PieceKind::Pawn,
        Some(letter) => PieceKind::from_letter(letter.chars().next().unwrap()).unwrap(),
    };
    // the regex guarantees the coordinates parse
    let sq = Square::parse(caps.get(2).unwrap().as_str()).unwrap();
    if kind == PieceKind::Pawn && (sq.rank() == 0 || sq.rank() == 7) {
        return Err(SetupError::InvalidPawnPosition(token.to_string()));
    }
    Ok((kind, sq))
}

fn classify_bad_token(token: &str) -> SetupError {
    match token.chars().next() {
        Some('a'..='h') => SetupError::InvalidCoordinates(token.to_string()),
        Some(c) if "KQRNB".contains(c) => {
            SetupError::InvalidCoordinates(token[c.len_utf8()..].to_string())
        }
        _ => SetupError::InvalidPiece(token.to_string()),
    }
}

/// A last move must be 4 coordinates, and its destination must hold a piece
/// of the side that is about to wait, or the record contradicts the turn.
fn parse_last_move(text: &str, board: &Board, waiting: Side) -> Result<Move, SetupError> {
    if !LAST_MOVE_RE.is_match(text) {
        return Err(SetupError::MalformedLastMove(text.to_string()));
    }
    let from = Square::parse(&text[0..2]).unwrap();
    let to = Square::parse(&text[2..4]).unwrap();
    match board.get(to) {
        Some(piece) if piece.side == waiting => Ok(Move::new(from, to)),
        _ => Err(SetupError::LastMoveConflict(text.to_string())),
    }
}
