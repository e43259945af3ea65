use crate::board::{Board, Piece, PieceKind, Side, Square};

/// Single-step king directions.
#[rustfmt::skip]
pub const KING_DIRS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1),
];

#[rustfmt::skip]
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, 1), (-1, 2), (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1),
];

pub const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

pub const BISHOP_DIRS: [(i8, i8); 4] = [(-1, 1), (1, -1), (1, 1), (-1, -1)];

#[rustfmt::skip]
pub const QUEEN_DIRS: [(i8, i8); 8] = [
    (0, 1), (0, -1), (1, 0), (-1, 0), (-1, 1), (1, -1), (1, 1), (-1, -1),
];

/// Squares a pawn of `side` attacks, relative to the pawn.
#[inline]
pub const fn pawn_attack_deltas(side: Side) -> [(i8, i8); 2] {
    match side {
        Side::White => [(-1, 1), (1, 1)],
        Side::Black => [(-1, -1), (1, -1)],
    }
}

/// Per-square count of how many pieces of one side attack it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttackMap {
    counts: [u8; 64],
}

impl Default for AttackMap {
    fn default() -> Self {
        AttackMap { counts: [0; 64] }
    }
}

impl AttackMap {
    #[inline]
    pub fn count(&self, sq: Square) -> u8 {
        self.counts[sq.index()]
    }

    #[inline]
    pub fn is_attacked(&self, sq: Square) -> bool {
        self.counts[sq.index()] > 0
    }

    #[inline]
    fn bump(&mut self, sq: Square) {
        self.counts[sq.index()] += 1;
    }
}

/// Accumulates the attack footprint of every piece in `pieces` over `board`.
/// Sliding pieces stop scanning a direction at the first occupied square;
/// that square is still counted as attacked.
pub fn attack_map(board: &Board, pieces: &[(Piece, Square)]) -> AttackMap {
    let mut map = AttackMap::default();
    for &(piece, sq) in pieces {
        match piece.kind {
            PieceKind::Pawn => {
                for (dx, dy) in pawn_attack_deltas(piece.side) {
                    if let Some(target) = sq.offset(dx, dy) {
                        map.bump(target);
                    }
                }
            }
            PieceKind::King => {
                for (dx, dy) in KING_DIRS {
                    if let Some(target) = sq.offset(dx, dy) {
                        map.bump(target);
                    }
                }
            }
            PieceKind::Knight => {
                for (dx, dy) in KNIGHT_OFFSETS {
                    if let Some(target) = sq.offset(dx, dy) {
                        map.bump(target);
                    }
                }
            }
            PieceKind::Queen => slide(board, &mut map, sq, &QUEEN_DIRS),
            PieceKind::Rook => slide(board, &mut map, sq, &ROOK_DIRS),
            PieceKind::Bishop => slide(board, &mut map, sq, &BISHOP_DIRS),
        }
    }
    map
}

fn slide(board: &Board, map: &mut AttackMap, from: Square, dirs: &[(i8, i8)]) {
    for &(dx, dy) in dirs {
        let mut cur = from;
        while let Some(next) = cur.offset(dx, dy) {
            map.bump(next);
            if !board.is_empty(next) {
                break;
            }
            cur = next;
        }
    }
}

/// Counts the distinct enemy pieces checking the king of `side` on `king_sq`.
/// Pawn checks contribute at most one; each sliding ray and each knight
/// square contributes independently. Values of 3 or more are impossible under
/// legal play and are classified by the caller, never clamped here.
pub fn count_checks(board: &Board, king_sq: Square, side: Side) -> u8 {
    pawn_checks(board, king_sq, side)
        + sliding_checks(board, king_sq, side)
        + knight_checks(board, king_sq, side)
}

fn pawn_checks(board: &Board, king_sq: Square, side: Side) -> u8 {
    // An enemy pawn checks from the squares our own pawns would attack from.
    let enemy = Piece::new(PieceKind::Pawn, side.opponent());
    for (dx, dy) in pawn_attack_deltas(side) {
        if let Some(sq) = king_sq.offset(dx, dy) {
            if board.get(sq) == Some(enemy) {
                return 1;
            }
        }
    }
    0
}

fn sliding_checks(board: &Board, king_sq: Square, side: Side) -> u8 {
    let mut checks = 0;
    for (dx, dy) in QUEEN_DIRS {
        let diagonal = dx != 0 && dy != 0;
        let mut cur = king_sq;
        while let Some(next) = cur.offset(dx, dy) {
            match board.get(next) {
                None => cur = next,
                Some(piece) => {
                    if piece.side != side {
                        let ray_kind = if diagonal { PieceKind::Bishop } else { PieceKind::Rook };
                        if piece.kind == PieceKind::Queen || piece.kind == ray_kind {
                            checks += 1;
                        }
                    }
                    // First occupied square decides the ray either way.
                    break;
                }
            }
        }
    }
    checks
}

fn knight_checks(board: &Board, king_sq: Square, side: Side) -> u8 {
    let enemy = Piece::new(PieceKind::Knight, side.opponent());
    let mut checks = 0;
    for (dx, dy) in KNIGHT_OFFSETS {
        if let Some(sq) = king_sq.offset(dx, dy) {
            if board.get(sq) == Some(enemy) {
                checks += 1;
            }
        }
    }
    checks
}
