use crate::attacks::{BISHOP_DIRS, KING_DIRS, KNIGHT_OFFSETS, QUEEN_DIRS, ROOK_DIRS};
use crate::board::{PieceKind, Side, Square};
use crate::moves::{Move, MoveList};
use crate::position::Position;

/// Enumerates the moves of the side to move, given its current check count.
///
/// Under double check only king moves come back, since no single piece can
/// block or capture two checkers at once. Ordering is pawn moves, then king
/// moves (castles ahead of steps), then the remaining pieces in piece-list
/// order; expansion numbering downstream depends on this order staying put.
///
/// Moves that leave the mover's own king in check are still emitted here;
/// the search discards them after applying the move.
pub fn generate_moves(pos: &Position, checks: u8) -> MoveList {
    let mut pawn_moves = MoveList::default();
    let mut king_moves = MoveList::default();
    let mut other_moves = MoveList::default();

    append_king_moves(pos, &mut king_moves);
    if checks < 2 {
        for &(piece, sq) in pos.pieces[pos.to_move.index()].iter().skip(1) {
            match piece.kind {
                PieceKind::Pawn => append_pawn_moves(pos, sq, &mut pawn_moves),
                kind => append_piece_moves(pos, kind, sq, &mut other_moves),
            }
        }
    }

    let mut moves = pawn_moves;
    moves.extend(king_moves);
    moves.extend(other_moves);
    moves
}

/// King steps plus castling. Castles are emitted as a bare 2-file king move;
/// the transition layer relocates the rook from the file delta alone.
///
/// Step destinations are filtered against the opponent's footprint as it was
/// computed with the king still standing on its origin square. A retreat
/// along the very ray that attacks the king slips through this filter and is
/// caught by the post-move check test instead.
fn append_king_moves(pos: &Position, moves: &mut MoveList) {
    let side = pos.to_move;
    let king_sq = pos.king_square(side);
    let enemy = &pos.footprints[pos.waiting().index()];
    let rights = pos.castling[side.index()];
    let rank = side.home_rank();

    if rights.long && can_castle_long(pos, rank) {
        moves.push(Move::new(king_sq, Square::new(2, rank)));
    }
    if rights.short && can_castle_short(pos, rank) {
        moves.push(Move::new(king_sq, Square::new(6, rank)));
    }

    for (dx, dy) in KING_DIRS {
        let Some(dest) = king_sq.offset(dx, dy) else {
            continue;
        };
        if let Some(piece) = pos.board.get(dest) {
            if piece.side == side {
                continue;
            }
        }
        if enemy.is_attacked(dest) {
            continue;
        }
        moves.push(Move::new(king_sq, dest));
    }
}

/// Long castle needs b, c and d empty, and c, d and e free of enemy attacks
/// (destination, transit and the king's current square).
fn can_castle_long(pos: &Position, rank: u8) -> bool {
    let enemy = &pos.footprints[pos.waiting().index()];
    !enemy.is_attacked(Square::new(2, rank))
        && !enemy.is_attacked(Square::new(3, rank))
        && !enemy.is_attacked(Square::new(4, rank))
        && pos.board.is_empty(Square::new(1, rank))
        && pos.board.is_empty(Square::new(2, rank))
        && pos.board.is_empty(Square::new(3, rank))
}

fn can_castle_short(pos: &Position, rank: u8) -> bool {
    let enemy = &pos.footprints[pos.waiting().index()];
    !enemy.is_attacked(Square::new(4, rank))
        && !enemy.is_attacked(Square::new(5, rank))
        && !enemy.is_attacked(Square::new(6, rank))
        && pos.board.is_empty(Square::new(5, rank))
        && pos.board.is_empty(Square::new(6, rank))
}

/// Queen, rook, bishop and knight moves. Sliders walk each ray over empty
/// squares and stop after at most one capture; knights test their fixed
/// offsets.
fn append_piece_moves(pos: &Position, kind: PieceKind, from: Square, moves: &mut MoveList) {
    let side = pos.to_move;
    let dirs: &[(i8, i8)] = match kind {
        PieceKind::Queen => &QUEEN_DIRS,
        PieceKind::Rook => &ROOK_DIRS,
        PieceKind::Bishop => &BISHOP_DIRS,
        PieceKind::Knight => &KNIGHT_OFFSETS,
        PieceKind::King | PieceKind::Pawn => unreachable!("handled by dedicated generators"),
    };
    let slides = kind != PieceKind::Knight;

    for &(dx, dy) in dirs {
        let mut cur = from;
        while let Some(dest) = cur.offset(dx, dy) {
            match pos.board.get(dest) {
                None => {
                    moves.push(Move::new(from, dest));
                }
                Some(piece) => {
                    if piece.side != side {
                        moves.push(Move::new(from, dest));
                    }
                    break;
                }
            }
            if !slides {
                break;
            }
            cur = dest;
        }
    }
}

/// The four conditional pawn templates: capture left, forward one, forward
/// two, capture right. Diagonals into an empty square are only legal as an
/// en-passant capture of a pawn that just made its 2-square advance, which
/// is what the position's last-move record exists to witness.
fn append_pawn_moves(pos: &Position, from: Square, moves: &mut MoveList) {
    let side = pos.to_move;
    let fwd = side.forward();
    let start_rank = match side {
        Side::White => 1,
        Side::Black => 6,
    };
    // Rank an en-passant capture lands on.
    let ep_dest_rank = match side {
        Side::White => 5,
        Side::Black => 2,
    };
    let enemy_pawn_home = match side {
        Side::White => 6,
        Side::Black => 1,
    };

    for (dx, dy) in [(-1, fwd), (0, fwd), (0, 2 * fwd), (1, fwd)] {
        let Some(dest) = from.offset(dx, dy) else {
            continue;
        };
        let occupant = pos.board.get(dest);

        if dx == 0 {
            if occupant.is_some() {
                continue;
            }
            if dy == 2 * fwd && dy != fwd {
                if from.rank() != start_rank {
                    continue;
                }
                let mid = from.offset(0, fwd).unwrap();
                if !pos.board.is_empty(mid) {
                    continue;
                }
            }
        } else {
            match occupant {
                Some(piece) => {
                    if piece.side == side {
                        continue;
                    }
                }
                None => {
                    if dest.rank() != ep_dest_rank {
                        continue;
                    }
                    let beside = Square::new(dest.file(), from.rank());
                    match pos.board.get(beside) {
                        Some(p) if p.kind == PieceKind::Pawn && p.side != side => {}
                        _ => continue,
                    }
                    let Some(last) = pos.last_move else {
                        continue;
                    };
                    if last.to != beside {
                        // that pawn did not make the very last move
                        continue;
                    }
                    if last.from.rank() != enemy_pawn_home {
                        // it moved, but not with a 2-square advance
                        continue;
                    }
                }
            }
        }
        moves.push(Move::new(from, dest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, PieceKind, Side, Square};
    use crate::position::Position;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn pc(kind: PieceKind, side: Side) -> Piece {
        Piece::new(kind, side)
    }

    fn moves_of(pos: &mut Position) -> MoveList {
        let checks = pos.compute_checks(pos.to_move);
        generate_moves(pos, checks)
    }

    fn contains(moves: &MoveList, from: &str, to: &str) -> bool {
        moves.iter().any(|m| m.from == sq(from) && m.to == sq(to))
    }

    #[test]
    fn double_check_restricts_to_king_moves() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("e1")),
                (pc(PieceKind::Queen, Side::White), sq("a5")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("h8")),
                (pc(PieceKind::Rook, Side::Black), sq("e8")),
                (pc(PieceKind::Knight, Side::Black), sq("f3")),
            ],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(
            moves.iter().all(|m| m.from == sq("e1")),
            "only king moves under double check, got {moves:?}"
        );
    }

    #[test]
    fn en_passant_capture_is_generated() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("e1")),
                (pc(PieceKind::Pawn, Side::White), sq("e5")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("e8")),
                (pc(PieceKind::Pawn, Side::Black), sq("d5")),
            ],
            Some(Move::new(sq("d7"), sq("d5"))),
        );
        let moves = moves_of(&mut pos);
        assert!(contains(&moves, "e5", "d6"), "expected e5xd6 in passing");
    }

    #[test]
    fn no_en_passant_without_the_matching_last_move() {
        // same layout, but the recorded last move was a 1-square advance
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("e1")),
                (pc(PieceKind::Pawn, Side::White), sq("e5")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("e8")),
                (pc(PieceKind::Pawn, Side::Black), sq("d5")),
            ],
            Some(Move::new(sq("d6"), sq("d5"))),
        );
        let moves = moves_of(&mut pos);
        assert!(!contains(&moves, "e5", "d6"));
    }

    #[test]
    fn castling_blocked_by_attack_on_transit_square() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("e1")),
                (pc(PieceKind::Rook, Side::White), sq("h1")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("a8")),
                (pc(PieceKind::Rook, Side::Black), sq("f8")),
            ],
            None,
        );
        assert!(pos.castling[0].short);
        let moves = moves_of(&mut pos);
        assert!(!contains(&moves, "e1", "g1"), "castling through an attacked square");
    }

    #[test]
    fn castling_generated_when_path_is_clear() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("e1")),
                (pc(PieceKind::Rook, Side::White), sq("a1")),
                (pc(PieceKind::Rook, Side::White), sq("h1")),
            ],
            vec![(pc(PieceKind::King, Side::Black), sq("a8"))],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(contains(&moves, "e1", "c1"), "expected 0-0-0");
        assert!(contains(&moves, "e1", "g1"), "expected 0-0");
    }

    #[test]
    fn castling_blocked_by_a_piece_in_between() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("e1")),
                (pc(PieceKind::Rook, Side::White), sq("a1")),
                (pc(PieceKind::Knight, Side::White), sq("b1")),
            ],
            vec![(pc(PieceKind::King, Side::Black), sq("h8"))],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(!contains(&moves, "e1", "c1"));
    }

    #[test]
    fn king_does_not_step_onto_attacked_squares() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![(pc(PieceKind::King, Side::White), sq("e1"))],
            vec![
                (pc(PieceKind::King, Side::Black), sq("h8")),
                (pc(PieceKind::Rook, Side::Black), sq("d8")),
            ],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(!contains(&moves, "e1", "d1"));
        assert!(!contains(&moves, "e1", "d2"));
        assert!(contains(&moves, "e1", "f1"));
    }

    #[test]
    fn king_does_not_capture_a_defended_piece() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![(pc(PieceKind::King, Side::White), sq("e1"))],
            vec![
                (pc(PieceKind::King, Side::Black), sq("h8")),
                (pc(PieceKind::Knight, Side::Black), sq("e2")),
                (pc(PieceKind::Rook, Side::Black), sq("e8")),
            ],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(!contains(&moves, "e1", "e2"), "e2 is defended by the rook");
    }

    #[test]
    fn pawn_double_step_needs_both_squares_clear() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("h1")),
                (pc(PieceKind::Pawn, Side::White), sq("e2")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("h8")),
                (pc(PieceKind::Knight, Side::Black), sq("e3")),
            ],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(!contains(&moves, "e2", "e3"));
        assert!(!contains(&moves, "e2", "e4"), "blocked on the intermediate square");

        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("h1")),
                (pc(PieceKind::Pawn, Side::White), sq("e2")),
            ],
            vec![(pc(PieceKind::King, Side::Black), sq("h8"))],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(contains(&moves, "e2", "e3"));
        assert!(contains(&moves, "e2", "e4"));
    }

    #[test]
    fn slider_captures_end_the_ray() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("h1")),
                (pc(PieceKind::Rook, Side::White), sq("a1")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("h8")),
                (pc(PieceKind::Knight, Side::Black), sq("d1")),
            ],
            None,
        );
        let moves = moves_of(&mut pos);
        assert!(contains(&moves, "a1", "d1"), "capture is legal");
        assert!(!contains(&moves, "a1", "e1"), "ray stops at the capture");
    }
}
