use std::fmt::Write as _;
use std::ops::{Index, IndexMut};

use crate::attacks::{self, AttackMap};
use crate::board::{Board, Piece, PieceKind, Side, Square};
use crate::error::StartError;
use crate::moves::Move;

/// Stable index of a Position inside the search arena.
pub type NodeId = usize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CastlingRights {
    pub long: bool,
    pub short: bool,
}

/// Lifecycle of a node during the search.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeState {
    /// Spawned but not expanded yet.
    Fresh,
    /// Currently on the exploration path.
    Expanding,
    /// Terminal: the side to move is checkmated.
    Win,
    /// Terminal: stalemate or insufficient material.
    Draw,
    /// All moves tried, no terminal verdict of its own.
    Expanded,
}

/// One node of the game tree. Owns its board snapshot and piece lists
/// outright; parent and children are arena indices, so nodes stay usable
/// for path reconstruction after the search finishes.
#[derive(Clone, Debug)]
pub struct Position {
    pub board: Board,
    pub to_move: Side,
    /// Per side, (piece, square) with the king always at index 0.
    pub pieces: [Vec<(Piece, Square)>; 2],
    pub castling: [CastlingRights; 2],
    /// Origin and destination of the move that produced this position.
    /// For the root this is the optional last-move hint from the input,
    /// kept solely to validate en-passant eligibility.
    pub last_move: Option<Move>,
    /// Check counts per side, filled in as they are computed.
    pub checks: [u8; 2],
    pub footprints: [AttackMap; 2],
    pub depth: u16,
    pub parent: Option<NodeId>,
    /// Expansion order, for progress reporting and diagnostics.
    pub num: u64,
    pub state: NodeState,
    /// Children known to be forced wins for the side that moved into them,
    /// in discovery order.
    pub winning_children: Vec<NodeId>,
}

impl Position {
    /// Assembles a root position from a piece list. Piece lists are sorted so
    /// the king lands at index 0, and castling rights are derived from the
    /// king and rooks standing on their home squares. The caller is expected
    /// to have validated the list (see the setup module).
    pub fn from_pieces(
        to_move: Side,
        mut white: Vec<(Piece, Square)>,
        mut black: Vec<(Piece, Square)>,
        last_move: Option<Move>,
    ) -> Position {
        let mut board = Board::default();
        for &(piece, sq) in white.iter().chain(black.iter()) {
            debug_assert!(board.is_empty(sq), "two pieces on {sq}");
            board.set(sq, Some(piece));
        }
        white.sort();
        black.sort();

        let mut pos = Position {
            board,
            to_move,
            pieces: [white, black],
            castling: [CastlingRights::default(); 2],
            last_move,
            checks: [0, 0],
            footprints: [AttackMap::default(); 2],
            depth: 0,
            parent: None,
            num: 0,
            state: NodeState::Fresh,
            winning_children: Vec::new(),
        };
        pos.derive_castling();
        pos.recompute_footprints();
        pos
    }

    /// A side keeps a castling right only while its king and the matching
    /// rook both stand on their home squares.
    fn derive_castling(&mut self) {
        for side in [Side::White, Side::Black] {
            let rank = side.home_rank();
            let king = Piece::new(PieceKind::King, side);
            let rook = Piece::new(PieceKind::Rook, side);
            if self.board.get(Square::new(4, rank)) != Some(king) {
                continue;
            }
            if self.board.get(Square::new(0, rank)) == Some(rook) {
                self.castling[side.index()].long = true;
            }
            if self.board.get(Square::new(7, rank)) == Some(rook) {
                self.castling[side.index()].short = true;
            }
        }
    }

    pub fn recompute_footprints(&mut self) {
        self.footprints = [
            attacks::attack_map(&self.board, &self.pieces[0]),
            attacks::attack_map(&self.board, &self.pieces[1]),
        ];
    }

    #[inline]
    pub fn waiting(&self) -> Side {
        self.to_move.opponent()
    }

    #[inline]
    pub fn king_square(&self, side: Side) -> Square {
        let (piece, sq) = self.pieces[side.index()][0];
        debug_assert_eq!(piece.kind, PieceKind::King);
        sq
    }

    /// Computes and records the check count on `side`'s king.
    pub fn compute_checks(&mut self, side: Side) -> u8 {
        let n = attacks::count_checks(&self.board, self.king_square(side), side);
        self.checks[side.index()] = n;
        n
    }

    #[inline]
    pub fn total_pieces(&self) -> usize {
        self.pieces[0].len() + self.pieces[1].len()
    }

    pub fn flip_turn(&mut self) {
        self.to_move = self.to_move.opponent();
    }

    /// Whether `mv`, made from this position, is an en-passant capture.
    fn is_ep_capture(&self, piece: Piece, mv: Move) -> bool {
        piece.kind == PieceKind::Pawn
            && mv.to.file() != mv.from.file()
            && self.board.is_empty(mv.to)
    }

    /// Applies a move to this position's board, yielding one successor
    /// board, or two for a pawn promotion (queen first, then knight).
    /// En passant also vacates the bypassed pawn's square, and a castling
    /// king move drags the rook along, derived purely from the +-2 file
    /// delta of the king.
    pub fn successor_boards(&self, mv: Move) -> Vec<(Board, Option<PieceKind>)> {
        let piece = self.board.get(mv.from).unwrap();

        if piece.kind == PieceKind::Pawn && (mv.to.rank() == 0 || mv.to.rank() == 7) {
            let queen = Piece::new(PieceKind::Queen, self.to_move);
            let knight = Piece::new(PieceKind::Knight, self.to_move);
            return vec![
                (self.board.moved(queen, mv.from, mv.to), Some(PieceKind::Queen)),
                (self.board.moved(knight, mv.from, mv.to), Some(PieceKind::Knight)),
            ];
        }

        let mut board = self.board.moved(piece, mv.from, mv.to);
        if self.is_ep_capture(piece, mv) {
            board.set(Square::new(mv.to.file(), mv.from.rank()), None);
        }
        if piece.kind == PieceKind::King {
            let rank = mv.from.rank();
            let rook = Piece::new(PieceKind::Rook, self.to_move);
            match mv.file_delta() {
                -2 => {
                    board.set(Square::new(0, rank), None);
                    board.set(Square::new(3, rank), Some(rook));
                }
                2 => {
                    board.set(Square::new(7, rank), None);
                    board.set(Square::new(5, rank), Some(rook));
                }
                _ => {}
            }
        }
        vec![(board, None)]
    }

    /// Builds the full successor Position for one board produced by
    /// `successor_boards`. Piece lists are rebuilt by copying (dropping any
    /// captured piece, en-passant aware), castling rights are cloned and
    /// narrowed, and attack footprints are recomputed from scratch.
    ///
    /// The returned position still has the parent's side to move; the search
    /// flips the turn only after the king-safety test passes.
    pub fn child(
        &self,
        parent_id: NodeId,
        mv: Move,
        board: Board,
        promotion: Option<PieceKind>,
    ) -> Position {
        let mover = self.to_move;
        let waiter = self.waiting();
        let moved_piece = self.board.get(mv.from).unwrap();
        let ep_capture = self.is_ep_capture(moved_piece, mv);
        let castle_delta = if moved_piece.kind == PieceKind::King {
            mv.file_delta()
        } else {
            0
        };

        let mut castling = self.castling;
        if moved_piece.kind == PieceKind::King {
            castling[mover.index()] = CastlingRights::default();
        }
        clear_rights_touching(&mut castling, mv.from);
        clear_rights_touching(&mut castling, mv.to);

        let mut pieces: [Vec<(Piece, Square)>; 2] = [Vec::new(), Vec::new()];

        let ep_square = Square::new(mv.to.file(), mv.from.rank());
        for &(piece, sq) in &self.pieces[waiter.index()] {
            if sq == mv.to || (ep_capture && sq == ep_square) {
                // captured by this move
                continue;
            }
            pieces[waiter.index()].push((piece, sq));
        }

        let home = mover.home_rank();
        for &(piece, sq) in &self.pieces[mover.index()] {
            if sq == mv.from {
                // Read the piece back from the new board so a promotion
                // shows up as the promoted piece.
                pieces[mover.index()].push((board.get(mv.to).unwrap(), mv.to));
            } else if castle_delta == -2 && piece.kind == PieceKind::Rook && sq == Square::new(0, home) {
                pieces[mover.index()].push((piece, Square::new(3, home)));
            } else if castle_delta == 2 && piece.kind == PieceKind::Rook && sq == Square::new(7, home) {
                pieces[mover.index()].push((piece, Square::new(5, home)));
            } else {
                pieces[mover.index()].push((piece, sq));
            }
        }

        let mut last = mv;
        last.promotion = promotion;

        let mut pos = Position {
            board,
            to_move: mover,
            pieces,
            castling,
            last_move: Some(last),
            checks: [0, 0],
            footprints: [AttackMap::default(); 2],
            depth: self.depth + 1,
            parent: Some(parent_id),
            num: 0,
            state: NodeState::Fresh,
            winning_children: Vec::new(),
        };
        pos.recompute_footprints();
        pos
    }

    /// Human-readable rendering for the CLI: board grid, castle
    /// availability, turn, and per-side check counts.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.board);
        let w = self.castling[0];
        let b = self.castling[1];
        let _ = writeln!(
            out,
            "Possible castle moves: w:{}{}  b:{}{}",
            if w.long { " 0-0-0" } else { "" },
            if w.short { " 0-0" } else { "" },
            if b.long { " 0-0-0" } else { "" },
            if b.short { " 0-0" } else { "" },
        );
        let _ = write!(
            out,
            "To play: {}    Checked: w={} b={}",
            self.to_move, self.checks[0], self.checks[1]
        );
        out
    }

    /// Attack-footprint counts for one side, rank 8 at the top.
    pub fn attack_grid(&self, side: Side) -> String {
        let map = &self.footprints[side.index()];
        let mut out = String::new();
        for rank in (0..8).rev() {
            for file in 0..8 {
                let n = map.count(Square::new(file, rank));
                if n == 0 {
                    out.push_str(" .");
                } else {
                    let _ = write!(out, " {n}");
                }
            }
            if rank > 0 {
                out.push('\n');
            }
        }
        out
    }
}

/// A move leaving a rook home square, or a capture landing on one, clears
/// that flank permanently for the square's owner. The cleared flag may
/// already be false; rights only ever narrow.
fn clear_rights_touching(castling: &mut [CastlingRights; 2], sq: Square) {
    for side in [Side::White, Side::Black] {
        if sq.rank() != side.home_rank() {
            continue;
        }
        match sq.file() {
            0 => castling[side.index()].long = false,
            7 => castling[side.index()].short = false,
            _ => {}
        }
    }
}

/// Before the search starts, the starting position must pass turn-legality:
/// only the side to move may be in check, and never by more than two pieces.
pub fn validate_start(pos: &mut Position) -> Result<(), StartError> {
    let white = pos.compute_checks(Side::White);
    let black = pos.compute_checks(Side::Black);

    if white > 0 && black > 0 {
        return Err(StartError::BothSidesInCheck);
    }
    let waiting = pos.waiting();
    if pos.checks[waiting.index()] > 0 {
        return Err(StartError::WaitingSideInCheck {
            to_move: pos.to_move,
            waiting,
        });
    }
    for (side, checks) in [(Side::White, white), (Side::Black, black)] {
        if checks > 2 {
            return Err(StartError::TooManyChecks { side, checks });
        }
    }
    Ok(())
}

/// Flat store of every explored Position, addressed by index. Parent and
/// forced-win relationships are index sets, which keeps the winning tree
/// walkable after the search without any pointer identity games.
#[derive(Default)]
pub struct Arena {
    nodes: Vec<Position>,
}

impl Arena {
    pub fn alloc(&mut self, pos: Position) -> NodeId {
        self.nodes.push(pos);
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.nodes.iter()
    }
}

impl Index<NodeId> for Arena {
    type Output = Position;

    fn index(&self, id: NodeId) -> &Position {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Position {
        &mut self.nodes[id]
    }
}
