use std::fmt::{self, Display};

/// The two players. White is the side moving up the board (towards rank 8).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Rank the side's king and rooks start on, 0-indexed.
    #[inline]
    pub const fn home_rank(self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }

    /// Direction pawns of this side advance in, as a rank delta.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "w"),
            Side::Black => write!(f, "b"),
        }
    }
}

/// Closed set of piece kinds. King is declared first so the derived ordering
/// sorts kings ahead of everything else in piece lists.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const fn letter(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'p',
        }
    }

    pub const fn from_letter(c: char) -> Option<PieceKind> {
        match c {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub const fn new(kind: PieceKind, side: Side) -> Piece {
        Piece { kind, side }
    }

    /// Two-character display code, piece letter then side letter.
    pub fn code(self) -> String {
        let side = match self.side {
            Side::White => 'w',
            Side::Black => 'b',
        };
        format!("{}{}", self.kind.letter(), side)
    }
}

/// Board square index 0..=63, little-endian file-rank mapping
/// (a1 = 0, h1 = 7, a8 = 56).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Square(u8);

impl Square {
    /// Builds a square from 0-indexed file and rank. Callers must pass values
    /// in 0..8; use `offset` for arithmetic that can leave the board.
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square(file + rank * 8)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// The square at (file + dx, rank + dy), or None when that walks off
    /// the board.
    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Option<Square> {
        let file = self.file() as i8 + dx;
        let rank = self.rank() as i8 + dy;
        if !(0..8).contains(&file) || !(0..8).contains(&rank) {
            return None;
        }
        Some(Square::new(file as u8, rank as u8))
    }

    /// Parses text coordinates like "e4".
    pub fn parse(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Some(Square::new(file as u8 - b'a', rank as u8 - b'1'))
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

/// One immutable 64-cell piece layout. Successor boards are built by value,
/// never mutated in place once a Position owns them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Default for Board {
    fn default() -> Self {
        Board { squares: [None; 64] }
    }
}

impl Board {
    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.squares[sq.index()].is_none()
    }

    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    /// The board after lifting the piece off `from` and dropping `piece` on
    /// `to`, overwriting whatever stood there. En passant's extra vacated
    /// square and the castling rook are handled by the transition layer.
    pub fn moved(&self, piece: Piece, from: Square, to: Square) -> Board {
        let mut next = *self;
        next.set(from, None);
        next.set(to, Some(piece));
        next
    }

    /// Compact canonical form, used as the revisit-tracker key.
    pub fn canonical(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        for (i, cell) in self.squares.iter().enumerate() {
            out[i] = match cell {
                None => 0,
                Some(p) => 1 + p.kind as u8 + 6 * p.side.index() as u8,
            };
        }
        out
    }
}

impl Display for Board {
    /// Rank 8 at the top, two-character piece codes, dots for empty squares.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "     a  b  c  d  e  f  g  h")?;
        for rank in (0..8).rev() {
            write!(f, "  {} ", rank + 1)?;
            for file in 0..8 {
                match self.get(Square::new(file, rank)) {
                    Some(p) => write!(f, " {}", p.code())?,
                    None => write!(f, " ..")?,
                }
            }
            writeln!(f, "  {}", rank + 1)?;
        }
        write!(f, "     a  b  c  d  e  f  g  h")
    }
}
