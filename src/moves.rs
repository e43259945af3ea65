use std::fmt::{self, Display};

use tinyvec::TinyVec;

use crate::board::{PieceKind, Square};

/// One move of the side to move. Created by the move generator, consumed by
/// the position transition, never mutated.
///
/// The generator always emits `promotion: None`; when a pawn reaches its
/// final rank the transition expands the move into the queen and knight
/// successor boards and records the chosen kind on the child's last-move
/// copy. Rook and bishop promotions are dominated and never produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Signed file change, positive towards the h-file. A king move with a
    /// delta of +-2 is a castle.
    #[inline]
    pub fn file_delta(&self) -> i8 {
        self.to.file() as i8 - self.from.file() as i8
    }
}

impl Display for Move {
    /// Plain long coordinate form, promotion kind appended when present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Move buffer with inline capacity for typical positions; spills to the
/// heap for the rare position with more moves.
pub type MoveList = TinyVec<[Move; 64]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_long_coordinate_form() {
        let m = Move::new(Square::parse("e2").unwrap(), Square::parse("e4").unwrap());
        assert_eq!(m.to_string(), "e2e4");

        let mut promo = Move::new(Square::parse("a7").unwrap(), Square::parse("a8").unwrap());
        promo.promotion = Some(PieceKind::Queen);
        assert_eq!(promo.to_string(), "a7a8Q");
    }

    #[test]
    fn file_delta_signs() {
        let castle_short = Move::new(Square::parse("e1").unwrap(), Square::parse("g1").unwrap());
        let castle_long = Move::new(Square::parse("e1").unwrap(), Square::parse("c1").unwrap());
        assert_eq!(castle_short.file_delta(), 2);
        assert_eq!(castle_long.file_delta(), -2);
    }
}
