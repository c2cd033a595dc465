use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/** Cell encoding shared with the advisory oracle (flat 64-cell boards). */
pub const CODE_EMPTY: u8 = 0;
pub const CODE_BLACK_MAN: u8 = 1;
pub const CODE_WHITE_MAN: u8 = 2;
pub const CODE_BLACK_KING: u8 = 3;
pub const CODE_WHITE_KING: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /** Row delta of a quiet man move: Black plays down the board, White up. */
    pub fn forward(self) -> i8 {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }

    /** Promotion row: the far edge from the player's point of view. */
    pub fn back_row(self) -> u8 {
        match self {
            Color::Black => 7,
            Color::White => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Man,
    King,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub rank: Rank,
}

impl Piece {
    pub fn man(color: Color) -> Piece {
        Piece {
            color,
            rank: Rank::Man,
        }
    }

    pub fn king(color: Color) -> Piece {
        Piece {
            color,
            rank: Rank::King,
        }
    }

    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }

    pub fn code(&self) -> u8 {
        match (self.color, self.rank) {
            (Color::Black, Rank::Man) => CODE_BLACK_MAN,
            (Color::White, Rank::Man) => CODE_WHITE_MAN,
            (Color::Black, Rank::King) => CODE_BLACK_KING,
            (Color::White, Rank::King) => CODE_WHITE_KING,
        }
    }
}

/**
8x8 board, row-major. Only dark squares (`(row + col) % 2 == 1`) are ever
occupied; callers must respect that, it is never checked here.

The board is owned by the turn state machine. Everything else, including
advisory workers, receives a `clone()` snapshot and never a live reference.
*/
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde_as(as = "[_; 64]")]
    cells: [Option<Piece>; 64],
}

impl Board {
    pub fn empty() -> Board {
        Board { cells: [None; 64] }
    }

    pub fn starting() -> Board {
        let mut board = Board::empty();
        for row in 0..8 {
            for col in 0..8 {
                if (row + col) % 2 != 1 {
                    continue;
                }
                if row < 3 {
                    board.set(row, col, Piece::man(Color::Black));
                } else if row > 4 {
                    board.set(row, col, Piece::man(Color::White));
                }
            }
        }
        board
    }

    fn index(row: u8, col: u8) -> usize {
        row as usize * 8 + col as usize
    }

    pub fn get(&self, row: u8, col: u8) -> Option<Piece> {
        self.cells[Board::index(row, col)]
    }

    pub fn set(&mut self, row: u8, col: u8, piece: Piece) {
        self.cells[Board::index(row, col)] = Some(piece);
    }

    pub fn take(&mut self, row: u8, col: u8) -> Option<Piece> {
        self.cells[Board::index(row, col)].take()
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|piece| piece.color == color)
            .count()
    }

    /** Flatten into the oracle cell encoding. */
    pub fn codes(&self) -> [u8; 64] {
        let mut codes = [CODE_EMPTY; 64];
        for (cell, code) in self.cells.iter().zip(codes.iter_mut()) {
            if let Some(piece) = cell {
                *code = piece.code();
            }
        }
        codes
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   +-----------------+")?;
        for row in 0..8 {
            write!(f, " {row} | ")?;
            for col in 0..8 {
                let symbol = match self.get(row, col) {
                    None => '.',
                    Some(piece) => match (piece.color, piece.rank) {
                        (Color::Black, Rank::Man) => 'b',
                        (Color::White, Rank::Man) => 'w',
                        (Color::Black, Rank::King) => 'B',
                        (Color::White, Rank::King) => 'W',
                    },
                };
                write!(f, "{symbol} ")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "   +-----------------+")?;
        write!(f, "     0 1 2 3 4 5 6 7")
    }
}
