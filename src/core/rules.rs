use serde::{Deserialize, Serialize};

use crate::core::board::{Board, Color, Piece, Rank};

pub const DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

pub fn on_board(row: i8, col: i8) -> bool {
    (0..8).contains(&row) && (0..8).contains(&col)
}

/** One atomic relocation; a capture removes exactly one enemy in between. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub from: (u8, u8),
    pub to: (u8, u8),
}

impl Step {
    pub fn new(from: (u8, u8), to: (u8, u8)) -> Step {
        Step { from, to }
    }
}

/**
Ordered, non-empty hop sequence. The generator below always produces
single hops: chains are not pre-enumerated, continuation is re-queried
from each landing square. Multi-hop sequences only appear in advisory
suggestions coming back from the oracle.
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    steps: Vec<Step>,
}

impl Move {
    pub fn single(step: Step) -> Move {
        Move { steps: vec![step] }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn origin(&self) -> (u8, u8) {
        self.steps[0].from
    }

    pub fn destination(&self) -> (u8, u8) {
        self.steps[self.steps.len() - 1].to
    }
}

/**
All legal moves for `player`, with the capture-compulsion flag.

If any capture exists anywhere on the board only the captures are
returned (`true`); quiet moves are never mixed in.
*/
pub fn legal_moves(board: &Board, player: Color) -> (Vec<Move>, bool) {
    let mut capture_moves = Vec::new();
    for row in 0..8 {
        for col in 0..8 {
            if let Some(piece) = board.get(row, col) {
                if piece.color == player {
                    capture_moves.extend(captures(board, row, col, piece));
                }
            }
        }
    }
    if !capture_moves.is_empty() {
        return (capture_moves, true);
    }

    let mut moves = Vec::new();
    for row in 0..8 {
        for col in 0..8 {
            if let Some(piece) = board.get(row, col) {
                if piece.color == player {
                    moves.extend(quiet_moves(board, row, col, piece));
                }
            }
        }
    }
    (moves, false)
}

/**
Single-hop captures for one piece.

A man jumps an adjacent enemy onto the empty square behind it, in any of
the four diagonals (backward included). A king slides over empty squares,
and the first occupied square decides: an enemy with empty squares behind
yields one landing option per empty square (the "flying" capture), a
friendly piece or an enemy with no gap behind yields nothing. Never more
than one enemy is crossed per hop.
*/
pub fn captures(board: &Board, row: u8, col: u8, piece: Piece) -> Vec<Move> {
    let enemy = piece.color.opposite();
    let mut moves = Vec::new();
    for (dr, dc) in DIRECTIONS {
        match piece.rank {
            Rank::Man => {
                let (mid_row, mid_col) = (row as i8 + dr, col as i8 + dc);
                let (jump_row, jump_col) = (row as i8 + 2 * dr, col as i8 + 2 * dc);
                if !on_board(jump_row, jump_col) {
                    continue;
                }
                let mid = board.get(mid_row as u8, mid_col as u8);
                if mid.is_some_and(|p| p.color == enemy)
                    && board.get(jump_row as u8, jump_col as u8).is_none()
                {
                    moves.push(Move::single(Step::new(
                        (row, col),
                        (jump_row as u8, jump_col as u8),
                    )));
                }
            }
            Rank::King => {
                let mut dist = 1;
                loop {
                    let (next_row, next_col) = (row as i8 + dist * dr, col as i8 + dist * dc);
                    if !on_board(next_row, next_col) {
                        break;
                    }
                    match board.get(next_row as u8, next_col as u8) {
                        None => dist += 1,
                        Some(p) if p.color == enemy => {
                            let mut land = 1;
                            loop {
                                let (land_row, land_col) =
                                    (next_row + land * dr, next_col + land * dc);
                                if !on_board(land_row, land_col)
                                    || board.get(land_row as u8, land_col as u8).is_some()
                                {
                                    break;
                                }
                                moves.push(Move::single(Step::new(
                                    (row, col),
                                    (land_row as u8, land_col as u8),
                                )));
                                land += 1;
                            }
                            break;
                        }
                        Some(_) => break,
                    }
                }
            }
        }
    }
    moves
}

/** Non-capturing moves: men step forward only, kings slide all four ways. */
pub fn quiet_moves(board: &Board, row: u8, col: u8, piece: Piece) -> Vec<Move> {
    let mut moves = Vec::new();
    match piece.rank {
        Rank::Man => {
            let dr = piece.color.forward();
            for dc in [-1, 1] {
                let (next_row, next_col) = (row as i8 + dr, col as i8 + dc);
                if on_board(next_row, next_col)
                    && board.get(next_row as u8, next_col as u8).is_none()
                {
                    moves.push(Move::single(Step::new(
                        (row, col),
                        (next_row as u8, next_col as u8),
                    )));
                }
            }
        }
        Rank::King => {
            for (dr, dc) in DIRECTIONS {
                let mut dist = 1;
                loop {
                    let (next_row, next_col) = (row as i8 + dist * dr, col as i8 + dist * dc);
                    if !on_board(next_row, next_col)
                        || board.get(next_row as u8, next_col as u8).is_some()
                    {
                        break;
                    }
                    moves.push(Move::single(Step::new(
                        (row, col),
                        (next_row as u8, next_col as u8),
                    )));
                    dist += 1;
                }
            }
        }
    }
    moves
}
