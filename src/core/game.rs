use log::{debug, info};

use crate::core::board::{Board, Color, Piece, Rank};
use crate::core::rules::{self, Move};

/**
Interactive phase. `Selected` and `Chaining` carry the selected square and
its candidate moves, so a selection without candidates cannot be
represented. While `Chaining`, the candidates are exactly the further
captures available from the square that just landed.
*/
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Selected { square: (u8, u8), moves: Vec<Move> },
    Chaining { square: (u8, u8), moves: Vec<Move> },
    Over { winner: Color },
}

/** What a click did, so the surface knows when to repaint and re-advise. */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Input did not correspond to a legal transition; nothing changed.
    Ignored,
    Selected,
    Cleared,
    /// A capture landed on a square with further mandatory captures;
    /// the turn goes on and the player does not change.
    ChainContinued,
    TurnEnded,
    GameOver(Color),
}

pub struct Game {
    board: Board,
    active_player: Color,
    phase: Phase,
    turn_id: u64,
}

impl Game {
    pub fn new(starting_player: Color) -> Game {
        Game::with_board(Board::starting(), starting_player)
    }

    pub fn with_board(board: Board, starting_player: Color) -> Game {
        Game {
            board,
            active_player: starting_player,
            phase: Phase::Idle,
            turn_id: 1,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_player(&self) -> Color {
        self.active_player
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /** Correlation key for advisory results; increments once per completed
    turn and once per reset, never rewinds. */
    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    pub fn game_over(&self) -> bool {
        matches!(self.phase, Phase::Over { .. })
    }

    pub fn winner(&self) -> Option<Color> {
        match self.phase {
            Phase::Over { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<(u8, u8)> {
        match &self.phase {
            Phase::Selected { square, .. } | Phase::Chaining { square, .. } => Some(*square),
            _ => None,
        }
    }

    pub fn candidate_moves(&self) -> &[Move] {
        match &self.phase {
            Phase::Selected { moves, .. } | Phase::Chaining { moves, .. } => moves,
            _ => &[],
        }
    }

    /** Dispatch a raw `(row, col)` click the way the board surface sees it. */
    pub fn handle_click(&mut self, row: u8, col: u8) -> Transition {
        if !rules::on_board(row as i8, col as i8) {
            return Transition::Ignored;
        }
        match &self.phase {
            Phase::Over { .. } => Transition::Ignored,
            Phase::Chaining { .. } => self.choose_destination(row, col),
            _ => {
                let own_piece = self
                    .board
                    .get(row, col)
                    .is_some_and(|piece| piece.color == self.active_player);
                if own_piece {
                    self.select_square(row, col)
                } else {
                    self.choose_destination(row, col)
                }
            }
        }
    }

    /**
    Select a square. Legal in `Idle`/`Selected` only; a mid-chain piece
    stays locked. Candidates are the player's legal moves originating
    here, which under capture compulsion may be empty even for a piece
    with free squares ahead of it.
    */
    pub fn select_square(&mut self, row: u8, col: u8) -> Transition {
        match self.phase {
            Phase::Chaining { .. } | Phase::Over { .. } => return Transition::Ignored,
            _ => {}
        }
        let (all_moves, mandatory) = rules::legal_moves(&self.board, self.active_player);
        let moves: Vec<Move> = all_moves
            .into_iter()
            .filter(|candidate| candidate.origin() == (row, col))
            .collect();
        if moves.is_empty() {
            let had_selection = matches!(self.phase, Phase::Selected { .. });
            self.phase = Phase::Idle;
            if had_selection {
                Transition::Cleared
            } else {
                Transition::Ignored
            }
        } else {
            debug!(
                "selected ({row},{col}): {} candidate(s), mandatory capture: {mandatory}",
                moves.len()
            );
            self.phase = Phase::Selected {
                square: (row, col),
                moves,
            };
            Transition::Selected
        }
    }

    /** Execute the candidate move ending at `(row, col)`, if there is one. */
    pub fn choose_destination(&mut self, row: u8, col: u8) -> Transition {
        let moves = match &self.phase {
            Phase::Selected { moves, .. } | Phase::Chaining { moves, .. } => moves,
            _ => return Transition::Ignored,
        };
        let Some(chosen) = moves
            .iter()
            .find(|candidate| candidate.destination() == (row, col))
            .cloned()
        else {
            return Transition::Ignored;
        };
        self.execute(chosen)
    }

    pub fn reset(&mut self, starting_player: Color) {
        self.board = Board::starting();
        self.active_player = starting_player;
        self.phase = Phase::Idle;
        self.turn_id += 1;
        info!(
            "new game, {:?} to move, turn {}",
            starting_player, self.turn_id
        );
    }

    fn execute(&mut self, chosen: Move) -> Transition {
        // Generator moves are single hops.
        let step = chosen.steps()[0];
        let Some(piece) = self.board.take(step.from.0, step.from.1) else {
            return Transition::Ignored;
        };

        // Remove the one enemy strictly between origin and destination.
        let dr: i8 = if step.to.0 > step.from.0 { 1 } else { -1 };
        let dc: i8 = if step.to.1 > step.from.1 { 1 } else { -1 };
        let mut captured = false;
        let (mut row, mut col) = (step.from.0 as i8 + dr, step.from.1 as i8 + dc);
        while (row as u8, col as u8) != step.to {
            if self.board.take(row as u8, col as u8).is_some() {
                captured = true;
            }
            row += dr;
            col += dc;
        }
        self.board.set(step.to.0, step.to.1, piece);

        if captured {
            let continuations = rules::captures(&self.board, step.to.0, step.to.1, piece);
            if !continuations.is_empty() {
                // The turn is not over and promotion is not evaluated yet.
                self.phase = Phase::Chaining {
                    square: step.to,
                    moves: continuations,
                };
                return Transition::ChainContinued;
            }
        }

        if piece.rank == Rank::Man && step.to.0 == piece.color.back_row() {
            self.board
                .set(step.to.0, step.to.1, Piece::king(piece.color));
            debug!("promotion at ({},{})", step.to.0, step.to.1);
        }
        self.end_turn()
    }

    fn end_turn(&mut self) -> Transition {
        for loser in [Color::Black, Color::White] {
            if self.board.count(loser) == 0 {
                let winner = loser.opposite();
                info!("game over, {winner:?} won");
                self.phase = Phase::Over { winner };
                return Transition::GameOver(winner);
            }
        }
        self.active_player = self.active_player.opposite();
        self.turn_id += 1;
        self.phase = Phase::Idle;
        Transition::TurnEnded
    }
}
