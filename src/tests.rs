use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;

fn board_with(pieces: &[(u8, u8, Piece)]) -> Board {
    let mut board = Board::empty();
    for &(row, col, piece) in pieces {
        board.set(row, col, piece);
    }
    board
}

fn destinations(moves: &[Move]) -> Vec<(u8, u8)> {
    let mut result: Vec<_> = moves.iter().map(Move::destination).collect();
    result.sort();
    result
}

#[test]
fn starting_position_has_twelve_pieces_each() {
    let board = Board::starting();
    assert_eq!(board.count(Color::Black), 12);
    assert_eq!(board.count(Color::White), 12);
}

#[test]
fn capture_compulsion_hides_quiet_moves() {
    // The second black man has quiet moves, but the capture is the only
    // legal move on the board.
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (0, 1, Piece::man(Color::Black)),
    ]);
    let (moves, mandatory) = rules::legal_moves(&board, Color::Black);
    assert!(mandatory);
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].origin(), (2, 1));
    assert_eq!(moves[0].destination(), (4, 3));
}

#[test]
fn legal_captures_equal_union_over_pieces() {
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (2, 5, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (3, 4, Piece::man(Color::White)),
    ]);
    let (moves, mandatory) = rules::legal_moves(&board, Color::Black);
    assert!(mandatory);
    let mut union = Vec::new();
    for row in 0..8 {
        for col in 0..8 {
            if let Some(piece) = board.get(row, col) {
                if piece.color == Color::Black {
                    union.extend(rules::captures(&board, row, col, piece));
                }
            }
        }
    }
    assert_eq!(moves, union);
    assert!(moves.len() >= 2);
}

#[test]
fn man_quiet_moves_are_strictly_forward() {
    let board = board_with(&[(4, 3, Piece::man(Color::Black))]);
    let moves = rules::quiet_moves(&board, 4, 3, Piece::man(Color::Black));
    assert_eq!(destinations(&moves), vec![(5, 2), (5, 4)]);

    let board = board_with(&[(4, 3, Piece::man(Color::White))]);
    let moves = rules::quiet_moves(&board, 4, 3, Piece::man(Color::White));
    assert_eq!(destinations(&moves), vec![(3, 2), (3, 4)]);
}

#[test]
fn man_captures_backward_too() {
    let board = board_with(&[
        (4, 3, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
    ]);
    let moves = rules::captures(&board, 4, 3, Piece::man(Color::Black));
    assert_eq!(destinations(&moves), vec![(2, 1)]);
}

#[test]
fn king_quiet_slide_stops_at_first_occupied_square() {
    let board = board_with(&[
        (1, 0, Piece::king(Color::White)),
        (4, 3, Piece::man(Color::White)),
    ]);
    let moves = rules::quiet_moves(&board, 1, 0, Piece::king(Color::White));
    assert_eq!(destinations(&moves), vec![(0, 1), (2, 1), (3, 2)]);
}

#[test]
fn flying_king_has_one_capture_per_landing_square() {
    let board = board_with(&[
        (1, 0, Piece::king(Color::White)),
        (4, 3, Piece::man(Color::Black)),
    ]);
    let moves = rules::captures(&board, 1, 0, Piece::king(Color::White));
    assert_eq!(destinations(&moves), vec![(5, 4), (6, 5), (7, 6)]);
}

#[test]
fn king_capture_blocked_when_enemy_backs_enemy() {
    let board = board_with(&[
        (1, 0, Piece::king(Color::White)),
        (4, 3, Piece::man(Color::Black)),
        (5, 4, Piece::man(Color::Black)),
    ]);
    let moves = rules::captures(&board, 1, 0, Piece::king(Color::White));
    assert!(moves.is_empty());
    let (_, mandatory) = rules::legal_moves(&board, Color::White);
    assert!(!mandatory);
}

#[test]
fn no_wraparound_at_board_edge() {
    let board = board_with(&[(2, 7, Piece::man(Color::Black))]);
    let moves = rules::quiet_moves(&board, 2, 7, Piece::man(Color::Black));
    assert_eq!(destinations(&moves), vec![(3, 6)]);
}

#[test]
fn opening_selection_offers_two_destinations() {
    let mut game = Game::new(Color::Black);
    assert_eq!(game.handle_click(2, 1), Transition::Selected);
    assert_eq!(game.selection(), Some((2, 1)));
    assert_eq!(destinations(game.candidate_moves()), vec![(3, 0), (3, 2)]);
}

#[test]
fn capture_chain_keeps_the_turn() {
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (5, 4, Piece::man(Color::White)),
        (0, 7, Piece::man(Color::White)),
    ]);
    let mut game = Game::with_board(board, Color::Black);
    assert_eq!(game.handle_click(2, 1), Transition::Selected);
    assert_eq!(game.handle_click(4, 3), Transition::ChainContinued);
    assert_eq!(game.active_player(), Color::Black);
    assert_eq!(game.turn_id(), 1);
    assert_eq!(game.selection(), Some((4, 3)));
    assert!(matches!(game.phase(), Phase::Chaining { .. }));

    assert_eq!(game.handle_click(6, 5), Transition::TurnEnded);
    assert_eq!(game.active_player(), Color::White);
    assert_eq!(game.turn_id(), 2);
    assert_eq!(game.board().count(Color::White), 1);
}

#[test]
fn selection_is_locked_while_chaining() {
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (0, 1, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (5, 4, Piece::man(Color::White)),
    ]);
    let mut game = Game::with_board(board, Color::Black);
    game.handle_click(2, 1);
    assert_eq!(game.handle_click(4, 3), Transition::ChainContinued);
    // Clicking the other black man cannot steal the selection mid-chain.
    assert_eq!(game.handle_click(0, 1), Transition::Ignored);
    assert_eq!(game.select_square(0, 1), Transition::Ignored);
    assert_eq!(game.selection(), Some((4, 3)));
}

#[test]
fn eliminating_every_white_piece_wins() {
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (5, 4, Piece::man(Color::White)),
    ]);
    let mut game = Game::with_board(board, Color::Black);
    game.handle_click(2, 1);
    assert_eq!(game.handle_click(4, 3), Transition::ChainContinued);
    assert_eq!(game.handle_click(6, 5), Transition::GameOver(Color::Black));
    assert!(game.game_over());
    assert_eq!(game.winner(), Some(Color::Black));
    // Terminal state ignores all further input.
    assert_eq!(game.handle_click(6, 5), Transition::Ignored);
    assert_eq!(game.handle_click(2, 1), Transition::Ignored);
}

#[test]
fn illegal_destination_is_a_silent_no_op() {
    let mut game = Game::new(Color::Black);
    game.handle_click(2, 1);
    let before = game.board().clone();
    assert_eq!(game.choose_destination(5, 5), Transition::Ignored);
    assert_eq!(game.board(), &before);
    assert_eq!(game.selection(), Some((2, 1)));
}

#[test]
fn mid_chain_back_row_landing_does_not_promote() {
    let board = board_with(&[
        (2, 1, Piece::man(Color::White)),
        (1, 2, Piece::man(Color::Black)),
        (1, 4, Piece::man(Color::Black)),
    ]);
    let mut game = Game::with_board(board, Color::White);
    game.handle_click(2, 1);
    // Lands on the promotion row but must keep capturing as a man.
    assert_eq!(game.handle_click(0, 3), Transition::ChainContinued);
    assert_eq!(game.board().get(0, 3), Some(Piece::man(Color::White)));
    assert_eq!(game.handle_click(2, 5), Transition::GameOver(Color::White));
    assert_eq!(game.board().get(2, 5), Some(Piece::man(Color::White)));
}

#[test]
fn promotion_applies_on_the_final_landing_row() {
    let board = board_with(&[
        (1, 2, Piece::man(Color::White)),
        (7, 0, Piece::man(Color::Black)),
    ]);
    let mut game = Game::with_board(board, Color::White);
    game.handle_click(1, 2);
    assert_eq!(game.handle_click(0, 1), Transition::TurnEnded);
    assert_eq!(game.board().get(0, 1), Some(Piece::king(Color::White)));
}

#[test]
fn turn_id_increments_per_turn_and_per_reset() {
    let mut game = Game::new(Color::Black);
    assert_eq!(game.turn_id(), 1);
    game.handle_click(2, 1);
    assert_eq!(game.handle_click(3, 0), Transition::TurnEnded);
    assert_eq!(game.turn_id(), 2);
    game.reset(Color::White);
    assert_eq!(game.turn_id(), 3);
    assert_eq!(game.active_player(), Color::White);
    assert!(!game.game_over());
}

struct FixedOracle {
    steps: Vec<Step>,
    score: i32,
}

impl Oracle for FixedOracle {
    fn search(
        &self,
        _board: [u8; 64],
        _player: u8,
        _limits: SearchLimits,
        progress: &mut dyn FnMut(u32, i32),
    ) -> anyhow::Result<SearchReport> {
        progress(3, self.score);
        Ok(SearchReport {
            steps: self.steps.clone(),
            score: self.score,
            depth: 3,
            nodes: 42,
        })
    }
}

struct FailingOracle;

impl Oracle for FailingOracle {
    fn search(
        &self,
        _board: [u8; 64],
        _player: u8,
        _limits: SearchLimits,
        _progress: &mut dyn FnMut(u32, i32),
    ) -> anyhow::Result<SearchReport> {
        anyhow::bail!("backend exploded")
    }
}

fn wait_for_outcome(advisor: &mut Advisor, turn_id: u64) -> SearchReport {
    for _ in 0..500 {
        advisor.poll(turn_id);
        if let Some(report) = advisor.view().outcome.clone() {
            return report;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("advisory result never arrived");
}

#[test]
fn advisory_result_for_current_turn_is_applied() {
    let steps = vec![Step::new((2, 1), (3, 0))];
    let oracle = FixedOracle {
        steps: steps.clone(),
        score: 17,
    };
    let mut advisor = Advisor::new(Arc::new(oracle), SearchLimits::default());
    advisor.request(Board::starting(), Color::Black, 7);
    assert!(advisor.view().thinking);

    let report = wait_for_outcome(&mut advisor, 7);
    assert_eq!(report.steps, steps);
    assert_eq!(advisor.view().hint(), Some(steps.as_slice()));
    assert_eq!(advisor.view().progress, Some((3, 17)));
    assert!(!advisor.view().thinking);
}

#[test]
fn advisory_result_for_a_superseded_turn_is_discarded() {
    let oracle = FixedOracle {
        steps: vec![Step::new((2, 1), (3, 0))],
        score: 17,
    };
    let mut advisor = Advisor::new(Arc::new(oracle), SearchLimits::default());
    advisor.request(Board::starting(), Color::Black, 7);
    // Let the worker finish before the consumer has moved on to turn 8.
    thread::sleep(Duration::from_millis(300));
    let changed = advisor.poll(8);
    assert!(!changed);
    assert!(advisor.view().outcome.is_none());
    assert!(advisor.view().hint().is_none());
    // The messages were consumed and dropped, not deferred.
    assert!(!advisor.poll(7));
    assert!(advisor.view().outcome.is_none());
}

#[test]
fn advisory_fault_is_contained() {
    let mut advisor = Advisor::new(Arc::new(FailingOracle), SearchLimits::default());
    advisor.request(Board::starting(), Color::Black, 1);
    thread::sleep(Duration::from_millis(300));
    assert!(!advisor.poll(1));
    assert!(advisor.view().outcome.is_none());
    // No hint this turn; the view just stays in thinking state.
    assert!(advisor.view().thinking);
}

fn quick_limits() -> SearchLimits {
    SearchLimits {
        max_time: Duration::from_secs(2),
        max_depth: 6,
    }
}

#[test]
fn search_plays_the_mandatory_capture() {
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (0, 1, Piece::man(Color::Black)),
        (7, 6, Piece::man(Color::White)),
    ]);
    let report = AlphaBetaOracle
        .search(board.codes(), 1, quick_limits(), &mut |_, _| {})
        .unwrap();
    assert_eq!(report.steps[0], Step::new((2, 1), (4, 3)));
    assert!(report.depth >= 1);
}

#[test]
fn search_prefers_the_longer_chain() {
    // A two-hop chain and an unrelated single capture; only the chain
    // is legal for the oracle's move list.
    let board = board_with(&[
        (2, 1, Piece::man(Color::Black)),
        (3, 2, Piece::man(Color::White)),
        (5, 4, Piece::man(Color::White)),
        (2, 5, Piece::man(Color::Black)),
        (3, 6, Piece::man(Color::White)),
    ]);
    let report = AlphaBetaOracle
        .search(board.codes(), 1, quick_limits(), &mut |_, _| {})
        .unwrap();
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].from, (2, 1));
    assert_eq!(report.steps[1].to, (6, 5));
}

#[test]
fn search_without_moves_reports_mate() {
    let report = AlphaBetaOracle
        .search(Board::empty().codes(), 1, quick_limits(), &mut |_, _| {})
        .unwrap();
    assert!(report.steps.is_empty());
    assert_eq!(report.score, -MATE);
}

#[test]
fn single_legal_move_short_circuits_the_search() {
    let board = board_with(&[(2, 7, Piece::man(Color::Black))]);
    let report = AlphaBetaOracle
        .search(board.codes(), 1, quick_limits(), &mut |_, _| {})
        .unwrap();
    assert_eq!(report.steps, vec![Step::new((2, 7), (3, 6))]);
    assert_eq!(report.depth, 1);
    assert_eq!(report.nodes, 0);
}

#[test]
fn search_respects_the_depth_ceiling() {
    let limits = SearchLimits {
        max_time: Duration::from_secs(5),
        max_depth: 2,
    };
    let mut reported_depths = Vec::new();
    let report = AlphaBetaOracle
        .search(Board::starting().codes(), 1, limits, &mut |depth, _| {
            reported_depths.push(depth)
        })
        .unwrap();
    assert!(report.depth <= 2);
    assert!(!reported_depths.is_empty());
    assert!(reported_depths.iter().all(|&depth| depth <= 2));
}

#[test]
fn advisor_with_real_oracle_suggests_a_legal_move() {
    let limits = SearchLimits {
        max_time: Duration::from_millis(200),
        max_depth: 4,
    };
    let mut advisor = Advisor::new(Arc::new(AlphaBetaOracle), limits);
    let game = Game::new(Color::Black);
    advisor.request(game.board().clone(), game.active_player(), game.turn_id());
    let report = wait_for_outcome(&mut advisor, game.turn_id());

    let (legal, _) = rules::legal_moves(game.board(), Color::Black);
    let suggested = report.steps[0];
    assert!(legal
        .iter()
        .any(|candidate| candidate.origin() == suggested.from
            && candidate.destination() == suggested.to));
}
