use std::time::Instant;

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::advisor::{Oracle, SearchLimits, SearchReport};
use crate::core::board::{
    CODE_BLACK_KING, CODE_BLACK_MAN, CODE_EMPTY, CODE_WHITE_KING, CODE_WHITE_MAN,
};
use crate::core::rules::{on_board, Step, DIRECTIONS};

/** Scores within 1000 of this magnitude denote a forced win/loss in N plies. */
pub const MATE: i32 = 900_000;
const INF: i32 = 1_000_000;
const MAX_PLY: i32 = 64;
const MAX_CHAIN: usize = 12;
/** Marks a just-captured piece during chain enumeration: it still blocks
sliding and cannot be jumped twice, but scores as nothing. */
const GHOST: u8 = 7;
const TT_SIZE: usize = 1 << 20;
/** How far past depth 0 a forced-capture flurry may extend. */
const NOISY_HORIZON: i32 = -12;

type Grid = [u8; 64];
/** Full multi-hop move, unlike the interactive engine's single-hop moves. */
type Chain = Vec<Step>;

fn at(grid: &Grid, row: i8, col: i8) -> u8 {
    grid[(row * 8 + col) as usize]
}

fn put(grid: &mut Grid, row: i8, col: i8, code: u8) {
    grid[(row * 8 + col) as usize] = code;
}

fn is_white(code: u8) -> bool {
    code == CODE_WHITE_MAN || code == CODE_WHITE_KING
}

fn is_king(code: u8) -> bool {
    code == CODE_WHITE_KING || code == CODE_BLACK_KING
}

fn is_enemy(code: u8, of_white: bool) -> bool {
    code != CODE_EMPTY && code != GHOST && is_white(code) != of_white
}

fn opponent(player: u8) -> u8 {
    if is_white(player) {
        CODE_BLACK_MAN
    } else {
        CODE_WHITE_MAN
    }
}

/**
Recursive capture enumeration. Each branch jumps one enemy, ghosts it,
and continues from the landing square; a branch with no continuation is a
complete chain. Kings fly: any empty square past the jumped enemy is a
separate landing, each with its own continuations.
*/
fn find_chains(grid: &Grid, row: i8, col: i8, piece: u8, current: &mut Chain, out: &mut Vec<Chain>) {
    if current.len() >= MAX_CHAIN {
        out.push(current.clone());
        return;
    }
    let white = is_white(piece);
    let mut extended = false;
    for (dr, dc) in DIRECTIONS {
        if !is_king(piece) {
            let (mid_row, mid_col) = (row + dr, col + dc);
            let (jump_row, jump_col) = (row + 2 * dr, col + 2 * dc);
            if on_board(jump_row, jump_col)
                && is_enemy(at(grid, mid_row, mid_col), white)
                && at(grid, jump_row, jump_col) == CODE_EMPTY
            {
                let mut scratch = *grid;
                put(&mut scratch, row, col, CODE_EMPTY);
                put(&mut scratch, mid_row, mid_col, GHOST);
                put(&mut scratch, jump_row, jump_col, piece);
                current.push(Step::new(
                    (row as u8, col as u8),
                    (jump_row as u8, jump_col as u8),
                ));
                find_chains(&scratch, jump_row, jump_col, piece, current, out);
                current.pop();
                extended = true;
            }
        } else {
            let mut dist = 1;
            loop {
                let (next_row, next_col) = (row + dist * dr, col + dist * dc);
                if !on_board(next_row, next_col) {
                    break;
                }
                let code = at(grid, next_row, next_col);
                if code == CODE_EMPTY {
                    dist += 1;
                    continue;
                }
                if is_enemy(code, white) {
                    let mut land = 1;
                    loop {
                        let (land_row, land_col) = (next_row + land * dr, next_col + land * dc);
                        if !on_board(land_row, land_col)
                            || at(grid, land_row, land_col) != CODE_EMPTY
                        {
                            break;
                        }
                        let mut scratch = *grid;
                        put(&mut scratch, row, col, CODE_EMPTY);
                        put(&mut scratch, next_row, next_col, GHOST);
                        put(&mut scratch, land_row, land_col, piece);
                        current.push(Step::new(
                            (row as u8, col as u8),
                            (land_row as u8, land_col as u8),
                        ));
                        find_chains(&scratch, land_row, land_col, piece, current, out);
                        current.pop();
                        extended = true;
                        land += 1;
                    }
                }
                break;
            }
        }
    }
    if !extended && !current.is_empty() {
        out.push(current.clone());
    }
}

/**
All legal moves for `player`, pre-enumerated as full chains. When captures
exist only the longest chains survive (majority rule); this is stricter
than the interactive engine on purpose, the oracle should not spend nodes
on obviously inferior short chains.
*/
fn generate(grid: &Grid, player: u8) -> (Vec<Chain>, bool) {
    let white = is_white(player);
    let mut chains = Vec::new();
    for row in 0..8 {
        for col in 0..8 {
            let code = at(grid, row, col);
            if code != CODE_EMPTY && code != GHOST && is_white(code) == white {
                let mut current = Vec::new();
                find_chains(grid, row, col, code, &mut current, &mut chains);
            }
        }
    }
    if !chains.is_empty() {
        let longest = chains.iter().map(Vec::len).max().unwrap_or(0);
        chains.retain(|chain| chain.len() == longest);
        return (chains, true);
    }

    let mut moves = Vec::new();
    for row in 0..8 {
        for col in 0..8 {
            let code = at(grid, row, col);
            if code == CODE_EMPTY || code == GHOST || is_white(code) != white {
                continue;
            }
            if !is_king(code) {
                let dr = if white { -1 } else { 1 };
                for dc in [-1, 1] {
                    let (next_row, next_col) = (row + dr, col + dc);
                    if on_board(next_row, next_col)
                        && at(grid, next_row, next_col) == CODE_EMPTY
                    {
                        moves.push(vec![Step::new(
                            (row as u8, col as u8),
                            (next_row as u8, next_col as u8),
                        )]);
                    }
                }
            } else {
                for (dr, dc) in DIRECTIONS {
                    let mut dist = 1;
                    loop {
                        let (next_row, next_col) = (row + dist * dr, col + dist * dc);
                        if !on_board(next_row, next_col)
                            || at(grid, next_row, next_col) != CODE_EMPTY
                        {
                            break;
                        }
                        moves.push(vec![Step::new(
                            (row as u8, col as u8),
                            (next_row as u8, next_col as u8),
                        )]);
                        dist += 1;
                    }
                }
            }
        }
    }
    (moves, false)
}

/** Play out a full chain: relocate, sweep every crossed square, promote. */
fn apply(grid: &mut Grid, chain: &[Step]) {
    let from = chain[0].from;
    let to = chain[chain.len() - 1].to;
    let piece = at(grid, from.0 as i8, from.1 as i8);
    put(grid, from.0 as i8, from.1 as i8, CODE_EMPTY);
    for step in chain {
        let dr: i8 = if step.to.0 > step.from.0 { 1 } else { -1 };
        let dc: i8 = if step.to.1 > step.from.1 { 1 } else { -1 };
        let (mut row, mut col) = (step.from.0 as i8 + dr, step.from.1 as i8 + dc);
        while (row as u8, col as u8) != step.to {
            put(grid, row, col, CODE_EMPTY);
            row += dr;
            col += dc;
        }
    }
    let landed = if piece == CODE_WHITE_MAN && to.0 == 0 {
        CODE_WHITE_KING
    } else if piece == CODE_BLACK_MAN && to.0 == 7 {
        CODE_BLACK_KING
    } else {
        piece
    };
    put(grid, to.0 as i8, to.1 as i8, landed);
}

fn is_promotion(chain: &[Step], piece: u8) -> bool {
    if chain.len() != 1 {
        return false;
    }
    let to_row = chain[0].to.0;
    (piece == CODE_WHITE_MAN && to_row == 0) || (piece == CODE_BLACK_MAN && to_row == 7)
}

const VAL_MAN: i32 = 1000;
const VAL_KING: i32 = 8000;
const RUNAWAY_BONUS: i32 = 600;
const MOBILITY_WEIGHT: i32 = 6;
const DANGER_NEAR_KING_ROW: i32 = 1000;

#[rustfmt::skip]
const PST_WHITE: [i32; 64] = [
       0,    0,    0,    0,    0,    0,    0,    0,
    1500, 1500, 1500, 1500, 1500, 1500, 1500, 1500,
     800,  800,  800,  800,  800,  800,  800,  800,
     200,  200,  250,  250,  250,  250,  200,  200,
     100,  100,  150,  150,  150,  150,  100,  100,
      50,   50,   80,   80,   80,   80,   50,   50,
      20,   20,   20,   20,   20,   20,   20,   20,
      10,   10,   10,   10,   10,   10,   10,   10,
];

#[rustfmt::skip]
const PST_BLACK: [i32; 64] = [
      10,   10,   10,   10,   10,   10,   10,   10,
      20,   20,   20,   20,   20,   20,   20,   20,
      50,   50,   80,   80,   80,   80,   50,   50,
     100,  100,  150,  150,  150,  150,  100,  100,
     200,  200,  250,  250,  250,  250,  200,  200,
     800,  800,  800,  800,  800,  800,  800,  800,
    1500, 1500, 1500, 1500, 1500, 1500, 1500, 1500,
       0,    0,    0,    0,    0,    0,    0,    0,
];

fn evaluate(grid: &Grid, player: u8) -> i32 {
    let mut white_score = 0;
    let mut black_score = 0;
    let mut white_total = 0;
    let mut black_total = 0;
    let mut white_moves = 0;
    let mut black_moves = 0;

    for row in 0..8i8 {
        for col in 0..8i8 {
            let index = (row * 8 + col) as usize;
            match grid[index] {
                CODE_WHITE_MAN => {
                    white_total += 1;
                    white_score += VAL_MAN + PST_WHITE[index];
                    if row <= 2 {
                        white_score += RUNAWAY_BONUS;
                    }
                    for dc in [-1, 1] {
                        if on_board(row - 1, col + dc) && at(grid, row - 1, col + dc) == CODE_EMPTY
                        {
                            white_moves += 1;
                        }
                    }
                }
                CODE_BLACK_MAN => {
                    black_total += 1;
                    black_score += VAL_MAN + PST_BLACK[index];
                    if row >= 5 {
                        black_score += RUNAWAY_BONUS;
                    }
                    for dc in [-1, 1] {
                        if on_board(row + 1, col + dc) && at(grid, row + 1, col + dc) == CODE_EMPTY
                        {
                            black_moves += 1;
                        }
                    }
                }
                CODE_WHITE_KING => {
                    white_total += 1;
                    white_score += VAL_KING;
                    white_moves += 5;
                }
                CODE_BLACK_KING => {
                    black_total += 1;
                    black_score += VAL_KING;
                    black_moves += 5;
                }
                _ => {}
            }
        }
    }

    // A man one row from promoting, with no defender on the back row.
    for col in 0..8i8 {
        if at(grid, 6, col) == CODE_BLACK_MAN {
            let guarded = (on_board(7, col - 1) && at(grid, 7, col - 1) != CODE_EMPTY)
                || (on_board(7, col + 1) && at(grid, 7, col + 1) != CODE_EMPTY);
            if !guarded {
                white_score -= DANGER_NEAR_KING_ROW;
            }
        }
        if at(grid, 1, col) == CODE_WHITE_MAN {
            let guarded = (on_board(0, col - 1) && at(grid, 0, col - 1) != CODE_EMPTY)
                || (on_board(0, col + 1) && at(grid, 0, col + 1) != CODE_EMPTY);
            if !guarded {
                black_score -= DANGER_NEAR_KING_ROW;
            }
        }
    }

    white_score += white_moves * MOBILITY_WEIGHT;
    black_score += black_moves * MOBILITY_WEIGHT;

    // The side ahead on material wants trades.
    if white_total > black_total {
        white_score += 2500 / (black_total + 1);
    }
    if black_total > white_total {
        black_score += 2500 / (white_total + 1);
    }

    let score = white_score - black_score;
    if is_white(player) {
        score
    } else {
        -score
    }
}

struct Zobrist {
    table: [[u64; 8]; 64],
    black_to_move: u64,
}

impl Zobrist {
    fn new() -> Zobrist {
        let mut rng = StdRng::seed_from_u64(12345);
        let mut table = [[0u64; 8]; 64];
        for cell in table.iter_mut() {
            for code in cell.iter_mut() {
                *code = rng.gen();
            }
        }
        Zobrist {
            table,
            black_to_move: rng.gen(),
        }
    }

    fn hash(&self, grid: &Grid, player: u8) -> u64 {
        let mut hash = 0;
        for (index, &code) in grid.iter().enumerate() {
            if code != CODE_EMPTY && code != GHOST {
                hash ^= self.table[index][code as usize];
            }
        }
        if !is_white(player) {
            hash ^= self.black_to_move;
        }
        hash
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TtFlag {
    Exact,
    Alpha,
    Beta,
}

#[derive(Clone)]
struct TtEntry {
    key: u64,
    score: i32,
    depth: i32,
    flag: TtFlag,
    best: Chain,
}

impl Default for TtEntry {
    fn default() -> Self {
        TtEntry {
            key: 0,
            score: 0,
            depth: 0,
            flag: TtFlag::Alpha,
            best: Vec::new(),
        }
    }
}

struct SearchState {
    zobrist: Zobrist,
    tt: Vec<TtEntry>,
    nodes: u64,
    deadline: Instant,
    stop: bool,
}

impl SearchState {
    fn new(deadline: Instant) -> SearchState {
        SearchState {
            zobrist: Zobrist::new(),
            tt: vec![TtEntry::default(); TT_SIZE],
            nodes: 0,
            deadline,
            stop: false,
        }
    }

    fn tt_save(&mut self, key: u64, score: i32, depth: i32, flag: TtFlag, best: &Chain) {
        let entry = &mut self.tt[key as usize % TT_SIZE];
        if entry.key != key || depth >= entry.depth {
            *entry = TtEntry {
                key,
                score,
                depth,
                flag,
                best: best.clone(),
            };
        }
    }

    /** Returns a usable score if the stored bound cuts, plus the stored
    best move for ordering either way. */
    fn tt_probe(&self, key: u64, depth: i32, alpha: i32, beta: i32) -> (Option<i32>, Chain) {
        let entry = &self.tt[key as usize % TT_SIZE];
        if entry.key != key {
            return (None, Vec::new());
        }
        let best = entry.best.clone();
        if entry.depth < depth {
            return (None, best);
        }
        let mut score = entry.score;
        // Mate scores are ply-relative; pull them back toward the root.
        if score > MATE - 1000 {
            score -= MAX_PLY;
        }
        if score < -MATE + 1000 {
            score += MAX_PLY;
        }
        match entry.flag {
            TtFlag::Exact => (Some(score), best),
            TtFlag::Alpha if score <= alpha => (Some(alpha), best),
            TtFlag::Beta if score >= beta => (Some(beta), best),
            _ => (None, best),
        }
    }

    fn out_of_time(&mut self) -> bool {
        if self.nodes & 2047 == 0 && Instant::now() >= self.deadline {
            self.stop = true;
        }
        self.stop
    }

    fn alpha_beta(
        &mut self,
        grid: &Grid,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        player: u8,
        ply: i32,
    ) -> i32 {
        self.nodes += 1;
        if self.out_of_time() {
            return 0;
        }

        let (moves, capture_forced) = generate(grid, player);
        if moves.is_empty() {
            return -MATE + ply;
        }

        if depth <= 0 {
            let noisy = capture_forced
                || moves.iter().any(|chain| {
                    let piece = at(grid, chain[0].from.0 as i8, chain[0].from.1 as i8);
                    is_promotion(chain, piece)
                });
            if !noisy || depth < NOISY_HORIZON {
                return evaluate(grid, player);
            }
        }

        let key = self.zobrist.hash(grid, player);
        let (cut, tt_best) = self.tt_probe(key, depth, alpha, beta);
        if let Some(score) = cut {
            if ply > 0 {
                return score;
            }
        }

        let mut ordered: Vec<(i32, &Chain)> = moves
            .iter()
            .map(|chain| {
                let piece = at(grid, chain[0].from.0 as i8, chain[0].from.1 as i8);
                let order = if *chain == tt_best {
                    2_000_000
                } else if capture_forced {
                    1_000_000 + chain.len() as i32 * 1000
                } else if is_promotion(chain, piece) {
                    950_000
                } else {
                    0
                };
                (order, chain)
            })
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0));

        let enemy = opponent(player);
        let mut best_score = -INF;
        let mut best_chain = ordered[0].1.clone();
        let mut flag = TtFlag::Alpha;
        for (_, chain) in ordered {
            let piece = at(grid, chain[0].from.0 as i8, chain[0].from.1 as i8);
            let extension = if is_promotion(chain, piece) && ply < MAX_PLY {
                1
            } else {
                0
            };
            let mut scratch = *grid;
            apply(&mut scratch, chain);
            let score =
                -self.alpha_beta(&scratch, depth - 1 + extension, -beta, -alpha, enemy, ply + 1);
            if self.stop {
                return 0;
            }
            if score > best_score {
                best_score = score;
                best_chain = chain.clone();
                if score > alpha {
                    alpha = score;
                    flag = TtFlag::Exact;
                    if alpha >= beta {
                        flag = TtFlag::Beta;
                        break;
                    }
                }
            }
        }
        self.tt_save(key, best_score, depth, flag, &best_chain);
        best_score
    }
}

/**
Built-in advisory oracle: iterative deepening negamax with alpha-beta and
a Zobrist transposition table over the flat-board encoding. Self-contained
and self-terminating; it never touches live game state.
*/
pub struct AlphaBetaOracle;

impl Oracle for AlphaBetaOracle {
    fn search(
        &self,
        board: [u8; 64],
        player: u8,
        limits: SearchLimits,
        progress: &mut dyn FnMut(u32, i32),
    ) -> Result<SearchReport> {
        let (mut root_moves, _) = generate(&board, player);
        if root_moves.is_empty() {
            return Ok(SearchReport {
                steps: Vec::new(),
                score: -MATE,
                depth: 0,
                nodes: 0,
            });
        }
        if root_moves.len() == 1 {
            debug!("single legal move, skipping search");
            return Ok(SearchReport {
                steps: root_moves.remove(0),
                score: 0,
                depth: 1,
                nodes: 0,
            });
        }

        let mut state = SearchState::new(Instant::now() + limits.max_time);
        let enemy = opponent(player);
        let mut best_overall = root_moves[0].clone();
        let mut best_score = -INF;
        let mut reached_depth = 0;

        for depth in 1..=limits.max_depth as i32 {
            // Previous iteration's best first.
            if let Some(index) = root_moves.iter().position(|chain| *chain == best_overall) {
                root_moves.swap(0, index);
            }
            let mut alpha = -INF;
            let beta = INF;
            let mut current_best = root_moves[0].clone();
            let mut current_score = -INF;
            for chain in &root_moves {
                let piece = at(&board, chain[0].from.0 as i8, chain[0].from.1 as i8);
                let extension = if is_promotion(chain, piece) { 1 } else { 0 };
                let mut scratch = board;
                apply(&mut scratch, chain);
                let score =
                    -state.alpha_beta(&scratch, depth - 1 + extension, -beta, -alpha, enemy, 1);
                if state.stop {
                    break;
                }
                if score > current_score {
                    current_score = score;
                    current_best = chain.clone();
                    if score > alpha {
                        alpha = score;
                    }
                }
            }
            if state.stop {
                break;
            }
            best_overall = current_best;
            best_score = current_score;
            reached_depth = depth;
            progress(depth as u32, best_score);
            info!(
                "depth {depth:2} | score {best_score:6} | nodes {}",
                state.nodes
            );
            if best_score > MATE - 5000 {
                break;
            }
        }

        Ok(SearchReport {
            steps: best_overall,
            score: best_score,
            depth: reached_depth as u32,
            nodes: state.nodes,
        })
    }
}
