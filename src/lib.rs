mod core;

// module re-exports
pub use core::*;

pub use core::advisor::{Advisor, AdvisoryMsg, AdvisoryView, Oracle, SearchLimits, SearchReport};
pub use core::board::{Board, Color, Piece, Rank};
pub use core::game::{Game, Phase, Transition};
pub use core::rules::{Move, Step};
pub use core::search::{AlphaBetaOracle, MATE};

#[cfg(test)]
mod tests;
