pub mod advisor;
pub mod board;
pub mod game;
pub mod rules;
pub mod search;
