//! Power4 (Connect Four) engine for the browser game server.
//! A single `GameState` owns the board, whose turn it is and the result.
//! Callers drive it one action at a time: start a game, drop a piece, let the
//! random opponent answer, rematch. Nothing here blocks or keeps global state.
use thiserror::Error;

mod board;
mod game;

pub use board::{Board, Cell, Player, Position, CONNECT, MIN_DIMENSION};
pub use game::{
    random_column, Difficulty, GameState, Mode, Placement, Status, TurnReport,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("board must be at least {min}x{min}, got {rows}x{cols}", min = MIN_DIMENSION)]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("column {column} is not playable: {reason}")]
    InvalidColumn { column: usize, reason: &'static str },
    #[error("the game is over, start a rematch or a new game")]
    IllegalMoveAfterGameOver,
    #[error("no legal moves remain")]
    NoMoves,
    #[error("it is not the computer's turn")]
    NotAiTurn,
    #[error("waiting for the computer's move")]
    AiToMove,
}
