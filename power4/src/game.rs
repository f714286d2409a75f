use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, Player};
use crate::GameError;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    SinglePlayerVsAi,
    TwoPlayer,
}

/// Picks the board size of a new game.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Labels match exactly; anything else gets the Easy board.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Normal" => Difficulty::Normal,
            "Hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    /// `(rows, cols)`
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            Difficulty::Easy => (6, 7),
            Difficulty::Normal => (6, 9),
            Difficulty::Hard => (7, 8),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    AwaitingMove { player: Player },
    /// `winner` is `None` for a draw.
    GameOver { winner: Option<Player> },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub player: Player,
    pub row: usize,
    pub column: usize,
}

/// What a call to [`GameState::play_column`] did.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub human: Placement,
    pub ai: Option<Placement>,
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameState {
    board: Board,
    current_player: Player,
    game_over: bool,
    winner: Option<Player>,
    mode: Mode,
    player1: String,
    player2: String,
    difficulty: Option<Difficulty>,
}

impl GameState {
    /// Empty board of the given size with player one to move. The game is
    /// single-player, unnamed and has no difficulty preset.
    pub fn initialize(rows: usize, cols: usize) -> Result<Self, GameError> {
        Ok(Self::fresh(Board::new(rows, cols)?))
    }

    /// Only an empty `player2` means playing against the computer; names and
    /// the difficulty label are taken as given.
    pub fn new_game(player1: &str, player2: &str, difficulty: &str) -> Self {
        let difficulty = Difficulty::from_label(difficulty);
        let (rows, cols) = difficulty.dimensions();
        let mut state = Self::fresh(Board::empty(rows, cols));
        state.mode = if player2.is_empty() {
            Mode::SinglePlayerVsAi
        } else {
            Mode::TwoPlayer
        };
        state.player1 = player1.to_string();
        state.player2 = player2.to_string();
        state.difficulty = Some(difficulty);
        state
    }

    fn fresh(board: Board) -> Self {
        Self {
            board,
            current_player: Player::One,
            game_over: false,
            winner: None,
            mode: Mode::SinglePlayerVsAi,
            player1: String::new(),
            player2: String::new(),
            difficulty: None,
        }
    }

    /// Fresh board of the same size; names, mode and difficulty stay.
    pub fn rematch(&mut self) {
        self.board = self.board.cleared();
        self.current_player = Player::One;
        self.game_over = false;
        self.winner = None;
    }

    /// Plays `col` for the player to move, then lets the computer answer in
    /// single-player games.
    pub fn play_column<R: Rng + ?Sized>(
        &mut self,
        col: usize,
        rng: &mut R,
    ) -> Result<TurnReport, GameError> {
        let human = self.play_human(col)?;
        let ai = if self.ai_pending() {
            Some(self.ai_play(rng)?)
        } else {
            None
        };
        Ok(TurnReport {
            human,
            ai,
            status: self.status(),
        })
    }

    /// Plays `col` for the player to move without triggering the computer.
    /// Rejected moves leave the state untouched.
    pub fn play_human(&mut self, col: usize) -> Result<Placement, GameError> {
        if self.game_over {
            return Err(GameError::IllegalMoveAfterGameOver);
        }
        if self.ai_pending() {
            return Err(GameError::AiToMove);
        }
        let player = self.current_player;
        self.place(col, player)
    }

    /// True when the next move belongs to the computer.
    pub fn ai_pending(&self) -> bool {
        !self.game_over && self.mode == Mode::SinglePlayerVsAi && self.current_player == Player::Two
    }

    /// Drops a piece for player two in a uniformly random open column.
    pub fn ai_play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Placement, GameError> {
        if self.game_over {
            return Err(GameError::IllegalMoveAfterGameOver);
        }
        if !self.ai_pending() {
            return Err(GameError::NotAiTurn);
        }
        let col = random_column(&self.board, rng).ok_or(GameError::NoMoves)?;
        debug!(column = col, "computer picked a column");
        self.place(col, Player::Two)
    }

    fn place(&mut self, col: usize, player: Player) -> Result<Placement, GameError> {
        let pos = self
            .board
            .drop_piece(col, player)?
            .ok_or(GameError::InvalidColumn {
                column: col,
                reason: "full",
            })?;
        self.settle(player);
        Ok(Placement {
            player,
            row: pos.row,
            column: pos.column,
        })
    }

    // Only the player who just moved can have completed a line.
    fn settle(&mut self, mover: Player) {
        if self.board.check_win(mover) {
            self.game_over = true;
            self.winner = Some(mover);
        } else if self.board.is_full() {
            self.game_over = true;
            self.winner = None;
        } else {
            self.current_player = mover.opponent();
        }
    }

    pub fn status(&self) -> Status {
        if self.game_over {
            Status::GameOver {
                winner: self.winner,
            }
        } else {
            Status::AwaitingMove {
                player: self.current_player,
            }
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn cols(&self) -> usize {
        self.board.cols()
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// 0 while undecided or on a draw, otherwise 1 or 2.
    pub fn winner_number(&self) -> u8 {
        self.winner.map_or(0, Player::number)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn player1(&self) -> &str {
        &self.player1
    }

    pub fn player2(&self) -> &str {
        &self.player2
    }

    pub fn player_name(&self, player: Player) -> &str {
        match player {
            Player::One => &self.player1,
            Player::Two => &self.player2,
        }
    }
}

/// Samples columns uniformly, skipping full ones. `None` on a full board.
pub fn random_column<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    if board.is_full() {
        return None;
    }
    loop {
        let col = rng.gen_range(0..board.cols());
        if let Ok(false) = board.is_column_full(col) {
            return Some(col);
        }
    }
}
