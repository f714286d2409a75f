use serde::{Deserialize, Serialize};

use crate::GameError;

/// Pieces in a row needed to win.
pub const CONNECT: usize = 4;
/// Smallest board on which a line of `CONNECT` fits in every direction.
pub const MIN_DIMENSION: usize = CONNECT;

/// Row/column steps: horizontal, vertical, diagonal `\`, diagonal `/`.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Player1,
    Player2,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// 1 or 2, the way players are numbered on screen.
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::Player1,
            Player::Two => Cell::Player2,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

/// Grid of cells, row 0 at the top. Pieces only enter through
/// [`Board::drop_piece`], so a cell is occupied only if every cell below it
/// in the same column is occupied too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    grid: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Result<Self, GameError> {
        if rows < MIN_DIMENSION || cols < MIN_DIMENSION {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        Ok(Self::empty(rows, cols))
    }

    /// Caller guarantees both dimensions are at least `MIN_DIMENSION`.
    pub(crate) fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            grid: vec![vec![Cell::Empty; cols]; rows],
        }
    }

    /// An empty board with the same dimensions.
    pub fn cleared(&self) -> Board {
        Self::empty(self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// Panics if `row` or `col` is off the board.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.grid[row][col]
    }

    /// A column is full once its top cell is taken.
    pub fn is_column_full(&self, col: usize) -> Result<bool, GameError> {
        self.check_column(col)?;
        Ok(self.grid[0][col] != Cell::Empty)
    }

    /// Checking the top row is enough thanks to gravity.
    pub fn is_full(&self) -> bool {
        self.grid[0].iter().all(|&cell| cell != Cell::Empty)
    }

    pub fn legal_columns(&self) -> Vec<usize> {
        (0..self.cols)
            .filter(|&col| self.grid[0][col] == Cell::Empty)
            .collect()
    }

    /// Lets a piece fall to the lowest empty row of `col`. Returns `None`
    /// and leaves the board untouched when the column is full.
    pub fn drop_piece(&mut self, col: usize, player: Player) -> Result<Option<Position>, GameError> {
        self.check_column(col)?;
        for row in (0..self.rows).rev() {
            if self.grid[row][col] == Cell::Empty {
                self.grid[row][col] = player.cell();
                return Ok(Some(Position { row, column: col }));
            }
        }
        Ok(None)
    }

    pub fn check_win(&self, player: Player) -> bool {
        self.winning_line(player).is_some()
    }

    /// Scans the whole board, direction by direction, for `CONNECT` of
    /// `player`'s pieces in a row and returns the first line found.
    pub fn winning_line(&self, player: Player) -> Option<[Position; CONNECT]> {
        let target = player.cell();
        for &(d_row, d_col) in DIRECTIONS.iter() {
            for row in 0..self.rows {
                for col in 0..self.cols {
                    let Some(line) = self.line_from(row, col, d_row, d_col) else {
                        continue;
                    };
                    if line.iter().all(|p| self.grid[p.row][p.column] == target) {
                        return Some(line);
                    }
                }
            }
        }
        None
    }

    fn line_from(
        &self,
        row: usize,
        col: usize,
        d_row: isize,
        d_col: isize,
    ) -> Option<[Position; CONNECT]> {
        let mut line = [Position { row, column: col }; CONNECT];
        for (step, slot) in line.iter_mut().enumerate().skip(1) {
            let r = row as isize + d_row * step as isize;
            let c = col as isize + d_col * step as isize;
            if r < 0 || c < 0 || r as usize >= self.rows || c as usize >= self.cols {
                return None;
            }
            *slot = Position {
                row: r as usize,
                column: c as usize,
            };
        }
        Some(line)
    }

    fn check_column(&self, col: usize) -> Result<(), GameError> {
        if col >= self.cols {
            return Err(GameError::InvalidColumn {
                column: col,
                reason: "out of bounds",
            });
        }
        Ok(())
    }
}
