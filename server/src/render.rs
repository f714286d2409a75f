//! Server-side HTML for the welcome page and the board.
use power4::{Cell, Difficulty, GameState, Mode, Player, Position, Status};

const STYLESHEET: &str = "/static/style.css";

pub fn index_page() -> String {
    let mut options = String::new();
    for difficulty in Difficulty::ALL {
        let (rows, cols) = difficulty.dimensions();
        options.push_str(&format!(
            r#"<option value="{label}">{label} ({rows}x{cols})</option>"#,
            label = difficulty.label(),
        ));
    }
    layout(
        "Power4",
        &format!(
            r#"<h1>Power4</h1>
<form method="post" action="/newgame" class="setup">
  <label>Player 1 <input name="player1" required></label>
  <label>Player 2 <input name="player2" placeholder="leave empty to play the computer"></label>
  <label>Difficulty <select name="difficulty">{options}</select></label>
  <button type="submit">New game</button>
</form>"#
        ),
    )
}

pub fn game_page(game: &GameState) -> String {
    let board = game.board();
    let line = game
        .winner()
        .and_then(|winner| board.winning_line(winner))
        .map(|l| l.to_vec())
        .unwrap_or_default();

    let mut body = format!(
        "<h1>{} vs {}</h1>\n<p class=\"status\">{}</p>\n",
        escape(&display_name(game, Player::One)),
        escape(&display_name(game, Player::Two)),
        status_line(game),
    );

    body.push_str("<form method=\"post\" action=\"/play\">\n<table class=\"board\">\n<tr>");
    for col in 0..board.cols() {
        let open = !game.is_game_over() && matches!(board.is_column_full(col), Ok(false));
        body.push_str(&format!(
            r#"<th><button name="col" value="{col}"{}>&darr;</button></th>"#,
            if open { "" } else { " disabled" },
        ));
    }
    body.push_str("</tr>\n");
    for (row, cells) in board.grid().iter().enumerate() {
        body.push_str("<tr>");
        for (column, &cell) in cells.iter().enumerate() {
            let mut class = cell_class(cell).to_string();
            if line.contains(&Position { row, column }) {
                class.push_str(" win");
            }
            body.push_str(&format!(r#"<td class="{class}"></td>"#));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n</form>\n");

    let difficulty = game.difficulty().map_or("Custom", Difficulty::label);
    body.push_str(&format!(
        r#"<p class="meta">{difficulty} board, {}x{}</p>
<form method="post" action="/rematch"><button type="submit">Rematch</button></form>
<p><a href="/">New game</a></p>"#,
        game.rows(),
        game.cols(),
    ));

    layout("Power4", &body)
}

fn status_line(game: &GameState) -> String {
    match game.status() {
        Status::AwaitingMove { player } => format!(
            "{} to play ({})",
            escape(&display_name(game, player)),
            colour(player),
        ),
        Status::GameOver {
            winner: Some(player),
        } => format!("{} wins!", escape(&display_name(game, player))),
        Status::GameOver { winner: None } => "Draw, the board is full.".to_string(),
    }
}

fn display_name(game: &GameState, player: Player) -> String {
    let name = game.player_name(player);
    if !name.is_empty() {
        return name.to_string();
    }
    match (player, game.mode()) {
        (Player::Two, Mode::SinglePlayerVsAi) => "Computer".to_string(),
        _ => format!("Player {}", player.number()),
    }
}

fn colour(player: Player) -> &'static str {
    match player {
        Player::One => "red",
        Player::Two => "yellow",
    }
}

fn cell_class(cell: Cell) -> &'static str {
    match cell {
        Cell::Empty => "empty",
        Cell::Player1 => "p1",
        Cell::Player2 => "p2",
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{STYLESHEET}">
</head>
<body>
{body}
</body>
</html>
"#
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
