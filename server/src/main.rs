use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use power4::{GameState, Status};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

mod config;
mod render;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = ServerConfig::from_env()?;
    let app = app_router(&config);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!("Power4 server listening on http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .try_init();
}

/// The one live game of the process and the computer's dice. Every action
/// runs with the lock held, so actions never interleave.
struct Session {
    game: Option<GameState>,
    rng: StdRng,
}

#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session>>,
    ai_delay: Duration,
}

impl AppState {
    fn new(config: &ServerConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            session: Arc::new(Mutex::new(Session { game: None, rng })),
            ai_delay: config.ai_delay,
        }
    }
}

fn app_router(config: &ServerConfig) -> Router {
    let api = Router::new().route("/state", get(game_state)).layer(
        CorsLayer::new()
            .allow_methods([axum::http::Method::GET])
            .allow_origin(axum::http::HeaderValue::from_static("*"))
            .allow_headers([header::CONTENT_TYPE]),
    );
    Router::new()
        .route("/", get(index))
        .route("/newgame", post(new_game).get(|| async { Redirect::to("/") }))
        .route("/game", get(show_game))
        .route("/play", post(play).get(back_to_game))
        .route("/rematch", post(rematch).get(back_to_game))
        .nest("/api", api)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(config))
}

async fn index() -> Html<String> {
    Html(render::index_page())
}

async fn back_to_game() -> Redirect {
    Redirect::to("/game")
}

#[derive(Debug, Deserialize)]
struct NewGameForm {
    #[serde(default)]
    player1: String,
    #[serde(default)]
    player2: String,
    #[serde(default)]
    difficulty: String,
}

async fn new_game(
    State(state): State<AppState>,
    Form(form): Form<NewGameForm>,
) -> Redirect {
    let game = GameState::new_game(&form.player1, &form.player2, &form.difficulty);
    info!(
        player1 = game.player1(),
        player2 = game.player2(),
        mode = ?game.mode(),
        rows = game.rows(),
        cols = game.cols(),
        "new game"
    );
    state.session.lock().await.game = Some(game);
    Redirect::to("/game")
}

async fn show_game(State(state): State<AppState>) -> Response {
    let session = state.session.lock().await;
    match &session.game {
        Some(game) => Html(render::game_page(game)).into_response(),
        None => Redirect::to("/").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct PlayForm {
    #[serde(default)]
    col: String,
}

/// Rejected moves are logged and otherwise ignored; the player just sees the
/// board again.
async fn play(State(state): State<AppState>, Form(form): Form<PlayForm>) -> Redirect {
    let Ok(col) = form.col.trim().parse::<usize>() else {
        warn!(col = %form.col, "ignoring unparsable column");
        return Redirect::to("/game");
    };

    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let Some(game) = session.game.as_mut() else {
        return Redirect::to("/");
    };

    match game.play_human(col) {
        Ok(placed) => debug!(player = placed.player.number(), row = placed.row, col, "piece dropped"),
        Err(err) => {
            warn!(col, %err, "move rejected");
            return Redirect::to("/game");
        }
    }

    if game.ai_pending() {
        tokio::time::sleep(state.ai_delay).await;
        match game.ai_play(&mut session.rng) {
            Ok(placed) => debug!(row = placed.row, col = placed.column, "computer dropped a piece"),
            Err(err) => warn!(%err, "computer could not move"),
        }
    }

    if let Status::GameOver { winner } = game.status() {
        match winner {
            Some(player) => info!(winner = game.player_name(player), "game won"),
            None => info!("game drawn"),
        }
    }
    Redirect::to("/game")
}

async fn rematch(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    match session.game.as_mut() {
        Some(game) => {
            game.rematch();
            info!(rows = game.rows(), cols = game.cols(), "rematch");
            Redirect::to("/game")
        }
        None => Redirect::to("/"),
    }
}

/// The game as JSON, plus the winner numbered 0 (none or draw), 1 or 2.
#[derive(Serialize)]
struct StateView {
    #[serde(flatten)]
    game: GameState,
    winner_number: u8,
}

async fn game_state(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.lock().await;
    let game = session.game.as_ref().ok_or(ApiError::NoGame)?;
    let view = StateView {
        game: game.clone(),
        winner_number: game.winner_number(),
    };
    let headers = [(header::CACHE_CONTROL, "no-store")];
    Ok((headers, Json(view)))
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("no game in progress")]
    NoGame,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NoGame => StatusCode::NOT_FOUND,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::util::ServiceExt;

    fn test_router() -> Router {
        app_router(&ServerConfig {
            ai_delay: Duration::ZERO,
            seed: Some(7),
            ..ServerConfig::default()
        })
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    async fn state_json(app: &Router) -> Value {
        let response = send(app, get_request("/api/state")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn pieces(state: &Value) -> usize {
        state["board"]["grid"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|row| row.as_array().unwrap())
            .filter(|cell| *cell != "empty")
            .count()
    }

    #[tokio::test]
    async fn index_serves_the_setup_form() {
        let app = test_router();
        let response = send(&app, get_request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"action="/newgame""#));
    }

    #[tokio::test]
    async fn no_game_yet() {
        let app = test_router();
        let response = send(&app, get_request("/game")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let response = send(&app, get_request("/api/state")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "no game in progress");

        let response = send(&app, post_form("/play", "col=0")).await;
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn two_player_game_over_http() {
        let app = test_router();
        let response = send(
            &app,
            post_form("/newgame", "player1=Ana&player2=Bo&difficulty=Hard"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/game");

        let response = send(&app, post_form("/play", "col=3")).await;
        assert_eq!(location(&response), "/game");

        let state = state_json(&app).await;
        assert_eq!(state["mode"], "two_player");
        assert_eq!(state["board"]["rows"], 7);
        assert_eq!(state["board"]["cols"], 8);
        assert_eq!(state["board"]["grid"][6][3], "player1");
        assert_eq!(state["current_player"], "two");

        let response = send(&app, get_request("/game")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Ana vs Bo"));
        assert!(html.contains("Bo to play"));
    }

    #[tokio::test]
    async fn computer_answers_each_move() {
        let app = test_router();
        send(&app, post_form("/newgame", "player1=Ana&difficulty=Normal")).await;
        send(&app, post_form("/play", "col=4")).await;

        let state = state_json(&app).await;
        assert_eq!(state["mode"], "single_player_vs_ai");
        assert_eq!(state["current_player"], "one");
        assert_eq!(pieces(&state), 2);
        assert_eq!(state["board"]["grid"][5][4], "player1");
    }

    #[tokio::test]
    async fn bad_columns_are_no_ops() {
        let app = test_router();
        send(&app, post_form("/newgame", "player1=Ana&player2=Bo&difficulty=Easy")).await;
        let before = state_json(&app).await;

        for body in ["col=abc", "col=7", "col=-1", ""] {
            let response = send(&app, post_form("/play", body)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/game");
        }
        assert_eq!(state_json(&app).await, before);
    }

    #[tokio::test]
    async fn finished_games_ignore_moves_until_rematch() {
        let app = test_router();
        send(&app, post_form("/newgame", "player1=Ana&player2=Bo&difficulty=Easy")).await;
        for col in [0, 0, 1, 1, 2, 2, 3] {
            send(&app, post_form("/play", &format!("col={col}"))).await;
        }
        let finished = state_json(&app).await;
        assert_eq!(finished["game_over"], true);
        assert_eq!(finished["winner"], "one");
        assert_eq!(finished["winner_number"], 1);

        send(&app, post_form("/play", "col=5")).await;
        assert_eq!(state_json(&app).await, finished);

        let response = send(&app, post_form("/rematch", "")).await;
        assert_eq!(location(&response), "/game");
        let state = state_json(&app).await;
        assert_eq!(state["game_over"], false);
        assert_eq!(state["winner"], Value::Null);
        assert_eq!(state["winner_number"], 0);
        assert_eq!(state["current_player"], "one");
        assert_eq!(state["player1"], "Ana");
        assert_eq!(state["player2"], "Bo");
        assert_eq!(state["difficulty"], "Easy");
        assert_eq!(pieces(&state), 0);
    }

    #[tokio::test]
    async fn blank_second_name_is_still_a_second_player() {
        let app = test_router();
        send(&app, post_form("/newgame", "player1=Ana&player2=+&difficulty=Normal+")).await;
        send(&app, post_form("/play", "col=2")).await;

        let state = state_json(&app).await;
        assert_eq!(state["mode"], "two_player");
        assert_eq!(state["player2"], " ");
        assert_eq!(state["difficulty"], "Easy");
        assert_eq!(state["board"]["cols"], 7);
        assert_eq!(pieces(&state), 1);
        assert_eq!(state["current_player"], "two");
    }

    #[tokio::test]
    async fn get_on_actions_redirects() {
        let app = test_router();
        let response = send(&app, get_request("/newgame")).await;
        assert_eq!(location(&response), "/");
        let response = send(&app, get_request("/play")).await;
        assert_eq!(location(&response), "/game");
    }
}
