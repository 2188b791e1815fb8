use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use burrow_api::auth::{self, AppState, AppStateInner};
use burrow_api::mail::Mailer;
use burrow_api::{chats, comments, friends, messages, users};
use burrow_relay::Registry;
use burrow_relay::connection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burrow=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("BURROW_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("BURROW_DB_PATH").unwrap_or_else(|_| "burrow.db".into());
    let host = std::env::var("BURROW_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("BURROW_PORT")
        .unwrap_or_else(|_| "3333".into())
        .parse()?;
    let mail_webhook = std::env::var("BURROW_MAIL_WEBHOOK").ok();
    let mail_from =
        std::env::var("BURROW_MAIL_FROM").unwrap_or_else(|_| "noreply@burrow.chat".into());

    // Init database
    let db = burrow_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let registry = Registry::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        mailer: Mailer::new(mail_webhook, mail_from),
    });

    // Routes
    let api_routes = Router::new()
        .route("/api/users", post(users::create_user))
        .route("/api/users/{user_id}", get(users::get_user).post(users::update_password))
        .route("/api/users/update/{user_id}", post(users::update_username))
        .route("/api/users/block/{friend_name}", post(users::block_user))
        .route("/api/users/unblock/{friend_name}", post(users::unblock_user))
        .route("/api/users/userfriend/{friend_name}", post(users::get_user_friend))
        .route("/api/users/forgotpassword/{email}", post(users::forgot_password))
        .route("/api/users/forgotusername/{email}", post(users::forgot_username))
        .route("/api/user/login", post(auth::login))
        .route("/api/user/validation", post(auth::validate_token))
        .route("/api/user/friends", post(friends::add_friend))
        .route("/api/user/friends/{user_id}", get(friends::get_friends))
        .route("/api/chats", post(chats::create_chat))
        .route("/api/chats/user/{user_id}", get(chats::get_chats))
        .route("/api/chats/{chat_id}", get(chats::get_chat).post(chats::update_chat))
        .route("/api/chats/participants/{chat_id}", get(chats::get_participants))
        .route("/api/chats/chat/{chat_id}", post(chats::leave_chat))
        .route("/api/chats/chat/add/{chat_id}", post(chats::add_friend_to_chat))
        .route("/api/messages", post(messages::create_message))
        .route("/api/messages/{chat_id}", get(messages::get_messages))
        .route("/api/messages/update/{message_id}", post(messages::update_message))
        .route("/api/comments", post(comments::create_comment))
        .with_state(app_state);

    let relay_route = Router::new()
        .route("/relay", get(ws_upgrade))
        .with_state(registry);

    let app = Router::new()
        .route("/", get(|| async { "welcome" }))
        .merge(api_routes)
        .merge(relay_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Burrow server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(registry): State<Registry>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, registry))
}
