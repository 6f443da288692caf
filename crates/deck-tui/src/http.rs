//! Remote control listener.
//!
//! `GET /` serves a small control page; `GET /command?command=..` turns the
//! request into the same `Command` tokens the keyboard produces and drops
//! them into the shared inbox for the UI loop. Handlers never draw. Every
//! request answers 200, known command or not.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use deck_proto::protocol::Command;
use deck_proto::row::Reference;
use deck_proto::state::SharedState;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

const CONTROL_PAGE: &str = include_str!("../assets/remote.html");

pub fn router(shared: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/command", get(command))
        .layer(CorsLayer::permissive())
        .with_state(shared)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    shared: SharedState,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(shared);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind remote control to {}: {}", addr, e);
                return;
            }
        };

        info!("Remote control listening on http://{}", addr);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            error!("Remote control server error: {}", e);
        }
        info!("Remote control stopped");
    })
}

async fn index() -> Html<&'static str> {
    Html(CONTROL_PAGE)
}

async fn command(
    State(shared): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> &'static str {
    let name = params.get("command").map(String::as_str).unwrap_or("");
    let arg = params
        .get("name")
        .or_else(|| params.get("url"))
        .map(String::as_str);

    match Command::from_remote(name, arg) {
        // a bare URL goes straight to the queue; the cursor is not involved
        Some(Command::SubmitUrl { url }) => {
            info!("Remote: enqueue {}", url);
            shared.enqueue(Reference::new(url));
        }
        Some(cmd) => {
            debug!("Remote: {:?}", cmd);
            shared.inject(cmd);
        }
        None => debug!("Remote: ignoring command {:?}", name),
    }
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use deck_proto::protocol::SourceId;
    use tower::ServiceExt;

    async fn get(shared: &SharedState, uri: &str) -> (StatusCode, String) {
        let response = router(shared.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_serves_control_page() {
        let shared = SharedState::new();
        let (status, body) = get(&shared, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/command?command="));
    }

    #[tokio::test]
    async fn test_navigation_goes_through_inbox() {
        let shared = SharedState::new();
        shared.take_redraw();

        let (status, body) = get(&shared, "/command?command=down").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
        get(&shared, "/command?command=source&name=files").await;
        get(&shared, "/command?command=enter").await;

        assert!(shared.take_redraw());
        assert_eq!(
            shared.drain_inbox(),
            vec![
                Command::Move { delta: 1 },
                Command::SwitchSource {
                    source: SourceId::Files
                },
                Command::Submit,
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_url_enqueues_without_touching_cursor() {
        let shared = SharedState::new();
        let (status, _) = get(
            &shared,
            "/command?command=url&url=https%3A%2F%2Fyoutu.be%2Fabc",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(shared.drain_inbox().is_empty());
        let state = shared.lock();
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.queue[0].reference.as_str(), "https://youtu.be/abc");
        assert_eq!(state.active_source().viewport.cursor, 0);
    }

    #[tokio::test]
    async fn test_unknown_commands_still_answer_ok() {
        let shared = SharedState::new();
        let (status, body) = get(&shared, "/command?command=selfdestruct").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
        let (status, _) = get(&shared, "/command").await;
        assert_eq!(status, StatusCode::OK);
        assert!(shared.drain_inbox().is_empty());
        assert_eq!(shared.queue_depth(), 0);
    }
}
