use std::sync::{
	Arc, Mutex,
	atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
};

use axum::{
	Json, Router,
	extract::{RawQuery, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::json;
use tokio::{net::TcpListener, sync::oneshot};

use whut_providers::{Error, SearchResult, media::MediaClient, redgifs::RedgifsClient, rule34::Rule34Client};

#[derive(Default)]
struct MockState {
	logins: AtomicUsize,
	searches: AtomicUsize,
	token_exp: AtomicI64,
	reject_next_search: AtomicBool,
	rule34_empty: AtomicBool,
	last_query: Mutex<Option<String>>,
	last_bearer: Mutex<Option<String>>,
}

fn token_expiring_at(exp: i64) -> String {
	let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "sub": "anon" }).to_string());

	format!("eyJhbGciOiJIUzI1NiJ9.{payload}.c2ln")
}

async fn start_mock(state: Arc<MockState>) -> (String, oneshot::Sender<()>) {
	let app = Router::new()
		.route("/v2/auth/temporary", routing::get(login_handler))
		.route("/v2/gifs/search", routing::get(gif_search_handler))
		.route("/index.php", routing::get(post_search_handler))
		.route("/files/{name}", routing::get(file_handler))
		.with_state(state);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind mock server.");
	let addr = listener.local_addr().expect("Failed to read mock server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

async fn login_handler(State(state): State<Arc<MockState>>) -> impl IntoResponse {
	state.logins.fetch_add(1, Ordering::SeqCst);

	Json(json!({ "token": token_expiring_at(state.token_exp.load(Ordering::SeqCst)) }))
}

async fn gif_search_handler(
	State(state): State<Arc<MockState>>,
	headers: HeaderMap,
	RawQuery(query): RawQuery,
) -> Response {
	state.searches.fetch_add(1, Ordering::SeqCst);

	*state.last_query.lock().expect("query lock") = query;
	*state.last_bearer.lock().expect("bearer lock") = headers
		.get("authorization")
		.and_then(|value| value.to_str().ok())
		.map(str::to_string);

	if state.reject_next_search.swap(false, Ordering::SeqCst) {
		return StatusCode::UNAUTHORIZED.into_response();
	}

	Json(json!({
		"page": 1,
		"gifs": [
			{ "id": "one", "urls": { "sd": "https://media.example/one-sd.mp4", "hd": "https://media.example/one.mp4" } },
			{ "id": "two", "urls": { "hd": "https://media.example/two.mp4" } },
			{ "id": "three", "urls": {} },
		],
	}))
	.into_response()
}

async fn post_search_handler(
	State(state): State<Arc<MockState>>,
	RawQuery(query): RawQuery,
) -> Response {
	*state.last_query.lock().expect("query lock") = query;

	if state.rule34_empty.load(Ordering::SeqCst) {
		return String::new().into_response();
	}

	Json(json!([
		{ "id": 10, "file_url": "https://img.example/images/10/cat.png", "image": "cat.png" },
		{ "id": 11, "image": "missing.png" },
	]))
	.into_response()
}

async fn file_handler(axum::extract::Path(name): axum::extract::Path<String>) -> Response {
	if name == "gone.png" {
		return StatusCode::NOT_FOUND.into_response();
	}

	format!("bytes of {name}").into_response()
}

fn redgifs_cfg(api_base: &str) -> whut_config::Redgifs {
	whut_config::Redgifs { api_base: api_base.to_string(), search_count: 5, timeout_ms: 5_000 }
}

fn rule34_cfg(api_base: &str) -> whut_config::Rule34 {
	whut_config::Rule34 {
		api_base: api_base.to_string(),
		path: "/index.php".to_string(),
		user_id: "42".to_string(),
		api_key: "secret".to_string(),
		timeout_ms: 5_000,
	}
}

fn terms(raw: &[&str]) -> Vec<String> {
	raw.iter().map(|term| term.to_string()).collect()
}

fn far_future() -> i64 {
	whut_providers::token::now_unix() + 3_600
}

#[tokio::test]
async fn gif_search_logs_in_once_and_reuses_bearer() {
	let state = Arc::new(MockState::default());

	state.token_exp.store(far_future(), Ordering::SeqCst);

	let (base, shutdown) = start_mock(state.clone()).await;
	let client = RedgifsClient::new(&redgifs_cfg(&base)).expect("client");
	let first = client.search(&terms(&["cats", "red"])).await.expect("first search");
	let second = client.search(&terms(&["dogs"])).await.expect("second search");

	assert_eq!(state.logins.load(Ordering::SeqCst), 1);
	assert_eq!(state.searches.load(Ordering::SeqCst), 2);
	assert_eq!(
		first,
		vec![
			SearchResult {
				name: "redgif_one-sd.mp4".to_string(),
				url: "https://media.example/one-sd.mp4".to_string(),
			},
			SearchResult {
				name: "redgif_two.mp4".to_string(),
				url: "https://media.example/two.mp4".to_string(),
			},
		]
	);
	assert_eq!(first, second);

	let query = state.last_query.lock().expect("query lock").clone().expect("query recorded");

	assert!(query.contains("search_text=dogs"), "{query}");
	assert!(query.contains("count=5"), "{query}");

	let bearer = state.last_bearer.lock().expect("bearer lock").clone().expect("bearer recorded");

	assert!(bearer.starts_with("Bearer eyJ"), "{bearer}");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn gif_search_refuses_token_without_usable_expiry() {
	let state = Arc::new(MockState::default());

	state.token_exp.store(0, Ordering::SeqCst);

	let (base, shutdown) = start_mock(state.clone()).await;
	let client = RedgifsClient::new(&redgifs_cfg(&base)).expect("client");
	let err = client.search(&terms(&["cats"])).await.expect_err("Expected expired token.");

	assert!(matches!(err, Error::TokenExpired { expires_at: 0 }));
	assert_eq!(state.logins.load(Ordering::SeqCst), 1);
	assert_eq!(state.searches.load(Ordering::SeqCst), 0);
	assert!(client.token().is_expired(0).await);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn rejected_bearer_triggers_fresh_login() {
	let state = Arc::new(MockState::default());

	state.token_exp.store(far_future(), Ordering::SeqCst);
	state.reject_next_search.store(true, Ordering::SeqCst);

	let (base, shutdown) = start_mock(state.clone()).await;
	let client = RedgifsClient::new(&redgifs_cfg(&base)).expect("client");
	let err = client.search(&terms(&["cats"])).await.expect_err("Expected rejected search.");

	assert!(matches!(err, Error::Unavailable { .. }));

	client.search(&terms(&["cats"])).await.expect("retry search");

	assert_eq!(state.logins.load(Ordering::SeqCst), 2);
	assert_eq!(state.searches.load(Ordering::SeqCst), 2);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn gif_search_without_terms_skips_network() {
	let state = Arc::new(MockState::default());
	let (base, shutdown) = start_mock(state.clone()).await;
	let client = RedgifsClient::new(&redgifs_cfg(&base)).expect("client");

	assert!(client.search(&[]).await.expect("empty search").is_empty());
	assert_eq!(state.logins.load(Ordering::SeqCst), 0);
	assert_eq!(state.searches.load(Ordering::SeqCst), 0);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn failed_login_surfaces_status() {
	// The prefixed base has no routes, so login answers 404.
	let state = Arc::new(MockState::default());
	let (base, shutdown) = start_mock(state.clone()).await;
	let client = RedgifsClient::new(&redgifs_cfg(&format!("{base}/missing"))).expect("client");
	let err = client.search(&terms(&["cats"])).await.expect_err("Expected login failure.");

	assert!(matches!(err, Error::LoginFailed { status: 404 }));
	assert_eq!(state.searches.load(Ordering::SeqCst), 0);

	let _ = shutdown.send(());
}

#[tokio::test]
async fn tag_search_joins_terms_and_passes_credentials() {
	let state = Arc::new(MockState::default());
	let (base, shutdown) = start_mock(state.clone()).await;
	let client = Rule34Client::new(&rule34_cfg(&base)).expect("client");
	let results = client.search(&terms(&["cats", "red", "small"])).await.expect("search");

	assert_eq!(
		results,
		vec![SearchResult {
			name: "cat.png".to_string(),
			url: "https://img.example/images/10/cat.png".to_string(),
		}]
	);

	let query = state.last_query.lock().expect("query lock").clone().expect("query recorded");

	assert!(query.contains("page=dapi"), "{query}");
	assert!(query.contains("json=1"), "{query}");
	assert!(query.contains("tags=cats+red+small"), "{query}");
	assert!(query.contains("user_id=42"), "{query}");
	assert!(query.contains("api_key=secret"), "{query}");

	let _ = shutdown.send(());
}

#[tokio::test]
async fn tag_search_treats_empty_body_as_no_results() {
	let state = Arc::new(MockState::default());

	state.rule34_empty.store(true, Ordering::SeqCst);

	let (base, shutdown) = start_mock(state.clone()).await;
	let client = Rule34Client::new(&rule34_cfg(&base)).expect("client");

	assert!(client.search(&terms(&["nothing"])).await.expect("search").is_empty());

	let _ = shutdown.send(());
}

#[tokio::test]
async fn media_fetch_reads_body_and_reports_status() {
	let state = Arc::new(MockState::default());
	let (base, shutdown) = start_mock(state).await;
	let client = MediaClient::new(5_000).expect("client");
	let bytes = client.fetch(&format!("{base}/files/cat.png")).await.expect("fetch");

	assert_eq!(bytes, b"bytes of cat.png".to_vec());

	let err = client.fetch(&format!("{base}/files/gone.png")).await.expect_err("Expected 404.");

	assert!(matches!(err, Error::Unavailable { .. }));

	let _ = shutdown.send(());
}
