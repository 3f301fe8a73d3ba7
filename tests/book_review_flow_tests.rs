use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use libris::config::Config;
use libris::db::LibraryStorage;
use libris::middleware::session::{session_key, start_session};
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;
use url::Url;

const SECRET: &str = "x";

struct Harness {
    app: Router,
    storage: LibraryStorage,
    cover_dir: PathBuf,
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.cover_dir);
    }
}

async fn harness() -> Harness {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut cover_dir = std::env::temp_dir();
    cover_dir.push(format!("libris-flow-{}-{}", std::process::id(), nanos));

    let cfg = Config {
        database_url: "sqlite::memory:".to_string(),
        cover_dir: cover_dir.clone(),
        // nothing listens on the discard port: covers degrade to the placeholder
        books_api_url: Url::parse("http://127.0.0.1:9/").unwrap(),
        ratings_api_key: None,
        session_secret: SECRET.repeat(64),
        insecure_cookie: true,
        http_timeout_secs: 1,
        ..Config::default()
    };

    let storage = LibraryStorage::connect(&cfg.database_url)
        .await
        .expect("open in-memory db");
    for (isbn, title, author, year) in [
        ("0380795272", "Krondor: The Betrayal", "Raymond E. Feist", 1998),
        ("1416949658", "The Dark Is Rising", "Susan Cooper", 1973),
        ("1857231082", "The Black Unicorn", "Terry Brooks", 1987),
    ] {
        storage
            .insert_book(isbn, title, author, year)
            .await
            .expect("seed book");
    }

    let state = libris::LibrisState::new(storage.clone(), &cfg).expect("build state");
    Harness {
        app: libris::libris_router(state),
        storage,
        cover_dir,
    }
}

fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("request failed")
}

async fn body_string(resp: Response) -> String {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(body.to_vec()).expect("response body was not utf-8")
}

async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).expect("response body was not json")
}

/// `name=value` of the live session cookie set by a response.
fn session_cookie(resp: &Response) -> String {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with("libris_session=") && !v.contains("Max-Age=0"))
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.len() > "libris_session=".len())
        .expect("no session cookie set")
        .to_string()
}

fn location(resp: &Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn register_login_review_updates_aggregate() {
    let h = harness().await;

    let resp = send(
        &h.app,
        form(
            "/register",
            "username=alice&password=pw123&confirmation=pw123",
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let resp = send(&h.app, form("/login", "username=alice&password=pw123", None)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&resp);

    let resp = send(&h.app, get("/", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Hello, alice!"));

    let before = body_json(send(&h.app, get("/api/1857231082", None)).await).await;
    assert_eq!(before["review_count"], 0);
    assert!(before["average_score"].is_null());

    let resp = send(
        &h.app,
        form("/submit_review", "book_id=3&rating=4&review=", Some(&cookie)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/books/3");

    let after = body_json(send(&h.app, get("/api/1857231082", None)).await).await;
    assert_eq!(after["review_count"], 1);
    assert_eq!(after["average_score"], 4.0);
    assert_eq!(after["title"], "The Black Unicorn");
    assert_eq!(after["year"], 1987);

    // second submission for the same book is ignored
    send(
        &h.app,
        form("/submit_review", "book_id=3&rating=1&review=nope", Some(&cookie)),
    )
    .await;
    let again = body_json(send(&h.app, get("/api/1857231082", None)).await).await;
    assert_eq!(again["review_count"], 1);
    assert_eq!(again["average_score"], 4.0);

    let resp = send(&h.app, get("/books/3", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Rating here: 4.00 / 5 from 1 review(s)"));
    assert!(html.contains("You have already reviewed this book."));
    assert!(html.contains("/covers/placeholder"));
    assert!(!html.contains("nope"));
}

#[tokio::test]
async fn unreviewed_book_page_is_neutral() {
    let h = harness().await;
    let resp = send(
        &h.app,
        form("/register", "username=bob&password=pw&confirmation=pw", None),
    )
    .await;
    let cookie = session_cookie(&resp);

    let resp = send(&h.app, get("/books/1", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("No ratings yet"));
    assert!(html.contains("No reviews yet."));

    let resp = send(&h.app, get("/books/999", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string(resp).await.contains("No such book"));

    let resp = send(&h.app, get("/covers/placeholder", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
}

#[tokio::test]
async fn duplicate_registration_is_a_visible_conflict() {
    let h = harness().await;
    let body = "username=alice&password=pw123&confirmation=pw123";
    send(&h.app, form("/register", body, None)).await;

    let resp = send(
        &h.app,
        form("/register", "username=alice&password=x&confirmation=x", None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(body_string(resp).await.contains("already exist"));
    assert_eq!(h.storage.count_users().await.unwrap(), 1);

    // original password still works
    let resp = send(&h.app, form("/login", "username=alice&password=pw123", None)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn validation_and_auth_failures() {
    let h = harness().await;

    let resp = send(&h.app, form("/login", "username=alice", None)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_string(resp).await.contains("must provide password"));

    let resp = send(&h.app, form("/login", "username=ghost&password=pw", None)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
        &h.app,
        form("/register", "username=bob&password=a&confirmation=b", None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&h.app, get("/", None)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let resp = send(&h.app, get("/search?q=dune", Some("libris_session=forged"))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn search_and_json_api_misses() {
    let h = harness().await;
    let resp = send(
        &h.app,
        form("/register", "username=carol&password=pw&confirmation=pw", None),
    )
    .await;
    let cookie = session_cookie(&resp);

    let resp = send(&h.app, get("/search?q=tolkien", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("No books found."));

    let resp = send(&h.app, get("/search?q=cooper", Some(&cookie))).await;
    let html = body_string(resp).await;
    assert!(html.contains(r#"<a href="/books/2">The Dark Is Rising</a>"#));

    let resp = send(&h.app, get("/api/0000000000", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert!(json["error"].is_string());

    let resp = send(&h.app, get("/users", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let own_page = location(&resp).to_string();
    let resp = send(&h.app, get(&own_page, Some(&cookie))).await;
    assert!(body_string(resp).await.contains("carol"));

    let resp = send(&h.app, get("/users/999", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string(resp).await.contains("No such user"));
}

#[tokio::test]
async fn session_without_user_row_is_sent_to_login() {
    let h = harness().await;
    // valid cookie for a user id that has no row
    let jar = start_session(PrivateCookieJar::new(session_key(&SECRET.repeat(64))), 77, false);
    let cookie = session_cookie(&jar.into_response());

    let resp = send(
        &h.app,
        form("/submit_review", "book_id=1&rating=5&review=ghost", Some(&cookie)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let summary = body_json(send(&h.app, get("/api/0380795272", None)).await).await;
    assert_eq!(summary["review_count"], 0);
}

#[tokio::test]
async fn cached_cover_is_served_with_its_real_content_type() {
    let h = harness().await;
    fs::create_dir_all(&h.cover_dir).unwrap();
    fs::write(h.cover_dir.join("2.png"), [0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]).unwrap();

    let resp = send(&h.app, get("/covers/2", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    let resp = send(&h.app, get("/covers/3", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
