//! End-to-end tests over the assembled router: signup/login cookie flow,
//! owner-scoped note access, and attachment lifecycle.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use quillbox_api::{AppState, AppStateInner, routes};

const BOUNDARY: &str = "quillbox-test-boundary";

async fn app_with_state(dir: &tempfile::TempDir) -> (Router, AppState) {
    let db = quillbox_db::Database::open(&dir.path().join("test.db")).unwrap();
    let files = quillbox_files::Storage::new(dir.path().join("uploads"))
        .await
        .unwrap();
    let state = Arc::new(AppStateInner {
        db,
        files,
        secret: "integration-test-secret".into(),
        cookie_secure: false,
    });
    (routes::router(state.clone()), state)
}

async fn app(dir: &tempfile::TempDir) -> Router {
    app_with_state(dir).await.0
}

async fn signup(app: &Router, username: &str, email: &str, password: &str) -> StatusCode {
    let req = Request::builder()
        .method("POST")
        .uri("/signup")
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(format!(
            "username={username}&email={email}&password={password}"
        )))
        .unwrap();
    app.clone().oneshot(req).await.unwrap().status()
}

/// Log in and return the `access_token=…` cookie pair on success.
async fn login(app: &Router, email: &str, password: &str) -> Option<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/login")
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(format!("email={email}&password={password}")))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();

    if resp.status() != StatusCode::SEE_OTHER {
        return None;
    }
    let set_cookie = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    set_cookie.split(';').next().map(str::to_string)
}

async fn list_notes(app: &Router, cookie: &str) -> Vec<serde_json::Value> {
    let req = Request::builder()
        .uri("/my-notes")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(title: &str, content: &str, file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("title", title), ("content", content)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn create_note(
    app: &Router,
    cookie: &str,
    title: &str,
    content: &str,
    file: Option<(&str, &[u8])>,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/notes/create")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(multipart_body(title, content, file)))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn delete_note(app: &Router, cookie: &str, note_id: i64) -> StatusCode {
    let req = Request::builder()
        .method("POST")
        .uri(format!("/notes/delete/{note_id}"))
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn signup_login_and_note_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    assert_eq!(
        signup(&app, "alice", "alice@x.com", "pw123").await,
        StatusCode::SEE_OTHER
    );
    // Same email, different username: rejected.
    assert_eq!(
        signup(&app, "bob", "alice@x.com", "pw456").await,
        StatusCode::CONFLICT
    );
    // Same username, different email: rejected.
    assert_eq!(
        signup(&app, "alice", "alice2@x.com", "pw456").await,
        StatusCode::CONFLICT
    );

    let cookie = login(&app, "alice@x.com", "pw123").await.unwrap();
    assert!(cookie.starts_with("access_token="));

    assert!(list_notes(&app, &cookie).await.is_empty());

    let (status, note) = create_note(&app, &cookie, "t", "c", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["title"], "t");
    assert_eq!(note["content"], "c");
    assert!(note["attachment"].is_null());

    let notes = list_notes(&app, &cookie).await;
    assert_eq!(notes.len(), 1);

    // A second user sees none of alice's notes.
    assert_eq!(
        signup(&app, "bob", "bob@x.com", "pw456").await,
        StatusCode::SEE_OTHER
    );
    let bob_cookie = login(&app, "bob@x.com", "pw456").await.unwrap();
    assert!(list_notes(&app, &bob_cookie).await.is_empty());

    // Bob cannot delete alice's note, and never learns it exists.
    let note_id = notes[0]["id"].as_i64().unwrap();
    assert_eq!(
        delete_note(&app, &bob_cookie, note_id).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(list_notes(&app, &cookie).await.len(), 1);

    assert_eq!(
        delete_note(&app, &cookie, note_id).await,
        StatusCode::NO_CONTENT
    );
    assert!(list_notes(&app, &cookie).await.is_empty());
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;
    signup(&app, "alice", "alice@x.com", "pw123").await;

    for (email, password) in [("alice@x.com", "wrong"), ("nobody@x.com", "pw123")] {
        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from(format!("email={email}&password={password}")))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn protected_routes_redirect_without_valid_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    // No cookie.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/my-notes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login-page");

    // Forged cookie.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/my-notes")
                .header(header::COOKIE, "access_token=forged.token.value")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login-page");
}

#[tokio::test]
async fn deleted_user_session_is_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with_state(&dir).await;

    signup(&app, "alice", "alice@x.com", "pw123").await;
    let cookie = login(&app, "alice@x.com", "pw123").await.unwrap();
    assert!(list_notes(&app, &cookie).await.is_empty());

    let alice = state.db.get_user_by_email("alice@x.com").unwrap().unwrap();
    state.db.delete_user(alice.id).unwrap();

    // The cookie is still within its TTL, but the subject no longer
    // resolves: the session must be treated as unauthenticated.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/my-notes")
                .header(header::COOKIE, cookie.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login-page");
}

#[tokio::test]
async fn attachment_follows_note_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    signup(&app, "alice", "alice@x.com", "pw123").await;
    let cookie = login(&app, "alice@x.com", "pw123").await.unwrap();

    let (status, note) =
        create_note(&app, &cookie, "report", "see attachment", Some(("report.txt", b"data"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let reference = note["attachment"].as_str().unwrap().to_string();
    let on_disk = dir.path().join("uploads").join(&reference);
    assert_eq!(std::fs::read(&on_disk).unwrap(), b"data");

    let note_id = note["id"].as_i64().unwrap();
    assert_eq!(
        delete_note(&app, &cookie, note_id).await,
        StatusCode::NO_CONTENT
    );
    assert!(!on_disk.exists());
}

#[tokio::test]
async fn search_is_scoped_to_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    signup(&app, "alice", "alice@x.com", "pw123").await;
    signup(&app, "bob", "bob@x.com", "pw456").await;
    let alice = login(&app, "alice@x.com", "pw123").await.unwrap();
    let bob = login(&app, "bob@x.com", "pw456").await.unwrap();

    create_note(&app, &alice, "Groceries", "buy milk", None).await;
    create_note(&app, &bob, "groceries", "buy eggs", None).await;

    let search = |cookie: String, q: &str| {
        let app = app.clone();
        let uri = format!("/notes/search?q={q}");
        async move {
            let resp = app
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .header(header::COOKIE, cookie)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let bytes = resp.into_body().collect().await.unwrap().to_bytes();
            serde_json::from_slice::<Vec<serde_json::Value>>(&bytes).unwrap()
        }
    };

    let hits = search(alice.clone(), "GROCERIES").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["content"], "buy milk");

    // Blank query stays scoped to the caller instead of listing everything.
    let hits = search(bob.clone(), "").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["content"], "buy eggs");
}

#[tokio::test]
async fn validation_rejects_empty_fields() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    signup(&app, "alice", "alice@x.com", "pw123").await;
    let cookie = login(&app, "alice@x.com", "pw123").await.unwrap();

    let (status, _) = create_note(&app, &cookie, "", "content", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = create_note(&app, &cookie, "title", "   ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/login-page");

    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("access_token="));
    assert!(set_cookie.contains("Max-Age=0"));
}
