use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use carbon_campaigns::{app, AppState, MemoryStore};
use tower::ServiceExt;

pub fn test_app() -> Router {
    app(AppState::new(MemoryStore::new()), 64 * 1024)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let resp = app.clone().oneshot(req).await.expect("infallible");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    TestResponse {
        status,
        body: String::from_utf8(bytes.to_vec()).expect("utf8"),
    }
}

/// POST with an `application/x-www-form-urlencoded` body, e.g. `"username=alice"`.
pub async fn post_form(app: &Router, uri: &str, form: &str) -> TestResponse {
    let req = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request");
    send(app, req).await
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let req = Request::get(uri).body(Body::empty()).expect("request");
    send(app, req).await
}

/// Signs up `username` and creates campaign `name` for them. Returns the campaign id.
pub async fn user_with_campaign(app: &Router, username: &str, name: &str) -> i64 {
    assert_eq!(post_form(app, "/api/user/signup", &format!("username={}", username)).await.status, StatusCode::CREATED);
    let resp = post_form(app, "/api/campaign/create", &format!("username={}&name={}", username, name)).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let user = get(app, &format!("/api/user/{}", username)).await.json();
    user["campaigns"]
        .as_array()
        .and_then(|cs| cs.iter().find(|c| c["name"] == name))
        .and_then(|c| c["id"].as_i64())
        .expect("campaign listed on user")
}
