use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{StatusCode, header};

use campease_auth::{Hs256Encoder, Role, RoutePolicy, TokenClaims};
use campease_shell::{ShellState, build_app};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(ShellState::new(SECRET, RoutePolicy::campease()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url, path))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, role: Role, exp: DateTime<Utc>) -> String {
    let claims = TokenClaims {
        sub: "42".to_string(),
        role,
        exp: exp.timestamp(),
        name: "Jamie Fox".to_string(),
        email: "jamie@example.com".to_string(),
        phone: None,
        iat: Some(Utc::now().timestamp()),
    };
    Hs256Encoder::new(secret).encode(&claims).expect("failed to encode jwt")
}

fn fresh(role: Role) -> String {
    mint_jwt(SECRET, role, Utc::now() + ChronoDuration::minutes(10))
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_is_not_guarded() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/healthz").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_protected_page_redirects_to_login() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/camps").send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/Login");
}

#[tokio::test]
async fn anonymous_public_page_renders() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/Register").send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["path"], "/Register");
    assert!(body["role"].is_null());
}

#[tokio::test]
async fn root_sends_role_to_landing_path() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/").bearer_auth(fresh(Role::Admin)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/dashboard");
}

#[tokio::test]
async fn parameterized_page_renders_with_captured_id() {
    let srv = TestServer::spawn().await;

    let res = srv
        .get("/parent/orders/77")
        .bearer_auth(fresh(Role::Parent))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Parent");
    assert_eq!(body["pattern"], "/parent/orders/:orderId");
    assert_eq!(body["params"]["orderId"], "77");
}

#[tokio::test]
async fn non_numeric_id_is_forbidden() {
    let srv = TestServer::spawn().await;

    let res = srv
        .get("/parent/orders/abc")
        .bearer_auth(fresh(Role::Parent))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/403");
}

#[tokio::test]
async fn other_roles_pages_are_forbidden_and_session_kept() {
    let srv = TestServer::spawn().await;

    let res = srv
        .get("/admin/dashboard")
        .header(header::COOKIE, format!("campease_token={}", fresh(Role::Camper)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/403");
    assert!(res.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn forbidden_page_itself_renders_for_signed_in_user() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/403").bearer_auth(fresh(Role::Staff)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_cookie_is_cleared_with_notice() {
    let srv = TestServer::spawn().await;
    let stale = mint_jwt(SECRET, Role::Parent, Utc::now() - ChronoDuration::minutes(1));

    let res = srv
        .get("/parent/orders/77")
        .header(header::COOKIE, format!("campease_token={stale}"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/Login");
    assert_eq!(res.headers().get("x-campease-notice").unwrap(), "session-expired");
    let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("campease_token=;"));
}

#[tokio::test]
async fn token_signed_with_other_secret_is_discarded() {
    let srv = TestServer::spawn().await;
    let forged = mint_jwt("not-the-secret", Role::Admin, Utc::now() + ChronoDuration::minutes(10));

    let res = srv.get("/admin/dashboard").bearer_auth(forged).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/Login");
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert!(res.headers().get("x-campease-notice").is_none());
}

#[tokio::test]
async fn discarded_token_on_public_page_still_renders() {
    let srv = TestServer::spawn().await;

    let res = srv
        .get("/Login")
        .header(header::COOKIE, "campease_token=garbage")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn unreadable_header_falls_back_to_valid_cookie() {
    let srv = TestServer::spawn().await;

    let res = srv
        .get("/parent/dashboard")
        .header(header::COOKIE, format!("campease_token={}", fresh(Role::Parent)))
        .bearer_auth("junk")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Parent");
}

#[tokio::test]
async fn expired_header_token_leaves_cookie_alone() {
    let srv = TestServer::spawn().await;
    let stale = mint_jwt(SECRET, Role::Staff, Utc::now() - ChronoDuration::minutes(5));

    let res = srv.get("/staff/orders").bearer_auth(stale).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/Login");
    assert_eq!(res.headers().get("x-campease-notice").unwrap(), "session-expired");
    assert!(res.headers().get(header::SET_COOKIE).is_none());
}
