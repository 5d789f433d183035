use std::{collections::HashMap, sync::Arc};

use axum::{
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use stockwatch::{
    config::{Settings, StorageKind},
    models::{Session, SessionUser},
    routes,
    services::{
        memory_backend::MemoryBackend,
        presentation_service::{NewsArticle, Quote, StaticNews, StaticQuotes},
        system_clock,
    },
    AppState,
};
use tower::ServiceExt;

fn test_settings() -> Settings {
    Settings {
        mongodb_uri: String::new(),
        mongodb_db: "stockwatch_test".to_string(),
        storage: StorageKind::Memory,
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_cookie_name: "auth".to_string(),
    }
}

fn test_app() -> (Router, AppState) {
    let mut quotes = HashMap::new();
    quotes.insert("AAPL".to_string(), Quote { c: Some(189.5), dp: Some(1.25) });

    let state = AppState::in_memory(test_settings(), MemoryBackend::new(), system_clock())
        .with_quotes(Arc::new(StaticQuotes(quotes)));
    (routes::app(state.clone()), state)
}

fn auth_cookie(state: &AppState, id: &str) -> String {
    let user = SessionUser {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: id.to_string(),
    };
    let token = state.sessions.issue_token(&user, 1).unwrap();
    format!("{}={}", state.sessions.cookie_name(), token)
}

async fn response_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<axum::body::Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(axum::body::Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(axum::body::Body::empty()).unwrap()
}

#[tokio::test]
async fn add_without_session_returns_401() {
    let (app, _state) = test_app();

    let res = app
        .oneshot(post_json("/watchlist", None, serde_json::json!({ "symbol": "AAPL" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = response_json(res).await;
    assert_eq!(body, serde_json::json!({ "success": false, "error": "Not authenticated" }));
}

#[tokio::test]
async fn add_then_check_membership() {
    let (app, state) = test_app();
    let cookie = auth_cookie(&state, "u1");

    let res = app
        .clone()
        .oneshot(post_json(
            "/watchlist",
            Some(&cookie),
            serde_json::json!({ "symbol": " aapl ", "company": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await, serde_json::json!({ "success": true }));

    let res = app.clone().oneshot(get("/watchlist/aapl/member", Some(&cookie))).await.unwrap();
    let body = response_json(res).await;
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["inWatchlist"], true);

    // anonymous reads degrade to false
    let res = app.clone().oneshot(get("/watchlist/AAPL/member", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["inWatchlist"], false);

    let res = app.oneshot(get("/watchlist/items", Some(&cookie))).await.unwrap();
    let body = response_json(res).await;
    assert_eq!(body[0]["symbol"], "AAPL");
    assert_eq!(body[0]["company"], "AAPL");
    assert_eq!(body[0]["userId"], "u1");
}

#[tokio::test]
async fn membership_route_does_not_shadow_items() {
    let (app, state) = test_app();
    let cookie = auth_cookie(&state, "u1");

    app.clone()
        .oneshot(post_json("/watchlist", Some(&cookie), serde_json::json!({ "symbol": "items" })))
        .await
        .unwrap();

    let res = app.clone().oneshot(get("/watchlist/items/member", Some(&cookie))).await.unwrap();
    let body = response_json(res).await;
    assert_eq!(body["symbol"], "ITEMS");
    assert_eq!(body["inWatchlist"], true);

    let res = app.oneshot(get("/watchlist/items", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["symbol"], "ITEMS");
}

#[tokio::test]
async fn add_with_missing_or_malformed_symbol() {
    let (app, state) = test_app();
    let cookie = auth_cookie(&state, "u1");

    let res = app
        .clone()
        .oneshot(post_json("/watchlist", Some(&cookie), serde_json::json!({ "company": "T" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        response_json(res).await,
        serde_json::json!({ "success": false, "error": "Invalid symbol" })
    );

    let res = app
        .clone()
        .oneshot(post_json("/watchlist", Some(&cookie), serde_json::json!({ "symbol": 42 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["error"], "Invalid symbol");

    let bad = Request::builder()
        .method("POST")
        .uri("/watchlist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(bad).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(res).await["error"], "Not authenticated");

    assert_eq!(watchlist_size(&state, "u1").await, 0);
}

async fn watchlist_size(state: &AppState, id: &str) -> usize {
    let session = Session::Authenticated(SessionUser {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: id.to_string(),
    });
    state.watchlist.list_for_owner(&session).await.len()
}

#[tokio::test]
async fn remove_route_is_idempotent() {
    let (app, state) = test_app();
    let cookie = auth_cookie(&state, "u1");

    let res = app
        .clone()
        .oneshot(post_json("/watchlist/MSFT/delete", Some(&cookie), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["success"], true);

    let res = app
        .oneshot(post_json("/watchlist/MSFT/delete", None, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn overview_joins_quotes() {
    let (app, state) = test_app();
    let cookie = auth_cookie(&state, "u1");

    for symbol in ["AAPL", "MSFT"] {
        app.clone()
            .oneshot(post_json("/watchlist", Some(&cookie), serde_json::json!({ "symbol": symbol })))
            .await
            .unwrap();
    }
    app.clone()
        .oneshot(post_json(
            "/alerts",
            Some(&cookie),
            serde_json::json!({
                "symbol": "AAPL",
                "company": "Apple",
                "alertName": "Dip",
                "alertType": "lower",
                "threshold": 150
            }),
        ))
        .await
        .unwrap();

    let res = app.oneshot(get("/watchlist", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let aapl = items.iter().find(|i| i["symbol"] == "AAPL").unwrap();
    assert_eq!(aapl["priceFormatted"], "$189.50");
    assert_eq!(aapl["changeFormatted"], "+1.25%");
    let msft = items.iter().find(|i| i["symbol"] == "MSFT").unwrap();
    assert_eq!(msft["priceFormatted"], "—");

    assert_eq!(body["alerts"][0]["currentPrice"], 189.5);
    assert_eq!(body["alerts"][0]["alertType"], "lower");
    assert_eq!(body["watchlistOptions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn overview_includes_news_for_watchlist_symbols() {
    let news = StaticNews(vec![
        (
            vec!["AAPL".to_string()],
            NewsArticle {
                id: 7,
                headline: "Apple beats estimates".to_string(),
                summary: "Quarterly revenue up".to_string(),
                source: "Wire".to_string(),
                url: "https://news.example.com/apple".to_string(),
                category: "company".to_string(),
                datetime: 1_700_000_000,
            },
        ),
        (
            vec!["TSLA".to_string()],
            NewsArticle {
                id: 8,
                headline: "Tesla recall".to_string(),
                ..Default::default()
            },
        ),
    ]);
    let (_, state) = test_app();
    let state = state.with_news(Arc::new(news));
    let app = routes::app(state.clone());
    let cookie = auth_cookie(&state, "u1");

    app.clone()
        .oneshot(post_json("/watchlist", Some(&cookie), serde_json::json!({ "symbol": "AAPL" })))
        .await
        .unwrap();
    // an alert alone does not pull news for its symbol
    app.clone()
        .oneshot(post_json(
            "/alerts",
            Some(&cookie),
            serde_json::json!({
                "symbol": "TSLA",
                "company": "Tesla",
                "alertName": "Spike",
                "alertType": "upper",
                "threshold": 300
            }),
        ))
        .await
        .unwrap();

    let res = app.oneshot(get("/watchlist", Some(&cookie))).await.unwrap();
    let body = response_json(res).await;

    let news = body["news"].as_array().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0]["id"], 7);
    assert_eq!(news[0]["headline"], "Apple beats estimates");
    assert_eq!(news[0]["url"], "https://news.example.com/apple");
    assert_eq!(news[0]["datetime"], 1_700_000_000);
}

#[tokio::test]
async fn health_and_fallback() {
    let (app, _state) = test_app();

    let res = app.clone().oneshot(get("/health/db", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get("/nope", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
