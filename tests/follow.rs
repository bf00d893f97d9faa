mod common;

use axum::http::StatusCode;
use common::{location, page, post_texts, TestApp};
use social_blog::entities::{EntFollow, Entity};

#[tokio::test]
async fn test_follow_and_unfollow() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let anna = app.user("anna").await;
    app.post(&john, "Тестовый текст", None).await;
    let cookie = app.login(&anna).await;

    let response = app.get("/john/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/john/");
    app.post_form("/john/follow/", "", Some(&cookie)).await;
    assert_eq!(EntFollow::count(&app.state.db).await.unwrap(), 1);

    let (_, context) = page(app.get("/follow/", Some(&cookie)).await).await;
    assert_eq!(post_texts(&context["page"]), ["Тестовый текст"]);

    let (_, context) = page(app.get("/john/", Some(&cookie)).await).await;
    assert_eq!(context["following"], true);
    assert_eq!(context["author"]["followers_count"], 1);

    let response = app.get("/john/unfollow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/john/");
    assert_eq!(EntFollow::count(&app.state.db).await.unwrap(), 0);

    let (_, context) = page(app.get("/follow/", Some(&cookie)).await).await;
    assert!(post_texts(&context["page"]).is_empty());
    assert_eq!(context["page"]["number"], 1);
}

#[tokio::test]
async fn test_feed_only_shows_followed_authors() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let anna = app.user("anna").await;
    let boris = app.user("boris").await;
    app.post(&john, "from john", None).await;
    app.post(&boris, "from boris", None).await;

    let anna_cookie = app.login(&anna).await;
    app.get("/john/follow/", Some(&anna_cookie)).await;

    let (_, context) = page(app.get("/follow/", Some(&anna_cookie)).await).await;
    assert_eq!(post_texts(&context["page"]), ["from john"]);

    let boris_cookie = app.login(&boris).await;
    let (_, context) = page(app.get("/follow/", Some(&boris_cookie)).await).await;
    assert!(post_texts(&context["page"]).is_empty());
}

#[tokio::test]
async fn test_self_follow_is_ignored() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let cookie = app.login(&john).await;

    let response = app.get("/john/follow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/john/");
    assert_eq!(EntFollow::count(&app.state.db).await.unwrap(), 0);

    let (_, context) = page(app.get("/john/", Some(&cookie)).await).await;
    assert_eq!(context["following"], false);
}

#[tokio::test]
async fn test_follow_unknown_author_is_404() {
    let app = TestApp::new().await;
    let anna = app.user("anna").await;
    let cookie = app.login(&anna).await;

    let response = app.get("/nobody/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
