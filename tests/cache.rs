mod common;

use common::{page, post_texts, TestApp};
use social_blog::entities::{EntPost, Entity};

#[tokio::test]
async fn test_index_is_cached_until_cleared() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let post = app.post(&john, "Тестовый текст", None).await;

    let (_, context) = page(app.get("/", None).await).await;
    assert_eq!(post_texts(&context["page"]), ["Тестовый текст"]);

    EntPost::delete(&app.state.db, post.id).await.unwrap();
    let (_, context) = page(app.get("/", None).await).await;
    assert_eq!(post_texts(&context["page"]), ["Тестовый текст"]);

    app.state.invalidate_pages().await;
    let (_, context) = page(app.get("/", None).await).await;
    assert!(post_texts(&context["page"]).is_empty());
}

#[tokio::test]
async fn test_new_post_clears_cache() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let cookie = app.login(&john).await;

    let (_, context) = page(app.get("/", None).await).await;
    assert!(post_texts(&context["page"]).is_empty());

    app.post_form("/new/", "text=fresh", Some(&cookie)).await;
    let (_, context) = page(app.get("/", None).await).await;
    assert_eq!(post_texts(&context["page"]), ["fresh"]);
}

#[tokio::test]
async fn test_other_pages_are_not_cached() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let post = app.post(&john, "Тестовый текст", None).await;

    page(app.get("/john/", None).await).await;
    EntPost::delete(&app.state.db, post.id).await.unwrap();
    let (_, context) = page(app.get("/john/", None).await).await;
    assert!(post_texts(&context["page"]).is_empty());
}
