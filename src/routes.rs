// Route table - URL patterns to handlers, plus the request-wide layers

use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    app_state::AppState,
    infrastructure::middleware::{page_cache, viewer_context_middleware},
    render::error_pages,
    views::{about, auth, errors, posts, profile},
};

pub fn create_app_router(state: AppState) -> Router {
    let index = get(posts::index).route_layer(from_fn_with_state(state.clone(), page_cache));
    let upload_limit = DefaultBodyLimit::max(state.config.media.max_upload_bytes);
    let media = ServeDir::new(state.media.root()).not_found_service(errors::missing_file.into_service());

    let routes = Router::new()
        .route("/", index)
        .route("/group/{slug}/", get(posts::group_posts))
        .route(
            "/new/",
            get(posts::new_post_page)
                .post(posts::create_post)
                .layer(upload_limit),
        )
        .route("/follow/", get(profile::follow_index))
        .route("/about/author/", get(about::author))
        .route("/about/tech/", get(about::tech))
        .route("/auth/signup/", get(auth::signup_page).post(auth::signup))
        .route("/auth/login/", get(auth::login_page).post(auth::login))
        .route("/auth/logout/", get(auth::logout).post(auth::logout))
        .nest_service("/media", media)
        .route("/{username}/", get(profile::profile))
        .route(
            "/{username}/follow/",
            get(profile::profile_follow).post(profile::profile_follow),
        )
        .route(
            "/{username}/unfollow/",
            get(profile::profile_unfollow).post(profile::profile_unfollow),
        )
        .route("/{username}/{post_id}/", get(posts::post_view))
        .route(
            "/{username}/{post_id}/edit/",
            get(posts::post_edit_page)
                .post(posts::post_edit)
                .layer(upload_limit),
        )
        .route(
            "/{username}/{post_id}/comment/",
            get(posts::comment_page).post(posts::add_comment),
        );

    with_app_layers(routes, state)
}

/// Fallback plus the layers every route runs under.
pub fn with_app_layers(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .fallback(errors::not_found)
        .layer(from_fn(error_pages))
        .layer(from_fn_with_state(state.clone(), viewer_context_middleware))
        .layer(CatchPanicLayer::custom(errors::panic_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
