// Profile views - author pages, follow/unfollow, follow feed

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    app_state::AppState,
    entities::{EntFollow, EntPost, EntUser, FollowOutcome, PostFilter, PostView},
    error::AppResult,
    infrastructure::middleware::{LoggedIn, Vc},
    paginator::{Page, PageQuery},
    render::{profile_url, redirect, TemplateResponse},
};

use super::ProfileAuthor;

#[derive(Serialize)]
pub struct ProfileContext {
    pub author: ProfileAuthor,
    pub page: Page<PostView>,
    pub following: bool,
}

#[derive(Serialize)]
pub struct FollowContext {
    pub page: Page<PostView>,
}

pub async fn profile(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<TemplateResponse<ProfileContext>> {
    let author = EntUser::gen_enforce_by_username(&state.db, &username).await?;
    let page = EntPost::paginate(&state.db, PostFilter::Author(author.id), query.page.as_deref()).await?;
    let following = match vc.user_id() {
        Some(viewer_id) => EntFollow::exists(&state.db, viewer_id, author.id).await?,
        None => false,
    };

    Ok(TemplateResponse::new(
        "profile.html",
        ProfileContext {
            author: ProfileAuthor::load(&state, &author).await?,
            page,
            following,
        },
    ))
}

pub async fn profile_follow(
    State(state): State<AppState>,
    viewer: LoggedIn,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = EntUser::gen_enforce_by_username(&state.db, &username).await?;
    match EntFollow::create(&state.db, viewer.id, author.id).await? {
        FollowOutcome::Created => {}
        outcome => debug!(user = %viewer.username, author = %author.username, ?outcome, "Follow skipped"),
    }
    Ok(redirect(profile_url(&author.username)))
}

pub async fn profile_unfollow(
    State(state): State<AppState>,
    viewer: LoggedIn,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = EntUser::gen_enforce_by_username(&state.db, &username).await?;
    EntFollow::remove(&state.db, viewer.id, author.id).await?;
    Ok(redirect(profile_url(&author.username)))
}

pub async fn follow_index(
    State(state): State<AppState>,
    viewer: LoggedIn,
    Query(query): Query<PageQuery>,
) -> AppResult<TemplateResponse<FollowContext>> {
    let page = EntPost::paginate(&state.db, PostFilter::FollowedBy(viewer.id), query.page.as_deref()).await?;
    Ok(TemplateResponse::new("follow.html", FollowContext { page }))
}
