// Post views - listings, detail, create, edit, comments

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    entities::{
        CommentView, EntComment, EntGroup, EntPost, EntUser, Entity, NewPost, PostChanges, PostFilter,
        PostView,
    },
    error::{AppError, AppResult},
    forms::{BoundForm, CleanedPost, CommentForm, PostForm},
    infrastructure::middleware::LoggedIn,
    paginator::{Page, PageQuery},
    render::{post_url, redirect, TemplateResponse},
};

use super::ProfileAuthor;

#[derive(Serialize)]
pub struct IndexContext {
    pub page: Page<PostView>,
}

#[derive(Serialize)]
pub struct GroupContext {
    pub group: EntGroup,
    pub page: Page<PostView>,
}

#[derive(Serialize)]
pub struct PostFormContext {
    pub form: BoundForm<PostForm>,
    pub groups: Vec<EntGroup>,
    pub is_edit: bool,
    pub post: Option<PostView>,
}

#[derive(Serialize)]
pub struct PostContext {
    pub post: PostView,
    pub author: ProfileAuthor,
    pub comments: Vec<CommentView>,
    pub form: BoundForm<CommentForm>,
}

#[derive(Serialize)]
pub struct CommentsContext {
    pub form: BoundForm<CommentForm>,
    pub post_id: i64,
    pub username: String,
}

/// Resolves `/<username>/<post_id>/`; the post must belong to that user.
pub(crate) async fn load_post(state: &AppState, username: &str, post_id: &str) -> AppResult<(EntUser, EntPost)> {
    let author = EntUser::gen_enforce_by_username(&state.db, username).await?;
    let post_id: i64 = post_id
        .parse()
        .map_err(|_| AppError::NotFound(format!("Invalid post id {}", post_id)))?;
    let post = EntPost::gen_enforce(&state.db, post_id).await?;
    if post.author_id != author.id {
        return Err(AppError::NotFound(format!(
            "Post {} does not belong to {}",
            post_id, username
        )));
    }
    Ok((author, post))
}

async fn gen_post_view(state: &AppState, post_id: i64) -> AppResult<PostView> {
    EntPost::gen_view(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
}

async fn render_post_form(
    state: &AppState,
    form: BoundForm<PostForm>,
    editing: Option<i64>,
) -> AppResult<Response> {
    let groups = EntGroup::gen_all(&state.db).await?;
    let post = match editing {
        Some(post_id) => Some(gen_post_view(state, post_id).await?),
        None => None,
    };
    Ok(TemplateResponse::new(
        "new_post.html",
        PostFormContext {
            form,
            groups,
            is_edit: post.is_some(),
            post,
        },
    )
    .into_response())
}

async fn store_image(state: &AppState, cleaned: &CleanedPost) -> AppResult<Option<String>> {
    match &cleaned.image {
        Some((upload, kind)) => Ok(Some(state.media.save_post_image(upload, *kind).await?)),
        None => Ok(None),
    }
}

/// Undoes `store_image` when the row that would reference the file was not written.
async fn discard_image(state: &AppState, path: Option<&str>) {
    if let Some(path) = path {
        state.media.remove(path).await;
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<TemplateResponse<IndexContext>> {
    let page = EntPost::paginate(&state.db, PostFilter::All, query.page.as_deref()).await?;
    Ok(TemplateResponse::new("index.html", IndexContext { page }))
}

pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<TemplateResponse<GroupContext>> {
    let group = EntGroup::gen_enforce_by_slug(&state.db, &slug).await?;
    let page = EntPost::paginate(&state.db, PostFilter::Group(group.id), query.page.as_deref()).await?;
    Ok(TemplateResponse::new("group.html", GroupContext { group, page }))
}

pub async fn new_post_page(State(state): State<AppState>, _viewer: LoggedIn) -> AppResult<Response> {
    render_post_form(&state, BoundForm::unbound(PostForm::default()), None).await
}

pub async fn create_post(
    State(state): State<AppState>,
    viewer: LoggedIn,
    form: PostForm,
) -> AppResult<Response> {
    let cleaned = match form.clean(&state.db).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            info!(user = %viewer.username, "Rejected new post: {:?}", errors);
            return render_post_form(&state, BoundForm::with_errors(form, errors), None).await;
        }
    };

    let image = store_image(&state, &cleaned).await?;
    let created = EntPost::create(
        &state.db,
        NewPost {
            author_id: viewer.id,
            text: cleaned.text,
            group_id: cleaned.group_id,
            image: image.clone(),
        },
    )
    .await;
    if let Err(e) = created {
        discard_image(&state, image.as_deref()).await;
        return Err(e);
    }
    state.invalidate_pages().await;
    Ok(redirect("/"))
}

pub async fn post_view(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<TemplateResponse<PostContext>> {
    let (author, post) = load_post(&state, &username, &post_id).await?;
    let view = gen_post_view(&state, post.id).await?;
    let comments = EntComment::list_for_post(&state.db, post.id).await?;
    let author = ProfileAuthor::load(&state, &author).await?;

    Ok(TemplateResponse::new(
        "post.html",
        PostContext {
            post: view,
            author,
            comments,
            form: BoundForm::unbound(CommentForm::default()),
        },
    ))
}

pub async fn post_edit_page(
    State(state): State<AppState>,
    viewer: LoggedIn,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let (author, post) = load_post(&state, &username, &post_id).await?;
    if viewer.id != post.author_id {
        return Ok(redirect(post_url(&author.username, post.id)));
    }
    render_post_form(&state, BoundForm::unbound(PostForm::from_post(&post)), Some(post.id)).await
}

pub async fn post_edit(
    State(state): State<AppState>,
    viewer: LoggedIn,
    Path((username, post_id)): Path<(String, String)>,
    form: PostForm,
) -> AppResult<Response> {
    let (author, post) = load_post(&state, &username, &post_id).await?;
    if viewer.id != post.author_id {
        warn!(user = %viewer.username, post = post.id, "Edit attempt by non-author");
        return Ok(redirect(post_url(&author.username, post.id)));
    }

    let cleaned = match form.clean(&state.db).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            return render_post_form(&state, BoundForm::with_errors(form, errors), Some(post.id)).await;
        }
    };

    let stored = store_image(&state, &cleaned).await?;
    let image = match &stored {
        Some(path) => Some(Some(path.clone())),
        None if cleaned.clear_image => Some(None),
        None => None,
    };
    let updated = EntPost::update(
        &state.db,
        post.id,
        PostChanges {
            text: cleaned.text,
            group_id: cleaned.group_id,
            image,
        },
    )
    .await;
    if let Err(e) = updated {
        discard_image(&state, stored.as_deref()).await;
        return Err(e);
    }
    state.invalidate_pages().await;
    Ok(redirect(post_url(&author.username, post.id)))
}

fn render_comment_form(form: BoundForm<CommentForm>, author: &EntUser, post: &EntPost) -> Response {
    TemplateResponse::new(
        "comments.html",
        CommentsContext {
            form,
            post_id: post.id,
            username: author.username.clone(),
        },
    )
    .into_response()
}

pub async fn comment_page(
    State(state): State<AppState>,
    _viewer: LoggedIn,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let (author, post) = load_post(&state, &username, &post_id).await?;
    Ok(render_comment_form(BoundForm::unbound(CommentForm::default()), &author, &post))
}

pub async fn add_comment(
    State(state): State<AppState>,
    viewer: LoggedIn,
    Path((username, post_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let (author, post) = load_post(&state, &username, &post_id).await?;
    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => return Ok(render_comment_form(BoundForm::with_errors(form, errors), &author, &post)),
    };

    EntComment::create(&state.db, post.id, viewer.id, &text).await?;
    Ok(redirect(post_url(&author.username, post.id)))
}
