use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        posts::{CreatePostRequest, PostResponse, UpdatePostRequest},
        DataResponse, ListResponse, MessageResponse,
    },
    handlers::ensure_access,
    middleware::Actor,
    models::Post,
    services::{ownership::POSTS, Access, SortBy},
    utils::validation::ValidatedJson,
    AppState,
};

/// Own posts plus every published public post; admins see all
#[utoipa::path(
    get,
    path = "/api/posts",
    responses(
        (status = 200, description = "{success, count, data: [PostResponse]}"),
        (status = 403, description = "Missing posts:read", body = ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<ListResponse<PostResponse>>, AppError> {
    let posts = state
        .stores
        .posts
        .find(POSTS.list_filter::<Post>(&actor), SortBy::newest_first())
        .await?;
    Ok(Json(ListResponse::new(
        posts.into_iter().map(PostResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "{success, data: PostResponse}"),
        (status = 403, description = "Private or unpublished post of another author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_post(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<PostResponse>>, AppError> {
    let post = POSTS
        .find_in_scope(state.stores.posts.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &post, Access::Read)?;
    Ok(Json(DataResponse::new(post.into())))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "{success, data: PostResponse}"),
        (status = 403, description = "Missing posts:create", body = ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_post(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<DataResponse<PostResponse>>), AppError> {
    let post = Post::new(
        actor.user_id.clone(),
        req.title.trim().to_string(),
        req.content.trim().to_string(),
        req.status.unwrap_or_default(),
        req.visibility.unwrap_or_default(),
        req.tags,
    );
    state.stores.posts.insert(&post).await?;
    tracing::info!(post_id = %post.id, author = %actor.user_id, "Post created");

    Ok((StatusCode::CREATED, Json(DataResponse::new(post.into()))))
}

/// Authors and admins only
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "{success, data: PostResponse}"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_post(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> Result<Json<DataResponse<PostResponse>>, AppError> {
    let mut post = POSTS
        .find_in_scope(state.stores.posts.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &post, Access::Update)?;

    req.apply(&mut post);
    state.stores.posts.replace(&post).await?;
    Ok(Json(DataResponse::new(post.into())))
}

/// Authors and admins only
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    tag = "Posts",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let post = POSTS
        .find_in_scope(state.stores.posts.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &post, Access::Delete)?;

    state.stores.posts.delete(&post.id).await?;
    tracing::info!(post_id = %post.id, actor = %actor.user_id, "Post deleted");
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
