//! Post handlers: listings, detail, and the author-only create/edit/delete views.
//!
//! Successful mutations answer with `302 Found` pointing at the view the
//! client should load next.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::Requester;
use quill_core::domain::{Post, PostDraft};
use quill_core::pagination::{Page, PageRequest};
use quill_core::service::AuthoredPost;
use quill_shared::dto::{
    DeleteConfirmationResponse, PageMeta, PostForm, PostFormResponse, PostListResponse,
    PostResponse,
};

use super::{POST_LIST_URL, post_detail_url};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

/// Post form body, as JSON or as an urlencoded form.
type FormBody =
    Result<web::Either<web::Json<PostForm>, web::Form<PostForm>>, actix_web::Error>;

fn post_response(post: Post, author: String) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        date_posted: post.date_posted,
        author_id: post.author_id,
        author,
    }
}

fn list_response(page: Page<AuthoredPost>) -> PostListResponse {
    let meta = PageMeta {
        number: page.number,
        per_page: page.per_page,
        total_items: page.total_items,
        num_pages: page.num_pages,
        has_next: page.has_next(),
        has_previous: page.has_previous(),
    };

    PostListResponse {
        posts: page
            .items
            .into_iter()
            .map(|entry| post_response(entry.post, entry.author))
            .collect(),
        page: meta,
    }
}

fn redirect(location: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    builder
}

/// Read the submitted form.
///
/// A body that cannot be parsed is reported only after the same checks the
/// mutation itself would run, so anonymous or non-author clients learn nothing
/// from a malformed request.
async fn read_form(
    state: &AppState,
    requester: Option<&Requester>,
    post_id: Option<Uuid>,
    body: FormBody,
) -> AppResult<PostDraft> {
    match body {
        Ok(either) => {
            let form = either.into_inner();
            Ok(PostDraft::new(form.title, form.content))
        }
        Err(err) => {
            match post_id {
                Some(id) => {
                    state.posts.edit_form(requester, id).await?;
                }
                None => {
                    state.posts.create_form(requester)?;
                }
            }
            Err(AppError::BadRequest(err.to_string()))
        }
    }
}

/// GET /api/posts/
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(query.page.as_deref())?;
    let page = state.posts.list_all(page).await?;

    Ok(HttpResponse::Ok().json(list_response(page)))
}

/// GET /api/users/{username}/posts/
pub async fn user_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(query.page.as_deref())?;
    let page = state.posts.list_by_user(&path, page).await?;

    Ok(HttpResponse::Ok().json(list_response(page)))
}

/// GET /api/posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let entry = state.posts.detail(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post_response(entry.post, entry.author)))
}

/// GET /api/posts/new/
pub async fn new_post_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let draft = state.posts.create_form(identity.requester().as_ref())?;

    Ok(HttpResponse::Ok().json(PostFormResponse {
        post_id: None,
        form: PostForm {
            title: draft.title,
            content: draft.content,
        },
    }))
}

/// POST /api/posts/new/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: FormBody,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    let draft = read_form(&state, requester.as_ref(), None, body).await?;

    let post = state.posts.create(requester.as_ref(), draft).await?;
    let author = identity.username();

    Ok(redirect(&post_detail_url(post.id)).json(post_response(post, author)))
}

/// GET /api/posts/{id}/edit/
pub async fn edit_post_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .edit_form(identity.requester().as_ref(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(PostFormResponse {
        post_id: Some(post.id),
        form: PostForm {
            title: post.title,
            content: post.content,
        },
    }))
}

/// POST /api/posts/{id}/edit/
pub async fn update_post(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
    body: FormBody,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let requester = identity.requester();
    let draft = read_form(&state, requester.as_ref(), Some(id), body).await?;

    let post = state.posts.update(requester.as_ref(), id, draft).await?;
    let author = identity.username();

    Ok(redirect(&post_detail_url(post.id)).json(post_response(post, author)))
}

/// GET /api/posts/{id}/delete/
pub async fn confirm_delete_post(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .delete_confirmation(identity.requester().as_ref(), path.into_inner())
        .await?;
    let author = identity.username();

    Ok(HttpResponse::Ok().json(DeleteConfirmationResponse {
        post: post_response(post, author),
    }))
}

/// POST /api/posts/{id}/delete/
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(identity.requester().as_ref(), path.into_inner())
        .await?;

    Ok(redirect(POST_LIST_URL).finish())
}
