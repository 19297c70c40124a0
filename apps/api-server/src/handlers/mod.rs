//! HTTP handlers and route configuration.

mod auth;
mod health;
mod pages;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::web;
use uuid::Uuid;

/// Where unauthenticated clients are sent to obtain a token.
pub const LOGIN_URL: &str = "/api/auth/login";

/// The list-all view.
pub const POST_LIST_URL: &str = "/api/posts/";

/// The detail view of one post.
pub fn post_detail_url(id: Uuid) -> String {
    format!("/api/posts/{}/", id)
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/about/", web::get().to(pages::about))
            .route("/users/{username}/posts/", web::get().to(posts::user_posts))
            // Posts; `new/` must be registered ahead of `{id}/`
            .service(
                web::scope("/posts")
                    .route("/", web::get().to(posts::list_posts))
                    .route("/new/", web::get().to(posts::new_post_form))
                    .route("/new/", web::post().to(posts::create_post))
                    .route("/{id}/", web::get().to(posts::post_detail))
                    .route("/{id}/edit/", web::get().to(posts::edit_post_form))
                    .route("/{id}/edit/", web::post().to(posts::update_post))
                    .route("/{id}/delete/", web::get().to(posts::confirm_delete_post))
                    .route("/{id}/delete/", web::post().to(posts::delete_post)),
            )
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            ),
    );
}
