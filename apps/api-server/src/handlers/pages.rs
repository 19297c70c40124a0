use actix_web::HttpResponse;
use quill_shared::dto::AboutResponse;

/// GET /api/about/
pub async fn about() -> HttpResponse {
    HttpResponse::Ok().json(AboutResponse {
        title: "About".to_string(),
    })
}
