//! Bearer-token extractors.
//!
//! [`Identity`] rejects the request when no usable token is present.
//! [`OptionalIdentity`] never rejects, so that post handlers can leave the
//! authentication decision to `PostService`, which checks it before anything
//! else.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use uuid::Uuid;

use quill_core::Requester;
use quill_core::ports::{AuthError, TokenClaims, TokenService};
use quill_shared::ErrorResponse;

use crate::handlers::LOGIN_URL;

/// The user a valid bearer token was issued to.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

impl From<&Identity> for Requester {
    fn from(identity: &Identity) -> Self {
        Requester::new(identity.user_id, identity.username.clone())
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Authorization header is not ASCII".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected a Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(tokens) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
        tracing::error!("TokenService is not registered as app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()));
    };

    let token = bearer_token(req)?;
    tokens.validate_token(token).map(Identity::from)
}

/// Rejection raised by the [`Identity`] extractor.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct AuthenticationError(#[from] pub AuthError);

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match &self.0 {
            AuthError::HashingError(_) => {
                return HttpResponse::InternalServerError().json(ErrorResponse::internal_error());
            }
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Log in again."),
            AuthError::InvalidToken(reason) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(reason.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Send a Bearer token in the Authorization header."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
        };

        HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, "Bearer realm=\"quill\""))
            .json(body.with_login_url(LOGIN_URL))
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(AuthenticationError))
    }
}

/// The caller's identity if it presented a valid token, `None` otherwise.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn requester(&self) -> Option<Requester> {
        self.0.as_ref().map(Requester::from)
    }

    /// Username of the caller, or empty for anonymous requests.
    pub fn username(&self) -> String {
        self.0
            .as_ref()
            .map(|identity| identity.username.clone())
            .unwrap_or_default()
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = match authenticate(req) {
            Ok(identity) => Some(identity),
            Err(AuthError::MissingAuth) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable credentials");
                None
            }
        };

        ready(Ok(OptionalIdentity(identity)))
    }
}
