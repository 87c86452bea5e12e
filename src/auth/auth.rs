use crate::{
    auth::jwt::{TokenType, verify_token},
    config::Config,
    error::ApiError,
    model::role::Role,
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Validates a raw `Authorization` header value.
    pub fn from_header(header: Option<&str>, secret: &str) -> Result<Self, ApiError> {
        let header = header
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Authorization header must start with Bearer".to_string())
        })?;

        let claims = verify_token(token, secret)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Access token required".to_string()));
        }

        let role = Role::from_id(claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role".to_string()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
        })
    }

    pub fn require_hr_or_admin(&self) -> Result<(), ApiError> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("HR/Admin only".to_string()))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::internal("Auth", "Config missing"))),
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(AuthUser::from_header(header, &config.jwt_secret))
    }
}
