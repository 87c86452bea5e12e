use crate::{
    api::attendance, auth::middleware::auth_middleware, config::Config, error::ApiError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Malformed query strings, paths and bodies get the same JSON envelope.
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/employee/attendance")
                    // /employee/attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .service(
                        web::resource("/checkin").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/checkout").route(web::post().to(attendance::check_out)),
                    )
                    // /employee/attendance/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(attendance::get_attendance)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::get().to(attendance::list_all_attendance)),
                    )
                    .service(
                        web::resource("/absent").route(web::post().to(attendance::mark_absent)),
                    )
                    // /attendance/shifts/{id}/refresh
                    .service(
                        web::resource("/shifts/{id}/refresh")
                            .route(web::post().to(attendance::refresh_shift)),
                    ),
            ),
    );
}
