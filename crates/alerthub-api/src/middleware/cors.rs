//! CORS layer configuration.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

use alerthub_core::config::app::CorsConfig;

use crate::extractors::auth::{
    ORGANIZATION_ID_HEADER, PIN_HEADER, USER_ID_HEADER, USER_ROLE_HEADER,
};

/// Builds a CORS tower layer from configuration.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    // Origins
    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    // Methods
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    layer = layer.allow_headers([
        header::CONTENT_TYPE,
        HeaderName::from_static(USER_ID_HEADER),
        HeaderName::from_static(ORGANIZATION_ID_HEADER),
        HeaderName::from_static(USER_ROLE_HEADER),
        HeaderName::from_static(PIN_HEADER),
    ]);

    layer.max_age(std::time::Duration::from_secs(config.max_age_seconds))
}
