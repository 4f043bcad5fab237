//! Router and response-header middleware.

use axum::extract::Request;
use axum::http::header::{HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use super::AppState;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const IMAGE_CACHE: &str = "public, max-age=3600";

const NO_CACHE_EXTENSIONS: &[&str] = &[".js", ".css", ".html"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Caching policy for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always revalidate.
    NoStore,
    /// Cache for an hour.
    Image,
    /// Leave the response alone.
    Default,
}

pub fn cache_control_for(path: &str) -> CachePolicy {
    if path == "/" || NO_CACHE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        CachePolicy::NoStore
    } else if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        CachePolicy::Image
    } else {
        CachePolicy::Default
    }
}

/// Build the router: static files from the state's root, wrapped in the
/// header and logging middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any);

    Router::new()
        .fallback_service(ServeDir::new(&state.root))
        .layer(middleware::from_fn(cache_headers))
        .layer(cors)
        .with_state(state)
}

async fn cache_headers(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    match cache_control_for(&path) {
        CachePolicy::NoStore => {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            headers.insert(EXPIRES, HeaderValue::from_static("0"));
        }
        CachePolicy::Image => {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE));
        }
        CachePolicy::Default => {}
    }

    tracing::info!(
        "[{}] \"{} {}\" {}",
        chrono::Local::now().format("%H:%M:%S"),
        method,
        path,
        response.status().as_u16()
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_policy() {
        assert_eq!(cache_control_for("/"), CachePolicy::NoStore);
        assert_eq!(cache_control_for("/timeline-data.js"), CachePolicy::NoStore);
        assert_eq!(cache_control_for("/styles/main.css"), CachePolicy::NoStore);
        assert_eq!(cache_control_for("/index.html"), CachePolicy::NoStore);
        assert_eq!(cache_control_for("/images/palace.jpeg"), CachePolicy::Image);
        assert_eq!(cache_control_for("/icon.webp"), CachePolicy::Image);
        assert_eq!(cache_control_for("/images/"), CachePolicy::Default);
        assert_eq!(cache_control_for("/feed.json"), CachePolicy::Default);
    }
}
