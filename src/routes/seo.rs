//! Crawler-facing documents: sitemap.xml and robots.txt.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::content::blog;
use crate::seo::{robots_txt, sitemap_entries, sitemap_xml};
use crate::state::SharedState;

const CACHE_CONTROL: &str = "public, max-age=3600";

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<SharedState>) -> Response {
    let posts = blog::load_posts(state.store()).await;
    let entries = sitemap_entries(&state.site(), &posts.value, Utc::now());
    tracing::debug!(entries = entries.len(), source = ?posts.source, "sitemap generated");

    (
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        sitemap_xml(&entries),
    )
        .into_response()
}

/// GET /robots.txt
pub async fn robots(State(state): State<SharedState>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        robots_txt(&state.site()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_text, empty_request, test_state};
    use axum::{http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/sitemap.xml", get(sitemap))
            .route("/robots.txt", get(robots))
            .with_state(test_state())
    }

    #[tokio::test]
    async fn test_sitemap_lists_pages_and_fallback_posts() {
        let res = app().oneshot(empty_request("GET", "/sitemap.xml", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/xml"));

        let xml = body_text(res).await;
        assert!(xml.contains("<loc>https://motionwealthgroup.com/about</loc>"));
        let first_post = &blog::fallback_posts()[0];
        assert!(xml.contains(&format!("https://motionwealthgroup.com/blog/{}", first_post.id)));
    }

    #[tokio::test]
    async fn test_robots_points_at_sitemap() {
        let res = app().oneshot(empty_request("GET", "/robots.txt", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_text(res).await;
        assert!(body.contains("Disallow: /admin/"));
        assert!(body.contains("Sitemap: https://motionwealthgroup.com/sitemap.xml"));
    }
}
