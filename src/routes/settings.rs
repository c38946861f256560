/**
 * Site Settings Routes
 * Footer logo read and admin update
 */
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::content::settings::{self, FooterLogo};
use crate::content::{ContentSource, SaveOutcome};
use crate::error::ApiError;
use crate::routes::forms::FormData;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterLogoResponse {
    #[serde(flatten)]
    pub logo: FooterLogo,
    pub source: ContentSource,
}

/// GET /api/settings/footer-logo
pub async fn get_footer_logo(State(state): State<SharedState>) -> Json<FooterLogoResponse> {
    let sourced = settings::load_footer_logo(state.store()).await;
    Json(FooterLogoResponse {
        logo: sourced.value,
        source: sourced.source,
    })
}

/// GET /api/admin/settings/footer-logo
pub async fn admin_get_footer_logo(State(state): State<SharedState>) -> Result<Json<FooterLogo>, ApiError> {
    let logo = settings::find_footer_logo(state.store()).await?;
    Ok(Json(logo.unwrap_or_default()))
}

/// PUT /api/admin/settings/footer-logo - multipart `linkUrl` plus `image` or `imageUrl`
pub async fn admin_put_footer_logo(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<SaveOutcome<FooterLogo>>, ApiError> {
    let mut form = FormData::read(multipart).await?;
    let image = form.image("image", "imageUrl");
    let outcome =
        settings::save_footer_logo(state.store(), state.blobs(), &form.text("linkUrl"), image).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_admin;
    use crate::test_support::{
        body_json, empty_request, issue_session_cookie, test_app_state, FailingBlobStore, Multipart as Form,
        ADMIN_EMAIL, PNG_BYTES,
    };
    use axum::{http::StatusCode, routing::get, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(state: crate::state::SharedState) -> Router {
        let admin = Router::new()
            .route(
                "/api/admin/settings/footer-logo",
                get(admin_get_footer_logo).put(admin_put_footer_logo),
            )
            .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_admin));

        Router::new()
            .route("/api/settings/footer-logo", get(get_footer_logo))
            .merge(admin)
            .with_state(state)
    }

    #[tokio::test]
    async fn test_update_then_read() {
        let state = Arc::new(test_app_state());
        let cookie = issue_session_cookie(&state, ADMIN_EMAIL).await;
        let app = app(state);

        let res = app
            .clone()
            .oneshot(empty_request("GET", "/api/settings/footer-logo", None))
            .await
            .unwrap();
        let body = body_json(res).await;
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["linkUrl"], "");

        let res = app
            .clone()
            .oneshot(
                Form::new()
                    .text("linkUrl", "https://linktr.ee/motionwealth")
                    .file("image", "logo.png", "image/png", PNG_BYTES)
                    .request("PUT", "/api/admin/settings/footer-logo", &cookie),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["message"], "Footer logo updated successfully");

        let res = app
            .oneshot(empty_request("GET", "/api/settings/footer-logo", None))
            .await
            .unwrap();
        let body = body_json(res).await;
        assert_eq!(body["source"], "store");
        assert_eq!(body["linkUrl"], "https://linktr.ee/motionwealth");
        assert!(body["imageUrl"].as_str().unwrap().starts_with("data:image/png"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_surfaced() {
        let mut state = test_app_state();
        state.blobs = Some(Arc::new(FailingBlobStore));
        let state = Arc::new(state);
        let cookie = issue_session_cookie(&state, ADMIN_EMAIL).await;

        let res = app(state)
            .oneshot(
                Form::new()
                    .text("linkUrl", "https://linktr.ee/motionwealth")
                    .file("image", "logo.png", "image/png", PNG_BYTES)
                    .request("PUT", "/api/admin/settings/footer-logo", &cookie),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
