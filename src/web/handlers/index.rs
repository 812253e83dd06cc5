//! Upload form page.

use axum::{extract::State, http::HeaderMap, response::Html};
use axum_extra::extract::cookie::SignedCookieJar;
use std::sync::Arc;

use crate::web::error::ApiError;
use crate::web::flash::{jar_from_headers, take_notices};
use crate::web::handlers::AppState;
use crate::web::pages::{render, IndexPage};

/// GET / - Upload form with pending notices and allowed extensions.
pub async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(SignedCookieJar, Html<String>), ApiError> {
    let (jar, notices) = take_notices(
        jar_from_headers(&headers, &state.flash_key),
        &state.notices,
    );

    let page = IndexPage {
        notices,
        allowed: state.policy.describe(),
    };

    Ok((jar, render(&page)?))
}
