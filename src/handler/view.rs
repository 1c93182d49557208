//! View page handler

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http;
use crate::render::{self, ViewModel};
use crate::storage::ImageId;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Render the page for one stored image, or 404 when nothing is stored
pub async fn serve_view(
    ctx: &RequestContext,
    state: &AppState,
    id: &ImageId,
) -> Response<Full<Bytes>> {
    let record = match state.store.exists(id).await {
        Ok(Some(record)) => record,
        Ok(None) => return http::build_404_response(),
        Err(e) => {
            tracing::error!("Failed to look up image {id}: {e}");
            return http::build_500_response("500 Internal Server Error");
        }
    };

    match state.templates.render_view(&ViewModel::from(&record)) {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            // The renderer's message goes back to the client as-is
            let message = render::error_message(&e);
            tracing::error!("Failed to render view for {id}: {message}");
            http::build_500_response(&message)
        }
    }
}
