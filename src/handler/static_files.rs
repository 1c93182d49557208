//! Static image serving module
//!
//! Raw pass-through of stored records under `/images/<id>.png`, with
//! conditional requests and single byte ranges.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, response::Validators, RangeParseResult};
use crate::storage::{ImageId, ImageStore};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Records are stored without inspection and always served as PNG
const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Serve the bytes stored under `id`
pub async fn serve_image(
    ctx: &RequestContext,
    store: &ImageStore,
    id: &ImageId,
) -> Response<Full<Bytes>> {
    let stored = match store.open(id).await {
        Ok(Some(stored)) => stored,
        Ok(None) => return http::build_404_response(),
        Err(e) => {
            tracing::error!("Failed to read image {id}: {e}");
            return http::build_500_response("500 Internal Server Error");
        }
    };

    let etag = cache::generate_etag(stored.record.size, &stored.record.stored_at);
    let last_modified = cache::http_date(&stored.record.stored_at);
    let validators = Validators {
        etag: &etag,
        last_modified: &last_modified,
    };

    // If-None-Match wins over If-Modified-Since when both are sent
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
    } else {
        cache::not_modified_since(ctx.if_modified_since.as_deref(), &stored.record.stored_at)
    };
    if not_modified {
        return http::build_304_response(validators);
    }

    let data = Bytes::from(stored.content);
    match http::parse_range_header(ctx.range_header.as_deref(), data.len()) {
        RangeParseResult::Valid(range) => http::response::build_partial_response(
            &data,
            range,
            IMAGE_CONTENT_TYPE,
            validators,
            ctx.is_head,
        ),
        RangeParseResult::NotSatisfiable => http::build_416_response(data.len()),
        RangeParseResult::None => http::response::build_image_response(
            data,
            IMAGE_CONTENT_TYPE,
            validators,
            ctx.is_head,
        ),
    }
}
