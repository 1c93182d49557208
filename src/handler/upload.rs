//! Upload handlers
//!
//! Serves the upload form and accepts `multipart/form-data` posts carrying the
//! image in the `img` field. The field is streamed straight into the store;
//! nothing is buffered beyond one multipart chunk.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http;
use crate::render::Templates;
use crate::routing::VIEW_PREFIX;
use crate::storage::{ImageId, ImageRecord, StoreError};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, Request, Response, StatusCode};
use multer::{Constraints, Multipart, SizeLimit};

/// Form field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "img";

/// Reasons an upload is refused
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("expected a multipart/form-data body with a boundary")]
    NotMultipart,

    #[error("malformed multipart body: {0}")]
    Malformed(#[source] multer::Error),

    #[error("missing file field `img`")]
    MissingField,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UploadError {
    fn from_multer(err: multer::Error) -> Self {
        match err {
            multer::Error::StreamSizeExceeded { limit }
            | multer::Error::FieldSizeExceeded { limit, .. } => Self::TooLarge { limit },
            other => Self::Malformed(other),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotMultipart | Self::Malformed(_) | Self::MissingField => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_response(self) -> Response<Full<Bytes>> {
        match self.status() {
            StatusCode::PAYLOAD_TOO_LARGE => http::build_413_response(),
            StatusCode::BAD_REQUEST => http::build_400_response(&self.to_string()),
            // Storage detail stays in the log
            _ => http::build_500_response("500 Internal Server Error"),
        }
    }
}

/// Render the upload form
pub fn serve_form(ctx: &RequestContext, templates: &Templates) -> Response<Full<Bytes>> {
    match templates.render_upload_form() {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            let message = crate::render::error_message(&e);
            tracing::error!("Failed to render upload form: {message}");
            http::build_500_response(&message)
        }
    }
}

/// Store the posted image and redirect to its view page
pub async fn save_upload<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    match receive_upload(req, state).await {
        Ok(record) => {
            tracing::info!(id = %record.id, size = record.size, "Image stored");
            http::build_redirect_response(&format!("{VIEW_PREFIX}{}", record.id))
        }
        Err(e) => {
            match &e {
                UploadError::Store(err) => tracing::error!("Upload failed: {err}"),
                other => tracing::warn!("Upload rejected: {other}"),
            }
            e.into_response()
        }
    }
}

async fn receive_upload<B>(req: Request<B>, state: &AppState) -> Result<ImageRecord, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let limit = state.config.http.max_upload_size;
    check_content_length(req.headers(), limit)?;

    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(UploadError::NotMultipart)?;

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart =
        Multipart::with_constraints(req.into_body().into_data_stream(), boundary, constraints);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(UploadError::from_multer)?
    {
        // Browsers send `filename=""` when no file was chosen
        let has_file = field.file_name().is_some_and(|name| !name.is_empty());
        if field.name() != Some(UPLOAD_FIELD) || !has_file {
            continue;
        }

        let id = ImageId::generate(state.config.storage.id_scheme);
        let mut pending = state.store.create(id).await?;
        while let Some(chunk) = field.chunk().await.map_err(UploadError::from_multer)? {
            pending.write_chunk(&chunk).await?;
        }
        drop(field);

        // Read the rest of the body so an oversized request is refused as a whole
        while multipart
            .next_field()
            .await
            .map_err(UploadError::from_multer)?
            .is_some()
        {}

        return Ok(pending.commit().await?);
    }

    Err(UploadError::MissingField)
}

/// Refuse early when the declared body length is over the limit
fn check_content_length(headers: &HeaderMap, limit: u64) -> Result<(), UploadError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(size) if size > limit => Err(UploadError::TooLarge { limit }),
        _ => Ok(()),
    }
}
