use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::tracing::RequestId;

/// Header name for the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn id_header(request_id: &RequestId) -> Option<(HeaderName, HeaderValue)> {
    // Inbound ids came out of a header and generated ids are UUIDs, so this
    // only rejects garbage a client smuggled in.
    HeaderValue::from_str(request_id.as_str())
        .ok()
        .map(|value| (HeaderName::from_static(REQUEST_ID_HEADER), value))
}

/// Attach a request id to every request: honor an inbound `x-request-id`,
/// mint a UUID otherwise, expose it to handlers via extensions and to error
/// responses via the tracing task-local, and echo it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(RequestId::new)
        .unwrap_or_default();

    if let Some((name, value)) = id_header(&request_id) {
        request.headers_mut().insert(name, value);
    }
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.as_str(),
        method = %request.method(),
        uri = %request.uri(),
    );
    let _guard = span.enter();
    let mut response = crate::tracing::scope_request_id(request_id.clone(), async move {
        next.run(request).await
    })
    .await;

    if let Some((name, value)) = id_header(&request_id) {
        response.headers_mut().insert(name, value);
    }
    response
}
