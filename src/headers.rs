use axum::http::HeaderName;

pub const HEADER_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
