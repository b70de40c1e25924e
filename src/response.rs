use crate::{
    error::FramingError,
    sse::{build_completion_frames, SseFrame, STREAM_CHUNK_SIZE},
    usecase::ChatResult,
};
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;

pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Full(Bytes),
    /// Encoded SSE events, written out in order.
    Events(Vec<Bytes>),
}

/// A complete response, independent of the HTTP server that will write it.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

/// Permissive CORS headers present on every gateway response.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let any = HeaderValue::from_static("*");
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, any.clone());
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, any.clone());
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, any);
    headers
}

fn sse_headers() -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    headers
}

impl GatewayResponse {
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, payload: &T) -> Result<Self, FramingError> {
        let body = serde_json::to_vec(payload)?;
        let mut headers = cors_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(Self {
            status,
            headers,
            body: ResponseBody::Full(Bytes::from(body)),
        })
    }

    /// `{"error": message}` with the given status.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = json!({ "error": message }).to_string();
        let mut headers = cors_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            status,
            headers,
            body: ResponseBody::Full(Bytes::from(body)),
        }
    }

    pub fn event_stream(frames: &[SseFrame]) -> Self {
        Self {
            status: StatusCode::OK,
            headers: sse_headers(),
            body: ResponseBody::Events(frames.iter().map(SseFrame::encode).collect()),
        }
    }

    /// Frames a chat result as either one JSON document or an event stream.
    pub fn frame(result: &ChatResult, stream_requested: bool) -> Result<Self, FramingError> {
        if stream_requested {
            Ok(Self::event_stream(&build_completion_frames(
                result,
                STREAM_CHUNK_SIZE,
            )))
        } else {
            Self::json(StatusCode::OK, result)
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, FramingError> {
        let value = HeaderValue::from_str(value).map_err(|_| FramingError::InvalidHeader)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_event_stream(&self) -> bool {
        matches!(self.body, ResponseBody::Events(_))
    }

    /// Whole body as one buffer; events are concatenated.
    pub fn body_bytes(&self) -> Bytes {
        match &self.body {
            ResponseBody::Full(bytes) => bytes.clone(),
            ResponseBody::Events(events) => Bytes::from(events.concat()),
        }
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            ResponseBody::Full(bytes) => Body::from(bytes),
            ResponseBody::Events(events) => Body::from_stream(futures_util::stream::iter(
                events.into_iter().map(Ok::<_, Infallible>),
            )),
        };
        (self.status, self.headers, body).into_response()
    }
}
