use crate::body::ResponseBody;
use crate::handler::HandlerError;
use crate::responder::Responder;
use bytes::{Bytes, BytesMut};
use http::header::IntoHeaderName;
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A per-request handle used to build the response.
///
/// The terminal handler and the controller bound to a route write into the same
/// writer: the controller receives a clone in `init` and keeps it for the rest
/// of its lifecycle. Clones share state; a writer never outlives the request it
/// was created for.
#[derive(Debug, Clone, Default)]
pub struct ResponseWriter {
    inner: Arc<Mutex<ResponseState>>,
}

#[derive(Debug, Default)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ResponseState> {
        // a panicking controller must not make the response unreadable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> StatusCode {
        self.state().status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state().status = status;
    }

    pub fn insert_header<K: IntoHeaderName>(&self, name: K, value: HeaderValue) {
        self.state().headers.insert(name, value);
    }

    pub fn header(&self, name: impl AsRef<str>) -> Option<HeaderValue> {
        self.state().headers.get(name.as_ref()).cloned()
    }

    /// Gives mutable access to the response headers for the duration of `f`.
    pub fn with_headers<R>(&self, f: impl FnOnce(&mut HeaderMap) -> R) -> R {
        f(&mut self.state().headers)
    }

    /// Appends `data` to the response body.
    pub fn write(&self, data: impl AsRef<[u8]>) {
        self.state().body.extend_from_slice(data.as_ref());
    }

    pub fn body_len(&self) -> usize {
        self.state().body.len()
    }

    /// Writes a [`Responder`] into this writer.
    pub fn respond<R: Responder>(&self, responder: R) -> Result<(), HandlerError> {
        responder.respond_to(self)
    }

    /// Discards everything written so far and sets `status`.
    pub fn reset(&self, status: StatusCode) {
        let mut state = self.state();
        *state = ResponseState::default();
        state.status = status;
    }

    /// Takes the written status, headers and body out as an [`http::Response`].
    ///
    /// Clones of this writer still held elsewhere observe an empty `200 OK`
    /// response afterwards.
    pub fn into_response(self) -> Response<ResponseBody> {
        let state = std::mem::take(&mut *self.state());
        let mut response = Response::new(ResponseBody::once(Bytes::from(state.body)));
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use crate::response::ResponseWriter;
    use http::{HeaderValue, StatusCode};

    #[test]
    fn test_clones_share_state() {
        let writer = ResponseWriter::new();
        let cloned = writer.clone();

        cloned.set_status(StatusCode::CREATED);
        cloned.insert_header(http::header::LOCATION, HeaderValue::from_static("/users/42"));
        writer.write("hello ");
        cloned.write(b"world");

        assert_eq!(writer.status(), StatusCode::CREATED);
        assert_eq!(writer.header("location").unwrap(), "/users/42");
        assert_eq!(writer.body_len(), 11);

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[http::header::LOCATION], "/users/42");
        assert_eq!(response.body().as_bytes(), b"hello world");

        // the state was taken out
        assert_eq!(cloned.body_len(), 0);
        assert_eq!(cloned.status(), StatusCode::OK);
    }

    #[test]
    fn test_reset() {
        let writer = ResponseWriter::new();
        writer.write("partial");
        writer.with_headers(|headers| {
            headers.insert("x-trace", HeaderValue::from_static("1"));
        });

        writer.reset(StatusCode::INTERNAL_SERVER_ERROR);

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().is_empty());
        assert!(response.body().as_bytes().is_empty());
    }
}
