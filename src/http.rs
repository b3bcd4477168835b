//! Transport request and response objects handed to services.
//!
//! Both are injectable: declare `Arc<HttpRequest>` or `Arc<HttpResponse>` in a
//! service's `Params` (or a constructor's `Deps`) and the resolver hands over
//! the live objects of the current request without a registry lookup.

use std::io;
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode, Uri};
use parking_lot::Mutex;

/// Read-only view of an inbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    peer: Option<SocketAddr>,
}

impl HttpRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            peer: None,
        }
    }

    /// Builds a request from hyper/http request parts and a collected body.
    pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            peer: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path plus query string, exactly as the client sent it.
    pub fn raw_url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Remote address, when the request came in over a socket.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Default for HttpRequest {
    /// `GET /`
    fn default() -> Self {
        Self::new(Method::GET, Uri::from_static("/"))
    }
}

/// Mutable response shared by every service of one request.
///
/// Services write body bytes and may change the status or headers. A service
/// may [`close`](Self::close) the response early to stop further writes, but
/// only the pipeline finalizes it: a failure after an early close still turns
/// the response into an empty `500`. Once closed, writes fail with
/// `BrokenPipe` and status or header changes are ignored.
#[derive(Debug)]
pub struct HttpResponse {
    state: Mutex<ResponseState>,
}

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    closed: bool,
    /// Set by the pipeline when dispatch is over; nothing changes after it
    finalized: bool,
}

impl HttpResponse {
    /// A fresh `200 OK` response with an empty body.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: BytesMut::new(),
                closed: false,
                finalized: false,
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.state.lock().status
    }

    pub fn set_status(&self, status: StatusCode) {
        let mut state = self.state.lock();
        if !state.closed {
            state.status = status;
        }
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        let mut state = self.state.lock();
        if !state.closed {
            state.headers.insert(name, value);
        }
    }

    pub fn headers(&self) -> HeaderMap {
        self.state.lock().headers.clone()
    }

    /// Appends bytes to the body.
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response already closed",
            ));
        }
        state.body.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.write(text.as_bytes())
    }

    /// Copy of the body written so far.
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().body)
    }

    /// Ends writing. Idempotent.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Replaces the status and drops any partial body, so a failed request
    /// never mixes handler output with an error status. Overrides an early
    /// [`close`](Self::close); only finalization protects the response.
    pub(crate) fn fail(&self, status: StatusCode) {
        let mut state = self.state.lock();
        if !state.finalized {
            state.status = status;
            state.body.clear();
            state.headers.clear();
        }
    }

    /// Closes and freezes the response once dispatch is over.
    pub(crate) fn finalize(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.finalized = true;
    }

    /// Status, headers and body as they stand, for serialization by the transport.
    pub fn to_parts(&self) -> (StatusCode, HeaderMap, Bytes) {
        let state = self.state.lock();
        (
            state.status,
            state.headers.clone(),
            Bytes::copy_from_slice(&state.body),
        )
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for &HttpResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        HttpResponse::write(*self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
