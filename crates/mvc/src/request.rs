//! Request handling module that provides access to HTTP request information and path parameters.
//!
//! This module contains the core types handlers and controllers see for a request:
//! - `RequestContext`: Provides access to the request head, body and path parameters
//! - `PathParams`: Handles URL path parameters extracted from request paths
//!
//! Both types own their data, so a controller may keep them after `init` without
//! borrowing from the router or the transport.

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};
use matchit::Params;
use std::collections::HashMap;
use std::sync::Arc;

/// Represents the context of an HTTP request.
///
/// Cloning is cheap: the request head and body are shared behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    parts: Parts,
    body: Bytes,
    path_params: PathParams,
}

impl RequestContext {
    /// Creates a new RequestContext from the request head, its body and the matched path parameters
    pub fn new(parts: Parts, body: Bytes, path_params: PathParams) -> Self {
        Self { inner: Arc::new(Inner { parts, body, path_params }) }
    }

    /// Creates a RequestContext for a request that has no path parameters
    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, PathParams::empty())
    }

    /// Returns a reference to the underlying request head
    pub fn parts(&self) -> &Parts {
        &self.inner.parts
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.inner.parts.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.inner.parts.uri
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.inner.parts.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.parts.headers
    }

    /// Returns the full request body
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Returns the path parameters extracted from the request URL
    pub fn path_params(&self) -> &PathParams {
        &self.inner.path_params
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::from_request(Request::default())
    }
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be extracted and accessed
/// by name. For example, in the path "/users/{id}", "id" is a path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Iterates over the parameters in the order they appear in the pattern
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies the parameters into a map keyed by parameter name
    pub fn to_map(&self) -> HashMap<String, String> {
        self.params.iter().cloned().collect()
    }
}

impl From<Params<'_, '_>> for PathParams {
    fn from(params: Params<'_, '_>) -> Self {
        Self { params: params.iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect() }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}
