//! Request filtering module that provides composable request filters.
//!
//! Every registered route item carries one filter built from the route's verb
//! and any extra filters declared with [`Route::with`](crate::route::Route::with).
//! Within one pattern the router picks the first item whose filter matches.
//!
//! ## Thread Safety
//!
//! All filters must implement the `Filter` trait, which requires `Send + Sync`,
//! so a built router can be shared across the threads serving requests.
//!
//! # Examples
//!
//! ```
//! use micro_mvc::router::filter::{all_filter, header, method_filter};
//! use micro_mvc::route::MethodSpec;
//!
//! let mut combined = all_filter();
//! combined.and(method_filter(MethodSpec::Any)).and(header("Authorization", "Bearer token").unwrap());
//! ```

use crate::request::RequestContext;
use crate::route::MethodSpec;
use http::{HeaderName, HeaderValue};
use std::fmt;

/// Core trait for request filtering.
///
/// Returns `true` if the request should be handled by the item owning the filter.
pub trait Filter: Send + Sync {
    fn matches(&self, req: &RequestContext) -> bool;
}

/// A filter that wraps a closure.
struct FnFilter<F: Fn(&RequestContext) -> bool>(F);

impl<F: Fn(&RequestContext) -> bool + Send + Sync> Filter for FnFilter<F> {
    fn matches(&self, req: &RequestContext) -> bool {
        (self.0)(req)
    }
}

/// Creates a new filter from a closure.
///
/// # Example
/// ```
/// use micro_mvc::router::filter::fn_filter;
///
/// let api_only = fn_filter(|req| req.uri().path().starts_with("/api"));
/// ```
pub fn fn_filter<F>(f: F) -> impl Filter
where
    F: Fn(&RequestContext) -> bool + Send + Sync,
{
    FnFilter(f)
}

/// Creates a new AND-composed filter chain.
pub fn all_filter() -> AllFilter {
    AllFilter { filters: vec![] }
}

/// Compose filters with AND logic.
///
/// An empty filter chain returns true.
pub struct AllFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AllFilter {
    /// Add a new filter to the AND chain.
    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub(crate) fn and_boxed(&mut self, filter: Box<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }
}

impl fmt::Debug for AllFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AllFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.iter().all(|filter| filter.matches(req))
    }
}

/// A filter that matches the verbs of a [`MethodSpec`].
#[derive(Debug, Clone)]
pub struct MethodFilter(MethodSpec);

/// Creates a filter accepting the verbs of `spec`.
#[inline]
pub fn method_filter(spec: MethodSpec) -> MethodFilter {
    MethodFilter(spec)
}

impl Filter for MethodFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.0.matches(req.method())
    }
}

/// Creates a filter that matches a specific header name and value.
pub fn header<K, V>(header_name: K, header_value: V) -> Result<HeaderFilter, http::Error>
where
    HeaderName: TryFrom<K>,
    <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
{
    let name = <HeaderName as TryFrom<K>>::try_from(header_name).map_err(Into::into)?;
    let value = <HeaderValue as TryFrom<V>>::try_from(header_value).map_err(Into::into)?;
    Ok(HeaderFilter(name, value))
}

/// A filter that matches HTTP headers.
#[derive(Debug, Clone)]
pub struct HeaderFilter(HeaderName, HeaderValue);

impl Filter for HeaderFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        req.headers().get(&self.0).is_some_and(|value| *value == self.1)
    }
}
