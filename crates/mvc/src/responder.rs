//! Response writing module that converts handler results into response output.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! write themselves into a [`ResponseWriter`]. It includes implementations for common
//! types like Result, Option, String, etc.
//!
//! Plain handlers built with [`handler_fn`](crate::handler_fn) return a `Responder`,
//! and controllers can hand one to [`ResponseWriter::respond`].

use crate::handler::HandlerError;
use crate::response::ResponseWriter;
use http::{HeaderValue, StatusCode};
use serde::Serialize;

/// A trait for types that can be written into a response.
pub trait Responder {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError>;
}

/// `Ok` values are written, `Err` values become the handler's error.
impl<T: Responder, E: Into<HandlerError>> Responder for Result<T, E> {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        match self {
            Ok(t) => t.respond_to(writer),
            Err(e) => Err(e.into()),
        }
    }
}

/// None case writes nothing.
impl<T: Responder> Responder for Option<T> {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        match self {
            Some(t) => t.respond_to(writer),
            None => Ok(()),
        }
    }
}

impl Responder for StatusCode {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        writer.set_status(self);
        Ok(())
    }
}

/// Implementation for (StatusCode, T) tuple allows setting a status code
/// along with the response content.
impl<T: Responder> Responder for (StatusCode, T) {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        let (status, responder) = self;
        writer.set_status(status);
        responder.respond_to(writer)
    }
}

impl<T: Responder> Responder for Box<T> {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        (*self).respond_to(writer)
    }
}

/// Implementation for unit type () writes nothing.
impl Responder for () {
    fn respond_to(self, _writer: &ResponseWriter) -> Result<(), HandlerError> {
        Ok(())
    }
}

fn write_text(writer: &ResponseWriter, text: &str) -> Result<(), HandlerError> {
    let content_type = HeaderValue::from_str(mime::TEXT_PLAIN_UTF_8.as_ref())?;
    writer.with_headers(|headers| {
        headers.entry(http::header::CONTENT_TYPE).or_insert(content_type);
    });
    writer.write(text);
    Ok(())
}

/// Static strings are written as plain text.
impl Responder for &'static str {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        write_text(writer, self)
    }
}

impl Responder for String {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        write_text(writer, &self)
    }
}

/// Serializes the wrapped value as the JSON response body.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn respond_to(self, writer: &ResponseWriter) -> Result<(), HandlerError> {
        let bytes = serde_json::to_vec(&self.0)?;
        writer.insert_header(http::header::CONTENT_TYPE, HeaderValue::from_str(mime::APPLICATION_JSON.as_ref())?);
        writer.write(bytes);
        Ok(())
    }
}
