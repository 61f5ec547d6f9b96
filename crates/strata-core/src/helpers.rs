//! Plain-text response shortcuts
//!
//! Each helper sets `content-type: text/plain; charset=utf-8` unless a content
//! type was already chosen, sends the status, then writes the body.

use crate::response::ResponseWriter;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use std::fmt;
use std::io;

const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";

/// Write `500 Internal Server Error` with the error's message as body
pub fn write_error<E>(w: &mut dyn ResponseWriter, err: &E) -> io::Result<()>
where
    E: fmt::Display + ?Sized,
{
    write_fmt(w, StatusCode::INTERNAL_SERVER_ERROR, format_args!("{err}"))
}

/// Write `200 OK` with `text`
pub fn write_ok(w: &mut dyn ResponseWriter, text: &str) -> io::Result<()> {
    write_text(w, StatusCode::OK, text)
}

/// Write `400 Bad Request` with `text`
pub fn write_bad_request(w: &mut dyn ResponseWriter, text: &str) -> io::Result<()> {
    write_text(w, StatusCode::BAD_REQUEST, text)
}

/// Write `401 Unauthorized` with `text`
pub fn write_unauthorized(w: &mut dyn ResponseWriter, text: &str) -> io::Result<()> {
    write_text(w, StatusCode::UNAUTHORIZED, text)
}

/// Write `503 Service Unavailable` with `text`
pub fn write_service_unavailable(w: &mut dyn ResponseWriter, text: &str) -> io::Result<()> {
    write_text(w, StatusCode::SERVICE_UNAVAILABLE, text)
}

/// Write `status` with `text`
pub fn write_text(w: &mut dyn ResponseWriter, status: StatusCode, text: &str) -> io::Result<()> {
    set_text_content_type(w);
    w.write_header(status);
    w.write(text.as_bytes())?;
    Ok(())
}

/// Write `status` with a formatted body
///
/// ```rust,ignore
/// write_fmt(w, StatusCode::NOT_FOUND, format_args!("no user {id}"))?;
/// ```
pub fn write_fmt(
    w: &mut dyn ResponseWriter,
    status: StatusCode,
    args: fmt::Arguments<'_>,
) -> io::Result<()> {
    match args.as_str() {
        Some(text) => write_text(w, status, text),
        None => write_text(w, status, &args.to_string()),
    }
}

fn set_text_content_type(w: &mut dyn ResponseWriter) {
    if !w.headers().contains_key(CONTENT_TYPE) {
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF_8));
    }
}
