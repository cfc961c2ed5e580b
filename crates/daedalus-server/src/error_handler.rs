//! Turning failures into responses.

use daedalus_core::{retrieve_error_code, Context, Error};
use serde::Serialize;

/// Writes the response for a failed request.
///
/// The dispatcher hands every error returned by middleware or handlers to
/// exactly one `ErrorHandler` call and never writes error bodies itself.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Writes a response for `error` into `ctx`.
    fn handle(&self, ctx: &mut Context, error: Error);
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut Context, Error) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, error: Error) {
        (self)(ctx, error);
    }
}

/// JSON error body written by [`DefaultErrorHandler`].
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric status.
    pub code: u16,
    /// Canonical reason phrase.
    pub message: &'static str,
}

/// Writes `{"code": ..., "message": ...}` with the status derived from the
/// error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, ctx: &mut Context, error: Error) {
        if ctx.is_written() || ctx.is_streaming() {
            tracing::error!(
                request_id = %ctx.request_id(),
                error = %error,
                "Error after response was written"
            );
            return;
        }

        let code = retrieve_error_code(&error);
        let body = ErrorBody {
            code: code.as_u16(),
            message: code.canonical_reason().unwrap_or("Unknown"),
        };
        if let Err(err) = ctx.send_json(&body, code) {
            tracing::error!(error = %err, "Failed to write error response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use daedalus_core::StatusError;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;

    fn ctx() -> Context {
        Context::new(Request::get("/").body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn test_status_error_body() {
        let mut ctx = ctx();
        DefaultErrorHandler.handle(&mut ctx, StatusError::forbidden().into());

        let response = ctx.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"code":403,"message":"Forbidden"}"#);
    }

    #[test]
    fn test_other_error_is_500() {
        let mut ctx = ctx();
        DefaultErrorHandler.handle(&mut ctx, Error::other(std::io::Error::other("boom")));
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_written_response_is_kept() {
        let mut ctx = ctx();
        ctx.send_text("done", StatusCode::ACCEPTED).unwrap();
        DefaultErrorHandler.handle(&mut ctx, StatusError::not_found().into());
        assert_eq!(ctx.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_closure_handler() {
        let handler = |ctx: &mut Context, _err: Error| {
            ctx.with_status(StatusCode::IM_A_TEAPOT);
        };
        let mut ctx = ctx();
        handler.handle(&mut ctx, StatusError::bad_request().into());
        assert_eq!(ctx.status(), StatusCode::IM_A_TEAPOT);
    }
}
