use embassy_time::{Duration, with_timeout};
use embedded_io_async::{Read, Write};
use log::{debug, warn};

use super::connection::{self, HttpConnection};
use super::headers::ResponseHeaders;
use super::{HttpError, HttpResult};

/// Upper bound for reading, handling and answering a single request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound for writing a rejection after a timed out request
pub const REJECT_TIMEOUT: Duration = Duration::from_millis(500);

#[allow(async_fn_in_trait)]
pub trait HttpHandler {
    async fn handle_request<S: Read + Write>(&self, conn: &mut HttpConnection<'_, S>)
    -> HttpResult;
}

/// Serve a single request on an accepted stream.
///
/// The whole exchange is bounded by [`REQUEST_TIMEOUT`]. Requests that cannot
/// be parsed are answered with a bare status line.
pub async fn serve<S: Read + Write, H: HttpHandler>(stream: &mut S, handler: &H) -> HttpResult {
    let result = match with_timeout(REQUEST_TIMEOUT, handle_connection(stream, handler)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("http: request timed out");
            let reject = connection::reject(stream, ResponseHeaders::from_code(408));
            match with_timeout(REJECT_TIMEOUT, reject).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("http: failed to write 408: {:?}", e),
                Err(_) => warn!("http: timed out writing 408"),
            }
            return Err(HttpError::Timeout);
        }
    };

    let response = match result {
        Err(HttpError::Parse) => ResponseHeaders::bad_request(),
        Err(HttpError::TooLarge) => ResponseHeaders::too_large(),
        other => return other,
    };
    debug!("http: rejecting request with {}", response.status());
    connection::reject(stream, response).await?;
    result
}

async fn handle_connection<S: Read + Write, H: HttpHandler>(
    stream: &mut S,
    handler: &H,
) -> HttpResult {
    let mut connection = HttpConnection::read_request(stream).await?;
    match handler.handle_request(&mut connection).await {
        // A status line is already out, the response can only be cut short
        Err(e @ (HttpError::Parse | HttpError::TooLarge)) if connection.headers_sent() => {
            warn!("http: response to {} aborted: {:?}", connection.path, e);
            Err(HttpError::Write)
        }
        result => result,
    }
}
