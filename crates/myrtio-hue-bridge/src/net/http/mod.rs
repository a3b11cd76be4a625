pub mod connection;
pub mod headers;
pub mod server;

pub use connection::HttpConnection;
pub use headers::{ContentHeaders, ContentType, HttpMethod, ResponseHeaders, TextEncoding};
pub use server::{HttpHandler, REQUEST_TIMEOUT, serve};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    Read,
    Write,
    Closed,
    Parse,
    NoData,
    TooLarge,
    Timeout,
    FormatHeaders,
}

impl From<core::fmt::Error> for HttpError {
    fn from(_error: core::fmt::Error) -> Self {
        HttpError::FormatHeaders
    }
}

pub type HttpResult = Result<(), HttpError>;
