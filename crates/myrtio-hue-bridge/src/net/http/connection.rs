use embedded_io_async::{Read, Write};
use heapless::{String, Vec};
use log::debug;
use serde::{Deserialize, Serialize};

use super::headers::{
    BufferedWriter as _, ContentHeaders, ContentType, HttpMethod, ResponseHeaders,
    find_content_length, parse_request_line, read_heading,
};
use super::{HttpError, HttpResult};

const HEADER_BUFFER_SIZE: usize = 512;
const BODY_BUFFER_SIZE: usize = 1024;
const STREAM_CHUNK_SIZE: usize = 512;

pub type RequestPath = String<64>;

/// HTTP connection context
pub struct HttpConnection<'a, S> {
    pub method: HttpMethod,
    pub path: RequestPath,

    stream: &'a mut S,
    content_length: u32,
    header_end: usize,
    header_buf: Vec<u8, HEADER_BUFFER_SIZE>,
    body_buf: Vec<u8, BODY_BUFFER_SIZE>,
    headers_sent: bool,
}

impl<'a, S: Read + Write> HttpConnection<'a, S> {
    /// Read the request line and headers from the stream.
    pub async fn read_request(stream: &'a mut S) -> Result<Self, HttpError> {
        let mut header_buf = Vec::<u8, HEADER_BUFFER_SIZE>::new();
        header_buf
            .resize(HEADER_BUFFER_SIZE, 0)
            .map_err(|()| HttpError::TooLarge)?;
        let (header_end, header_len) = read_heading(header_buf.as_mut_slice(), stream).await?;
        header_buf.truncate(header_len);

        // Body bytes may follow the headers in the same read, keep them out of the parse
        let header_str =
            core::str::from_utf8(&header_buf[..header_end]).map_err(|_| HttpError::Parse)?;
        let (method, raw_path, rest_headers) =
            parse_request_line(header_str).ok_or(HttpError::Parse)?;
        let content_length = find_content_length(rest_headers).unwrap_or(0);
        let raw_path = raw_path.split_once('?').map_or(raw_path, |(path, _)| path);

        let mut path = RequestPath::new();
        path.push_str(raw_path).map_err(|()| HttpError::TooLarge)?;

        Ok(Self {
            method,
            path,
            stream,
            content_length,
            header_end,
            header_buf,
            body_buf: Vec::new(),
            headers_sent: false,
        })
    }

    /// Get request method and path
    pub fn route(&self) -> (HttpMethod, &'_ str) {
        (self.method, self.path.as_str())
    }

    pub fn content_length(&self) -> u32 {
        self.content_length
    }

    /// Whether a status line has already been written
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Write the headers to the connection
    pub async fn write_headers(&mut self, headers: &ResponseHeaders) -> HttpResult {
        self.header_buf.clear();
        headers.write_to(&mut self.header_buf)?;
        self.headers_sent = true;
        write_all(self.stream, &self.header_buf).await
    }

    /// Write a response without a body
    pub async fn write_status(&mut self, headers: ResponseHeaders) -> HttpResult {
        let headers = headers.with_content(
            ContentHeaders::new_with_content_type(ContentType::TextPlain).with_content_length(0),
        );
        self.write_headers(&headers).await
    }

    /// Write the body to the connection
    pub async fn write_body(&mut self, body: &[u8]) -> HttpResult {
        for chunk in body.chunks(STREAM_CHUNK_SIZE) {
            write_all(self.stream, chunk).await?;
        }
        Ok(())
    }

    /// Write a complete response with a pre-rendered body
    pub async fn write_response(
        &mut self,
        status: u16,
        content_type: ContentType,
        body: &[u8],
    ) -> HttpResult {
        let headers = ResponseHeaders::from_code(status).with_content(
            ContentHeaders::new_with_content_type(content_type).with_content_length(body.len()),
        );
        self.write_headers(&headers).await?;
        self.write_body(body).await
    }

    /// Write JSON to the connection
    ///
    /// Writes both headers and body.
    pub async fn write_json<T: Serialize>(&mut self, data: &T) -> HttpResult {
        self.write_json_status(200, data).await
    }

    /// Write JSON with a custom status code
    pub async fn write_json_status<T: Serialize>(&mut self, status: u16, data: &T) -> HttpResult {
        let n = self.render_json(data)?;
        let headers = ResponseHeaders::from_code(status).with_content(
            ContentHeaders::new_with_content_type(ContentType::Json).with_content_length(n),
        );
        self.write_headers(&headers).await?;
        write_all(self.stream, &self.body_buf).await
    }

    /// Write a JSON value as a part of a streamed body
    ///
    /// Headers must be written before, without a content length.
    pub async fn write_json_chunk<T: Serialize>(&mut self, data: &T) -> HttpResult {
        self.render_json(data)?;
        write_all(self.stream, &self.body_buf).await
    }

    /// Read JSON from the request body
    pub async fn read_json<'b, T: Deserialize<'b>>(&'b mut self) -> Result<T, HttpError> {
        let body = self.read_body().await?;
        let (data, _) = serde_json_core::from_slice(body).map_err(|e| {
            debug!("http: json parse error: {:?}", e);
            HttpError::Parse
        })?;
        Ok(data)
    }

    /// Read the request body
    pub async fn read_body(&mut self) -> Result<&[u8], HttpError> {
        let content_length = self.content_length as usize;
        if content_length == 0 {
            return Err(HttpError::NoData);
        }
        if content_length > BODY_BUFFER_SIZE {
            return Err(HttpError::TooLarge);
        }

        self.body_buf.clear();
        let trailer = &self.header_buf[self.header_end.min(self.header_buf.len())..];
        let trailer = &trailer[..trailer.len().min(content_length)];
        self.body_buf
            .extend_from_slice(trailer)
            .map_err(|()| HttpError::TooLarge)?;

        let mut received = self.body_buf.len();
        self.body_buf
            .resize(content_length, 0)
            .map_err(|()| HttpError::TooLarge)?;
        while received < content_length {
            let n = self
                .stream
                .read(&mut self.body_buf[received..])
                .await
                .map_err(|_| HttpError::Read)?;
            if n == 0 {
                return Err(HttpError::Closed);
            }
            received += n;
        }

        Ok(self.body_buf.as_slice())
    }

    fn render_json<T: Serialize>(&mut self, data: &T) -> Result<usize, HttpError> {
        self.body_buf.clear();
        self.body_buf
            .resize(BODY_BUFFER_SIZE, 0)
            .map_err(|()| HttpError::TooLarge)?;
        let n = serde_json_core::to_slice(data, self.body_buf.as_mut_slice())
            .map_err(|_| HttpError::TooLarge)?;
        self.body_buf.truncate(n);
        Ok(n)
    }
}

/// Write a bare status response straight to the stream.
///
/// Used when the request could not be parsed into a connection.
pub(super) async fn reject<S: Write>(stream: &mut S, headers: ResponseHeaders) -> HttpResult {
    let headers = headers.with_content(
        ContentHeaders::new_with_content_type(ContentType::TextPlain).with_content_length(0),
    );
    let mut buf = Vec::<u8, 128>::new();
    headers.write_to(&mut buf)?;
    write_all(stream, &buf).await
}

async fn write_all<S: Write>(stream: &mut S, buf: &[u8]) -> HttpResult {
    stream.write_all(buf).await.map_err(|_| HttpError::Write)?;
    stream.flush().await.map_err(|_| HttpError::Write)
}
