use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::http;
use crate::media::{MediaError, UnknownOperation};

/// Everything that can stop a convert request short of a download
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request is not multipart/form-data")]
    NotMultipart,

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),

    #[error("missing form field '{0}'")]
    MissingField(&'static str),

    #[error("uploaded filename is empty after sanitizing")]
    EmptyFilename,

    #[error(transparent)]
    InvalidOperation(#[from] UnknownOperation),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl RequestError {
    /// Server-side faults answer with a bare 500, client faults with a 400
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Media(_))
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::InvalidOperation(_) => {
                http::build_json_error_response(StatusCode::BAD_REQUEST, "Invalid operation")
            }
            Self::Multipart(multer::Error::StreamSizeExceeded { .. }) => http::build_413_response(),
            Self::NotMultipart | Self::Multipart(_) | Self::MissingField(_) | Self::EmptyFilename => {
                http::build_400_response(&self.to_string())
            }
            Self::Storage(_) | Self::Media(_) => http::build_500_response(),
        }
    }
}
