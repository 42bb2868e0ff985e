//! `POST /convert`
//!
//! Reads the multipart form, stores the upload, runs the media tool and
//! answers with the produced file as an attachment.

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response};
use std::ffi::OsStr;
use std::path::Path;

use super::RequestError;
use crate::config::AppState;
use crate::http::{self, mime};
use crate::logger;
use crate::media::Operation;
use crate::storage::{secure_filename, Job};

/// The `file` part of the form
#[derive(Debug)]
pub struct UploadedFile {
    /// Name as sent by the client, before sanitizing
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// Fields of a convert request; each is `None` until seen in the body
#[derive(Debug, Default)]
pub struct ConvertForm {
    pub file: Option<UploadedFile>,
    pub target: Option<String>,
    pub operation: Option<String>,
}

pub async fn handle_convert<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, RequestError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let form = read_form(req, state.config.http.max_body_size).await?;

    let file = form.file.ok_or(RequestError::MissingField("file"))?;
    let target = form.target.ok_or(RequestError::MissingField("target"))?;
    let operation: Operation = form
        .operation
        .ok_or(RequestError::MissingField("operation"))?
        .parse()?;

    let safe_name = secure_filename(file.file_name.as_deref().unwrap_or_default());
    if safe_name.is_empty() {
        return Err(RequestError::EmptyFilename);
    }

    // Dropping `job` removes its files when cleanup is enabled
    let job = state.storage.prepare_job(&safe_name, &target).await?;
    let output = run_job(state, operation, &job, &file.data).await?;

    let extension = Path::new(&job.output_name)
        .extension()
        .and_then(OsStr::to_str);
    Ok(http::build_attachment_response(
        output,
        &job.output_name,
        mime::get_content_type(extension),
    ))
}

/// Save the upload, run the tool and read back the output
async fn run_job(
    state: &AppState,
    operation: Operation,
    job: &Job,
    upload: &Bytes,
) -> Result<Bytes, RequestError> {
    tokio::fs::write(&job.input, upload).await?;

    if let Err(e) = state.run_job(operation, &job.input, &job.output).await {
        logger::log_job_failed(operation, &e);
        return Err(e.into());
    }

    Ok(Bytes::from(tokio::fs::read(&job.output).await?))
}

/// Collect the known form fields; later duplicates replace earlier ones
///
/// `max_body_size` caps the bytes read from the body whether or not the
/// client sent a `Content-Length`.
async fn read_form<B>(req: Request<B>, max_body_size: Option<u64>) -> Result<ConvertForm, RequestError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(RequestError::NotMultipart)?;

    let stream = req.into_body().into_data_stream();
    let mut multipart = match max_body_size {
        Some(limit) => multer::Multipart::with_constraints(
            stream,
            boundary,
            multer::Constraints::new().size_limit(multer::SizeLimit::new().whole_stream(limit)),
        ),
        None => multer::Multipart::new(stream, boundary),
    };
    let mut form = ConvertForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(ToString::to_string);
                let data = field.bytes().await?;
                form.file = Some(UploadedFile { file_name, data });
            }
            Some("target") => form.target = Some(field.text().await?),
            Some("operation") => form.operation = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}
