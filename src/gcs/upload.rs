use super::{util, ObjectAttributes, TOKEN_DEADLINE, UPLOAD_DEADLINE};
use crate::{
    allowlist::{self, USER_TOKEN_VAR},
    credentials::{self, KeySource},
    env::EnvPayload,
    progress, Error, Scopes as _,
};
use clap::builder::NonEmptyStringValueParser;
use nu_ansi_term::Color;
use std::{path::PathBuf, time::Duration};
use tame_gcs::{self as tgcs, http, objects::InsertObjectOptional};

/// Uploads a local file to a GCS bucket, refusing to overwrite an existing object
#[derive(clap::Parser)]
pub struct Args {
    /// Path to the file on the local filesystem
    #[arg(short = 'f', long = "filepath")]
    file: PathBuf,
    /// Name of the object in the bucket
    #[arg(short = 'o', long = "objectname", value_parser = NonEmptyStringValueParser::new())]
    object_name: String,
    /// Path (prefix) in the bucket the object is uploaded under
    #[arg(short = 'p', long = "objectpath", value_parser = NonEmptyStringValueParser::new())]
    object_path: String,
    /// The bucket to upload to
    bucket: String,
}

impl crate::Scopes for Args {
    fn scopes(&self) -> &'static [&'static str] {
        credentials::FULL_CONTROL
    }
}

/// Joins a path prefix and an object name into a full object key
pub fn object_key(prefix: &str, name: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

/// A validated upload: where the bytes come from and where they go
#[derive(Debug)]
pub struct UploadRequest {
    pub bucket: tgcs::BucketName<'static>,
    pub object: tgcs::ObjectName<'static>,
    pub file: PathBuf,
}

impl UploadRequest {
    pub fn new(bucket: String, object: String, file: PathBuf) -> Result<Self, Error> {
        if file.as_os_str().is_empty() {
            return Err(Error::io(
                "no local file path provided",
                std::io::ErrorKind::InvalidInput.into(),
            ));
        }

        let bucket = tgcs::BucketName::try_from(bucket.clone()).map_err(|source| {
            Error::InvalidName {
                kind: "bucket",
                name: bucket,
                source,
            }
        })?;
        let object = tgcs::ObjectName::try_from(object.clone()).map_err(|source| {
            Error::InvalidName {
                kind: "object",
                name: object,
                source,
            }
        })?;

        Ok(Self {
            bucket,
            object,
            file,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The object was created
    Uploaded(ObjectAttributes),
    /// An object already exists at the key, nothing was written
    AlreadyExists,
}

/// Builds a media upload for the object that only succeeds if no live
/// object exists at the key yet
pub fn insert_request(
    obj: &tgcs::objects::Object,
    req: &UploadRequest,
    len: u64,
) -> Result<http::Request<std::io::Empty>, Error> {
    let mut optional = InsertObjectOptional::default();
    // Generation 0 means "no live version", ie. create-only
    optional.conditionals.if_generation_match = Some(0);

    obj.insert_simple(
        &(&req.bucket, &req.object),
        std::io::empty(),
        len,
        Some(optional),
    )
    .map_err(|err| Error::Upload(format!("failed to build insert request: {err}")))
}

/// Maps an insert response onto an outcome
pub fn classify(res: http::Response<bytes::Bytes>) -> Result<UploadOutcome, Error> {
    use tgcs::{objects::InsertResponse, ApiResponse};

    let status = res.status();

    if status == http::StatusCode::PRECONDITION_FAILED {
        return Ok(UploadOutcome::AlreadyExists);
    }

    if !status.is_success() {
        return Err(Error::Upload(util::error_message::<InsertResponse>(res)));
    }

    let inserted = InsertResponse::try_from_parts(res)
        .map_err(|err| Error::Upload(format!("failed to parse insert response: {err}")))?;

    Ok(UploadOutcome::Uploaded(inserted.metadata.into()))
}

/// Streams the request's file to GCS, rendering a progress bar as bytes are
/// read. The transfer is aborted if it does not finish within `deadline`.
pub async fn upload(
    ctx: &util::RequestContext,
    req: &UploadRequest,
    deadline: Duration,
) -> Result<UploadOutcome, Error> {
    let file = tokio::fs::File::open(&req.file)
        .await
        .map_err(|err| Error::io(format!("failed to open {}", req.file.display()), err))?;

    let len = file
        .metadata()
        .await
        .map_err(|err| Error::io(format!("failed to stat {}", req.file.display()), err))?
        .len();

    let request = insert_request(&ctx.obj, req, len)?;

    let bar = progress::bytes_bar(len, "Uploading...");
    let body = reqwest::Body::wrap_stream(progress::reader_stream(file, bar.clone()));

    tracing::info!(
        file = %req.file.display(),
        bucket = %req.bucket,
        object = %req.object,
        len,
        "starting upload"
    );

    let response = match tokio::time::timeout(deadline, util::send(ctx, request, body)).await {
        Ok(Ok(res)) => res,
        Ok(Err(err)) => {
            bar.abandon();
            return Err(Error::Upload(format!("{err:#}")));
        }
        Err(_elapsed) => {
            bar.abandon();
            return Err(Error::Timeout {
                operation: "upload",
                deadline,
            });
        }
    };

    let outcome = classify(response);
    match &outcome {
        Ok(UploadOutcome::Uploaded(_)) => bar.finish(),
        _ => bar.abandon(),
    }

    outcome
}

pub(super) async fn run(args: Args, key: KeySource<'_>) -> anyhow::Result<()> {
    // The env payload and caller token are checked before anything touches the network
    let payload = EnvPayload::embedded()?;
    payload.apply();
    let allowed = payload.allowlist();

    let token = allowlist::caller_token(USER_TOKEN_VAR)?;
    allowed.authorize(&token)?;

    let req = UploadRequest::new(
        args.bucket.clone(),
        object_key(&args.object_path, &args.object_name),
        args.file.clone(),
    )?;

    let ctx = credentials::connect(&key.provider()?, args.scopes(), TOKEN_DEADLINE).await?;

    match upload(&ctx, &req, UPLOAD_DEADLINE).await? {
        UploadOutcome::Uploaded(attrs) => {
            let size = attrs
                .size
                .map(progress::human_bytes)
                .unwrap_or_else(|| "unknown size".to_owned());

            println!(
                "\n{} File {} uploaded to bucket {} at path {} ({size}).",
                Color::Green.paint("OK"),
                req.file.display(),
                req.bucket,
                req.object,
            );
        }
        UploadOutcome::AlreadyExists => {
            tracing::warn!(bucket = %req.bucket, object = %req.object, "object already exists");

            println!(
                "\n{} Upload refused: precondition not met, an object already exists at gs://{}/{}.",
                Color::Yellow.paint("SKIPPED"),
                req.bucket,
                req.object,
            );
        }
    }

    Ok(())
}
