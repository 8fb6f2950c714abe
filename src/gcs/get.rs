use super::{util, ObjectAttributes, DEFAULT_BUCKET, FETCH_DEADLINE, TOKEN_DEADLINE};
use crate::{
    credentials::{self, KeySource},
    Error, Scopes as _,
};
use clap::builder::NonEmptyStringValueParser;
use nu_ansi_term::Color;
use std::time::Duration;
use tame_gcs::{self as tgcs, http};

/// Gets the attributes of an object in a GCS bucket, if it exists
#[derive(clap::Parser)]
pub struct Args {
    /// The bucket to look in, an empty value means the default bucket
    #[arg(short = 'b', long = "bucketname", default_value = DEFAULT_BUCKET, value_parser = bucket_or_default)]
    bucket: String,
    /// The object to look up, including any path prefix
    #[arg(short = 'o', long = "objectname", value_parser = NonEmptyStringValueParser::new())]
    object: String,
}

fn bucket_or_default(s: &str) -> Result<String, String> {
    if s.is_empty() {
        Ok(DEFAULT_BUCKET.to_owned())
    } else {
        Ok(s.to_owned())
    }
}

impl crate::Scopes for Args {
    fn scopes(&self) -> &'static [&'static str] {
        credentials::FULL_CONTROL
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(ObjectAttributes),
    NotFound,
}

/// Maps a metadata response onto an outcome
pub fn classify(res: http::Response<bytes::Bytes>) -> Result<FetchOutcome, Error> {
    use tgcs::{objects::GetObjectResponse, ApiResponse};

    let status = res.status();

    if status == http::StatusCode::NOT_FOUND {
        return Ok(FetchOutcome::NotFound);
    }

    if !status.is_success() {
        return Err(Error::Fetch(util::error_message::<GetObjectResponse>(res)));
    }

    let got = GetObjectResponse::try_from_parts(res)
        .map_err(|err| Error::Fetch(format!("failed to parse object metadata: {err}")))?;

    Ok(FetchOutcome::Found(got.metadata.into()))
}

/// Queries the metadata of `object`. An absent object is an outcome, not an error.
pub async fn fetch_attributes(
    ctx: &util::RequestContext,
    bucket: &str,
    object: &str,
    deadline: Duration,
) -> Result<FetchOutcome, Error> {
    let bucket_name = tgcs::BucketName::try_from(bucket).map_err(|source| Error::InvalidName {
        kind: "bucket",
        name: bucket.to_owned(),
        source,
    })?;
    let object_name = tgcs::ObjectName::try_from(object).map_err(|source| Error::InvalidName {
        kind: "object",
        name: object.to_owned(),
        source,
    })?;

    let request = ctx
        .obj
        .get(&(&bucket_name, &object_name), None)
        .map_err(|err| Error::Fetch(format!("failed to build request: {err}")))?;

    let response = tokio::time::timeout(
        deadline,
        util::send(ctx, request, reqwest::Body::from(Vec::new())),
    )
    .await
    .map_err(|_elapsed| Error::Timeout {
        operation: "metadata query",
        deadline,
    })?
    .map_err(|err| Error::Fetch(format!("Object({object:?}).Attrs: {err:#}")))?;

    classify(response)
}

pub(super) async fn run(args: Args, key: KeySource<'_>) -> anyhow::Result<()> {
    let ctx = credentials::connect(&key.provider()?, args.scopes(), TOKEN_DEADLINE).await?;

    println!(
        "Checking if object exists in bucket: {} with name: {}",
        args.bucket, args.object
    );

    match fetch_attributes(&ctx, &args.bucket, &args.object, FETCH_DEADLINE).await? {
        FetchOutcome::Found(attrs) => {
            println!("{}", Color::Green.paint("Object found:"));
            println!("{attrs}");
        }
        FetchOutcome::NotFound => {
            println!(
                "Object {} {} in bucket {}",
                args.object,
                Color::Yellow.paint("does not exist"),
                args.bucket
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> http::Response<bytes::Bytes> {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(bytes::Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test]
    fn found_object_matches_key() {
        let outcome = classify(response(
            200,
            r#"{
                "kind": "storage#object",
                "name": "statements/2024/q1.pdf",
                "bucket": "prod-eu-zimvest",
                "contentType": "application/pdf",
                "size": "2048",
                "storageClass": "STANDARD",
                "updated": "2024-05-01T10:00:00.000Z"
            }"#,
        ))
        .unwrap();

        let FetchOutcome::Found(attrs) = outcome else {
            panic!("expected object to be found");
        };

        assert_eq!(attrs.name, "statements/2024/q1.pdf");
        assert_eq!(attrs.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(attrs.storage_class.as_deref(), Some("STANDARD"));
        assert_eq!(
            attrs.updated,
            Some(time::macros::datetime!(2024-05-01 10:00:00 UTC))
        );
    }

    #[test]
    fn absent_object_is_not_an_error() {
        let outcome = classify(response(
            404,
            r#"{"error":{"code":404,"message":"No such object: prod-eu-zimvest/nope","errors":[]}}"#,
        ))
        .unwrap();

        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[test]
    fn other_failures_are_errors() {
        assert!(matches!(
            classify(response(
                403,
                r#"{"error":{"code":403,"message":"Forbidden","errors":[]}}"#,
            )),
            Err(Error::Fetch(_))
        ));
    }

    #[test]
    fn bucket_defaults() {
        use clap::Parser;

        let args = Args::try_parse_from(["get", "-o", "statements/q1.pdf"]).unwrap();
        assert_eq!(args.bucket, DEFAULT_BUCKET);
        assert_eq!(args.object, "statements/q1.pdf");

        let args = Args::try_parse_from(["get", "-b", "other-bucket", "-o", "x"]).unwrap();
        assert_eq!(args.bucket, "other-bucket");
    }

    #[test]
    fn empty_bucket_means_default() {
        use clap::Parser;

        let args = Args::try_parse_from(["get", "-b", "", "-o", "x"]).unwrap();
        assert_eq!(args.bucket, DEFAULT_BUCKET);

        let args = Args::try_parse_from(["get", "--bucketname=", "-o", "x"]).unwrap();
        assert_eq!(args.bucket, DEFAULT_BUCKET);
    }

    #[tokio::test]
    async fn metadata_query_is_bounded() {
        let ctx = util::RequestContext::new(reqwest::Client::new());

        let err = fetch_attributes(&ctx, DEFAULT_BUCKET, "statements/q1.pdf", Duration::ZERO)
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                Error::Timeout {
                    operation: "metadata query",
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn builds_metadata_request() {
        let bucket = tgcs::BucketName::try_from("prod-eu-zimvest").unwrap();
        let object = tgcs::ObjectName::try_from("statements/q1.pdf").unwrap();

        let req = tgcs::objects::Object::default()
            .get(&(&bucket, &object), None)
            .unwrap();

        assert_eq!(req.method(), http::Method::GET);
        assert!(req.uri().path().contains("prod-eu-zimvest"));
    }
}
