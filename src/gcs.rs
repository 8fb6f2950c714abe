pub mod get;
pub mod upload;
pub mod util;

use crate::credentials::KeySource;
use std::{fmt, time::Duration};
use tame_gcs::objects::Metadata;

/// The bucket `get` looks in when none is given
pub const DEFAULT_BUCKET: &str = "prod-eu-zimvest";
/// Upper bound for exchanging the service account key for an access token
pub const TOKEN_DEADLINE: Duration = Duration::from_secs(30);
/// Upper bound for streaming a file to GCS
pub const UPLOAD_DEADLINE: Duration = Duration::from_secs(50);
/// Upper bound for a metadata query
pub const FETCH_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Performs GCS operations
#[derive(clap::Subcommand)]
pub enum Args {
    Upload(upload::Args),
    Get(get::Args),
}

/// The subset of an object's metadata the tool reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttributes {
    pub name: String,
    pub content_type: Option<String>,
    pub updated: Option<time::OffsetDateTime>,
    pub storage_class: Option<String>,
    pub size: Option<u64>,
}

impl From<Metadata> for ObjectAttributes {
    fn from(md: Metadata) -> Self {
        // The storage class is only exposed as an enum, its serialized form is
        // the name GCS itself uses, eg. `STANDARD`
        let storage_class = md.storage_class.and_then(|sc| {
            serde_json::to_value(sc)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
        });

        Self {
            name: md.name.unwrap_or_default(),
            content_type: md.content_type,
            updated: md.updated,
            storage_class,
            size: md.size,
        }
    }
}

impl fmt::Display for ObjectAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_unknown = |s: &Option<String>| s.clone().unwrap_or_else(|| "unknown".to_owned());

        let updated = self
            .updated
            .and_then(|ts| {
                ts.format(&time::format_description::well_known::Rfc3339)
                    .ok()
            })
            .unwrap_or_else(|| "unknown".to_owned());

        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Content-Type: {}", or_unknown(&self.content_type))?;
        writeln!(f, "Last Modified: {updated}")?;
        write!(f, "Storage Class: {}", or_unknown(&self.storage_class))
    }
}

pub async fn run(args: Args, key: KeySource<'_>) -> anyhow::Result<()> {
    match args {
        Args::Upload(upload) => upload::run(upload, key).await?,
        Args::Get(get) => get::run(get, key).await?,
    }

    Ok(())
}
