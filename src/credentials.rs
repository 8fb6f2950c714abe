use crate::{gcs::util::RequestContext, Error};
use std::{path::Path, time::Duration};
use tame_oauth::gcp::{self, TokenProvider as _};

/// The service account key compiled into the binary. The checked in
/// `assets/key.json` is a placeholder, see `assets/README.md`.
pub const EMBEDDED_KEY: &[u8] = include_bytes!("../assets/key.json");

/// Full read/write control over GCS
pub const FULL_CONTROL: &[&str] = &["https://www.googleapis.com/auth/devstorage.full_control"];

/// Where the service account key comes from
#[derive(Debug, Clone)]
pub enum KeySource<'p> {
    Embedded,
    File(&'p Path),
}

impl KeySource<'_> {
    pub fn read(&self) -> Result<Vec<u8>, Error> {
        match self {
            Self::Embedded => Ok(EMBEDDED_KEY.to_vec()),
            Self::File(path) => std::fs::read(path).map_err(|err| {
                Error::Credential(format!("failed to read key {}: {err}", path.display()))
            }),
        }
    }

    /// Reads and parses the key. The bundled key is a placeholder until it is
    /// replaced at build time, so a failure to parse it points at the override.
    pub fn provider(&self) -> Result<gcp::ServiceAccountProvider, Error> {
        self.parse(&self.read()?)
    }

    fn parse(&self, key: &[u8]) -> Result<gcp::ServiceAccountProvider, Error> {
        match (self, service_account(key)) {
            (Self::Embedded, Err(Error::Credential(msg))) => Err(Error::Credential(format!(
                "{msg}; the bundled key is only a placeholder unless assets/key.json was \
                 replaced before building, pass --key-file or set GCSCLI_KEY_FILE"
            ))),
            (_, res) => res,
        }
    }
}

/// Parses a JSON service account key
pub fn service_account(key: &[u8]) -> Result<gcp::ServiceAccountProvider, Error> {
    let info = gcp::ServiceAccountInfo::deserialize(key)
        .map_err(|err| Error::Credential(format!("failed to parse service account key: {err}")))?;

    gcp::ServiceAccountProvider::new(info)
        .map_err(|err| Error::Credential(format!("invalid service account key: {err}")))
}

/// Exchanges the service account's credentials for a bearer token usable as
/// an `Authorization` header
pub async fn get_bearer_token(
    tp: &gcp::ServiceAccountProvider,
    client: &reqwest::Client,
    scopes: &[&str],
) -> Result<http::header::HeaderValue, Error> {
    let cred_err = |what: &str, err: &dyn std::fmt::Display| Error::Credential(format!("{what}: {err}"));

    match tp
        .get_token(scopes)
        .map_err(|err| cred_err("failed to make token request", &err))?
    {
        gcp::TokenOrRequest::Token(tok) => tok
            .try_into()
            .map_err(|err| cred_err("failed to convert token to header value", &err)),
        gcp::TokenOrRequest::Request {
            request,
            scope_hash,
            ..
        } => {
            let (parts, body) = request.into_parts();
            let uri = parts.uri.to_string();

            tracing::debug!(%uri, "requesting access token");

            // The token exchange is always a POST
            let res = client
                .post(&uri)
                .headers(parts.headers)
                .body(body)
                .send()
                .await
                .map_err(|err| cred_err("failed to send token request", &err))?;

            let code = res.status();

            let mut builder = http::Response::builder()
                .status(code)
                .version(res.version());

            if let Some(headers) = builder.headers_mut() {
                headers.extend(
                    res.headers()
                        .into_iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }

            let buffer = res
                .bytes()
                .await
                .map_err(|err| cred_err("failed to read token response", &err))?;

            if !code.is_success() {
                return Err(match String::from_utf8(buffer.into()) {
                    Ok(err_str) => Error::Credential(err_str),
                    Err(_) => Error::Credential(format!("failed to retrieve error for {code}")),
                });
            }

            let response = builder
                .body(buffer)
                .map_err(|err| cred_err("failed to build token response", &err))?;

            tp.parse_token_response(scope_hash, response)
                .map_err(|err| cred_err("failed to parse token response", &err))?
                .try_into()
                .map_err(|err| cred_err("failed to convert token to header value", &err))
        }
    }
}

/// Builds an authenticated storage client for a service account.
/// The token exchange is the only network call and is bounded by `deadline`.
pub async fn connect(
    tp: &gcp::ServiceAccountProvider,
    scopes: &[&str],
    deadline: Duration,
) -> Result<RequestContext, Error> {
    let auth_token = tokio::time::timeout(
        deadline,
        get_bearer_token(tp, &reqwest::Client::new(), scopes),
    )
    .await
    .map_err(|_elapsed| Error::Timeout {
        operation: "token exchange",
        deadline,
    })??;

    tracing::debug!("obtained access token");

    let hm = {
        let mut hm = reqwest::header::HeaderMap::new();
        hm.insert(http::header::AUTHORIZATION, auth_token);
        hm
    };

    let client = reqwest::Client::builder()
        .default_headers(hm)
        .build()
        .map_err(|err| Error::Credential(format!("failed to build client: {err}")))?;

    Ok(RequestContext::new(client))
}
