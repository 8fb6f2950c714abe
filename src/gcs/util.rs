use anyhow::Context as _;
use tame_gcs::{self as tgcs, http};

/// Converts the head of a vanilla `http::Request` plus a body into a
/// `reqwest::Request`. The body built by `tame-gcs` is ignored so callers can
/// supply a streaming one.
fn convert_request(
    parts: http::request::Parts,
    body: reqwest::Body,
    client: &reqwest::Client,
) -> anyhow::Result<reqwest::Request> {
    let uri = parts.uri.to_string();

    Ok(client
        .request(parts.method, &uri)
        .headers(parts.headers)
        .body(body)
        .build()?)
}

/// Converts a `reqwest::Response` into a vanilla `http::Response`. This currently copies
/// the entire response body into a single buffer with no streaming
async fn convert_response(res: reqwest::Response) -> anyhow::Result<http::Response<bytes::Bytes>> {
    let mut builder = http::Response::builder()
        .status(res.status())
        .version(res.version());

    let headers = builder
        .headers_mut()
        .context("failed to convert response headers")?;

    headers.extend(
        res.headers()
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    let content_len = tame_gcs::util::get_content_length(headers).unwrap_or_default();
    let mut buffer = bytes::BytesMut::with_capacity(content_len);

    let mut stream = res.bytes_stream();

    use bytes::BufMut;
    use futures_util::StreamExt;

    while let Some(item) = stream.next().await {
        buffer.put(item?);
    }

    Ok(builder.body(buffer.freeze())?)
}

/// An authenticated client plus the GCS request builder
#[derive(Clone)]
pub struct RequestContext {
    pub client: reqwest::Client,
    pub obj: tgcs::objects::Object,
}

impl RequestContext {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            obj: tgcs::objects::Object::default(),
        }
    }
}

/// Sends a GCS request with the given body and returns the raw response. Non
/// success statuses are _not_ treated as errors here, callers decide which
/// statuses are expected outcomes.
pub async fn send<B>(
    ctx: &RequestContext,
    req: http::Request<B>,
    body: reqwest::Body,
) -> anyhow::Result<http::Response<bytes::Bytes>> {
    let (parts, _) = req.into_parts();
    let method = parts.method.clone();

    let request = convert_request(parts, body, &ctx.client)?;
    tracing::debug!(%method, url = %request.url(), "sending request");

    let response = ctx
        .client
        .execute(request)
        .await
        .context("failed to send request")?;
    tracing::debug!(status = %response.status(), "received response");

    convert_response(response)
        .await
        .context("failed to convert response")
}

/// Describes a failed response, preferring the API's own error message
pub fn error_message<R>(res: http::Response<bytes::Bytes>) -> String
where
    R: tgcs::ApiResponse<bytes::Bytes>,
{
    let status = res.status();

    match res
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|hv| hv.to_str().ok())
    {
        Some(ct) if ct.starts_with("text/plain") => format!(
            "HTTP status: {status} -> {}",
            std::str::from_utf8(res.body()).unwrap_or("text/plain body was not utf8")
        ),
        _ => match R::try_from_parts(res) {
            Err(err) => format!("HTTP status: {status} -> {err}"),
            Ok(_) => format!("HTTP status: {status}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: &str, body: &'static str) -> http::Response<bytes::Bytes> {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(bytes::Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test]
    fn plain_text_errors_use_body() {
        let msg = error_message::<tgcs::objects::GetObjectResponse>(response(
            503,
            "text/plain; charset=utf-8",
            "backend unavailable",
        ));

        assert!(msg.contains("503"), "{msg}");
        assert!(msg.contains("backend unavailable"), "{msg}");
    }

    #[test]
    fn json_errors_include_status() {
        let msg = error_message::<tgcs::objects::GetObjectResponse>(response(
            403,
            "application/json; charset=UTF-8",
            r#"{"error":{"code":403,"message":"caller does not have storage.objects.get access","errors":[]}}"#,
        ));

        assert!(msg.contains("403"), "{msg}");
    }
}
