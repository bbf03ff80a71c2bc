// API client module: a small blocking HTTP client for the IPFS gateway.
// Two calls are exposed, `add` (multipart upload) and `remove`. Response
// bodies are validated here so callers only ever see typed values.

use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::config::AppContext;
use crate::error::{Error, Result};
use crate::removal::{RemovalKind, RemovalTarget};
use crate::walker::FileEntry;

/// Removal calls give up after this long. Uploads have no deadline.
pub const REMOVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Multipart field every file is attached under.
const FILE_FIELD: &str = "file";

/// Blocking client bound to one API base URL and one device id.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    device_id: String,
}

/// One entry of the `data` list returned by `/add`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Size", default, deserialize_with = "string_or_number")]
    pub size: Option<String>,
    #[serde(rename = "ShortUrl", default)]
    pub short_url: Option<String>,
}

/// Body returned by `/block/rm`.
#[derive(Debug, Deserialize)]
struct RemoveResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, device_id: &str) -> Result<Self> {
        // The blocking client defaults to a 30 s total timeout, which would
        // cut off large uploads.
        let client = Client::builder().timeout(None).build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            device_id: device_id.to_string(),
        })
    }

    pub fn from_context(ctx: &AppContext) -> Result<Self> {
        Self::new(&ctx.settings.api_url, &ctx.device_id)
    }

    /// POST all `files` as one multipart request to `/add` and return the
    /// validated `data` entries.
    pub fn add(&self, files: &[FileEntry]) -> Result<Vec<AddEntry>> {
        let url = format!("{}/add", self.base_url);

        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::file(&file.absolute_path)?.file_name(file.transport_name.clone());
            form = form.part(FILE_FIELD, part);
        }

        debug!(%url, files = files.len(), "sending add request");
        let res = self
            .client
            .post(&url)
            .query(&[("uid", self.device_id.as_str()), ("cidV", "1")])
            .multipart(form)
            .send()?;

        let status = res.status();
        let body = res.text()?;
        if !status.is_success() {
            return Err(remote_error(status, &body));
        }
        parse_add_response(&body)
    }

    /// POST a removal request for a hash or a subname.
    pub fn remove(&self, target: &RemovalTarget) -> Result<()> {
        let url = format!("{}/block/rm", self.base_url);
        let key = match target.kind {
            RemovalKind::Hash => "arg",
            RemovalKind::Subname => "subname",
        };

        debug!(%url, %key, value = %target.value, "sending removal request");
        let res = self
            .client
            .post(&url)
            .query(&[("uid", self.device_id.as_str()), (key, target.value.as_str())])
            .timeout(REMOVE_TIMEOUT)
            .send()?;

        let status = res.status();
        let body = res.text()?;
        if !status.is_success() {
            return Err(remote_error(status, &body));
        }

        let parsed: RemoveResponse =
            serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        if parsed.code == 200 {
            Ok(())
        } else {
            Err(Error::Remote {
                status: None,
                code: Some(parsed.code),
                message: parsed
                    .msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Unknown error occurred".to_string()),
            })
        }
    }
}

/// Validate an `/add` body: `data` must be a non-empty list of entries.
pub fn parse_add_response(body: &str) -> Result<Vec<AddEntry>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| Error::InvalidResponse(e.to_string()))?;

    let items = match value.get("data") {
        Some(Value::Array(items)) if !items.is_empty() => items.clone(),
        Some(Value::Array(_)) => return Err(Error::InvalidResponse("empty data list".into())),
        Some(_) => return Err(Error::InvalidResponse("data is not a list".into())),
        None => return Err(Error::InvalidResponse("missing data".into())),
    };

    serde_json::from_value(Value::Array(items)).map_err(|e| Error::InvalidResponse(e.to_string()))
}

/// Build a `Remote` error from a non-success HTTP response.
fn remote_error(status: StatusCode, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|v| v.get("code")).and_then(numeric_code);
    let msg = parsed
        .as_ref()
        .and_then(|v| v.get("msg").or_else(|| v.get("message")))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("Server error");

    Error::Remote {
        status: Some(status.as_u16()),
        code,
        message: format!("HTTP Error {}: {}", status.as_u16(), msg),
    }
}

/// Application codes show up both as numbers and as numeric strings.
fn numeric_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
