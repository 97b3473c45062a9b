//! Three-stage decode of the `appmsgpublish` response.
//!
//! The envelope carries `publish_page` as a JSON string; that page carries a
//! list of entries whose `publish_info` is itself a JSON string holding the
//! articles. Each stage is decoded separately so a bad entry only drops that
//! entry.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::FetchError;
use crate::types::RawArticle;

/// `err_msg` values meaning the session is no longer usable.
const AUTH_ERROR_MESSAGES: [&str; 3] = ["invalid session", "invalid csrf token", "not login"];

// ---------------------------------------------------------------------------
// Stage types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub(crate) base_resp: Option<BaseResp>,
    #[serde(default)]
    pub(crate) publish_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BaseResp {
    #[serde(default)]
    pub(crate) ret: Option<i64>,
    #[serde(default)]
    pub(crate) err_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishPage {
    #[serde(default)]
    pub(crate) publish_list: Vec<PublishEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishEntry {
    #[serde(default)]
    pub(crate) publish_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishInfo {
    #[serde(default)]
    pub(crate) appmsgex: Vec<AppMsg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppMsg {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) link: Option<String>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub(crate) create_time: Option<i64>,
}

fn epoch_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Stage 1: the outer envelope and its status.
pub(crate) fn decode_envelope(body: &str, context: &str) -> Result<Envelope, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(context, format!("response is not JSON: {e}")))?;

    if let Some(base) = &envelope.base_resp {
        match base.err_msg.as_deref().map(str::trim) {
            Some(msg) if !msg.eq_ignore_ascii_case("ok") => {
                let lower = msg.to_lowercase();
                return Err(if AUTH_ERROR_MESSAGES.contains(&lower.as_str()) {
                    FetchError::auth(context, msg)
                } else {
                    FetchError::malformed(context, format!("API error: {msg}"))
                });
            }
            None if base.ret.is_some_and(|r| r != 0) => {
                return Err(FetchError::malformed(
                    context,
                    format!("API error: ret={}", base.ret.unwrap_or_default()),
                ));
            }
            _ => {}
        }
    }

    Ok(envelope)
}

/// Stage 2: the publish page string.
pub(crate) fn decode_publish_page(raw: &str) -> Result<PublishPage, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Stage 3: one entry's publish info string.
pub(crate) fn decode_publish_info(raw: &str) -> Result<PublishInfo, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Run all stages and flatten to raw articles in source order.
///
/// Articles without both a link and a title are dropped.
pub(crate) fn extract_articles(body: &str, context: &str) -> Result<Vec<RawArticle>, FetchError> {
    let envelope = decode_envelope(body, context)?;

    let page_raw = envelope
        .publish_page
        .ok_or_else(|| FetchError::malformed(context, "publish_page missing from response"))?;

    let page = decode_publish_page(&page_raw)
        .map_err(|e| FetchError::malformed(context, format!("publish_page undecodable: {e}")))?;

    let mut articles = Vec::new();
    for (index, entry) in page.publish_list.iter().enumerate() {
        let Some(info_raw) = entry.publish_info.as_deref() else {
            continue;
        };
        let info = match decode_publish_info(info_raw) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(
                    account = context,
                    entry = index,
                    error = %e,
                    "skipping undecodable publish entry"
                );
                continue;
            }
        };

        for msg in info.appmsgex {
            if let Some(raw) = to_raw_article(msg) {
                articles.push(raw);
            }
        }
    }

    Ok(articles)
}

fn to_raw_article(msg: AppMsg) -> Option<RawArticle> {
    let title = msg.title.filter(|t| !t.trim().is_empty())?;
    let link = msg.link.filter(|l| !l.trim().is_empty())?;
    Some(RawArticle {
        title: Some(title),
        url: Some(link),
        published_at: msg.create_time.and_then(epoch_to_utc),
    })
}

fn epoch_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
