//! Request encoding and response decoding for the Play Store reviews RPC.
//!
//! The Play Store web client fetches reviews through the `batchexecute`
//! endpoint with rpc id `UsvDTd`. Requests carry a JSON-in-JSON `f.req`
//! form field; responses are an anti-XSSI prefix followed by a JSON envelope
//! whose third element is itself a JSON string holding the review page.

use serde_json::Value;

use crate::error::SentimentError;

pub(super) const RPC_ID: &str = "UsvDTd";

/// Sort order code for "newest first".
const SORT_NEWEST: u8 = 2;

/// Index of the review body inside one review entry.
const REVIEW_TEXT_INDEX: usize = 4;

const XSSI_PREFIX: &str = ")]}'";

/// One decoded page of reviews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ReviewPage {
    /// Review bodies in page order. Entries without a body are skipped.
    pub(super) texts: Vec<String>,
    /// Number of review entries on the page, including skipped ones.
    pub(super) entries: usize,
    pub(super) next_token: Option<String>,
}

/// Whether `app_id` looks like an Android package name
/// (`segment(.segment)+`, each segment `[A-Za-z][A-Za-z0-9_]*`).
pub(super) fn is_valid_app_id(app_id: &str) -> bool {
    let mut segments = 0usize;
    for segment in app_id.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Build the `f.req` form value requesting `count` reviews of `app_id`.
///
/// `token` continues from a previous page. Score and device filters are
/// left unset.
pub(super) fn build_request_body(app_id: &str, count: usize, token: Option<&str>) -> String {
    let token_json = token.map_or_else(|| "null".to_string(), |t| Value::from(t).to_string());
    let app_json = Value::from(app_id).to_string();
    let inner = format!(
        "[null,null,[2,{SORT_NEWEST},[{count},null,{token_json}],null,\
         [null,null,null,null,null,null,null,null,null]],[{app_json},7]]"
    );
    serde_json::json!([[[RPC_ID, inner, null, "generic"]]]).to_string()
}

/// Decode one `batchexecute` response body.
///
/// Returns `Ok(None)` when the envelope carries no payload, which is how the
/// Play Store answers for unknown apps and for pages past the end.
///
/// # Errors
///
/// Returns [`SentimentError::MalformedResponse`] when the body does not have
/// the expected envelope, or [`SentimentError::Deserialize`] when a JSON
/// layer does not parse.
pub(super) fn parse_review_page(body: &str) -> Result<Option<ReviewPage>, SentimentError> {
    let json = body
        .trim_start()
        .strip_prefix(XSSI_PREFIX)
        .ok_or_else(|| malformed("response is missing the anti-XSSI prefix"))?;

    let envelope: Value =
        serde_json::from_str(json.trim()).map_err(|e| SentimentError::Deserialize {
            context: "batchexecute envelope".to_string(),
            source: e,
        })?;

    let frame = envelope
        .as_array()
        .and_then(|frames| {
            frames.iter().find(|frame| {
                frame.get(0).and_then(Value::as_str) == Some("wrb.fr")
                    && frame.get(1).and_then(Value::as_str) == Some(RPC_ID)
            })
        })
        .ok_or_else(|| malformed("no UsvDTd frame in envelope"))?;

    let Some(payload) = frame.get(2).and_then(Value::as_str) else {
        return Ok(None);
    };

    let payload: Value = serde_json::from_str(payload).map_err(|e| SentimentError::Deserialize {
        context: "review page payload".to_string(),
        source: e,
    })?;
    let Some(sections) = payload.as_array() else {
        return Ok(None);
    };

    let entries = sections
        .first()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let texts = entries
        .iter()
        .filter_map(|entry| entry.get(REVIEW_TEXT_INDEX).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    // The continuation token is the last element of the second-to-last
    // section. Anything other than a string there means "no more pages".
    let next_token = sections
        .len()
        .checked_sub(2)
        .and_then(|idx| sections[idx].as_array())
        .and_then(|section| section.last())
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Some(ReviewPage {
        texts,
        entries: entries.len(),
        next_token,
    }))
}

fn malformed(reason: &str) -> SentimentError {
    SentimentError::MalformedResponse {
        context: "review page".to_string(),
        reason: reason.to_string(),
    }
}
