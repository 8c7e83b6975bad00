//! Opaque list cursors: the store's last-evaluated key as a URL-escaped JSON
//! object of strings.

use crate::clients::StartKey;

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("cursor is not valid URL encoding")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("cursor is not a JSON object of strings")]
    Format(#[from] serde_json::Error),
}

pub fn encode_cursor(key: &StartKey) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(key)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// Accepts both escaped and already unescaped cursors, since API Gateway
/// decodes query parameters once before the handler sees them.
pub fn decode_cursor(cursor: &str) -> Result<StartKey, CursorError> {
    let json = urlencoding::decode(cursor)?;
    Ok(serde_json::from_str(&json)?)
}
