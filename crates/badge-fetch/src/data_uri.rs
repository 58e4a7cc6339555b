//! RFC 2397 `data:` URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use percent_encoding::percent_decode_str;

const DEFAULT_MEDIA_TYPE: &str = "text/plain;charset=US-ASCII";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataUri {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

pub(crate) fn is_data_uri(uri: &str) -> bool {
    uri.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Decode `data:[<mediatype>][;base64],<data>`.
pub(crate) fn parse(uri: &str) -> Result<DataUri, String> {
    if !is_data_uri(uri) {
        return Err("not a data URI".into());
    }
    let (meta, data) = uri[5..]
        .split_once(',')
        .ok_or_else(|| "data URI has no `,` separator".to_string())?;

    let mut params: Vec<&str> = meta.split(';').map(str::trim).collect();
    let base64 = params
        .last()
        .is_some_and(|p| p.eq_ignore_ascii_case("base64"));
    if base64 {
        params.pop();
    }

    let media_type = match params.first() {
        Some(t) if t.contains('/') => params.join(";"),
        _ => DEFAULT_MEDIA_TYPE.to_string(),
    };

    let decoded: Vec<u8> = percent_decode_str(data).collect();
    let bytes = if base64 {
        let compact: Vec<u8> = decoded.into_iter().filter(|b| !b.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| format!("invalid base64 payload: {e}"))?
    } else {
        decoded
    };

    Ok(DataUri { media_type, bytes })
}
