use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// A saved page snapshot decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("snapshot is not valid {encoding}")]
    Malformed { encoding: String },
}

/// Decode snapshot bytes: BOM first, then an explicit charset hint, then
/// chardetng detection.
pub fn decode_snapshot(
    bytes: &[u8],
    charset_hint: Option<&str>,
) -> Result<DecodedSnapshot, DecodeError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            charset_hint.and_then(|label| Encoding::for_label(charset_of(label).as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors && actual == encoding_rs::UTF_8 && encoding == encoding_rs::UTF_8 {
        return Err(DecodeError::Malformed {
            encoding: actual.name().to_string(),
        });
    }
    Ok(DecodedSnapshot {
        html: text.into_owned(),
        encoding_label: actual.name().to_string(),
    })
}

/// Accepts either a bare label (`utf-8`) or a content-type value
/// (`text/html; charset=utf-8`).
fn charset_of(hint: &str) -> &str {
    hint.split(';')
        .map(str::trim)
        .find_map(|part| {
            part.split_once('=')
                .filter(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
                .map(|(_, value)| value.trim().trim_matches('"'))
        })
        .unwrap_or_else(|| hint.trim())
}
