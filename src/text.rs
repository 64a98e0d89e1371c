//! Decoders for the three textual chunk types: tEXt, zTXt and iTXt.
//!
//! zlib-compressed payloads are not inflated. They come back as
//! [`TextValue::Compressed`] so they cannot be mistaken for decoded text.

use crate::chunk::{Chunk, ChunkType};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

const MAX_KEYWORD_LENGTH: usize = 79;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("Expected {expected} chunk")]
    WrongType {
        expected: ChunkType,
        found: ChunkType,
    },

    #[error("Invalid {0} chunk format")]
    InvalidFormat(ChunkType),

    #[error("Invalid {chunk} keyword length")]
    KeywordLength { chunk: ChunkType, length: usize },

    #[error("Invalid {0} keyword characters")]
    KeywordCharacters(ChunkType),

    #[error("Unsupported compression method in {chunk} chunk")]
    UnsupportedCompression { chunk: ChunkType, method: u8 },

    #[error("iTXt chunk too short")]
    TooShort(usize),

    #[error("Invalid iTXt chunk: {0} not terminated")]
    Unterminated(ItxtField),

    #[error("Invalid iTXt chunk: missing compression flag")]
    MissingCompressionFlag,

    #[error("Invalid iTXt chunk: missing compression method")]
    MissingCompressionMethod,

    #[error("Invalid compression flag in iTXt chunk")]
    InvalidCompressionFlag(u8),
}

/// The NUL-terminated fields of an iTXt chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItxtField {
    Keyword,
    LanguageTag,
    TranslatedKeyword,
}

impl fmt::Display for ItxtField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItxtField::Keyword => "keyword",
            ItxtField::LanguageTag => "language tag",
            ItxtField::TranslatedKeyword => "translated keyword",
        })
    }
}

/// Which chunk type a text entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextChunkKind {
    Text,
    CompressedText,
    InternationalText,
}

impl TextChunkKind {
    pub fn chunk_type(self) -> ChunkType {
        match self {
            TextChunkKind::Text => ChunkType::tEXt,
            TextChunkKind::CompressedText => ChunkType::zTXt,
            TextChunkKind::InternationalText => ChunkType::iTXt,
        }
    }
}

impl Serialize for TextChunkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.chunk_type().serialize(serializer)
    }
}

/// Text content of a text chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextValue {
    /// Decoded as UTF-8, or Latin-1 when the bytes are not valid UTF-8.
    Decoded(String),
    /// A zlib stream that was not inflated.
    Compressed(Vec<u8>),
}

impl TextValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TextValue::Decoded(s) => Some(s),
            TextValue::Compressed(_) => None,
        }
    }
}

impl fmt::Display for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextValue::Decoded(s) => f.write_str(s),
            TextValue::Compressed(bytes) => write!(f, "[zlib data, {} bytes]", bytes.len()),
        }
    }
}

impl Serialize for TextValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TextValue::Decoded(s) => serializer.serialize_str(s),
            TextValue::Compressed(bytes) => {
                let mut state = serializer.serialize_struct("CompressedText", 2)?;
                state.serialize_field("encoding", "zlib")?;
                state.serialize_field("compressedLength", &bytes.len())?;
                state.end()
            }
        }
    }
}

/// One keyword/text pair from a tEXt, zTXt or iTXt chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetadata {
    pub keyword: String,
    pub text: TextValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_keyword: Option<String>,
    pub compressed: bool,
    #[serde(rename = "chunkType")]
    pub kind: TextChunkKind,
}

/// Decode a tEXt chunk: `keyword NUL text`.
pub fn extract_text_metadata(chunk: &Chunk<'_>) -> Result<TextMetadata, TextError> {
    expect_type(chunk, ChunkType::tEXt)?;

    let (keyword, text) = split_keyword(chunk.data, ChunkType::tEXt)?;
    let keyword = validate_keyword(keyword, ChunkType::tEXt)?;

    Ok(TextMetadata {
        keyword,
        text: TextValue::Decoded(decode_text(text)),
        language_tag: None,
        translated_keyword: None,
        compressed: false,
        kind: TextChunkKind::Text,
    })
}

/// Decode a zTXt chunk: `keyword NUL method zlib-data`.
pub fn extract_compressed_text_metadata(chunk: &Chunk<'_>) -> Result<TextMetadata, TextError> {
    expect_type(chunk, ChunkType::zTXt)?;

    let (keyword, rest) = split_keyword(chunk.data, ChunkType::zTXt)?;
    let keyword = validate_keyword(keyword, ChunkType::zTXt)?;

    // split_keyword leaves at least one byte after the separator.
    let method = rest[0];
    if method != 0 {
        return Err(TextError::UnsupportedCompression {
            chunk: ChunkType::zTXt,
            method,
        });
    }
    log::debug!("zTXt {keyword:?}: leaving {} bytes compressed", rest.len() - 1);

    Ok(TextMetadata {
        keyword,
        text: TextValue::Compressed(rest[1..].to_vec()),
        language_tag: None,
        translated_keyword: None,
        compressed: true,
        kind: TextChunkKind::CompressedText,
    })
}

/// Decode an iTXt chunk:
///
/// ```text
/// keyword NUL flag method language-tag NUL translated-keyword NUL text
/// ```
pub fn extract_international_text_metadata(chunk: &Chunk<'_>) -> Result<TextMetadata, TextError> {
    expect_type(chunk, ChunkType::iTXt)?;

    let data = chunk.data;
    if data.len() < 5 {
        return Err(TextError::TooShort(data.len()));
    }

    let (keyword, rest) =
        split_at_nul(data).ok_or(TextError::Unterminated(ItxtField::Keyword))?;
    let keyword = validate_keyword(keyword, ChunkType::iTXt)?;

    let (&flag, rest) = rest
        .split_first()
        .ok_or(TextError::MissingCompressionFlag)?;
    let compressed = match flag {
        0 => false,
        1 => true,
        other => return Err(TextError::InvalidCompressionFlag(other)),
    };

    let (&method, rest) = rest
        .split_first()
        .ok_or(TextError::MissingCompressionMethod)?;
    if compressed && method != 0 {
        return Err(TextError::UnsupportedCompression {
            chunk: ChunkType::iTXt,
            method,
        });
    }

    let (language_tag, rest) =
        split_at_nul(rest).ok_or(TextError::Unterminated(ItxtField::LanguageTag))?;
    let (translated_keyword, text) =
        split_at_nul(rest).ok_or(TextError::Unterminated(ItxtField::TranslatedKeyword))?;

    let text = if compressed {
        TextValue::Compressed(text.to_vec())
    } else {
        TextValue::Decoded(decode_text(text))
    };

    Ok(TextMetadata {
        keyword,
        text,
        language_tag: non_empty(decode_text(language_tag)),
        translated_keyword: non_empty(decode_text(translated_keyword)),
        compressed,
        kind: TextChunkKind::InternationalText,
    })
}

fn expect_type(chunk: &Chunk<'_>, expected: ChunkType) -> Result<(), TextError> {
    if chunk.chunk_type == expected {
        Ok(())
    } else {
        Err(TextError::WrongType {
            expected,
            found: chunk.chunk_type,
        })
    }
}

/// Split at the first NUL, returning the bytes on either side.
fn split_at_nul(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = memchr::memchr(0, data)?;
    Some((&data[..pos], &data[pos + 1..]))
}

/// Split `keyword NUL rest`, requiring a non-empty rest.
fn split_keyword(data: &[u8], chunk: ChunkType) -> Result<(&[u8], &[u8]), TextError> {
    match split_at_nul(data) {
        Some((keyword, rest)) if !rest.is_empty() => Ok((keyword, rest)),
        _ => Err(TextError::InvalidFormat(chunk)),
    }
}

/// Keywords are 1-79 printable ASCII characters.
fn validate_keyword(keyword: &[u8], chunk: ChunkType) -> Result<String, TextError> {
    if keyword.is_empty() || keyword.len() > MAX_KEYWORD_LENGTH {
        return Err(TextError::KeywordLength {
            chunk,
            length: keyword.len(),
        });
    }
    if !keyword.iter().all(|&b| (0x20..=0x7e).contains(&b)) {
        return Err(TextError::KeywordCharacters(chunk));
    }
    Ok(keyword.iter().map(|&b| b as char).collect())
}

/// UTF-8 if the bytes are valid UTF-8, Latin-1 otherwise.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::read_chunk;
    use crate::test_support::png_chunk;
    use assert_matches::assert_matches;

    fn with_chunk<T>(chunk_type: &[u8; 4], data: &[u8], f: impl FnOnce(&Chunk<'_>) -> T) -> T {
        let buf = png_chunk(chunk_type, data);
        let (chunk, _) = read_chunk(&buf, 0).unwrap();
        f(&chunk)
    }

    fn text(data: &[u8]) -> Result<TextMetadata, TextError> {
        with_chunk(b"tEXt", data, extract_text_metadata)
    }

    fn ztxt(data: &[u8]) -> Result<TextMetadata, TextError> {
        with_chunk(b"zTXt", data, extract_compressed_text_metadata)
    }

    fn itxt(data: &[u8]) -> Result<TextMetadata, TextError> {
        with_chunk(b"iTXt", data, extract_international_text_metadata)
    }

    #[test]
    fn test_text_round_trip() {
        let cases: &[(&str, &str)] = &[
            ("Title", "Abstract watercolors"),
            ("A", "x"),
            ("Comment", "multi\nline, with \"quotes\""),
            ("Description", "日本語のテキスト"),
            ("Software", "émoji 🎨"),
        ];
        for &(keyword, body) in cases {
            let mut data = keyword.as_bytes().to_vec();
            data.push(0);
            data.extend_from_slice(body.as_bytes());
            let meta = text(&data).unwrap();
            assert_eq!(meta.keyword, keyword);
            assert_eq!(meta.text, TextValue::Decoded(body.to_string()));
            assert_eq!(meta.language_tag, None);
            assert_eq!(meta.translated_keyword, None);
            assert!(!meta.compressed);
            assert_eq!(meta.kind, TextChunkKind::Text);
        }

        let longest = "k".repeat(79);
        let meta = text(format!("{longest}\0v").as_bytes()).unwrap();
        assert_eq!(meta.keyword, longest);
    }

    #[test]
    fn test_text_latin1_fallback() {
        let meta = text(b"Author\0Ren\xe9e").unwrap();
        assert_eq!(meta.text.as_str(), Some("Renée"));
    }

    #[test]
    fn test_text_second_nul_is_part_of_text() {
        let meta = text(b"Key\0one\0two").unwrap();
        assert_eq!(meta.text.as_str(), Some("one\0two"));
    }

    #[test]
    fn test_text_format_errors() {
        let err = text(b"no separator").unwrap_err();
        assert_matches!(err, TextError::InvalidFormat(ChunkType::tEXt));
        assert_eq!(err.to_string(), "Invalid tEXt chunk format");

        assert_matches!(text(b"Empty\0"), Err(TextError::InvalidFormat(_)));
        assert_matches!(text(b""), Err(TextError::InvalidFormat(_)));
    }

    #[test]
    fn test_text_keyword_errors() {
        let err = text(b"\0text").unwrap_err();
        assert_matches!(err, TextError::KeywordLength { length: 0, .. });
        assert_eq!(err.to_string(), "Invalid tEXt keyword length");

        let long = format!("{}\0text", "k".repeat(80));
        assert_matches!(
            text(long.as_bytes()),
            Err(TextError::KeywordLength { length: 80, .. })
        );

        let err = text(b"Bad\x01Key\0text").unwrap_err();
        assert_matches!(err, TextError::KeywordCharacters(ChunkType::tEXt));
        assert_eq!(err.to_string(), "Invalid tEXt keyword characters");

        assert_matches!(text(b"Caf\xe9\0text"), Err(TextError::KeywordCharacters(_)));
        assert_matches!(text(b"Del\x7f\0text"), Err(TextError::KeywordCharacters(_)));
    }

    #[test]
    fn test_wrong_chunk_type() {
        let err = with_chunk(b"zTXt", b"Title\0x", extract_text_metadata).unwrap_err();
        assert_eq!(err.to_string(), "Expected tEXt chunk");
        let err = with_chunk(b"tEXt", b"Title\0x", extract_compressed_text_metadata).unwrap_err();
        assert_eq!(err.to_string(), "Expected zTXt chunk");
        let err = with_chunk(b"tEXt", b"Title\0\0\0\0\0x", extract_international_text_metadata)
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected iTXt chunk");
    }

    #[test]
    fn test_ztxt() {
        let meta = ztxt(b"Comment\0\0\x78\x9c\x01\x02").unwrap();
        assert_eq!(meta.keyword, "Comment");
        assert!(meta.compressed);
        assert_eq!(meta.kind, TextChunkKind::CompressedText);
        assert_eq!(meta.text, TextValue::Compressed(vec![0x78, 0x9c, 0x01, 0x02]));
        assert_eq!(meta.text.as_str(), None);
        assert_eq!(meta.text.to_string(), "[zlib data, 4 bytes]");
    }

    #[test]
    fn test_ztxt_errors() {
        let err = ztxt(b"Comment\0\x01data").unwrap_err();
        assert_matches!(
            err,
            TextError::UnsupportedCompression {
                chunk: ChunkType::zTXt,
                method: 1
            }
        );
        assert_eq!(err.to_string(), "Unsupported compression method in zTXt chunk");

        assert_matches!(ztxt(b"Comment"), Err(TextError::InvalidFormat(ChunkType::zTXt)));
        assert_matches!(ztxt(b"Comment\0"), Err(TextError::InvalidFormat(_)));
        assert_matches!(ztxt(b"\0\0data"), Err(TextError::KeywordLength { .. }));
        assert_matches!(ztxt(b"a\tb\0\0data"), Err(TextError::KeywordCharacters(_)));
    }

    #[test]
    fn test_itxt_uncompressed() {
        let mut data = b"Description\0\0\0ja\0".to_vec();
        data.extend_from_slice("説明".as_bytes());
        data.push(0);
        data.extend_from_slice("三色の縞".as_bytes());
        let meta = itxt(&data).unwrap();
        assert_eq!(meta.keyword, "Description");
        assert_eq!(meta.text.as_str(), Some("三色の縞"));
        assert_eq!(meta.language_tag.as_deref(), Some("ja"));
        assert_eq!(meta.translated_keyword.as_deref(), Some("説明"));
        assert!(!meta.compressed);
        assert_eq!(meta.kind, TextChunkKind::InternationalText);
    }

    #[test]
    fn test_itxt_empty_optional_fields() {
        let meta = itxt(b"Title\0\0\0\0\0Hello").unwrap();
        assert_eq!(meta.language_tag, None);
        assert_eq!(meta.translated_keyword, None);
        assert_eq!(meta.text.as_str(), Some("Hello"));

        let meta = itxt(b"Title\0\0\0\0\0").unwrap();
        assert_eq!(meta.text.as_str(), Some(""));
    }

    #[test]
    fn test_itxt_compressed() {
        let meta = itxt(b"Title\0\x01\0en\0\0\x78\x9c").unwrap();
        assert!(meta.compressed);
        assert_eq!(meta.text, TextValue::Compressed(vec![0x78, 0x9c]));
        assert_eq!(meta.language_tag.as_deref(), Some("en"));
    }

    #[test]
    fn test_itxt_method_ignored_when_uncompressed() {
        let meta = itxt(b"Title\0\0\x07\0\0plain").unwrap();
        assert_eq!(meta.text.as_str(), Some("plain"));
    }

    #[test]
    fn test_itxt_errors() {
        assert_matches!(itxt(b"abcd"), Err(TextError::TooShort(4)));

        let err = itxt(b"Title without nul").unwrap_err();
        assert_matches!(err, TextError::Unterminated(ItxtField::Keyword));
        assert_eq!(err.to_string(), "Invalid iTXt chunk: keyword not terminated");

        assert_matches!(itxt(b"Title\0"), Err(TextError::MissingCompressionFlag));
        assert_matches!(itxt(b"Titles\0\0"), Err(TextError::MissingCompressionMethod));
        assert_matches!(itxt(b"Title\0\x02\0\0\0x"), Err(TextError::InvalidCompressionFlag(2)));
        assert_matches!(
            itxt(b"Title\0\x01\x05\0\0x"),
            Err(TextError::UnsupportedCompression { method: 5, .. })
        );

        let err = itxt(b"Title\0\0\0en").unwrap_err();
        assert_matches!(err, TextError::Unterminated(ItxtField::LanguageTag));
        assert_eq!(err.to_string(), "Invalid iTXt chunk: language tag not terminated");

        let err = itxt(b"Title\0\0\0en\0Titel").unwrap_err();
        assert_matches!(err, TextError::Unterminated(ItxtField::TranslatedKeyword));

        assert_matches!(itxt(b"\0\0\0\0\0"), Err(TextError::KeywordLength { .. }));
        assert_matches!(itxt(b"T\x1bE\0\0\0\0\0"), Err(TextError::KeywordCharacters(_)));
    }

    #[test]
    fn test_serialize() {
        let meta = text(b"Title\0Hello").unwrap();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "keyword": "Title",
                "text": "Hello",
                "compressed": false,
                "chunkType": "tEXt",
            })
        );

        let meta = ztxt(b"Comment\0\0abc").unwrap();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["text"]["compressedLength"], 3);
        assert_eq!(json["chunkType"], "zTXt");
    }
}
