//! PNG file format handler
//!
//! This module reads and rewrites the text chunks of a PNG stream. Image data
//! chunks are copied byte for byte; only `tEXt`/`iTXt` chunks are touched.
//!
//! PNG text storage:
//! - `tEXt`: keyword (Latin-1, null-terminated) + Latin-1 text
//! - `iTXt`: keyword (null-terminated) + compression flag + compression method
//!   + language tag (null-terminated) + translated keyword (null-terminated) + UTF-8 text
//! - XMP Packet is stored in an uncompressed iTXt chunk with keyword "XML:com.adobe.xmp"

use crate::core::error::{MetaError, MetaResult};
use crate::utils::bytes::ByteView;

/// PNG file signature
pub const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// XMP keyword in iTXt chunk
pub const XMP_KEYWORD: &str = "XML:com.adobe.xmp";

/// Longest keyword a text chunk may carry, in bytes
const MAX_KEYWORD_LEN: usize = 79;

/// PNG chunk type for tEXt
const CHUNK_TYPE_TEXT: &[u8; 4] = b"tEXt";

/// PNG chunk type for iTXt
const CHUNK_TYPE_ITXT: &[u8; 4] = b"iTXt";

/// PNG chunk type for IEND (end of file)
const CHUNK_TYPE_IEND: &[u8; 4] = b"IEND";

/// Which chunk type a text entry is written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextChunkKind {
    /// `tEXt`, Latin-1
    Latin1,
    /// `iTXt`, uncompressed UTF-8
    International,
}

/// One key/value text entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    /// Chunk keyword
    pub key: String,
    /// Text content
    pub value: String,
    /// Chunk type used when embedding
    pub kind: TextChunkKind,
}

/// A chunk as laid out in the stream
#[derive(Debug, Clone, Copy)]
struct PngChunk<'a> {
    chunk_type: [u8; 4],
    data: &'a [u8],
    /// Length, type, data and CRC exactly as read
    raw: &'a [u8],
}

/// Split a PNG stream into chunks
///
/// Returns the chunks read so far and, when the stream is malformed, why
/// reading stopped. Bytes after `IEND` are returned as the trailer.
fn split_chunks(data: &[u8]) -> (Vec<PngChunk<'_>>, &[u8], Option<String>) {
    let view = ByteView::new(data);
    let mut chunks = Vec::new();
    let mut pos = PNG_SIGNATURE.len();

    loop {
        if pos >= view.len() {
            return (chunks, &[], Some("missing IEND chunk".to_string()));
        }
        let header = view.slice(pos..pos + 8);
        let Some(header) = header else {
            return (chunks, &[], Some(format!("truncated chunk header at offset {pos}")));
        };
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let chunk_type = [header[4], header[5], header[6], header[7]];

        let data_end = pos + 8 + length;
        let (Some(chunk_data), Some(raw)) = (
            view.slice(pos + 8..data_end),
            view.slice(pos..data_end + 4),
        ) else {
            return (
                chunks,
                &[],
                Some(format!(
                    "chunk {} at offset {pos} overruns the stream",
                    String::from_utf8_lossy(&chunk_type)
                )),
            );
        };

        chunks.push(PngChunk {
            chunk_type,
            data: chunk_data,
            raw,
        });
        pos = data_end + 4;

        if chunk_type == *CHUNK_TYPE_IEND {
            let trailer = view.slice(pos..view.len()).unwrap_or(&[]);
            return (chunks, trailer, None);
        }
    }
}

/// Text chunks of a PNG image
///
/// Exposes the entries already stored in a stream, lets callers add or
/// replace entries, and writes them back with [`PngTextChunks::embed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngTextChunks {
    entries: Vec<TextEntry>,
}

impl PngTextChunks {
    /// Create an empty set of text entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the uncompressed text entries of a PNG stream
    ///
    /// Only the signature is checked strictly. A damaged chunk stream yields
    /// the entries read before the damage; compressed `iTXt` entries are
    /// skipped.
    pub fn read(data: &[u8]) -> MetaResult<Self> {
        if !data.starts_with(PNG_SIGNATURE) {
            return Err(MetaError::InvalidContainer(
                "Not a valid PNG file".to_string(),
            ));
        }

        let (chunks, _, problem) = split_chunks(data);
        if let Some(problem) = problem {
            log::debug!("PNG text read stopped early: {problem}");
        }

        let mut text = Self::new();
        for chunk in chunks {
            let entry = match &chunk.chunk_type {
                CHUNK_TYPE_TEXT => Self::decode_text(chunk.data),
                CHUNK_TYPE_ITXT => Self::decode_itxt(chunk.data),
                _ => continue,
            };
            if let Some(entry) = entry {
                text.upsert(entry);
            }
        }
        Ok(text)
    }

    /// Add a text entry, as `tEXt` when the value is Latin-1 and `iTXt`
    /// otherwise
    pub fn add_text(&mut self, key: &str, value: &str) -> MetaResult<()> {
        Self::check_keyword(key)?;
        let kind = if is_latin1(value) {
            TextChunkKind::Latin1
        } else {
            TextChunkKind::International
        };
        self.upsert(TextEntry {
            key: key.to_string(),
            value: value.to_string(),
            kind,
        });
        Ok(())
    }

    /// Add an international (`iTXt`) text entry
    pub fn add_itxt(&mut self, key: &str, value: &str) -> MetaResult<()> {
        Self::check_keyword(key)?;
        self.upsert(TextEntry {
            key: key.to_string(),
            value: value.to_string(),
            kind: TextChunkKind::International,
        });
        Ok(())
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    /// Iterate over `(key, value)` pairs in stream order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    /// Iterate over entries with their chunk kinds
    pub fn iter(&self) -> impl Iterator<Item = &TextEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite `data` so its text chunks are exactly these entries
    ///
    /// Existing `tEXt` and uncompressed `iTXt` chunks are dropped; the entries
    /// are written right before `IEND`. Compressed `iTXt` chunks are kept
    /// unless an entry replaces their keyword. Every other chunk, `zTXt`
    /// included, and any bytes after `IEND` are copied unchanged.
    pub fn embed(&self, data: &[u8]) -> MetaResult<Vec<u8>> {
        const STAGE: &str = "png text embed";
        if !data.starts_with(PNG_SIGNATURE) {
            return Err(MetaError::embed(STAGE, "missing PNG signature"));
        }

        let (chunks, trailer, problem) = split_chunks(data);
        if let Some(problem) = problem {
            return Err(MetaError::embed(STAGE, problem));
        }

        let mut output = Vec::with_capacity(data.len() + self.encoded_len());
        output.extend_from_slice(PNG_SIGNATURE);
        for chunk in &chunks {
            match &chunk.chunk_type {
                CHUNK_TYPE_TEXT => continue,
                CHUNK_TYPE_ITXT => match compressed_itxt_keyword(chunk.data) {
                    Some(key) if self.get(&key).is_none() => {}
                    _ => continue,
                },
                CHUNK_TYPE_IEND => {
                    for entry in &self.entries {
                        let (chunk_type, body) = Self::encode_entry(entry);
                        write_chunk(&mut output, chunk_type, &body);
                    }
                }
                _ => {}
            }
            output.extend_from_slice(chunk.raw);
        }
        output.extend_from_slice(trailer);
        Ok(output)
    }

    fn upsert(&mut self, entry: TextEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    fn check_keyword(key: &str) -> MetaResult<()> {
        if key.is_empty() || key.chars().count() > MAX_KEYWORD_LEN {
            return Err(MetaError::field(
                key,
                format!("PNG text keyword must be 1 to {MAX_KEYWORD_LEN} characters"),
            ));
        }
        if !is_latin1(key) || key.contains('\0') {
            return Err(MetaError::field(
                key,
                "PNG text keyword must be Latin-1 without NUL",
            ));
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.key.len() + entry.value.len() + 17)
            .sum()
    }

    fn encode_entry(entry: &TextEntry) -> (&'static [u8; 4], Vec<u8>) {
        let mut body = latin1_bytes(&entry.key);
        body.push(0);
        match entry.kind {
            TextChunkKind::Latin1 => {
                body.extend(latin1_bytes(&entry.value));
                (CHUNK_TYPE_TEXT, body)
            }
            TextChunkKind::International => {
                body.push(0); // compression flag (0 = uncompressed)
                body.push(0); // compression method
                body.push(0); // language tag (empty, null-terminated)
                body.push(0); // translated keyword (empty, null-terminated)
                body.extend_from_slice(entry.value.as_bytes());
                (CHUNK_TYPE_ITXT, body)
            }
        }
    }

    /// Decode a `tEXt` chunk body
    fn decode_text(data: &[u8]) -> Option<TextEntry> {
        let nul = data.iter().position(|&b| b == 0)?;
        Some(TextEntry {
            key: latin1_string(&data[..nul]),
            value: latin1_string(&data[nul + 1..]),
            kind: TextChunkKind::Latin1,
        })
    }

    /// Decode an uncompressed `iTXt` chunk body
    fn decode_itxt(data: &[u8]) -> Option<TextEntry> {
        let nul = data.iter().position(|&b| b == 0)?;
        let key = latin1_string(&data[..nul]);
        let rest = data.get(nul + 1..)?;
        let (&compression_flag, rest) = rest.split_first()?;
        let (_compression_method, rest) = rest.split_first()?;
        if compression_flag != 0 {
            log::debug!("skipping compressed iTXt chunk {key:?}");
            return None;
        }

        // Skip language tag and translated keyword (both null-terminated)
        let lang_end = rest.iter().position(|&b| b == 0)?;
        let rest = &rest[lang_end + 1..];
        let translated_end = rest.iter().position(|&b| b == 0)?;
        let text = &rest[translated_end + 1..];

        Some(TextEntry {
            key,
            value: String::from_utf8_lossy(text).into_owned(),
            kind: TextChunkKind::International,
        })
    }
}

/// Keyword of a compressed `iTXt` chunk body, `None` when uncompressed
fn compressed_itxt_keyword(data: &[u8]) -> Option<String> {
    let nul = data.iter().position(|&b| b == 0)?;
    let compression_flag = *data.get(nul + 1)?;
    (compression_flag != 0).then(|| latin1_string(&data[..nul]))
}

/// Append one chunk: length, type, data, CRC
fn write_chunk(output: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    let mut crc_data = Vec::with_capacity(4 + data.len());
    crc_data.extend_from_slice(chunk_type);
    crc_data.extend_from_slice(data);
    let crc = calculate_crc(&crc_data);

    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(chunk_type);
    output.extend_from_slice(data);
    output.extend_from_slice(&crc.to_be_bytes());
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| (c as u32) <= 0xFF)
}

/// Latin-1 bytes of text already checked with `is_latin1`
fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u32 as u8).collect()
}

fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Calculate PNG CRC-32
///
/// PNG uses CRC-32 with polynomial 0xEDB88320
pub fn calculate_crc(data: &[u8]) -> u32 {
    let mut crc = 0xFFFFFFFFu32;
    let table = crc_table();

    for &byte in data {
        let index = ((crc ^ (byte as u32)) & 0xFF) as usize;
        crc = (crc >> 8) ^ table[index];
    }

    crc ^ 0xFFFFFFFF
}

/// Generate CRC-32 lookup table
fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let polynomial = 0xEDB88320u32;

    for (i, item) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ polynomial;
            } else {
                crc >>= 1;
            }
        }
        *item = crc;
    }

    table
}
