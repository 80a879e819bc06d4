//! Shared helpers for integration tests
//!
//! Builds small JPEG/PNG/TIFF buffers in memory and provides stand-in image
//! and EXIF backends so the dispatcher can be driven end to end.

#![allow(dead_code)]

use imgmeta::exif::ifd::{ExifIfdMap, ExifValue, IfdKind};
use imgmeta::files::formats::png::calculate_crc;
use imgmeta::{ContainerFormat, DecodedImage, ExifPacker, ImageCodec, MetaError, MetaResult};

pub const XMP_IDENTIFIER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
pub const EXIF_IDENTIFIER: &[u8] = b"Exif\0\0";
pub const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A marker segment with a length field
pub fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xFF, marker];
    bytes.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// An APP1 segment carrying `packet` as XMP
pub fn xmp_segment(packet: &[u8]) -> Vec<u8> {
    let mut payload = XMP_IDENTIFIER.to_vec();
    payload.extend_from_slice(packet);
    segment(0xE1, &payload)
}

/// JFIF APP0 payload
pub fn jfif_payload() -> Vec<u8> {
    vec![
        b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
    ]
}

/// Entropy-coded bytes with stuffed 0xFF and a restart marker
pub fn scan_data() -> Vec<u8> {
    vec![0x12, 0xFF, 0x00, 0x34, 0xFF, 0xD0, 0x56, 0x78]
}

/// SOI, APP0 (JFIF), DQT, SOS, scan data, EOI
pub fn jpeg_with_jfif() -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(segment(0xE0, &jfif_payload()));
    jpeg.extend(segment(0xDB, &[0x00; 5]));
    jpeg.extend(segment(0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]));
    jpeg.extend(scan_data());
    jpeg.extend([0xFF, 0xD9]);
    jpeg
}

/// EXIF APP1 payload with a tiny big-endian TIFF header
pub fn exif_payload() -> Vec<u8> {
    let mut payload = EXIF_IDENTIFIER.to_vec();
    payload.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00]);
    payload
}

/// SOI, APP0 (JFIF), APP1 (EXIF), DQT, SOF0, DHT, SOS, scan data, EOI
///
/// Returns the buffer and the offset right after the EXIF segment.
pub fn camera_jpeg() -> (Vec<u8>, usize) {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(segment(0xE0, &jfif_payload()));
    jpeg.extend(segment(0xE1, &exif_payload()));
    let after_exif = jpeg.len();
    jpeg.extend(segment(0xDB, &[0x00, 0x10, 0x0B, 0x0C, 0x0E]));
    jpeg.extend(segment(
        0xC0,
        &[0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00],
    ));
    jpeg.extend(segment(0xC4, &[0x00, 0x00, 0x01, 0x05, 0x01, 0x01, 0x01]));
    jpeg.extend(segment(0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]));
    jpeg.extend(scan_data());
    jpeg.extend([0xFF, 0xD9]);
    (jpeg, after_exif)
}

/// SOI, DQT, SOS, scan data, EOI (no APP segments)
pub fn bare_jpeg() -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend(segment(0xDB, &[0x00; 5]));
    jpeg.extend(segment(0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]));
    jpeg.extend(scan_data());
    jpeg.extend([0xFF, 0xD9]);
    jpeg
}

/// A PNG chunk with a valid CRC
pub fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = (data.len() as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(kind);
    bytes.extend_from_slice(data);
    let mut crc_input = kind.to_vec();
    crc_input.extend_from_slice(data);
    bytes.extend_from_slice(&calculate_crc(&crc_input).to_be_bytes());
    bytes
}

/// A `tEXt` chunk
pub fn text_chunk(key: &str, value: &str) -> Vec<u8> {
    let mut data = key.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(value.as_bytes());
    chunk(b"tEXt", &data)
}

/// A `width` x `height` PNG: IHDR, one IDAT, IEND, plus `extra` chunks
/// before IDAT
pub fn png(width: u32, height: u32, extra: &[Vec<u8>]) -> Vec<u8> {
    let mut ihdr = width.to_be_bytes().to_vec();
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);

    let mut png = PNG_SIGNATURE.to_vec();
    png.extend(chunk(b"IHDR", &ihdr));
    for extra in extra {
        png.extend_from_slice(extra);
    }
    png.extend(chunk(b"IDAT", &[0x78, 0x9C, 0x63, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01]));
    png.extend(chunk(b"IEND", &[]));
    png
}

/// Little-endian TIFF header with an empty IFD and a text body
pub fn tiff(body: &[u8]) -> Vec<u8> {
    let mut tiff = vec![b'I', b'I', 42, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    tiff.extend_from_slice(body);
    tiff
}

fn ifd_code(kind: IfdKind) -> u8 {
    match kind {
        IfdKind::Zeroth => b'0',
        IfdKind::Exif => b'E',
        IfdKind::Gps => b'G',
        IfdKind::First => b'1',
    }
}

fn ifd_from_code(code: u8) -> Option<IfdKind> {
    match code {
        b'0' => Some(IfdKind::Zeroth),
        b'E' => Some(IfdKind::Exif),
        b'G' => Some(IfdKind::Gps),
        b'1' => Some(IfdKind::First),
        _ => None,
    }
}

/// EXIF packer storing byte-like entries in a simple line format
///
/// Each entry is `<ifd> <tag> <a|b> <hex bytes>\n` behind the `Exif\0\0`
/// identifier. Numeric entries are not needed by the tests and are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineExifPacker;

impl LineExifPacker {
    fn blob_in(data: &[u8]) -> Option<&[u8]> {
        let start = data
            .windows(EXIF_IDENTIFIER.len())
            .position(|w| w == EXIF_IDENTIFIER)?;
        let body = &data[start + EXIF_IDENTIFIER.len()..];
        let end = body.iter().position(|&b| b == 0xFF).unwrap_or(body.len());
        Some(&body[..end])
    }
}

impl ExifPacker for LineExifPacker {
    fn load(&self, data: &[u8]) -> MetaResult<ExifIfdMap> {
        let blob = Self::blob_in(data)
            .ok_or_else(|| MetaError::InvalidContainer("no EXIF identifier".to_string()))?;
        let text = std::str::from_utf8(blob)
            .map_err(|e| MetaError::InvalidContainer(e.to_string()))?;

        let mut ifds = ExifIfdMap::new();
        for line in text.lines().filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split(' ').collect();
            let [ifd, tag, kind, hex] = parts.as_slice() else {
                return Err(MetaError::InvalidContainer(format!("bad EXIF line {line:?}")));
            };
            let ifd = ifd_from_code(ifd.as_bytes()[0])
                .ok_or_else(|| MetaError::InvalidContainer(format!("bad IFD {ifd}")))?;
            let tag: u16 = tag
                .parse()
                .map_err(|_| MetaError::InvalidContainer(format!("bad tag {tag}")))?;
            let bytes: Vec<u8> = (0..hex.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0))
                .collect();
            let value = match *kind {
                "a" => ExifValue::Ascii(String::from_utf8_lossy(&bytes).into_owned()),
                _ => ExifValue::Bytes(bytes),
            };
            ifds.ifd_mut(ifd).insert(tag, value);
        }
        Ok(ifds)
    }

    fn dump(&self, ifds: &ExifIfdMap) -> MetaResult<Vec<u8>> {
        let mut blob = EXIF_IDENTIFIER.to_vec();
        for kind in [IfdKind::Zeroth, IfdKind::Exif, IfdKind::Gps, IfdKind::First] {
            for (tag, value) in ifds.ifd(kind) {
                let (code, bytes) = match value {
                    ExifValue::Ascii(s) => ("a", s.as_bytes().to_vec()),
                    ExifValue::Bytes(b) => ("b", b.clone()),
                    _ => continue,
                };
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                blob.extend_from_slice(
                    format!("{} {tag} {code} {hex}\n", ifd_code(kind) as char).as_bytes(),
                );
            }
        }
        Ok(blob)
    }
}

/// EXIF packer whose `dump` always fails
#[derive(Debug, Default, Clone, Copy)]
pub struct BrokenExifPacker;

impl ExifPacker for BrokenExifPacker {
    fn load(&self, data: &[u8]) -> MetaResult<ExifIfdMap> {
        LineExifPacker.load(data)
    }

    fn dump(&self, _ifds: &ExifIfdMap) -> MetaResult<Vec<u8>> {
        Err(MetaError::InvalidContainer("directory offsets overflow".to_string()))
    }
}

/// Image backend that understands the buffers built by this module
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCodec {
    /// Fail every re-encode
    pub fail_reencode: bool,
}

impl ImageCodec for StubCodec {
    fn decode(&self, data: &[u8]) -> MetaResult<DecodedImage> {
        match ContainerFormat::sniff(data) {
            Some(ContainerFormat::Png) if data.len() >= 24 => {
                let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
                let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
                Ok(DecodedImage::new(ContainerFormat::Png, width, height))
            }
            Some(format @ (ContainerFormat::Jpeg | ContainerFormat::Tiff)) => {
                let mut image = DecodedImage::new(format, 1, 1);
                image.exif = LineExifPacker::blob_in(data).map(|blob| {
                    let mut full = EXIF_IDENTIFIER.to_vec();
                    full.extend_from_slice(blob);
                    full
                });
                Ok(image)
            }
            _ => Err(MetaError::InvalidContainer("cannot identify image".to_string())),
        }
    }

    fn reencode(&self, data: &[u8], format: ContainerFormat, exif: &[u8]) -> MetaResult<Vec<u8>> {
        if self.fail_reencode {
            return Err(MetaError::InvalidContainer("encoder rejected image".to_string()));
        }
        match format {
            ContainerFormat::Jpeg => {
                // Drop any previous EXIF segment and put the new one after SOI
                let mut out = vec![0xFF, 0xD8];
                out.extend(segment(0xE1, exif));
                let mut rest = &data[2..];
                if rest.len() > 4 && rest[..2] == [0xFF, 0xE1] && rest[4..].starts_with(EXIF_IDENTIFIER)
                {
                    let len = u16::from_be_bytes([rest[2], rest[3]]) as usize;
                    rest = &rest[2 + len..];
                }
                out.extend_from_slice(rest);
                Ok(out)
            }
            ContainerFormat::Tiff => Ok(tiff(exif)),
            other => Err(MetaError::InvalidContainer(format!("cannot encode {other}"))),
        }
    }
}
