//! JPEG file format handler
//!
//! This module walks JPEG marker segments and splices XMP packets into the
//! header region. Everything works on borrowed byte slices; the input is never
//! modified and every rewrite returns a new buffer.
//!
//! JPEG XMP Storage:
//! - XMP Packet is stored in APP1 segment with identifier `<http://ns.adobe.com/xap/1.0/>\0`
//! - The segment length field is 16 bits and counts itself, so one APP1
//!   segment holds at most 65535 - 2 bytes of payload
//! - Packets that do not fit are rejected; Extended XMP chunking is not written

use crate::core::error::{MetaError, MetaResult};
use crate::utils::bytes::ByteView;
use std::ops::Range;

/// JPEG segment markers
pub const MARKER_SOI: u8 = 0xD8; // Start of Image
pub const MARKER_EOI: u8 = 0xD9; // End of Image
pub const MARKER_SOS: u8 = 0xDA; // Start of Scan
pub const MARKER_APP0: u8 = 0xE0;
pub const MARKER_APP1: u8 = 0xE1;
const MARKER_RST0: u8 = 0xD0;
const MARKER_RST7: u8 = 0xD7;

/// XMP namespace identifier in APP1 segment
pub const XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// Largest value a segment length field can hold
pub const MAX_SEGMENT_LENGTH: usize = 0xFFFF;

/// One marker segment of the header region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegSegment<'a> {
    /// Marker code (the byte after 0xFF)
    pub marker: u8,
    /// Offset of the 0xFF byte that starts the marker
    pub offset: usize,
    /// Value of the length field; 0 for restart markers, which have none
    pub length: u16,
    /// Segment content after the length field
    pub payload: &'a [u8],
}

impl<'a> JpegSegment<'a> {
    /// Offset one past the last byte of the segment
    pub fn end(&self) -> usize {
        if self.has_length() {
            self.offset + 2 + self.length as usize
        } else {
            self.offset + 2
        }
    }

    /// Byte range of the whole segment, marker included
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Whether this marker carries a length field
    pub fn has_length(&self) -> bool {
        !is_restart_marker(self.marker)
    }

    /// APP0 (JFIF) or APP1 (EXIF/XMP)
    pub fn is_app0_or_app1(&self) -> bool {
        self.marker == MARKER_APP0 || self.marker == MARKER_APP1
    }

    /// An APP1 segment carrying a standard XMP packet
    pub fn is_xmp(&self) -> bool {
        self.marker == MARKER_APP1 && self.payload.starts_with(XMP_NAMESPACE)
    }

    /// The XMP packet bytes, if this is the XMP segment
    pub fn xmp_packet(&self) -> Option<&'a [u8]> {
        if self.is_xmp() {
            self.payload.get(XMP_NAMESPACE.len()..)
        } else {
            None
        }
    }
}

fn is_restart_marker(marker: u8) -> bool {
    (MARKER_RST0..=MARKER_RST7).contains(&marker)
}

/// Why segment scanning stopped, with the offset it stopped at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// Start-Of-Scan marker at this offset; compressed data follows
    StartOfScan(usize),
    /// End-Of-Image marker at this offset
    EndOfImage(usize),
    /// Ran out of bytes, hit a non-marker byte or a bad length field
    Truncated(usize),
}

impl ScanEnd {
    /// Offset where scanning stopped
    pub fn offset(self) -> usize {
        match self {
            ScanEnd::StartOfScan(offset)
            | ScanEnd::EndOfImage(offset)
            | ScanEnd::Truncated(offset) => offset,
        }
    }
}

/// Lazy iterator over the marker segments before the scan data
///
/// Clone the walker to restart from the same position. Scanning never reads
/// past the buffer: a length field that overruns it ends the iteration with
/// [`ScanEnd::Truncated`].
#[derive(Debug, Clone)]
pub struct SegmentWalker<'a> {
    view: ByteView<'a>,
    pos: usize,
    insertion_point: usize,
    end: Option<ScanEnd>,
}

impl<'a> SegmentWalker<'a> {
    /// Start walking after the SOI marker
    pub fn new(data: &'a [u8]) -> MetaResult<Self> {
        let view = ByteView::new(data);
        if !view.starts_with_at(0, &[0xFF, MARKER_SOI]) {
            return Err(MetaError::InvalidContainer(
                "Not a valid JPEG file: missing SOI marker".to_string(),
            ));
        }
        Ok(Self {
            view,
            pos: 2,
            insertion_point: 2,
            end: None,
        })
    }

    /// End of the last APP0/APP1 segment seen so far, or 2 if none
    pub fn insertion_point(&self) -> usize {
        self.insertion_point
    }

    /// How scanning stopped, once it has
    pub fn scan_end(&self) -> Option<ScanEnd> {
        self.end
    }

    fn stop(&mut self, end: ScanEnd) -> Option<JpegSegment<'a>> {
        if let ScanEnd::Truncated(offset) = end {
            log::debug!("JPEG segment scan stopped early at offset {offset}");
        }
        self.end = Some(end);
        None
    }
}

impl<'a> Iterator for SegmentWalker<'a> {
    type Item = JpegSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }

        // Skip 0xFF fill bytes in front of the marker code
        let mut offset = self.pos;
        while self.view.byte(offset) == Some(0xFF) && self.view.byte(offset + 1) == Some(0xFF) {
            offset += 1;
        }

        let (Some(0xFF), Some(marker)) = (self.view.byte(offset), self.view.byte(offset + 1))
        else {
            return self.stop(ScanEnd::Truncated(self.pos));
        };

        match marker {
            MARKER_SOS => return self.stop(ScanEnd::StartOfScan(offset)),
            MARKER_EOI => return self.stop(ScanEnd::EndOfImage(offset)),
            m if is_restart_marker(m) => {
                self.pos = offset + 2;
                return Some(JpegSegment {
                    marker,
                    offset,
                    length: 0,
                    payload: &[],
                });
            }
            _ => {}
        }

        let Some(length) = self.view.u16_be(offset + 2) else {
            return self.stop(ScanEnd::Truncated(offset));
        };
        if length < 2 {
            return self.stop(ScanEnd::Truncated(offset));
        }
        let end = offset + 2 + length as usize;
        let Some(payload) = self.view.slice(offset + 4..end) else {
            return self.stop(ScanEnd::Truncated(offset));
        };

        let segment = JpegSegment {
            marker,
            offset,
            length,
            payload,
        };
        if segment.is_app0_or_app1() {
            self.insertion_point = end;
        }
        self.pos = end;
        Some(segment)
    }
}

/// Result of scanning a JPEG for its XMP segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpLocation {
    /// Byte range of the first XMP APP1 segment, if any
    pub existing: Option<Range<usize>>,
    /// Where a new segment goes when there is none
    pub insertion_point: usize,
    /// How scanning stopped
    pub scan_end: ScanEnd,
}

/// JPEG file handler for XMP metadata
#[derive(Debug, Clone, Copy)]
pub struct JpegHandler;

impl JpegHandler {
    /// Scan the header region for the XMP segment and the insertion point
    pub fn locate_xmp(data: &[u8]) -> MetaResult<XmpLocation> {
        let mut walker = SegmentWalker::new(data)?;
        let mut existing = None;
        for segment in walker.by_ref() {
            if existing.is_none() && segment.is_xmp() {
                existing = Some(segment.range());
            }
        }
        Ok(XmpLocation {
            existing,
            insertion_point: walker.insertion_point(),
            scan_end: walker.scan_end().unwrap_or(ScanEnd::Truncated(data.len())),
        })
    }

    /// Get the XMP packet of the first XMP segment
    ///
    /// Buffers that are not JPEG, or have no XMP segment, yield `None`.
    pub fn read_xmp_packet(data: &[u8]) -> Option<&[u8]> {
        SegmentWalker::new(data)
            .ok()?
            .find_map(|segment| segment.xmp_packet())
    }

    /// Build a complete APP1 XMP segment: marker, length, identifier, packet
    pub fn build_xmp_segment(packet: &[u8]) -> MetaResult<Vec<u8>> {
        // Length counts itself, the identifier and the packet
        let length = XMP_NAMESPACE.len() + packet.len() + 2;
        if length > MAX_SEGMENT_LENGTH {
            return Err(MetaError::PacketTooLarge {
                length,
                limit: MAX_SEGMENT_LENGTH,
            });
        }

        let mut segment = Vec::with_capacity(length + 2);
        segment.extend_from_slice(&[0xFF, MARKER_APP1]);
        segment.extend_from_slice(&(length as u16).to_be_bytes());
        segment.extend_from_slice(XMP_NAMESPACE);
        segment.extend_from_slice(packet);
        Ok(segment)
    }

    /// Embed an XMP packet, returning the rewritten JPEG
    ///
    /// An existing XMP segment is replaced in place. Otherwise the new segment
    /// goes right after the last APP0/APP1 segment, or right after SOI when
    /// there is none. Every other byte, scan data included, is copied
    /// unchanged.
    pub fn write_xmp(data: &[u8], packet: &[u8]) -> MetaResult<Vec<u8>> {
        let location = Self::locate_xmp(data)?;
        let segment = Self::build_xmp_segment(packet)?;

        let (head, tail) = match &location.existing {
            Some(range) => (range.start, range.end),
            None => (location.insertion_point, location.insertion_point),
        };
        log::debug!(
            "{} XMP segment at offset {head} ({} byte packet)",
            if location.existing.is_some() { "replacing" } else { "inserting" },
            packet.len()
        );

        let mut output = Vec::with_capacity(data.len() - (tail - head) + segment.len());
        output.extend_from_slice(&data[..head]);
        output.extend_from_slice(&segment);
        output.extend_from_slice(&data[tail..]);
        Ok(output)
    }
}
