//! Embedded preview extraction for camera RAW files.
//!
//! Converting a RAW file to JPEG does not demosaic the sensor data. Almost
//! every camera writes a full-size JPEG preview into the file, and that is
//! what gets decoded here.
//!
//! TIFF-based containers (ARW, CR2, NEF, DNG, PEF, SR2, ORF, RW2) are walked
//! through the IFD chain and any SubIFDs, collecting every
//! `JPEGInterchangeFormat` block and every JPEG-compressed strip. The largest
//! candidate wins. Containers that are not TIFF (RAF) or whose directories
//! don't point at a preview fall back to a marker scan.

use std::path::Path;

use super::raster::decode_image;
use super::{DecodeError, DecodedImage};

/// File extensions treated as camera RAW.
pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "nef", "arw", "orf", "rw2", "dng", "raf", "sr2", "pef", "raw",
];

const TAG_COMPRESSION: u16 = 0x0103;
const TAG_STRIP_OFFSETS: u16 = 0x0111;
const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;
const TAG_SUB_IFDS: u16 = 0x014A;
const TAG_JPEG_OFFSET: u16 = 0x0201;
const TAG_JPEG_LENGTH: u16 = 0x0202;

const COMPRESSION_OLD_JPEG: u32 = 6;
const COMPRESSION_JPEG: u32 = 7;

const MAX_IFDS: usize = 32;
const MAX_ENTRIES: u16 = 1024;
const MIN_SCANNED_PREVIEW: usize = 16 * 1024;

/// Returns true if the path has one of the [`RAW_EXTENSIONS`].
pub fn is_raw_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| RAW_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Extract the bytes of the largest embedded JPEG preview.
pub fn extract_raw_preview(bytes: &[u8]) -> Result<&[u8], DecodeError> {
    let from_ifds = TiffWalker::new(bytes).map(|walker| walker.jpeg_candidates());

    let best = from_ifds
        .into_iter()
        .flatten()
        .filter_map(|(offset, len)| jpeg_slice(bytes, offset, len))
        .max_by_key(|slice| slice.len());

    best.or_else(|| scan_for_jpeg(bytes))
        .ok_or(DecodeError::NoPreview)
}

/// Extract and decode the embedded preview of a RAW file.
pub fn decode_raw_preview(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let jpeg = extract_raw_preview(bytes)?;
    decode_image(jpeg)
}

fn jpeg_slice(bytes: &[u8], offset: u32, len: u32) -> Option<&[u8]> {
    let start = offset as usize;
    let end = start.checked_add(len as usize)?;
    let slice = bytes.get(start..end)?;
    (slice.len() > 2 && slice.starts_with(&[0xFF, 0xD8])).then_some(slice)
}

/// Last resort: take the span from the first SOI marker after the header to
/// the last EOI marker in the file.
fn scan_for_jpeg(bytes: &[u8]) -> Option<&[u8]> {
    let start = bytes
        .windows(3)
        .skip(8)
        .position(|w| w == [0xFF, 0xD8, 0xFF])?
        + 8;
    let end = bytes.windows(2).rposition(|w| w == [0xFF, 0xD9])? + 2;
    let slice = bytes.get(start..end)?;
    (slice.len() >= MIN_SCANNED_PREVIEW).then_some(slice)
}

struct TiffWalker<'a> {
    bytes: &'a [u8],
    little_endian: bool,
    first_ifd: u32,
}

struct Entry {
    tag: u16,
    count: u32,
    value: u32,
}

impl<'a> TiffWalker<'a> {
    fn new(bytes: &'a [u8]) -> Option<Self> {
        let little_endian = match bytes.get(0..2)? {
            b"II" => true,
            b"MM" => false,
            _ => return None,
        };
        let mut walker = Self {
            bytes,
            little_endian,
            first_ifd: 0,
        };
        // 42 for plain TIFF; ORF and RW2 use their own magic in this slot.
        let magic = walker.u16_at(2)?;
        if !matches!(magic, 42 | 0x4F52 | 0x5352 | 0x0055) {
            return None;
        }
        walker.first_ifd = walker.u32_at(4)?;
        Some(walker)
    }

    fn u16_at(&self, at: usize) -> Option<u16> {
        let raw: [u8; 2] = self.bytes.get(at..at.checked_add(2)?)?.try_into().ok()?;
        Some(if self.little_endian {
            u16::from_le_bytes(raw)
        } else {
            u16::from_be_bytes(raw)
        })
    }

    fn u32_at(&self, at: usize) -> Option<u32> {
        let raw: [u8; 4] = self.bytes.get(at..at.checked_add(4)?)?.try_into().ok()?;
        Some(if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    /// Read one directory; returns its entries and the next IFD offset.
    fn read_ifd(&self, offset: u32) -> Option<(Vec<Entry>, u32)> {
        let at = offset as usize;
        let count = self.u16_at(at)?;
        if count > MAX_ENTRIES {
            return None;
        }
        let first_entry = at.checked_add(2)?;
        // Bounded by MAX_ENTRIES, so the table span itself can't overflow.
        let table_end = first_entry.checked_add(count as usize * 12)?;
        if table_end > self.bytes.len() {
            return None;
        }
        let mut entries = Vec::with_capacity(count as usize);
        for base in (first_entry..table_end).step_by(12) {
            let tag = self.u16_at(base)?;
            let kind = self.u16_at(base + 2)?;
            let count = self.u32_at(base + 4)?;
            // SHORT values sit left-justified in the value slot.
            let value = if kind == 3 && count == 1 {
                u32::from(self.u16_at(base + 8)?)
            } else {
                self.u32_at(base + 8)?
            };
            entries.push(Entry { tag, count, value });
        }
        let next = self.u32_at(table_end).unwrap_or(0);
        Some((entries, next))
    }

    fn sub_ifd_offsets(&self, entry: &Entry) -> Vec<u32> {
        if entry.count <= 1 {
            return vec![entry.value];
        }
        (0..entry.count.min(MAX_IFDS as u32) as usize)
            .filter_map(|i| self.u32_at((entry.value as usize).checked_add(i * 4)?))
            .collect()
    }

    /// Every (offset, length) pair that may hold a JPEG, across all IFDs.
    fn jpeg_candidates(&self) -> Vec<(u32, u32)> {
        let mut pending = vec![self.first_ifd];
        let mut visited = Vec::new();
        let mut found = Vec::new();

        while let Some(offset) = pending.pop() {
            if offset == 0 || visited.contains(&offset) || visited.len() >= MAX_IFDS {
                continue;
            }
            visited.push(offset);
            let Some((entries, next)) = self.read_ifd(offset) else {
                continue;
            };
            pending.push(next);

            let find = |tag: u16| entries.iter().find(|e| e.tag == tag).map(|e| e.value);

            if let (Some(start), Some(len)) = (find(TAG_JPEG_OFFSET), find(TAG_JPEG_LENGTH)) {
                found.push((start, len));
            }
            let jpeg_strips = matches!(
                find(TAG_COMPRESSION),
                Some(COMPRESSION_OLD_JPEG | COMPRESSION_JPEG)
            );
            if jpeg_strips {
                if let (Some(start), Some(len)) =
                    (find(TAG_STRIP_OFFSETS), find(TAG_STRIP_BYTE_COUNTS))
                {
                    found.push((start, len));
                }
            }
            for entry in entries.iter().filter(|e| e.tag == TAG_SUB_IFDS) {
                pending.extend(self.sub_ifd_offsets(entry));
            }
        }
        found
    }
}
