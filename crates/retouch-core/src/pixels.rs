//! Owned RGBA pixel buffers and the bounded store of baked pixel versions.
//!
//! Crop is the only destructive edit: it replaces the source pixels. Every
//! baked result is kept here under a [`PixelVersion`] so edit history can
//! restore earlier pixels without re-decoding. The decoded original is the
//! pinned root and is never evicted.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transform::PixelRegion;

/// Default number of pixel versions kept, root included.
pub const DEFAULT_BITMAP_CAPACITY: usize = 8;

/// An RGBA8 image, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel. Length is `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A buffer filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Row stride in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// RGBA at `(x, y)`. Caller guarantees the coordinate is in range.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = y as usize * self.stride() + x as usize * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// Stable identifier of a baked pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelVersion(pub u64);

impl PixelVersion {
    /// The decoded original.
    pub const ROOT: PixelVersion = PixelVersion(0);
}

impl std::fmt::Display for PixelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One baked buffer plus where it sits inside the root.
#[derive(Debug, Clone)]
pub struct BitmapEntry {
    pub version: PixelVersion,
    pub buffer: Arc<PixelBuffer>,
    /// Region of the root buffer this version was cropped from.
    pub origin: PixelRegion,
}

/// Bounded arena of pixel versions with a pinned root.
///
/// Pushing truncates every version after the current one (a new crop after
/// an undo discards the redo branch) and evicts the oldest non-root version
/// once `capacity` is exceeded.
#[derive(Debug)]
pub struct BitmapHistory {
    root: BitmapEntry,
    entries: VecDeque<BitmapEntry>,
    current: PixelVersion,
    next_id: u64,
    capacity: usize,
}

impl BitmapHistory {
    /// Create a store holding only the decoded original.
    ///
    /// `capacity` counts the root and is raised to at least 2.
    pub fn new(root: PixelBuffer, capacity: usize) -> Self {
        let origin = PixelRegion::full(root.width, root.height);
        Self {
            root: BitmapEntry {
                version: PixelVersion::ROOT,
                buffer: Arc::new(root),
                origin,
            },
            entries: VecDeque::new(),
            current: PixelVersion::ROOT,
            next_id: 1,
            capacity: capacity.max(2),
        }
    }

    /// Store a freshly baked buffer as the new current version.
    ///
    /// `region` is the crop rectangle relative to the current buffer.
    pub fn push(&mut self, buffer: PixelBuffer, region: PixelRegion) -> PixelVersion {
        let parent_origin = self.current_entry().origin;
        let origin = PixelRegion {
            x: parent_origin.x + region.x,
            y: parent_origin.y + region.y,
            width: region.width,
            height: region.height,
        };

        // Drop the redo branch
        if let Some(pos) = self.position(self.current) {
            self.entries.truncate(pos + 1);
        } else {
            self.entries.clear();
        }

        let version = PixelVersion(self.next_id);
        self.next_id += 1;
        self.entries.push_back(BitmapEntry {
            version,
            buffer: Arc::new(buffer),
            origin,
        });

        while self.entries.len() + 1 > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(version = %evicted.version, "evicted pixel version");
            }
        }

        self.current = version;
        version
    }

    /// Make `version` current. Returns `None` if it was evicted or never existed.
    pub fn restore(&mut self, version: PixelVersion) -> Option<&BitmapEntry> {
        if version == PixelVersion::ROOT {
            self.current = version;
            return Some(&self.root);
        }
        let pos = self.position(version)?;
        self.current = version;
        self.entries.get(pos)
    }

    pub fn get(&self, version: PixelVersion) -> Option<&BitmapEntry> {
        if version == PixelVersion::ROOT {
            return Some(&self.root);
        }
        self.position(version).and_then(|pos| self.entries.get(pos))
    }

    pub fn contains(&self, version: PixelVersion) -> bool {
        self.get(version).is_some()
    }

    pub fn current(&self) -> PixelVersion {
        self.current
    }

    pub fn current_entry(&self) -> &BitmapEntry {
        self.get(self.current).unwrap_or(&self.root)
    }

    pub fn root(&self) -> &BitmapEntry {
        &self.root
    }

    /// Number of stored versions, root included.
    pub fn len(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn position(&self, version: PixelVersion) -> Option<usize> {
        self.entries.iter().position(|e| e.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::filled(w, h, [10, 20, 30, 255])
    }

    fn region(x: u32, y: u32, width: u32, height: u32) -> PixelRegion {
        PixelRegion {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_filled_buffer() {
        let buf = buffer(3, 2);
        assert_eq!(buf.byte_size(), 24);
        assert_eq!(buf.pixel(2, 1), [10, 20, 30, 255]);
        assert!(!buf.is_empty());
        assert!(PixelBuffer::new(0, 0, vec![]).is_empty());
    }

    #[test]
    fn test_rgba_image_conversion() {
        let buf = buffer(4, 4);
        let img = buf.to_rgba_image().unwrap();
        assert_eq!(PixelBuffer::from_rgba_image(img), buf);
    }

    #[test]
    fn test_root_only() {
        let history = BitmapHistory::new(buffer(10, 10), 4);
        assert_eq!(history.current(), PixelVersion::ROOT);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_entry().origin, region(0, 0, 10, 10));
    }

    #[test]
    fn test_push_accumulates_origin() {
        let mut history = BitmapHistory::new(buffer(100, 100), 4);
        let v1 = history.push(buffer(50, 50), region(10, 20, 50, 50));
        let v2 = history.push(buffer(10, 10), region(5, 5, 10, 10));

        assert_eq!(history.get(v1).unwrap().origin, region(10, 20, 50, 50));
        assert_eq!(history.get(v2).unwrap().origin, region(15, 25, 10, 10));
        assert_eq!(history.current(), v2);
    }

    #[test]
    fn test_push_after_restore_drops_branch() {
        let mut history = BitmapHistory::new(buffer(100, 100), 8);
        let v1 = history.push(buffer(50, 50), region(0, 0, 50, 50));
        let v2 = history.push(buffer(20, 20), region(0, 0, 20, 20));

        assert!(history.restore(v1).is_some());
        let v3 = history.push(buffer(30, 30), region(0, 0, 30, 30));

        assert!(!history.contains(v2));
        assert!(history.contains(v1));
        assert_ne!(v3, v2, "versions are never reused");
    }

    #[test]
    fn test_eviction_keeps_root() {
        let mut history = BitmapHistory::new(buffer(100, 100), 3);
        let v1 = history.push(buffer(90, 90), region(0, 0, 90, 90));
        let v2 = history.push(buffer(80, 80), region(0, 0, 80, 80));
        let v3 = history.push(buffer(70, 70), region(0, 0, 70, 70));

        assert_eq!(history.len(), 3);
        assert!(!history.contains(v1));
        assert!(history.contains(v2));
        assert!(history.contains(v3));
        assert!(history.contains(PixelVersion::ROOT));
        assert!(history.restore(PixelVersion::ROOT).is_some());
        assert_eq!(history.current_entry().buffer.width, 100);
    }

    #[test]
    fn test_restore_missing_version() {
        let mut history = BitmapHistory::new(buffer(10, 10), 4);
        assert!(history.restore(PixelVersion(42)).is_none());
        assert_eq!(history.current(), PixelVersion::ROOT);
    }

    #[test]
    fn test_capacity_minimum() {
        let history = BitmapHistory::new(buffer(1, 1), 0);
        assert_eq!(history.capacity(), 2);
    }
}
