//! Decode errors and EXIF orientation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    InvalidFormat,

    #[error("image could not be decoded: {0}")]
    CorruptedFile(String),

    #[error("image has no pixels")]
    Empty,

    /// A resize was asked for a zero-sized result.
    #[error("cannot resize to {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// The correction an EXIF orientation tag asks for: clockwise quarter turns,
/// then an optional horizontal mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExifOrientation {
    pub quarter_turns: u8,
    pub mirrored: bool,
}

impl ExifOrientation {
    pub const UPRIGHT: ExifOrientation = ExifOrientation {
        quarter_turns: 0,
        mirrored: false,
    };

    /// Map tag values 1-8. Anything else is treated as upright.
    pub fn from_tag(tag: u32) -> Self {
        let (quarter_turns, mirrored) = match tag {
            2 => (0, true),
            3 => (2, false),
            4 => (2, true),
            5 => (1, true),
            6 => (1, false),
            7 => (3, true),
            8 => (3, false),
            _ => (0, false),
        };
        Self {
            quarter_turns,
            mirrored,
        }
    }

    pub fn is_upright(self) -> bool {
        self == Self::UPRIGHT
    }

    /// Stored width and height are swapped relative to the upright image.
    pub fn swaps_dimensions(self) -> bool {
        self.quarter_turns % 2 == 1
    }
}
