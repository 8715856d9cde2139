use super::CompressError;

/// Lowest quality the JPEG encoder accepts.
pub const MIN_QUALITY: u8 = 1;
/// Highest quality the JPEG encoder accepts.
pub const MAX_QUALITY: u8 = 100;

/// Inclusive range of encoder qualities the search may pick from.
///
/// Always satisfies `MIN_QUALITY <= low <= high <= MAX_QUALITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityBounds {
    low: u8,
    high: u8,
}

impl QualityBounds {
    /// The canonical 5..=95 range.
    pub const DEFAULT: Self = Self { low: 5, high: 95 };

    pub fn new(low: u8, high: u8) -> Result<Self, CompressError> {
        if low < MIN_QUALITY || high > MAX_QUALITY {
            return Err(CompressError::InvalidInput(format!(
                "quality bounds {low}..={high} outside the legal range \
                 {MIN_QUALITY}..={MAX_QUALITY}"
            )));
        }
        if low > high {
            return Err(CompressError::InvalidInput(format!(
                "quality lower bound {low} is above upper bound {high}"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    /// Number of quality values in the range.
    fn len(&self) -> u32 {
        u32::from(self.high - self.low) + 1
    }

    /// Worst-case number of probes a bisection over this range performs,
    /// `floor(log2(len)) + 1`.
    pub fn max_probes(&self) -> u32 {
        u32::BITS - self.len().leading_zeros()
    }
}

impl Default for QualityBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}
