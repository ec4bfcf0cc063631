//! Converter clocking newtypes.
//!
//! These zero-cost wrappers carry the range checks that must pass before a
//! driver touches the bus:
//! - `RefClockKhz`: DAC PLL reference input, 80 MHz – 1 GHz
//! - `DacClockKhz`: DAC sample clock produced by the PLL, 420 MHz – 2.25 GHz
//! - `PhaseDegrees`: NCO phase offset, [-180, 180)

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: i64,
    /// The inclusive minimum allowed value.
    pub min: i64,
    /// The maximum allowed value (inclusive unless the type says otherwise).
    pub max: i64,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} outside [{}, {}]", self.value, self.min, self.max)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfRangeError {}

// ── RefClockKhz ──────────────────────────────────────────────────────────────

/// DAC PLL reference clock in kHz.
///
/// Valid range: 80 000–1 000 000 kHz inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct RefClockKhz(u32);

impl RefClockKhz {
    /// Lowest reference the phase detector accepts.
    pub const MIN_KHZ: u32 = 80_000;

    /// Highest reference the input buffer accepts.
    pub const MAX_KHZ: u32 = 1_000_000;

    /// Create a `RefClockKhz`, returning an error if out of range.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `khz < 80_000` or `khz > 1_000_000`.
    pub fn new(khz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_KHZ..=Self::MAX_KHZ).contains(&khz) {
            Ok(Self(khz))
        } else {
            Err(OutOfRangeError {
                value: i64::from(khz),
                min: i64::from(Self::MIN_KHZ),
                max: i64::from(Self::MAX_KHZ),
            })
        }
    }

    /// Return the frequency in kHz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── DacClockKhz ──────────────────────────────────────────────────────────────

/// DAC sample clock in kHz.
///
/// Valid range: 420 000–2 250 000 kHz inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct DacClockKhz(u32);

impl DacClockKhz {
    /// Lowest DAC clock the LO divider chain can produce.
    pub const MIN_KHZ: u32 = 420_000;

    /// Highest DAC clock the converter core accepts.
    pub const MAX_KHZ: u32 = 2_250_000;

    /// Create a `DacClockKhz`, returning an error if out of range.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `khz < 420_000` or `khz > 2_250_000`.
    pub fn new(khz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_KHZ..=Self::MAX_KHZ).contains(&khz) {
            Ok(Self(khz))
        } else {
            Err(OutOfRangeError {
                value: i64::from(khz),
                min: i64::from(Self::MIN_KHZ),
                max: i64::from(Self::MAX_KHZ),
            })
        }
    }

    /// Return the frequency in kHz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── PhaseDegrees ─────────────────────────────────────────────────────────────

/// NCO phase offset in whole degrees, half-open range [-180, 180).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct PhaseDegrees(i16);

impl PhaseDegrees {
    /// Inclusive lower bound.
    pub const MIN: i16 = -180;

    /// Exclusive upper bound.
    pub const MAX: i16 = 180;

    /// Create a `PhaseDegrees`, returning an error outside [-180, 180).
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `deg < -180` or `deg >= 180`.
    pub fn new(deg: i16) -> Result<Self, OutOfRangeError> {
        if (Self::MIN..Self::MAX).contains(&deg) {
            Ok(Self(deg))
        } else {
            Err(OutOfRangeError {
                value: i64::from(deg),
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            })
        }
    }

    /// Return the phase in degrees.
    #[must_use]
    pub fn get(self) -> i16 {
        self.0
    }

    /// Phase offset register value: `deg / 180 * 2^15`, two's complement.
    ///
    /// -180° maps to 0x8000, +90° to 0x4000.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // two's-complement reinterpretation is the register format
    pub fn register_word(self) -> u16 {
        // |deg| < 181, so deg * 32768 fits comfortably in i32
        let scaled = i32::from(self.0) * 32_768 / 180;
        (scaled as i16) as u16
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
