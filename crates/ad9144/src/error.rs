//! Driver error taxonomy.

use platform::{OutOfRangeError, Subclass};

/// PLL identifier used in lock reports and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pll {
    /// SERDES receiver PLL (lane clock).
    Serdes,
    /// DAC sample-clock PLL.
    Dac,
}

/// What a bounded poll gave up waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutKind {
    /// Lock bits never all set within the retry budget.
    PllNotLocked(Pll),
}

/// Rejected input, detected before any register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArgumentError {
    /// More lanes than the device has.
    TooManyLanes {
        /// Lanes asked for.
        requested: u8,
        /// Device maximum.
        max: u8,
    },
    /// More converters than the device has.
    TooManyConverters {
        /// Converters asked for.
        requested: u8,
        /// Device maximum.
        max: u8,
    },
    /// A count that the ILAS encodes as `value - 1` was zero.
    ZeroField(&'static str),
    /// A crossbar entry names a physical lane that does not exist.
    CrossbarLane {
        /// Logical lane.
        logical: u8,
        /// Physical lane it was mapped to.
        physical: u8,
    },
    /// The device only implements subclass 0 and 1.
    UnsupportedSubclass(Subclass),
    /// Lane rate is not representable for these link parameters.
    LaneRate,
    /// DAC sample rate outside what the converter core accepts.
    DacRate(OutOfRangeError),
    /// DAC PLL reference outside its input range.
    RefClock(OutOfRangeError),
    /// DAC PLL output outside its synthesis range.
    DacClock(OutOfRangeError),
    /// NCO phase outside [-180, 180).
    Phase(OutOfRangeError),
    /// A link state callback ran before `on_link_init` negotiated the link.
    LinkNotNegotiated,
    /// Fewer expected sample sets than active converters.
    MissingPatternSamples {
        /// Active converters.
        converters: u8,
        /// Sample sets supplied.
        provided: usize,
    },
}

impl core::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooManyLanes { requested, max } => {
                write!(f, "{requested} lanes requested, device has {max}")
            }
            Self::TooManyConverters { requested, max } => {
                write!(f, "{requested} converters requested, device has {max}")
            }
            Self::ZeroField(name) => write!(f, "{name} must be at least 1"),
            Self::CrossbarLane { logical, physical } => {
                write!(f, "logical lane {logical} mapped to missing physical lane {physical}")
            }
            Self::UnsupportedSubclass(s) => write!(f, "subclass {} not supported", s.bits()),
            Self::LaneRate => write!(f, "lane rate out of range for link parameters"),
            Self::DacRate(e) => write!(f, "DAC rate (kHz) {e}"),
            Self::RefClock(e) => write!(f, "DAC PLL reference (kHz) {e}"),
            Self::DacClock(e) => write!(f, "DAC PLL output (kHz) {e}"),
            Self::Phase(e) => write!(f, "NCO phase (degrees) {e}"),
            Self::LinkNotNegotiated => write!(f, "link parameters not negotiated"),
            Self::MissingPatternSamples {
                converters,
                provided,
            } => write!(
                f,
                "{provided} pattern sample sets for {converters} converters"
            ),
        }
    }
}

/// Hardware check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Code-group sync missing on at least one lane.
    CodeGroupSync {
        /// `REG_CODEGRPSYNCFLG` value.
        flags: u8,
    },
    /// Frame sync disagrees with code-group sync.
    FrameSync {
        /// `REG_FRAMESYNCFLG` value.
        flags: u8,
    },
    /// Initial lane sync disagrees with code-group sync.
    InitialLaneSync {
        /// `REG_INITLANESYNCFLG` value.
        flags: u8,
    },
    /// Short transport-layer pattern mismatch.
    ShortPatternTest {
        /// Converter under test.
        converter: u8,
        /// Sample slot under test.
        sample: u8,
    },
    /// Datapath PRBS checker did not report good data.
    DatapathPrbs {
        /// Page index of the failing DAC pair.
        page: u8,
    },
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CodeGroupSync { flags } => {
                write!(f, "code group sync failed (flags {flags:#04x})")
            }
            Self::FrameSync { flags } => write!(f, "frame sync failed (flags {flags:#04x})"),
            Self::InitialLaneSync { flags } => {
                write!(f, "initial lane sync failed (flags {flags:#04x})")
            }
            Self::ShortPatternTest { converter, sample } => write!(
                f,
                "short transport pattern mismatch on converter {converter} sample {sample}"
            ),
            Self::DatapathPrbs { page } => write!(f, "datapath PRBS errors on page {page}"),
        }
    }
}

/// AD9144 driver error.
///
/// `E` is the register transport's error and is passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Input rejected before touching the bus.
    InvalidArgument(ArgumentError),
    /// A bounded poll expired.
    Timeout(TimeoutKind),
    /// A status check failed.
    HardwareFault(Fault),
    /// The register transport failed.
    Transport(E),
    /// The part on the bus is not an AD9144.
    UnsupportedDevice {
        /// `PRODIDH:PRODIDL` as read.
        product_id: u16,
    },
}

impl<E> From<ArgumentError> for Error<E> {
    fn from(e: ArgumentError) -> Self {
        Self::InvalidArgument(e)
    }
}

impl<E> From<Fault> for Error<E> {
    fn from(f: Fault) -> Self {
        Self::HardwareFault(f)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument(e) => write!(f, "invalid argument: {e}"),
            Self::Timeout(TimeoutKind::PllNotLocked(Pll::Serdes)) => {
                write!(f, "SERDES PLL did not lock")
            }
            Self::Timeout(TimeoutKind::PllNotLocked(Pll::Dac)) => {
                write!(f, "DAC PLL did not lock")
            }
            Self::HardwareFault(fault) => write!(f, "hardware fault: {fault}"),
            Self::Transport(e) => write!(f, "register transport error: {e:?}"),
            Self::UnsupportedDevice { product_id } => {
                write!(f, "unexpected product ID {product_id:#06x}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for Error<E> {}
