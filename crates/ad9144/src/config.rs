//! Board-level configuration for one AD9144.
//!
//! Everything a board supplies is gathered in [`Ad9144Config`] and checked
//! once by [`Ad9144Config::validate`] when the driver is constructed, so no
//! range error can surface half-way through a register sequence.
//!
//! # Clock chain (FMCDAQ2 reference)
//!
//! ```text
//! AD9523 OUT1 (1 GHz) ──▶ DAC CLK ──▶ DAC core (1 GSPS, 1× interpolation)
//!                                      └▶ JESD204B: L=4, M=2, F=1
//!                                         lane rate = 1e9 / (50·4·1/2) kHz
//!                                                   = 10 Gbps
//! AD9523 OUT7 (1 GHz / 128) ──▶ SYSREF (oneshot, subclass 1)
//! ```

use platform::{DacClockKhz, OutOfRangeError, PhaseDegrees, RefClockKhz, Subclass, SysrefMode};

use crate::error::ArgumentError;
use crate::link_config::MAX_LANES;

/// Highest DAC sample rate the converter core accepts, in kHz.
pub const MAX_DAC_RATE_KHZ: u32 = 2_000_000;

/// Interpolation factor between the JESD204 frame rate and the DAC rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interpolation {
    /// No interpolation.
    #[default]
    X1,
    /// 2× interpolation.
    X2,
    /// 4× interpolation.
    X4,
    /// 8× interpolation.
    X8,
}

impl Interpolation {
    /// Numeric factor.
    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Interpolation::X1 => 1,
            Interpolation::X2 => 2,
            Interpolation::X4 => 4,
            Interpolation::X8 => 8,
        }
    }

    /// `REG_INTERP_MODE` encoding.
    #[must_use]
    pub const fn register_value(self) -> u8 {
        match self {
            Interpolation::X1 => 0x00,
            Interpolation::X2 => 0x01,
            Interpolation::X4 => 0x03,
            Interpolation::X8 => 0x04,
        }
    }
}

/// Sample encoding on the JESD204 lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataFormat {
    /// Signed two's complement.
    #[default]
    TwosComplement,
    /// Offset binary.
    OffsetBinary,
}

/// Device-clock edge SYSREF is sampled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysrefEdge {
    /// Rising edge.
    #[default]
    Rising,
    /// Falling edge.
    Falling,
}

/// Link parameters as wired on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardLink {
    /// L
    pub lanes: u8,
    /// M
    pub converters: u8,
    /// F
    pub octets_per_frame: u8,
    /// K
    pub frames_per_multiframe: u8,
    /// S
    pub samples_per_conv_frame: u8,
    /// N
    pub converter_resolution: u8,
    /// N'
    pub bits_per_sample: u8,
    /// CS
    pub ctrl_bits_per_sample: u8,
    /// Device subclass.
    pub subclass: Subclass,
    /// Lane scrambling.
    pub scrambling: bool,
    /// HD
    pub high_density: bool,
    /// DID
    pub device_id: u8,
    /// BID
    pub bank_id: u8,
    /// SYSREF delivery.
    pub sysref_mode: SysrefMode,
    /// Physical lane feeding each logical lane. Entries past `lanes` are ignored.
    pub lane_xbar: [u8; MAX_LANES],
}

impl BoardLink {
    /// FMCDAQ2 transmit link: L=4, M=2, F=1, K=32, S=1, N=14, N'=16.
    pub const fn fmcdaq2() -> Self {
        Self {
            lanes: 4,
            converters: 2,
            octets_per_frame: 1,
            frames_per_multiframe: 32,
            samples_per_conv_frame: 1,
            converter_resolution: 14,
            bits_per_sample: 16,
            ctrl_bits_per_sample: 0,
            subclass: Subclass::One,
            scrambling: true,
            high_density: true,
            device_id: 0,
            bank_id: 0,
            sysref_mode: SysrefMode::Oneshot,
            lane_xbar: [0, 1, 2, 3, 4, 5, 6, 7],
        }
    }
}

/// On-chip DAC clock PLL settings. Absent when the DAC clock is supplied
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacPllSettings {
    /// Reference input in kHz.
    pub ref_clk_khz: u32,
}

/// NCO programming applied during Setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NcoSettings {
    /// Center-frequency shift in kHz; negative selects the lower sideband.
    pub carrier_khz: i32,
    /// Phase offset in degrees, [-180, 180).
    pub phase_deg: i16,
}

/// Bounded lock polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockPollConfig {
    /// Status reads before giving up (at least 1).
    pub attempts: u8,
    /// Delay after each unsuccessful read.
    pub interval_ms: u32,
}

impl Default for LockPollConfig {
    /// 10 reads, 10 ms apart.
    fn default() -> Self {
        Self {
            attempts: 10,
            interval_ms: 10,
        }
    }
}

/// Complete AD9144 configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ad9144Config {
    /// JESD204 link as wired.
    pub link: BoardLink,
    /// DAC sample rate in kHz.
    pub dac_rate_khz: u32,
    /// Interpolation between frame rate and DAC rate.
    pub interpolation: Interpolation,
    /// Lane sample encoding.
    pub data_format: DataFormat,
    /// DAC PLL, when the DAC clock is synthesised on chip.
    pub dac_pll: Option<DacPllSettings>,
    /// NCO programmed during Setup.
    pub nco: NcoSettings,
    /// SYSREF sampling edge.
    pub sysref_edge: SysrefEdge,
    /// SERDES PLL lock polling.
    pub serdes_lock: LockPollConfig,
    /// DAC PLL lock polling.
    pub dac_pll_lock: LockPollConfig,
}

impl Ad9144Config {
    /// FMCDAQ2 reference configuration: 1 GSPS external DAC clock, 1×
    /// interpolation, zero NCO carrier.
    pub fn fmcdaq2() -> Self {
        Self {
            link: BoardLink::fmcdaq2(),
            dac_rate_khz: 1_000_000,
            interpolation: Interpolation::X1,
            data_format: DataFormat::TwosComplement,
            dac_pll: None,
            nco: NcoSettings::default(),
            sysref_edge: SysrefEdge::Rising,
            serdes_lock: LockPollConfig::default(),
            dac_pll_lock: LockPollConfig::default(),
        }
    }

    /// Interpolation factor as an integer.
    pub fn sample_rate_div(&self) -> u32 {
        self.interpolation.factor()
    }

    /// Converter sample rate in Hz.
    pub fn sample_rate_hz(&self) -> u64 {
        u64::from(self.dac_rate_khz) * 1000
    }

    /// Check every range that does not depend on link negotiation.
    ///
    /// # Errors
    ///
    /// Returns the first [`ArgumentError`] found.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.dac_rate_khz == 0 || self.dac_rate_khz > MAX_DAC_RATE_KHZ {
            return Err(ArgumentError::DacRate(OutOfRangeError {
                value: i64::from(self.dac_rate_khz),
                min: 1,
                max: i64::from(MAX_DAC_RATE_KHZ),
            }));
        }
        if let Some(pll) = self.dac_pll {
            RefClockKhz::new(pll.ref_clk_khz).map_err(ArgumentError::RefClock)?;
            DacClockKhz::new(self.dac_rate_khz).map_err(ArgumentError::DacClock)?;
        }
        PhaseDegrees::new(self.nco.phase_deg).map_err(ArgumentError::Phase)?;
        if self.serdes_lock.attempts == 0 {
            return Err(ArgumentError::ZeroField("serdes_lock.attempts"));
        }
        if self.dac_pll_lock.attempts == 0 {
            return Err(ArgumentError::ZeroField("dac_pll_lock.attempts"));
        }
        Ok(())
    }
}

impl Default for Ad9144Config {
    fn default() -> Self {
        Self::fmcdaq2()
    }
}
