//! Link parameter negotiation.
//!
//! Turns the board's [`BoardLink`] into the device-owned [`LinkConfig`]:
//! counts are checked against the device's capabilities, the lane rate is
//! derived from the sample rate, and the register encodings that depend on
//! more than one parameter (lane mask, SYNC~ pulse width, ILAS checksum) are
//! computed once.
//!
//! # Lane rate
//!
//! With N' = 16 and 8b/10b coding each converter sample costs 20 line bits:
//!
//! ```text
//! lane_rate_bps = sample_rate · M · 20 / (L · interp)
//! lane_rate_khz = sample_rate_hz / (50 · L · interp / M)
//! ```
//!
//! The denominator is evaluated in integer arithmetic first, exactly as
//! written, and the final division rounds to nearest.

use platform::{JesdLink, Subclass, SysrefMode};

use crate::config::{Ad9144Config, BoardLink};
use crate::error::ArgumentError;
use crate::registers::{ILS_HD, ILS_SCR, JESDV_B};

/// Physical SERDES lanes on the AD9144.
pub const MAX_LANES: usize = 8;

/// DAC channels on the AD9144.
pub const MAX_CONVERTERS: usize = 4;

/// Capability limits the negotiator checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceCaps {
    /// Lanes per link.
    pub max_lanes: u8,
    /// Converters per device.
    pub max_converters: u8,
}

/// AD9144 limits.
#[allow(clippy::cast_possible_truncation)]
pub const AD9144_CAPS: DeviceCaps = DeviceCaps {
    max_lanes: MAX_LANES as u8,
    max_converters: MAX_CONVERTERS as u8,
};

/// SYNC~ low time used to signal an error, in multiframe clock units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncPulseWidth {
    /// Half a PCLK cycle.
    HalfCycle,
    /// One PCLK cycle.
    OneCycle,
    /// Two PCLK cycles.
    TwoCycles,
}

impl SyncPulseWidth {
    /// Pick the pulse width for F octets per frame.
    ///
    /// F = 1 and F = 2 have dedicated widths; every other F (including
    /// unusual ones) uses the two-cycle default rather than failing.
    #[must_use]
    pub const fn from_octets_per_frame(octets: u8) -> Self {
        match octets {
            1 => SyncPulseWidth::HalfCycle,
            2 => SyncPulseWidth::OneCycle,
            _ => SyncPulseWidth::TwoCycles,
        }
    }

    /// `SYNCB_ERR_DUR` field value.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            SyncPulseWidth::HalfCycle => 0,
            SyncPulseWidth::OneCycle => 1,
            SyncPulseWidth::TwoCycles => 2,
        }
    }
}

/// `round_closest(sample_rate_hz / (50 · lanes · sample_rate_div / converters))`.
///
/// Returns `None` when the denominator is zero or the result does not fit
/// in 32 bits.
#[must_use]
pub fn lane_rate_khz(
    sample_rate_hz: u64,
    lanes: u8,
    sample_rate_div: u32,
    converters: u8,
) -> Option<u32> {
    let denominator = 50u64
        .checked_mul(u64::from(lanes))?
        .checked_mul(u64::from(sample_rate_div))?
        .checked_div(u64::from(converters))?;
    if denominator == 0 {
        return None;
    }
    let rounded = sample_rate_hz.checked_add(denominator / 2)? / denominator;
    u32::try_from(rounded).ok()
}

/// Negotiated link, owned by one device and immutable after `LinkInit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
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
    /// Subclass (0 or 1).
    pub subclass: Subclass,
    /// Scrambling.
    pub scrambling: bool,
    /// HD
    pub high_density: bool,
    /// DID
    pub device_id: u8,
    /// BID
    pub bank_id: u8,
    /// SYSREF delivery.
    pub sysref_mode: SysrefMode,
    /// Physical source for each logical lane; entries past `lanes` are zero.
    pub lane_xbar: [u8; MAX_LANES],
    /// Sample rate in Hz.
    pub sample_rate_hz: u64,
    /// Interpolation factor.
    pub sample_rate_div: u32,
    /// Derived serial lane rate in kHz.
    pub lane_rate_khz: u32,
    /// SYNC~ error pulse width for this F.
    pub sync_pulse: SyncPulseWidth,
}

impl LinkConfig {
    /// Validate `board` against `caps` and derive the link rates from the
    /// converter configuration.
    ///
    /// # Errors
    ///
    /// [`ArgumentError`] if a count exceeds the device maximum, a count that
    /// the ILAS encodes as `value - 1` is zero, a crossbar entry names a
    /// missing lane, the subclass is 2, or the lane rate is unrepresentable.
    pub fn negotiate(
        board: &BoardLink,
        caps: DeviceCaps,
        config: &Ad9144Config,
    ) -> Result<Self, ArgumentError> {
        if board.lanes > caps.max_lanes {
            return Err(ArgumentError::TooManyLanes {
                requested: board.lanes,
                max: caps.max_lanes,
            });
        }
        if board.converters > caps.max_converters {
            return Err(ArgumentError::TooManyConverters {
                requested: board.converters,
                max: caps.max_converters,
            });
        }
        for (value, name) in [
            (board.lanes, "lanes"),
            (board.converters, "converters"),
            (board.octets_per_frame, "octets_per_frame"),
            (board.frames_per_multiframe, "frames_per_multiframe"),
            (board.samples_per_conv_frame, "samples_per_conv_frame"),
            (board.converter_resolution, "converter_resolution"),
            (board.bits_per_sample, "bits_per_sample"),
        ] {
            if value == 0 {
                return Err(ArgumentError::ZeroField(name));
            }
        }
        if board.subclass == Subclass::Two {
            return Err(ArgumentError::UnsupportedSubclass(board.subclass));
        }

        let mut lane_xbar = [0u8; MAX_LANES];
        for ((logical, physical), slot) in (0u8..)
            .zip(board.lane_xbar.iter().copied())
            .zip(lane_xbar.iter_mut())
            .take(usize::from(board.lanes))
        {
            if usize::from(physical) >= MAX_LANES {
                return Err(ArgumentError::CrossbarLane { logical, physical });
            }
            *slot = physical;
        }

        let sample_rate_hz = config.sample_rate_hz();
        let sample_rate_div = config.sample_rate_div();
        let lane_rate_khz =
            lane_rate_khz(sample_rate_hz, board.lanes, sample_rate_div, board.converters)
                .ok_or(ArgumentError::LaneRate)?;

        Ok(Self {
            lanes: board.lanes,
            converters: board.converters,
            octets_per_frame: board.octets_per_frame,
            frames_per_multiframe: board.frames_per_multiframe,
            samples_per_conv_frame: board.samples_per_conv_frame,
            converter_resolution: board.converter_resolution,
            bits_per_sample: board.bits_per_sample,
            ctrl_bits_per_sample: board.ctrl_bits_per_sample,
            subclass: board.subclass,
            scrambling: board.scrambling,
            high_density: board.high_density,
            device_id: board.device_id,
            bank_id: board.bank_id,
            sysref_mode: board.sysref_mode,
            lane_xbar,
            sample_rate_hz,
            sample_rate_div,
            lane_rate_khz,
            sync_pulse: SyncPulseWidth::from_octets_per_frame(board.octets_per_frame),
        })
    }

    /// Logical lanes in use, as a bitmask (`(1 << L) - 1`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // L <= 8
    pub fn lane_mask(&self) -> u8 {
        ((1u16 << self.lanes) - 1) as u8
    }

    /// Physical lanes in use, as a bitmask.
    #[must_use]
    pub fn physical_lane_mask(&self) -> u8 {
        self.active_xbar()
            .iter()
            .fold(0u8, |mask, &lane| mask | (1 << lane))
    }

    /// Crossbar entries for the lanes in use.
    #[must_use]
    pub fn active_xbar(&self) -> &[u8] {
        self.lane_xbar
            .get(..usize::from(self.lanes))
            .unwrap_or(self.lane_xbar.as_slice())
    }

    /// ILAS register values, in `REG_ILS_DID..=REG_ILS_HD_CF` order.
    ///
    /// Counts are encoded as `value - 1`; LID is that of lane 0.
    #[must_use]
    pub fn ilas_registers(&self) -> [u8; 11] {
        let scr = if self.scrambling { ILS_SCR } else { 0 };
        let hd = if self.high_density { ILS_HD } else { 0 };
        [
            self.device_id,
            self.bank_id,
            0,
            scr | ((self.lanes - 1) & 0x1F),
            self.octets_per_frame - 1,
            self.frames_per_multiframe - 1,
            self.converters - 1,
            ((self.ctrl_bits_per_sample & 0x3) << 6) | ((self.converter_resolution - 1) & 0x1F),
            (self.subclass.bits() << 5) | ((self.bits_per_sample - 1) & 0x1F),
            (JESDV_B << 5) | ((self.samples_per_conv_frame - 1) & 0x1F),
            hd,
        ]
    }

    /// JESD204B lane-0 checksum: the sum of the ILAS fields modulo 256.
    ///
    /// Fields are summed individually (not as packed bytes), which is what
    /// the receiver checks with `CHECKSUM_MODE` clear.
    #[must_use]
    pub fn ilas_checksum(&self) -> u8 {
        let fields = [
            self.device_id,
            self.bank_id,
            0, // LID
            u8::from(self.scrambling),
            self.lanes - 1,
            self.octets_per_frame - 1,
            self.frames_per_multiframe - 1,
            self.converters - 1,
            self.converter_resolution - 1,
            self.ctrl_bits_per_sample,
            self.bits_per_sample - 1,
            self.subclass.bits(),
            self.samples_per_conv_frame - 1,
            JESDV_B,
            u8::from(self.high_density),
            0, // CF
        ];
        fields.iter().fold(0u8, |sum, f| sum.wrapping_add(*f))
    }

    /// Copy the negotiated parameters into the orchestrator's link descriptor.
    pub fn publish(&self, link: &mut JesdLink) {
        link.is_transmit = true;
        link.num_lanes = self.lanes;
        link.num_converters = self.converters;
        link.octets_per_frame = self.octets_per_frame;
        link.frames_per_multiframe = self.frames_per_multiframe;
        link.samples_per_conv_frame = self.samples_per_conv_frame;
        link.converter_resolution = self.converter_resolution;
        link.bits_per_sample = self.bits_per_sample;
        link.ctrl_bits_per_sample = self.ctrl_bits_per_sample;
        link.subclass = self.subclass;
        link.scrambling = self.scrambling;
        link.high_density = self.high_density;
        link.device_id = self.device_id;
        link.bank_id = self.bank_id;
        link.sysref_mode = self.sysref_mode;
        link.sample_rate_hz = self.sample_rate_hz;
        link.sample_rate_div = self.sample_rate_div;
        link.lane_ids.clear();
        for id in 0..self.lanes {
            // capacity equals MAX_LANES and lanes <= MAX_LANES
            let _ = link.lane_ids.push(id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn negotiate(board: &BoardLink) -> Result<LinkConfig, ArgumentError> {
        LinkConfig::negotiate(board, AD9144_CAPS, &Ad9144Config::fmcdaq2())
    }

    #[test]
    fn fmcdaq2_lane_rate_is_10_gbps() {
        let link = negotiate(&BoardLink::fmcdaq2()).unwrap();
        assert_eq!(link.lane_rate_khz, 10_000_000);
        assert_eq!(link.lane_mask(), 0x0F);
        assert_eq!(link.sync_pulse, SyncPulseWidth::HalfCycle);
    }

    #[test]
    fn lane_rate_denominator_truncates_before_dividing() {
        // 50 * 1 * 1 / 4 = 12 (not 12.5), so 1 GHz / 12 = 83_333_333.3 -> 83_333_333
        assert_eq!(lane_rate_khz(1_000_000_000, 1, 1, 4), Some(83_333_333));
        // 50 * 3 * 1 / 4 = 37; 1_000_000_000 / 37 = 27_027_027.03 -> 27_027_027
        assert_eq!(lane_rate_khz(1_000_000_000, 3, 1, 4), Some(27_027_027));
    }

    #[test]
    fn lane_rate_rounds_to_nearest() {
        // 50 * 8 * 2 / 1 = 800; 1_000_000_400 / 800 = 1_250_000.5 -> 1_250_001
        assert_eq!(lane_rate_khz(1_000_000_400, 8, 2, 1), Some(1_250_001));
        assert_eq!(lane_rate_khz(1_000_000_399, 8, 2, 1), Some(1_250_000));
    }

    #[test]
    fn lane_rate_rejects_zero_denominator() {
        assert_eq!(lane_rate_khz(1_000_000_000, 0, 1, 1), None);
        assert_eq!(lane_rate_khz(1_000_000_000, 1, 1, 0), None);
    }

    #[test]
    fn too_many_lanes_is_invalid() {
        let mut board = BoardLink::fmcdaq2();
        board.lanes = 9;
        assert_eq!(
            negotiate(&board),
            Err(ArgumentError::TooManyLanes {
                requested: 9,
                max: 8
            })
        );
    }

    #[test]
    fn too_many_converters_is_invalid() {
        let mut board = BoardLink::fmcdaq2();
        board.converters = 5;
        assert_eq!(
            negotiate(&board),
            Err(ArgumentError::TooManyConverters {
                requested: 5,
                max: 4
            })
        );
    }

    #[test]
    fn device_maxima_are_accepted() {
        let mut board = BoardLink::fmcdaq2();
        board.lanes = 8;
        board.converters = 4;
        assert!(negotiate(&board).is_ok());
    }

    #[test]
    fn zero_counts_are_invalid() {
        let mut board = BoardLink::fmcdaq2();
        board.octets_per_frame = 0;
        assert_eq!(
            negotiate(&board),
            Err(ArgumentError::ZeroField("octets_per_frame"))
        );
    }

    #[test]
    fn crossbar_must_name_existing_lanes() {
        let mut board = BoardLink::fmcdaq2();
        board.lane_xbar[2] = 8;
        assert_eq!(
            negotiate(&board),
            Err(ArgumentError::CrossbarLane {
                logical: 2,
                physical: 8
            })
        );
    }

    #[test]
    fn crossbar_entries_past_lane_count_are_ignored() {
        let mut board = BoardLink::fmcdaq2();
        board.lane_xbar = [3, 2, 1, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        let link = negotiate(&board).unwrap();
        assert_eq!(link.active_xbar(), &[3, 2, 1, 0]);
        assert_eq!(link.physical_lane_mask(), 0x0F);
    }

    #[test]
    fn subclass_2_is_rejected() {
        let mut board = BoardLink::fmcdaq2();
        board.subclass = Subclass::Two;
        assert_eq!(
            negotiate(&board),
            Err(ArgumentError::UnsupportedSubclass(Subclass::Two))
        );
    }

    #[test]
    fn sync_pulse_width_buckets() {
        assert_eq!(SyncPulseWidth::from_octets_per_frame(1).code(), 0);
        assert_eq!(SyncPulseWidth::from_octets_per_frame(2).code(), 1);
        assert_eq!(SyncPulseWidth::from_octets_per_frame(4).code(), 2);
        assert_eq!(
            SyncPulseWidth::from_octets_per_frame(3),
            SyncPulseWidth::TwoCycles,
            "uncommon F falls into the default bucket"
        );
    }

    #[test]
    fn ilas_registers_encode_minus_one() {
        let link = negotiate(&BoardLink::fmcdaq2()).unwrap();
        let regs = link.ilas_registers();
        assert_eq!(regs[3], 0x80 | 3, "SCR | L-1");
        assert_eq!(regs[4], 0, "F-1");
        assert_eq!(regs[5], 31, "K-1");
        assert_eq!(regs[6], 1, "M-1");
        assert_eq!(regs[7], 13, "CS=0 | N-1");
        assert_eq!(regs[8], (1 << 5) | 15, "SUBCLASSV | N'-1");
        assert_eq!(regs[9], (1 << 5), "JESDV | S-1");
        assert_eq!(regs[10], 0x80, "HD");
    }

    #[test]
    fn ilas_checksum_sums_fields() {
        let link = negotiate(&BoardLink::fmcdaq2()).unwrap();
        // DID 0 + BID 0 + LID 0 + SCR 1 + L-1 3 + F-1 0 + K-1 31 + M-1 1
        // + N-1 13 + CS 0 + N'-1 15 + SUBCLASSV 1 + S-1 0 + JESDV 1 + HD 1 + CF 0
        assert_eq!(link.ilas_checksum(), 67);
    }

    #[test]
    fn publish_fills_orchestrator_link() {
        let link = negotiate(&BoardLink::fmcdaq2()).unwrap();
        let mut jesd = JesdLink::default();
        link.publish(&mut jesd);
        assert!(jesd.is_transmit);
        assert_eq!(jesd.num_lanes, 4);
        assert_eq!(jesd.sample_rate_hz, 1_000_000_000);
        assert_eq!(jesd.sample_rate_div, 1);
        assert_eq!(jesd.lane_ids.as_slice(), &[0, 1, 2, 3]);
    }
}
