//! SERDES receiver PLL and CDR configuration.
//!
//! The deserializer PLL is programmed in three steps:
//!
//! 1. A fixed vendor-calibrated register block, identical for every lane
//!    rate.
//! 2. A VCO preset chosen by lane rate (one threshold at 7.15 Gbps) and a
//!    CDR/divider preset chosen by lane-rate band (half-rate above
//!    6.19 Gbps, full-rate above 3.09 Gbps, oversampled below).
//! 3. Enable and recalibrate, then poll for lock.
//!
//! Both presets come from ordered `(upper bound, preset)` tables; the first
//! entry whose bound exceeds the lane rate wins.
//!
//! A missing lock is logged and bring-up continues: the link health check
//! in `Running` will report the failure with a more specific category.

use embedded_hal::delay::DelayNs;
use platform::RegisterBus;

use crate::device::{Ad9144, LockOutcome};
use crate::error::{Error, Pll};
use crate::registers::{
    EQ_BIAS_LOW_POWER, REG_CDR_OPERATING_MODE_REG_0, REG_EQ_BIAS_REG, REG_GENERIC_PD,
    REG_MASTER_PD, REG_PHY_PD, REG_PLL_STATUS, REG_REF_CLK_DIVIDER_LDO, REG_SYNTH_ENABLE_CNTRL,
    REG_TERM_BLK1_CTRLREG0, REG_TERM_BLK2_CTRLREG0, SPI_ENABLE_SYNTH, SPI_I_TUNE_R_CAL_TERMBLK,
    SPI_PLL_LOCK_RB, SPI_RECAL_SYNTH,
};

/// Vendor-calibrated SERDES PLL settings, written before any preset.
pub const OPTIMAL_SERDES_SETTINGS: [(u16, u8); 13] = [
    (0x284, 0x62),
    (0x285, 0xC9),
    (0x286, 0x0E),
    (0x287, 0x12),
    (0x28A, 0x7B),
    (0x28B, 0x00),
    (0x290, 0x89),
    (0x294, 0x24),
    (0x297, 0x0D),
    (0x299, 0x02),
    (0x29A, 0x8E),
    (0x29C, 0x2A),
    (0x2A0, 0x06),
];

/// SERDES VCO band settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerdesVcoPreset {
    /// VCO LDO / bias (0x296).
    pub vco_bias: u8,
    /// VCO varactor (0x29F).
    pub varactor: u8,
}

/// VCO band register 0x296.
pub const REG_SERDES_VCO_BIAS: u16 = 0x296;
/// VCO varactor register 0x29F.
pub const REG_SERDES_VCO_VARACTOR: u16 = 0x29F;

/// VCO presets by lane rate (kHz, exclusive upper bound).
pub const SERDES_VCO_TABLE: [(u32, SerdesVcoPreset); 2] = [
    (
        7_150_000,
        SerdesVcoPreset {
            vco_bias: 0x1B,
            varactor: 0x78,
        },
    ),
    (
        u32::MAX,
        SerdesVcoPreset {
            vco_bias: 0x0C,
            varactor: 0x7B,
        },
    ),
];

/// CDR sampling and PLL reference divider for one lane-rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CdrPreset {
    /// `REG_CDR_OPERATING_MODE_REG_0`: half-rate enable and division rate.
    pub cdr_mode: u8,
    /// `REG_REF_CLK_DIVIDER_LDO`: CDR oversampling.
    pub ref_divider: u8,
}

/// CDR presets by lane rate (kHz, exclusive upper bound).
pub const CDR_TABLE: [(u32, CdrPreset); 3] = [
    (
        3_090_000,
        CdrPreset {
            cdr_mode: 0x0A,
            ref_divider: 0x06,
        },
    ),
    (
        6_190_000,
        CdrPreset {
            cdr_mode: 0x08,
            ref_divider: 0x05,
        },
    ),
    (
        u32::MAX,
        CdrPreset {
            cdr_mode: 0x28,
            ref_divider: 0x04,
        },
    ),
];

/// First preset whose bound exceeds `lane_rate_khz`.
///
/// Tables end with a `u32::MAX` bound, so the last entry catches everything
/// else (including `u32::MAX` itself).
fn select<T: Copy>(table: &[(u32, T)], lane_rate_khz: u32) -> Option<T> {
    table
        .iter()
        .find(|(bound, _)| lane_rate_khz < *bound)
        .or_else(|| table.last())
        .map(|(_, preset)| *preset)
}

/// Settings chosen for a lane rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerdesPllConfig {
    /// Lane rate in kHz.
    pub lane_rate_khz: u32,
    /// VCO preset.
    pub vco: SerdesVcoPreset,
    /// CDR preset.
    pub cdr: CdrPreset,
    /// Lock result of the last enable, if the PLL has been enabled.
    pub lock: Option<LockOutcome>,
}

impl SerdesPllConfig {
    /// Pick the presets for `lane_rate_khz`.
    #[must_use]
    pub fn for_lane_rate(lane_rate_khz: u32) -> Self {
        // Both tables are non-empty constants.
        let vco = select(&SERDES_VCO_TABLE, lane_rate_khz).unwrap_or(SERDES_VCO_TABLE[1].1);
        let cdr = select(&CDR_TABLE, lane_rate_khz).unwrap_or(CDR_TABLE[2].1);
        Self {
            lane_rate_khz,
            vco,
            cdr,
            lock: None,
        }
    }
}

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Power the receiver PHYs for `physical_lanes` and calibrate their
    /// termination.
    pub(crate) fn power_up_phy(&mut self, physical_lanes: u8) -> Result<(), Error<B::Error>> {
        self.write_seq(&[
            (REG_MASTER_PD, 0x00),
            (REG_PHY_PD, !physical_lanes),
            (REG_GENERIC_PD, 0x00),
            (REG_EQ_BIAS_REG, EQ_BIAS_LOW_POWER),
            (REG_TERM_BLK1_CTRLREG0, SPI_I_TUNE_R_CAL_TERMBLK),
            (REG_TERM_BLK2_CTRLREG0, SPI_I_TUNE_R_CAL_TERMBLK),
        ])
    }

    /// Program and enable the SERDES PLL for `lane_rate_khz`.
    ///
    /// Returns the settings with the lock outcome filled in. An unlocked PLL
    /// is not an error here; see [`LockOutcome::into_result`].
    ///
    /// # Errors
    ///
    /// Transport errors only.
    pub fn configure_serdes_pll(
        &mut self,
        lane_rate_khz: u32,
    ) -> Result<SerdesPllConfig, Error<B::Error>> {
        let mut pll = SerdesPllConfig::for_lane_rate(lane_rate_khz);
        debug!(
            "SERDES PLL: lane rate {} kHz, CDR mode {:#x}, divider {:#x}",
            lane_rate_khz, pll.cdr.cdr_mode, pll.cdr.ref_divider
        );

        self.write_seq(&OPTIMAL_SERDES_SETTINGS)?;
        self.write_seq(&[
            (REG_SERDES_VCO_BIAS, pll.vco.vco_bias),
            (REG_SERDES_VCO_VARACTOR, pll.vco.varactor),
            (REG_CDR_OPERATING_MODE_REG_0, pll.cdr.cdr_mode),
            (REG_REF_CLK_DIVIDER_LDO, pll.cdr.ref_divider),
            (REG_SYNTH_ENABLE_CNTRL, SPI_ENABLE_SYNTH | SPI_RECAL_SYNTH),
            (REG_SYNTH_ENABLE_CNTRL, SPI_ENABLE_SYNTH),
        ])?;

        let poll = self.config.serdes_lock;
        let lock = self.poll_lock(Pll::Serdes, REG_PLL_STATUS, SPI_PLL_LOCK_RB, poll)?;
        if lock.locked {
            info!("SERDES PLL locked after {} reads", lock.attempts);
        } else {
            warn!(
                "SERDES PLL not locked (status {:#x}), continuing",
                lock.last_status
            );
        }
        pll.lock = Some(lock);
        self.serdes_pll = Some(pll);
        Ok(pll)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Ad9144Config;
    use platform::mocks::{MockDelay, MockRegisterBus};

    #[test]
    fn vco_threshold_is_7_15_gbps() {
        assert_eq!(
            SerdesPllConfig::for_lane_rate(7_149_999).vco,
            SERDES_VCO_TABLE[0].1
        );
        assert_eq!(
            SerdesPllConfig::for_lane_rate(7_150_000).vco,
            SERDES_VCO_TABLE[1].1
        );
    }

    #[test]
    fn cdr_bands() {
        assert_eq!(SerdesPllConfig::for_lane_rate(1_500_000).cdr, CDR_TABLE[0].1);
        assert_eq!(SerdesPllConfig::for_lane_rate(3_089_999).cdr, CDR_TABLE[0].1);
        assert_eq!(SerdesPllConfig::for_lane_rate(3_090_000).cdr, CDR_TABLE[1].1);
        assert_eq!(SerdesPllConfig::for_lane_rate(6_189_999).cdr, CDR_TABLE[1].1);
        assert_eq!(SerdesPllConfig::for_lane_rate(6_190_000).cdr, CDR_TABLE[2].1);
        assert_eq!(SerdesPllConfig::for_lane_rate(10_000_000).cdr, CDR_TABLE[2].1);
        assert_eq!(SerdesPllConfig::for_lane_rate(u32::MAX).cdr, CDR_TABLE[2].1);
    }

    #[test]
    fn optimal_settings_precede_presets_and_enable() {
        let mut bus = MockRegisterBus::new();
        bus.set(REG_PLL_STATUS, SPI_PLL_LOCK_RB);
        let mut dev = Ad9144::new(&mut bus, MockDelay::new(), Ad9144Config::fmcdaq2()).unwrap();
        let pll = dev.configure_serdes_pll(10_000_000).unwrap();
        assert!(pll.lock.unwrap().locked);
        drop(dev);

        let writes = bus.writes();
        assert_eq!(&writes[..OPTIMAL_SERDES_SETTINGS.len()], &OPTIMAL_SERDES_SETTINGS);
        assert_eq!(
            &writes[OPTIMAL_SERDES_SETTINGS.len()..],
            &[
                (REG_SERDES_VCO_BIAS, 0x0C),
                (REG_SERDES_VCO_VARACTOR, 0x7B),
                (REG_CDR_OPERATING_MODE_REG_0, 0x28),
                (REG_REF_CLK_DIVIDER_LDO, 0x04),
                (REG_SYNTH_ENABLE_CNTRL, 0x05),
                (REG_SYNTH_ENABLE_CNTRL, 0x01),
            ]
        );
    }

    #[test]
    fn missing_lock_is_reported_not_raised() {
        let mut bus = MockRegisterBus::new();
        let mut dev = Ad9144::new(&mut bus, MockDelay::new(), Ad9144Config::fmcdaq2()).unwrap();
        let pll = dev.configure_serdes_pll(5_000_000).unwrap();
        let lock = pll.lock.unwrap();
        assert!(!lock.locked);
        assert_eq!(lock.attempts, 10);
        assert!(lock.into_result::<()>().is_err());
    }
}
