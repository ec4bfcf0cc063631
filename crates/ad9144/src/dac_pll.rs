//! On-chip DAC clock PLL.
//!
//! # Divider chain
//!
//! ```text
//! fdac = fref / 2^ref_div · 2 · bcount       (PFD = fref / 2^ref_div ≤ 80 MHz)
//! fvco = fdac · 2^(lo_div + 1)
//! ```
//!
//! The LO divider is picked from the output frequency, the reference is
//! halved until the phase detector input is at most 80 MHz, and the feedback
//! count must be at least 6 (otherwise the reference is halved once more and
//! the count doubled). The VCO bias preset depends on the resulting VCO
//! frequency.

use embedded_hal::delay::DelayNs;
use platform::{DacClockKhz, RefClockKhz, RegisterBus};

use crate::device::{Ad9144, LockOutcome};
use crate::error::{ArgumentError, Error, Pll};
use crate::registers::{
    DACPLL_LOCK_MASK, ENABLE_SYNTH, REG_DACCPCNTRL, REG_DACINTEGERWORD0, REG_DACLDOCNTRL1,
    REG_DACLDOCNTRL2, REG_DACLOGENCNTRL, REG_DACLOOPFILT1, REG_DACLOOPFILT2, REG_DACLOOPFILT3,
    REG_DACPLLCNTRL, REG_DACPLLSTATUS, REG_DACPLLT17, REG_DACPLLT5, REG_DACPLLTB, REG_DACPLLTD,
    SYNTH_RECAL,
};

/// Highest phase-detector input frequency, in kHz.
pub const MAX_PFD_KHZ: u32 = 80_000;

/// Smallest feedback count the synthesizer accepts.
const MIN_BCOUNT: u32 = 6;

/// Loop filter, charge pump and calibration constants written before the
/// computed dividers.
pub const DAC_PLL_PRECAL: [(u16, u8); 12] = [
    (REG_DACLOOPFILT1, 0x62),
    (REG_DACLOOPFILT2, 0xC9),
    (REG_DACLOOPFILT3, 0x0E),
    (REG_DACCPCNTRL, 0x12),
    (REG_DACLDOCNTRL2, 0x7B),
    (0x1B0, 0x00),
    (0x1B9, 0x24),
    (0x1BC, 0x0D),
    (0x1BE, 0x02),
    (0x1BF, 0x8E),
    (0x1C0, 0x2A),
    (0x1C1, 0x2A),
];

/// VCO bias and calibration values for one VCO band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacVcoPreset {
    /// `REG_DACPLLT5`
    pub t5: u8,
    /// `REG_DACPLLTB`
    pub tb: u8,
    /// `REG_DACPLLT17`
    pub t17: u8,
    /// `REG_DACPLLTD`
    pub td: u8,
}

/// VCO presets by VCO frequency (kHz, exclusive upper bound).
pub const DAC_VCO_TABLE: [(u32, DacVcoPreset); 3] = [
    (
        6_840_000,
        DacVcoPreset {
            t5: 0x08,
            tb: 0x03,
            t17: 0x07,
            td: 0x06,
        },
    ),
    (
        8_690_000,
        DacVcoPreset {
            t5: 0x09,
            tb: 0x03,
            t17: 0x07,
            td: 0x06,
        },
    ),
    (
        u32::MAX,
        DacVcoPreset {
            t5: 0x09,
            tb: 0x13,
            t17: 0x04,
            td: 0x06,
        },
    ),
];

/// Computed DAC PLL settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    /// Reference input, kHz.
    pub ref_khz: u32,
    /// Requested DAC clock, kHz.
    pub target_khz: u32,
    /// LO divider code: output is the VCO divided by `2^(lo_div_mode + 1)`.
    pub lo_div_mode: u8,
    /// Reference divider code: reference is divided by `2^ref_div_mode`.
    pub ref_div_mode: u8,
    /// Feedback integer word.
    pub bcount: u32,
    /// VCO frequency, kHz.
    pub fvco_khz: u32,
    /// Index of the selected row of [`DAC_VCO_TABLE`].
    pub vco_band: usize,
    /// Selected VCO preset.
    pub vco: DacVcoPreset,
    /// Lock result, once the PLL has been enabled.
    pub lock: Option<LockOutcome>,
}

impl PllConfig {
    /// Compute dividers for `fdac` from `fref`.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::RefClock`] or [`ArgumentError::DacClock`] when either
    /// frequency is outside its range.
    pub fn compute(ref_khz: u32, target_khz: u32) -> Result<Self, ArgumentError> {
        let fref = RefClockKhz::new(ref_khz).map_err(ArgumentError::RefClock)?.get();
        let fdac = DacClockKhz::new(target_khz)
            .map_err(ArgumentError::DacClock)?
            .get();

        let lo_div_mode: u8 = if fdac >= 1_500_000 {
            1
        } else if fdac >= 750_000 {
            2
        } else {
            3
        };

        let mut pfd = fref;
        let mut ref_div_mode: u8 = 0;
        while pfd > MAX_PFD_KHZ {
            pfd /= 2;
            ref_div_mode += 1;
        }

        // fdac ≤ 2.25 GHz, so the shift by at most 4 stays below 2^32.
        let fvco_khz = fdac << (lo_div_mode + 1);
        let mut bcount = fdac / (2 * pfd);
        if bcount < MIN_BCOUNT {
            bcount *= 2;
            ref_div_mode += 1;
        }

        let (vco_band, vco) = DAC_VCO_TABLE
            .iter()
            .enumerate()
            .find(|(_, (bound, _))| fvco_khz < *bound)
            .map(|(i, (_, preset))| (i, *preset))
            .unwrap_or((DAC_VCO_TABLE.len() - 1, DAC_VCO_TABLE[2].1));

        Ok(Self {
            ref_khz,
            target_khz,
            lo_div_mode,
            ref_div_mode,
            bcount,
            fvco_khz,
            vco_band,
            vco,
            lock: None,
        })
    }
}

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Program the DAC PLL and wait for lock.
    ///
    /// Both frequencies are range-checked before any register is written.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for out-of-range frequencies
    /// - [`Error::Timeout`] if the PLL does not lock within the configured
    ///   polling budget
    /// - [`Error::Transport`] on bus failure
    pub fn configure_dac_pll(
        &mut self,
        ref_khz: u32,
        target_khz: u32,
    ) -> Result<PllConfig, Error<B::Error>> {
        let pll = self.program_dac_pll(ref_khz, target_khz)?;
        if let Some(lock) = pll.lock {
            lock.into_result::<B::Error>()?;
        }
        Ok(pll)
    }

    /// Program the DAC PLL; an unlocked PLL is logged, not returned as an
    /// error.
    pub(crate) fn program_dac_pll(
        &mut self,
        ref_khz: u32,
        target_khz: u32,
    ) -> Result<PllConfig, Error<B::Error>> {
        let mut pll = PllConfig::compute(ref_khz, target_khz)?;
        debug!(
            "DAC PLL: lo_div {} ref_div {} bcount {} fvco {} kHz",
            pll.lo_div_mode, pll.ref_div_mode, pll.bcount, pll.fvco_khz
        );

        self.write_seq(&DAC_PLL_PRECAL)?;
        self.write_seq(&[
            (REG_DACPLLT5, pll.vco.t5),
            (REG_DACPLLTB, pll.vco.tb),
            (REG_DACPLLT17, pll.vco.t17),
            (REG_DACPLLTD, pll.vco.td),
            (REG_DACLOGENCNTRL, pll.lo_div_mode),
            (REG_DACLDOCNTRL1, pll.ref_div_mode),
            // PFD ≥ 40 MHz, so bcount ≤ 2.25e6 / 80e3 < 29
            (REG_DACINTEGERWORD0, u8::try_from(pll.bcount).unwrap_or(u8::MAX)),
            (REG_DACPLLCNTRL, ENABLE_SYNTH),
            (REG_DACPLLCNTRL, ENABLE_SYNTH | SYNTH_RECAL),
        ])?;

        let poll = self.config.dac_pll_lock;
        let lock = self.poll_lock(Pll::Dac, REG_DACPLLSTATUS, DACPLL_LOCK_MASK, poll)?;
        if lock.locked {
            info!("DAC PLL locked at {} kHz", target_khz);
        } else {
            warn!("DAC PLL not locked (status {:#x})", lock.last_status);
        }
        pll.lock = Some(lock);
        self.dac_pll = Some(pll);
        Ok(pll)
    }
}
