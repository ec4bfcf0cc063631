//! Numerically controlled oscillator (main datapath frequency shift).
//!
//! A carrier at or above `fs/2` leaves the modulator off. Carrier offsets that land exactly on `fs/4` or `fs/8` use the coarse
//! modulators and need no tuning word. Anything else, a zero carrier
//! included, runs the 48-bit fine NCO:
//!
//! ```text
//! FTW = floor(2^48 · |carrier| / fs)
//! ```
//!
//! A negative carrier selects the lower sideband. The tuning word only takes
//! effect after a separate update request.

use embedded_hal::delay::DelayNs;
use platform::{OutOfRangeError, PhaseDegrees, RegisterBus};

use crate::config::MAX_DAC_RATE_KHZ;
use crate::device::Ad9144;
use crate::error::{ArgumentError, Error};
use crate::registers::{
    modulation_type, FTW_UPDATE_REQ, NCO_CTRL_MASK, REG_DATAPATH_CTRL, REG_FTW0,
    REG_NCO_FTW_UPDATE, REG_NCO_PHASE_OFFSET0, REG_NCO_PHASE_OFFSET1, SEL_SIDEBAND,
};

/// Tuning word width in bits.
pub const FTW_BITS: u32 = 48;

/// Datapath modulation selected for a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NcoMode {
    /// Modulation off.
    #[default]
    None,
    /// 48-bit fine NCO.
    Fine,
    /// Coarse fs/4 modulator.
    Coarse4,
    /// Coarse fs/8 modulator.
    Coarse8,
}

impl NcoMode {
    /// `MODULATION_TYPE` field code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            NcoMode::None => 0,
            NcoMode::Fine => 1,
            NcoMode::Coarse4 => 2,
            NcoMode::Coarse8 => 3,
        }
    }
}

/// NCO settings for one carrier request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NcoConfig {
    /// Requested carrier in kHz, signed.
    pub carrier_khz: i32,
    /// Phase offset.
    pub phase: PhaseDegrees,
    /// Selected modulation.
    pub mode: NcoMode,
    /// Tuning word; zero unless `mode` is [`NcoMode::Fine`].
    pub ftw: u64,
    /// Lower sideband selected (negative carrier).
    pub lower_sideband: bool,
}

impl NcoConfig {
    /// Choose the modulation mode and tuning word for `carrier_khz` at a
    /// DAC rate of `sample_rate_khz`.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::Phase`] outside [-180, 180), [`ArgumentError::DacRate`]
    /// for a zero sample rate.
    pub fn compute(
        carrier_khz: i32,
        phase_deg: i16,
        sample_rate_khz: u32,
    ) -> Result<Self, ArgumentError> {
        let phase = PhaseDegrees::new(phase_deg).map_err(ArgumentError::Phase)?;
        if sample_rate_khz == 0 {
            return Err(ArgumentError::DacRate(OutOfRangeError {
                value: 0,
                min: 1,
                max: i64::from(MAX_DAC_RATE_KHZ),
            }));
        }

        let magnitude = carrier_khz.unsigned_abs();
        let fs = u64::from(sample_rate_khz);
        let mag = u64::from(magnitude);

        let mode = if magnitude >= sample_rate_khz / 2 {
            NcoMode::None
        } else if fs == 4 * mag {
            NcoMode::Coarse4
        } else if fs == 8 * mag {
            NcoMode::Coarse8
        } else {
            NcoMode::Fine
        };

        let ftw = if mode == NcoMode::Fine {
            // mag < fs/2, so the quotient is below 2^47.
            let word = (u128::from(mag) << FTW_BITS) / u128::from(fs);
            u64::try_from(word).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            carrier_khz,
            phase,
            mode,
            ftw,
            lower_sideband: carrier_khz < 0,
        })
    }

    /// Frequency the tuning word actually produces, in kHz (rounded down).
    #[must_use]
    pub fn synthesized_khz(&self, sample_rate_khz: u32) -> u64 {
        let product = u128::from(self.ftw) * u128::from(sample_rate_khz);
        u64::try_from(product >> FTW_BITS).unwrap_or(u64::MAX)
    }

    /// `REG_DATAPATH_CTRL` bits under [`NCO_CTRL_MASK`].
    #[must_use]
    pub fn control_bits(&self) -> u8 {
        let sideband = if self.lower_sideband { SEL_SIDEBAND } else { 0 };
        modulation_type(self.mode.code()) | sideband
    }
}

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Retune the NCO at the configured DAC rate.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an out-of-range phase (nothing is
    /// written), or a transport error.
    pub fn set_nco(
        &mut self,
        carrier_khz: i32,
        phase_deg: i16,
    ) -> Result<NcoConfig, Error<B::Error>> {
        let nco = NcoConfig::compute(carrier_khz, phase_deg, self.config.dac_rate_khz)?;
        self.program_nco(&nco)?;
        self.nco = Some(nco);
        Ok(nco)
    }

    pub(crate) fn program_nco(&mut self, nco: &NcoConfig) -> Result<(), Error<B::Error>> {
        debug!(
            "NCO: carrier {} kHz, mode {}, ftw {:#x}",
            nco.carrier_khz,
            nco.mode.code(),
            nco.ftw
        );
        self.update_bits(REG_DATAPATH_CTRL, NCO_CTRL_MASK, nco.control_bits())?;

        let [phase_lo, phase_hi] = nco.phase.register_word().to_le_bytes();
        self.write(REG_NCO_PHASE_OFFSET0, phase_lo)?;
        self.write(REG_NCO_PHASE_OFFSET1, phase_hi)?;

        if nco.mode == NcoMode::Fine {
            let bytes = nco.ftw.to_le_bytes();
            for (reg, byte) in (REG_FTW0..).zip(bytes.iter().take(6)) {
                self.write(reg, *byte)?;
            }
            self.write(REG_NCO_FTW_UPDATE, 0x00)?;
            self.write(REG_NCO_FTW_UPDATE, FTW_UPDATE_REQ)?;
        }
        Ok(())
    }
}
