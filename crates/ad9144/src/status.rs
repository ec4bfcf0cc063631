//! One-shot status readout.

use embedded_hal::delay::DelayNs;
use platform::RegisterBus;

use crate::device::Ad9144;
use crate::error::Error;
use crate::health::HealthStatus;
use crate::registers::{
    DACPLL_LOCK_MASK, ERR_DLYOVER, ERR_INTSUPP, ERR_JESDBAD, ERR_KUNSUPP, ERR_SUBCLASS,
    ERR_WINLIMIT, REFBUSY, REFLOCK, REFROTA, REFTRIP, REFWLIM, REG_DACPLLSTATUS,
    REG_JESD_CHECKS, REG_PLL_STATUS, REG_SYNC_STATUS, SPI_PLL_LOCK_RB,
};

/// SYSREF alignment flags from `REG_SYNC_STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncStatus {
    /// Alignment in progress.
    pub busy: bool,
    /// LMFC aligned to SYSREF.
    pub locked: bool,
    /// Alignment rotated the LMFC.
    pub rotated: bool,
    /// Phase error inside the window limit.
    pub within_window: bool,
    /// Alignment was triggered.
    pub tripped: bool,
}

impl SyncStatus {
    /// Decode the raw register.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            busy: bits & REFBUSY != 0,
            locked: bits & REFLOCK != 0,
            rotated: bits & REFROTA != 0,
            within_window: bits & REFWLIM != 0,
            tripped: bits & REFTRIP != 0,
        }
    }
}

/// Configuration consistency errors latched in `REG_JESD_CHECKS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigChecks {
    /// LMFC delay exceeds the multiframe.
    pub delay_overflow: bool,
    /// Unsupported window limit.
    pub window_limit: bool,
    /// Unsupported link parameter combination.
    pub bad_parameters: bool,
    /// Unsupported K.
    pub k_unsupported: bool,
    /// Unsupported subclass.
    pub subclass: bool,
    /// Unsupported interpolation.
    pub interpolation: bool,
}

impl ConfigChecks {
    /// Decode the raw register.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            delay_overflow: bits & ERR_DLYOVER != 0,
            window_limit: bits & ERR_WINLIMIT != 0,
            bad_parameters: bits & ERR_JESDBAD != 0,
            k_unsupported: bits & ERR_KUNSUPP != 0,
            subclass: bits & ERR_SUBCLASS != 0,
            interpolation: bits & ERR_INTSUPP != 0,
        }
    }

    /// No check flagged.
    #[must_use]
    pub fn all_clear(&self) -> bool {
        *self == Self::default()
    }
}

/// Snapshot of lock, alignment and lane status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// SERDES PLL lock bit.
    pub serdes_pll_locked: bool,
    /// DAC PLL lock and calibration bits, when the PLL is in use.
    pub dac_pll_locked: Option<bool>,
    /// SYSREF alignment.
    pub sync: SyncStatus,
    /// Link parameter checks.
    pub checks: ConfigChecks,
    /// Lane status, once the link has been negotiated.
    pub lanes: Option<HealthStatus>,
}

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Read every status register once.
    ///
    /// # Errors
    ///
    /// Transport errors only; unlocked PLLs are reported and logged.
    pub fn status(&mut self) -> Result<StatusReport, Error<B::Error>> {
        let serdes_pll_locked = self.read(REG_PLL_STATUS)? & SPI_PLL_LOCK_RB != 0;
        let dac_pll_locked = if self.config.dac_pll.is_some() {
            Some(self.read(REG_DACPLLSTATUS)? & DACPLL_LOCK_MASK == DACPLL_LOCK_MASK)
        } else {
            None
        };
        let sync = SyncStatus::from_bits(self.read(REG_SYNC_STATUS)?);
        let checks = ConfigChecks::from_bits(self.read(REG_JESD_CHECKS)?);
        let lanes = match self.link {
            Some(link) => Some(self.read_health(link.lanes)?),
            None => None,
        };

        if !serdes_pll_locked {
            warn!("SERDES PLL unlocked");
        }
        if dac_pll_locked == Some(false) {
            warn!("DAC PLL unlocked");
        }
        if !checks.all_clear() {
            warn!("JESD204 configuration check failed: {:?}", checks);
        }

        Ok(StatusReport {
            serdes_pll_locked,
            dac_pll_locked,
            sync,
            checks,
            lanes,
        })
    }
}
