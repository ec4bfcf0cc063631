//! AD9144 device handle
//!
//! [`Ad9144`] owns the register transport, the delay source, the board
//! configuration and every piece of state derived from it (negotiated link,
//! PLL settings, NCO settings). There is no state outside the instance, so
//! several converters can be driven side by side.
//!
//! The per-block operations live in their own modules as further
//! `impl Ad9144` blocks: [`crate::serdes_pll`], [`crate::dac_pll`],
//! [`crate::nco`], [`crate::health`], [`crate::status`],
//! [`crate::test_modes`] and the link state callbacks in [`crate::link`].

use embedded_hal::delay::DelayNs;
use platform::{LinkState, RegisterBus};

use crate::config::{Ad9144Config, LockPollConfig};
use crate::dac_pll::PllConfig;
use crate::error::{ArgumentError, Error, Pll, TimeoutKind};
use crate::link_config::LinkConfig;
use crate::nco::NcoConfig;
use crate::registers::{
    CHIP_ID, PRODUCT_ID, REG_SPI_CHIPGRADE, REG_SPI_INTFCONFA, REG_SPI_PRODIDH,
    REG_SPI_PRODIDL, SOFTRESET, SOFTRESET_M,
};
use crate::serdes_pll::SerdesPllConfig;

/// Settling time after a soft reset.
const RESET_SETTLE_MS: u32 = 1;

/// Identity read back by [`Ad9144::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipInfo {
    /// `PRODIDH:PRODIDL`.
    pub product_id: u16,
    /// Speed grade, `CHIPGRADE[7:4]`.
    pub grade: u8,
    /// Die revision, `CHIPGRADE[3:0]`.
    pub revision: u8,
}

/// Result of a bounded lock poll.
///
/// Bring-up logs an unlocked PLL and carries on; a standalone caller
/// converts with [`LockOutcome::into_result`] to fail fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockOutcome {
    /// PLL polled.
    pub pll: Pll,
    /// All lock bits were seen set.
    pub locked: bool,
    /// Last status byte read.
    pub last_status: u8,
    /// Status reads performed.
    pub attempts: u8,
}

impl LockOutcome {
    /// `Ok(self)` if locked, `Err(Timeout(PllNotLocked))` otherwise.
    pub fn into_result<E>(self) -> Result<Self, Error<E>> {
        if self.locked {
            Ok(self)
        } else {
            Err(Error::Timeout(TimeoutKind::PllNotLocked(self.pll)))
        }
    }
}

/// AD9144 quad 16-bit DAC with JESD204B receiver.
pub struct Ad9144<B, D> {
    pub(crate) bus: B,
    pub(crate) delay: D,
    pub(crate) config: Ad9144Config,
    pub(crate) link: Option<LinkConfig>,
    pub(crate) serdes_pll: Option<SerdesPllConfig>,
    pub(crate) dac_pll: Option<PllConfig>,
    pub(crate) nco: Option<NcoConfig>,
    pub(crate) state: Option<LinkState>,
}

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Create a driver after validating `config`.
    ///
    /// No bus traffic happens here; call [`probe`](Self::probe) to reset and
    /// identify the part.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `config` fails [`Ad9144Config::validate`].
    pub fn new(bus: B, delay: D, config: Ad9144Config) -> Result<Self, Error<B::Error>> {
        config.validate()?;
        Ok(Self {
            bus,
            delay,
            config,
            link: None,
            serdes_pll: None,
            dac_pll: None,
            nco: None,
            state: None,
        })
    }

    /// Give back the transport and delay.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    /// Board configuration.
    pub fn config(&self) -> &Ad9144Config {
        &self.config
    }

    /// Negotiated link, once `on_link_init` has run.
    pub fn link_config(&self) -> Option<&LinkConfig> {
        self.link.as_ref()
    }

    /// SERDES PLL settings from the last Setup.
    pub fn serdes_pll_config(&self) -> Option<&SerdesPllConfig> {
        self.serdes_pll.as_ref()
    }

    /// DAC PLL settings from the last Setup or standalone call.
    pub fn pll_config(&self) -> Option<&PllConfig> {
        self.dac_pll.as_ref()
    }

    /// Last programmed NCO settings.
    pub fn nco_config(&self) -> Option<&NcoConfig> {
        self.nco.as_ref()
    }

    /// Last link state whose callback completed with reason `Init`.
    pub fn state(&self) -> Option<LinkState> {
        self.state
    }

    /// Soft reset the part and check its product ID.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedDevice`] if the ID is not 0x9144, or a transport
    /// error.
    pub fn probe(&mut self) -> Result<ChipInfo, Error<B::Error>> {
        self.write(REG_SPI_INTFCONFA, SOFTRESET_M | SOFTRESET)?;
        self.write(REG_SPI_INTFCONFA, 0x00)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        let low = self.read(REG_SPI_PRODIDL)?;
        let high = self.read(REG_SPI_PRODIDH)?;
        let product_id = u16::from_be_bytes([high, low]);
        if low != CHIP_ID || product_id != PRODUCT_ID {
            error!("unexpected AD9144 product ID {:#x}", product_id);
            return Err(Error::UnsupportedDevice { product_id });
        }

        let grade = self.read(REG_SPI_CHIPGRADE)?;
        let info = ChipInfo {
            product_id,
            grade: grade >> 4,
            revision: grade & 0x0F,
        };
        info!(
            "AD9144 detected, grade {} revision {}",
            info.grade, info.revision
        );
        self.link = None;
        self.serdes_pll = None;
        self.dac_pll = None;
        self.nco = None;
        self.state = None;
        Ok(info)
    }

    // -----------------------------------------------------------------------
    // Register helpers
    // -----------------------------------------------------------------------

    pub(crate) fn read(&mut self, reg: u16) -> Result<u8, Error<B::Error>> {
        self.bus.read_reg(reg).map_err(Error::Transport)
    }

    pub(crate) fn write(&mut self, reg: u16, value: u8) -> Result<(), Error<B::Error>> {
        self.bus.write_reg(reg, value).map_err(Error::Transport)
    }

    /// Write a fixed `(register, value)` sequence in order.
    pub(crate) fn write_seq(&mut self, seq: &[(u16, u8)]) -> Result<(), Error<B::Error>> {
        for &(reg, value) in seq {
            self.write(reg, value)?;
        }
        Ok(())
    }

    /// Read-modify-write: replace the bits under `mask` with `value`.
    pub(crate) fn update_bits(
        &mut self,
        reg: u16,
        mask: u8,
        value: u8,
    ) -> Result<(), Error<B::Error>> {
        let current = self.read(reg)?;
        self.write(reg, (current & !mask) | (value & mask))
    }

    /// Poll `reg` until every bit in `mask` is set, at most
    /// `poll.attempts` reads with `poll.interval_ms` between them.
    ///
    /// An unlocked PLL is reported in the outcome, not as an error; only a
    /// transport failure is an `Err`.
    pub(crate) fn poll_lock(
        &mut self,
        pll: Pll,
        reg: u16,
        mask: u8,
        poll: LockPollConfig,
    ) -> Result<LockOutcome, Error<B::Error>> {
        let mut outcome = LockOutcome {
            pll,
            locked: false,
            last_status: 0,
            attempts: 0,
        };
        for _ in 0..poll.attempts {
            outcome.last_status = self.read(reg)?;
            outcome.attempts = outcome.attempts.saturating_add(1);
            if outcome.last_status & mask == mask {
                outcome.locked = true;
                return Ok(outcome);
            }
            self.delay.delay_ms(poll.interval_ms);
        }
        Ok(outcome)
    }

    /// Negotiated link or `LinkNotNegotiated`.
    pub(crate) fn negotiated(&self) -> Result<LinkConfig, Error<B::Error>> {
        self.link
            .ok_or(Error::InvalidArgument(ArgumentError::LinkNotNegotiated))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{MockDelay, MockRegisterBus};

    fn device(bus: &mut MockRegisterBus) -> Ad9144<&mut MockRegisterBus, MockDelay> {
        Ad9144::new(bus, MockDelay::new(), Ad9144Config::fmcdaq2()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config_without_bus_traffic() {
        let mut bus = MockRegisterBus::new();
        let mut cfg = Ad9144Config::fmcdaq2();
        cfg.nco.phase_deg = -181;
        let result = Ad9144::new(&mut bus, MockDelay::new(), cfg);
        assert!(matches!(
            result,
            Err(Error::InvalidArgument(ArgumentError::Phase(_)))
        ));
        assert!(bus.log().is_empty());
    }

    #[test]
    fn probe_resets_then_identifies() {
        let mut bus = MockRegisterBus::new();
        bus.set(REG_SPI_PRODIDL, 0x44)
            .set(REG_SPI_PRODIDH, 0x91)
            .set(REG_SPI_CHIPGRADE, 0x16);
        let info = device(&mut bus).probe().unwrap();
        assert_eq!(
            info,
            ChipInfo {
                product_id: 0x9144,
                grade: 1,
                revision: 6
            }
        );
        assert_eq!(bus.writes_to(REG_SPI_INTFCONFA), vec![0x81, 0x00]);
    }

    #[test]
    fn probe_rejects_other_parts() {
        let mut bus = MockRegisterBus::new();
        bus.set(REG_SPI_PRODIDL, 0x52).set(REG_SPI_PRODIDH, 0x91);
        let err = device(&mut bus).probe().unwrap_err();
        assert_eq!(err, Error::UnsupportedDevice { product_id: 0x9152 });
    }

    #[test]
    fn update_bits_preserves_unmasked_bits() {
        let mut bus = MockRegisterBus::new();
        bus.set(0x111, 0b1010_0001);
        device(&mut bus).update_bits(0x111, 0x0E, 0x06).unwrap();
        assert_eq!(bus.get(0x111), 0b1010_0111);
    }

    #[test]
    fn poll_lock_stops_at_first_locked_read() {
        let mut bus = MockRegisterBus::new();
        bus.script(0x281, &[0x00, 0x00, 0x09]);
        let mut dev = device(&mut bus);
        let outcome = dev
            .poll_lock(Pll::Serdes, 0x281, 0x01, LockPollConfig::default())
            .unwrap();
        assert!(outcome.locked);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.last_status, 0x09);
        let (_, delay) = dev.release();
        assert_eq!(delay.total_ms(), 20, "two misses, 10 ms each");
    }

    #[test]
    fn poll_lock_gives_up_after_budget() {
        let mut bus = MockRegisterBus::new();
        bus.set(0x084, 0x20);
        let mut dev = device(&mut bus);
        let poll = LockPollConfig {
            attempts: 4,
            interval_ms: 5,
        };
        let outcome = dev.poll_lock(Pll::Dac, 0x084, 0x22, poll).unwrap();
        assert!(!outcome.locked);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(
            outcome.into_result::<()>(),
            Err(Error::Timeout(TimeoutKind::PllNotLocked(Pll::Dac)))
        );
        drop(dev);
        assert_eq!(bus.reads_of(0x084), 4);
    }
}
