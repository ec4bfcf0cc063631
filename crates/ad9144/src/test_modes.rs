//! Link and datapath self-tests.
//!
//! - Short transport-layer test: the receiver compares one sample slot of
//!   one converter against an expected value. The transmitter must be
//!   sending the matching short test pattern.
//! - Datapath PRBS: the DAC datapath checks a PRBS7 or PRBS15 sequence
//!   arriving over the link, separately for each DAC pair.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use platform::RegisterBus;

use crate::device::Ad9144;
use crate::error::{ArgumentError, Error, Fault};
use crate::registers::{
    short_tpl_m_sel, short_tpl_sp_sel, PAGEINDX_ALL, PAGEINDX_DAC01, PAGEINDX_DAC23, PRBS_EN,
    PRBS_GOOD_I, PRBS_GOOD_Q, PRBS_MODE, PRBS_RESET, REG_PRBS, REG_PRBS_ERROR_I,
    REG_PRBS_ERROR_Q, REG_SHORT_TPL_TEST_0, REG_SHORT_TPL_TEST_1, REG_SHORT_TPL_TEST_2,
    REG_SHORT_TPL_TEST_3, REG_SPI_PAGEINDX, SHORT_TPL_FAIL, SHORT_TPL_TEST_EN,
    SHORT_TPL_TEST_RESET,
};

/// Sample slots the short pattern checker can select.
pub const SHORT_TPL_SLOTS: usize = 4;

/// Checker settling time per slot.
const SHORT_TPL_SETTLE_MS: u32 = 1;

/// Time the PRBS checker runs before the result is read.
pub const PRBS_SETTLE_MS: u32 = 500;

/// Datapath PRBS polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrbsPattern {
    /// x^7 + x^6 + 1
    #[default]
    Prbs7,
    /// x^15 + x^14 + 1
    Prbs15,
}

/// Result for one DAC pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrbsPairResult {
    /// Page index of the pair (1 = DAC0/1, 2 = DAC2/3).
    pub page: u8,
    /// Raw `REG_PRBS` readback.
    pub status: u8,
    /// I-channel error count (saturating).
    pub errors_i: u8,
    /// Q-channel error count (saturating).
    pub errors_q: u8,
}

impl PrbsPairResult {
    /// Both channels report good data.
    #[must_use]
    pub fn good(&self) -> bool {
        let mask = PRBS_GOOD_I | PRBS_GOOD_Q;
        self.status & mask == mask
    }
}

/// Per-pair PRBS results.
pub type PrbsReport = Vec<PrbsPairResult, 2>;

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Run the short transport-layer test.
    ///
    /// `expected[m][s]` is the sample converter `m` should carry in slot `s`.
    /// Only the first `S` slots (at most four) are checked. The checker is
    /// disabled again before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::HardwareFault`] with [`Fault::ShortPatternTest`] for the
    ///   first mismatching converter and slot
    /// - [`Error::InvalidArgument`] before `on_link_init`, or when fewer
    ///   sample sets than converters are given
    pub fn short_pattern_test(
        &mut self,
        expected: &[[u16; SHORT_TPL_SLOTS]],
    ) -> Result<(), Error<B::Error>> {
        let link = self.negotiated()?;
        if expected.len() < usize::from(link.converters) {
            return Err(ArgumentError::MissingPatternSamples {
                converters: link.converters,
                provided: expected.len(),
            }
            .into());
        }
        let slots = usize::from(link.samples_per_conv_frame).min(SHORT_TPL_SLOTS);

        let result = self.run_short_pattern(expected, link.converters, slots);
        self.write(REG_SHORT_TPL_TEST_0, 0x00)?;
        result
    }

    fn run_short_pattern(
        &mut self,
        expected: &[[u16; SHORT_TPL_SLOTS]],
        converters: u8,
        slots: usize,
    ) -> Result<(), Error<B::Error>> {
        for (converter, samples) in (0..converters).zip(expected) {
            for (sample, value) in (0u8..).zip(samples.iter().take(slots)) {
                let sel = short_tpl_m_sel(converter) | short_tpl_sp_sel(sample);
                let [hi, lo] = value.to_be_bytes();
                self.write_seq(&[
                    (REG_SHORT_TPL_TEST_0, sel),
                    (REG_SHORT_TPL_TEST_2, hi),
                    (REG_SHORT_TPL_TEST_1, lo),
                    (REG_SHORT_TPL_TEST_0, sel | SHORT_TPL_TEST_EN),
                    (REG_SHORT_TPL_TEST_0, sel | SHORT_TPL_TEST_EN | SHORT_TPL_TEST_RESET),
                    (REG_SHORT_TPL_TEST_0, sel | SHORT_TPL_TEST_EN),
                ])?;
                self.delay.delay_ms(SHORT_TPL_SETTLE_MS);
                if self.read(REG_SHORT_TPL_TEST_3)? & SHORT_TPL_FAIL != 0 {
                    error!(
                        "short pattern mismatch: converter {} sample {} expected {:#x}",
                        converter, sample, *value
                    );
                    return Err(Fault::ShortPatternTest { converter, sample }.into());
                }
            }
        }
        info!("short transport-layer test passed");
        Ok(())
    }

    /// Run the datapath PRBS test.
    ///
    /// # Errors
    ///
    /// - [`Error::HardwareFault`] with [`Fault::DatapathPrbs`] naming the first
    ///   pair without good data
    /// - [`Error::InvalidArgument`] before `on_link_init`
    pub fn datapath_prbs_test(
        &mut self,
        pattern: PrbsPattern,
    ) -> Result<PrbsReport, Error<B::Error>> {
        let link = self.negotiated()?;
        let mode = match pattern {
            PrbsPattern::Prbs7 => PRBS_MODE,
            PrbsPattern::Prbs15 => 0x00,
        };
        self.write(REG_PRBS, mode | PRBS_RESET | PRBS_EN)?;
        self.write(REG_PRBS, mode | PRBS_EN)?;
        self.delay.delay_ms(PRBS_SETTLE_MS);

        let pages: &[u8] = if link.converters > 2 {
            &[PAGEINDX_DAC01, PAGEINDX_DAC23]
        } else {
            &[PAGEINDX_DAC01]
        };
        let mut report = PrbsReport::new();
        for &page in pages {
            self.write(REG_SPI_PAGEINDX, page)?;
            let pair = PrbsPairResult {
                page,
                status: self.read(REG_PRBS)?,
                errors_i: self.read(REG_PRBS_ERROR_I)?,
                errors_q: self.read(REG_PRBS_ERROR_Q)?,
            };
            debug!(
                "PRBS page {}: status {:#x} errors I {} Q {}",
                page, pair.status, pair.errors_i, pair.errors_q
            );
            // at most two pages
            let _ = report.push(pair);
        }
        self.write(REG_SPI_PAGEINDX, PAGEINDX_ALL)?;

        if let Some(bad) = report.iter().find(|pair| !pair.good()) {
            error!("datapath PRBS failed on page {}", bad.page);
            return Err(Fault::DatapathPrbs { page: bad.page }.into());
        }
        info!("datapath PRBS test passed");
        Ok(report)
    }
}
