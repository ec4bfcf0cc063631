//! JESD204 link state callbacks.
//!
//! # Setup sequence
//!
//! ```text
//! power ─▶ PHY + SERDES PLL ─▶ [DAC PLL] ─▶ datapath ─▶ transport layer
//!       ─▶ SYSREF receiver ─▶ NCO ─▶ SYNC~ logic
//! ```
//!
//! The link stays disabled until `on_link_enable`. Setup writes the same
//! sequence every time it runs for an unchanged configuration, so it can be
//! repeated after a teardown.
//!
//! Only reason `Init` does any work for Init, Setup and Running; with any
//! other reason those callbacks succeed immediately. Enable is the exception:
//! reason `Init` enables the link and every other reason disables it.

use embedded_hal::delay::DelayNs;
use platform::{
    JesdLink, LinkCallbacks, LinkReason, LinkState, RegisterBus, Subclass, SysrefMode,
};

use crate::config::{DataFormat, SysrefEdge};
use crate::device::Ad9144;
use crate::error::Error;
use crate::link_config::{LinkConfig, AD9144_CAPS};
use crate::nco::NcoConfig;
use crate::registers::{
    link_en, subclassv_local, syncb_err_dur, syncmode, xbar_pair, BINARY_FORMAT, LINK_EN_MASK,
    PD_DAC_0, PD_SYSREF, REG_CLKCFG0, REG_DATA_FORMAT, REG_GENERAL_JRX_CTRL_0,
    REG_GENERAL_JRX_CTRL_1, REG_ILS_CHECKSUM, REG_ILS_DID, REG_INTERP_MODE, REG_LANEENABLE,
    REG_PWRCNTRL0, REG_SYNCB_GEN_1, REG_SYNC_CTRL, REG_SYSREF_ACTRL0, REG_XBAR_LN_0_1,
    SYNCARM, SYNCCLRSTKY, SYNCENABLE, SYNCMODE_CONTINUOUS, SYNCMODE_ONESHOT, SYSREF_RISE,
};

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Power down the DAC cores past `converters`.
    fn power_bits(converters: u8) -> u8 {
        (0..AD9144_CAPS.max_converters)
            .filter(|dac| *dac >= converters)
            .fold(0u8, |pd, dac| pd | (PD_DAC_0 >> dac))
    }

    fn sync_sequence(link: &LinkConfig) -> &'static [u8] {
        const ONESHOT: [u8; 2] = [
            SYNCENABLE | syncmode(SYNCMODE_ONESHOT) | SYNCCLRSTKY,
            SYNCENABLE | syncmode(SYNCMODE_ONESHOT) | SYNCARM,
        ];
        const CONTINUOUS: [u8; 2] = [
            SYNCENABLE | syncmode(SYNCMODE_CONTINUOUS) | SYNCCLRSTKY,
            SYNCENABLE | syncmode(SYNCMODE_CONTINUOUS),
        ];
        match (link.subclass, link.sysref_mode) {
            (Subclass::Zero, _) => &[0x00],
            (_, SysrefMode::Oneshot) => &ONESHOT,
            (_, SysrefMode::Continuous) => &CONTINUOUS,
        }
    }

    /// Program everything but the link enable.
    fn setup_link(&mut self) -> Result<(), Error<B::Error>> {
        let link = self.negotiated()?;
        let config = self.config;

        self.write(REG_PWRCNTRL0, Self::power_bits(link.converters))?;
        self.write(REG_CLKCFG0, 0x00)?;

        self.power_up_phy(link.physical_lane_mask())?;
        self.configure_serdes_pll(link.lane_rate_khz)?;

        if let Some(pll) = config.dac_pll {
            self.program_dac_pll(pll.ref_clk_khz, config.dac_rate_khz)?;
        }

        self.write(REG_INTERP_MODE, config.interpolation.register_value())?;
        let format = match config.data_format {
            DataFormat::TwosComplement => 0x00,
            DataFormat::OffsetBinary => BINARY_FORMAT,
        };
        self.write(REG_DATA_FORMAT, format)?;

        // Transport layer
        self.write(REG_GENERAL_JRX_CTRL_0, link_en(0))?;
        self.write(REG_GENERAL_JRX_CTRL_1, subclassv_local(link.subclass.bits()))?;
        for (reg, value) in (REG_ILS_DID..).zip(link.ilas_registers()) {
            self.write(reg, value)?;
        }
        self.write(REG_ILS_CHECKSUM, link.ilas_checksum())?;
        for (reg, pair) in (REG_XBAR_LN_0_1..).zip(link.lane_xbar.chunks_exact(2)) {
            if let [even, odd] = pair {
                self.write(reg, xbar_pair(*even, *odd))?;
            }
        }
        self.write(REG_LANEENABLE, link.lane_mask())?;
        self.write(REG_SYNCB_GEN_1, syncb_err_dur(link.sync_pulse.code()))?;

        let sysref = match (link.subclass, config.sysref_edge) {
            (Subclass::Zero, _) => PD_SYSREF,
            (_, SysrefEdge::Rising) => SYSREF_RISE,
            (_, SysrefEdge::Falling) => 0x00,
        };
        self.write(REG_SYSREF_ACTRL0, sysref)?;

        let nco = NcoConfig::compute(
            config.nco.carrier_khz,
            config.nco.phase_deg,
            config.dac_rate_khz,
        )?;
        self.program_nco(&nco)?;
        self.nco = Some(nco);

        for &value in Self::sync_sequence(&link) {
            self.write(REG_SYNC_CTRL, value)?;
        }
        Ok(())
    }
}

impl<B: RegisterBus, D: DelayNs> LinkCallbacks for Ad9144<B, D> {
    type Error = Error<B::Error>;

    fn on_link_init(
        &mut self,
        reason: LinkReason,
        link: &mut JesdLink,
    ) -> Result<(), Self::Error> {
        if reason != LinkReason::Init {
            return Ok(());
        }
        let negotiated = LinkConfig::negotiate(&self.config.link, AD9144_CAPS, &self.config)?;
        negotiated.publish(link);
        debug!(
            "link L={} M={} F={} K={}, lane rate {} kHz",
            negotiated.lanes,
            negotiated.converters,
            negotiated.octets_per_frame,
            negotiated.frames_per_multiframe,
            negotiated.lane_rate_khz
        );
        self.link = Some(negotiated);
        self.state = Some(LinkState::Init);
        Ok(())
    }

    fn on_link_setup(
        &mut self,
        reason: LinkReason,
        _link: &mut JesdLink,
    ) -> Result<(), Self::Error> {
        if reason != LinkReason::Init {
            return Ok(());
        }
        self.setup_link()?;
        info!("AD9144 link programmed");
        self.state = Some(LinkState::Setup);
        Ok(())
    }

    fn on_link_enable(
        &mut self,
        reason: LinkReason,
        _link: &mut JesdLink,
    ) -> Result<(), Self::Error> {
        let enable = reason == LinkReason::Init;
        self.update_bits(REG_GENERAL_JRX_CTRL_0, LINK_EN_MASK, link_en(u8::from(enable)))?;
        if enable {
            info!("AD9144 link enabled");
            self.state = Some(LinkState::Enable);
        } else {
            info!("AD9144 link disabled");
            if self.state.is_some_and(|s| s > LinkState::Setup) {
                self.state = Some(LinkState::Setup);
            }
        }
        Ok(())
    }

    fn on_link_running(
        &mut self,
        reason: LinkReason,
        _link: &mut JesdLink,
    ) -> Result<(), Self::Error> {
        if reason != LinkReason::Init {
            return Ok(());
        }
        self.verify_link()?;
        self.state = Some(LinkState::Running);
        Ok(())
    }
}
