//! Integration test: full JESD204 link bring-up against a mock register file.
//!
//! Tests that:
//!   1. The FMCDAQ2 configuration walks Init → Setup → Enable → Running
//!   2. Transport-layer, crossbar and SYNC~ registers carry the negotiated link
//!   3. Teardown clears only the link-enable field
//!   4. Setup is repeatable with an identical write sequence
//!   5. Each failure surfaces in the right state with the right category
//!   6. Probe frames every access as a single SPI transaction
//!
//! Does NOT require physical hardware.
//!
//! Run with: cargo test -p ad9144 --test bring_up

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use ad9144::registers::{
    REG_CODEGRPSYNCFLG, REG_DACPLLSTATUS, REG_FRAMESYNCFLG, REG_GENERAL_JRX_CTRL_0,
    REG_GOODCHKSUMFLG, REG_ILS_BID, REG_ILS_CHECKSUM, REG_ILS_CS_N, REG_ILS_DID, REG_ILS_F,
    REG_ILS_HD_CF, REG_ILS_K, REG_ILS_LID0, REG_ILS_M, REG_ILS_NP, REG_ILS_S, REG_ILS_SCR_L,
    REG_INITLANESYNCFLG, REG_LANEENABLE, REG_NCO_FTW_UPDATE, REG_PHY_PD, REG_PLL_STATUS, REG_SYNCB_GEN_1, REG_SYNC_CTRL, REG_XBAR_LN_0_1,
};
use ad9144::{
    Ad9144, Ad9144Config, ArgumentError, DacPllSettings, Error, Fault, Pll, TimeoutKind,
};
use platform::mocks::{MockBusError, MockDelay, MockRegisterBus};
use platform::{bring_up, tear_down, JesdLink, LinkCallbacks, LinkReason, LinkState};

type Dac<'a> = Ad9144<&'a mut MockRegisterBus, MockDelay>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Register file of a part whose PLLs lock and whose four lanes all align.
fn healthy_bus() -> MockRegisterBus {
    let mut bus = MockRegisterBus::new();
    bus.set(REG_PLL_STATUS, 0x01)
        .set(REG_DACPLLSTATUS, 0x22)
        .set(REG_CODEGRPSYNCFLG, 0x0F)
        .set(REG_FRAMESYNCFLG, 0x0F)
        .set(REG_GOODCHKSUMFLG, 0x0F)
        .set(REG_INITLANESYNCFLG, 0x0F);
    bus
}

fn dac(bus: &mut MockRegisterBus, config: Ad9144Config) -> Dac<'_> {
    Ad9144::new(bus, MockDelay::new(), config).unwrap()
}

// -- Happy path -----------------------------------------------------------

#[test]
fn fmcdaq2_link_comes_up() {
    init_tracing();
    let mut bus = healthy_bus();
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());

    bring_up(&mut dev, &mut link).unwrap();

    assert_eq!(dev.state(), Some(LinkState::Running));
    assert!(link.is_transmit);
    assert_eq!(link.num_lanes, 4);
    assert_eq!(link.num_converters, 2);
    assert_eq!(link.lane_ids.as_slice(), &[0, 1, 2, 3]);
    assert_eq!(dev.link_config().unwrap().lane_rate_khz, 10_000_000);
    assert!(dev.serdes_pll_config().unwrap().lock.unwrap().locked);
    assert!(dev.pll_config().is_none(), "FMCDAQ2 clocks the DAC externally");
    drop(dev);

    assert_eq!(
        bus.writes_to(REG_GENERAL_JRX_CTRL_0).last(),
        Some(&0x01),
        "link enabled last"
    );
}

#[test]
fn transport_layer_matches_negotiated_link() {
    let mut bus = healthy_bus();
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    dev.on_link_init(LinkReason::Init, &mut link).unwrap();
    dev.on_link_setup(LinkReason::Init, &mut link).unwrap();
    drop(dev);

    let ilas: Vec<u8> = (0..11u16).map(|i| bus.get(REG_ILS_DID + i)).collect();
    assert_eq!(
        ilas,
        vec![0x00, 0x00, 0x00, 0x83, 0x00, 0x1F, 0x01, 0x0D, 0x2F, 0x20, 0x80]
    );
    assert_eq!(bus.get(REG_ILS_CHECKSUM), 67);
    let fields = [
        (REG_ILS_BID, 0x00),
        (REG_ILS_LID0, 0x00),
        (REG_ILS_SCR_L, 0x83),
        (REG_ILS_F, 0x00),
        (REG_ILS_K, 0x1F),
        (REG_ILS_M, 0x01),
        (REG_ILS_CS_N, 0x0D),
        (REG_ILS_NP, 0x2F),
        (REG_ILS_S, 0x20),
        (REG_ILS_HD_CF, 0x80),
    ];
    for (reg, value) in fields {
        assert_eq!(bus.get(reg), value, "ILS register {reg:#x}");
    }
    assert_eq!(bus.get(REG_LANEENABLE), 0x0F);
    assert_eq!(bus.get(REG_PHY_PD), 0xF0, "physical lanes 0-3 powered");
    assert_eq!(bus.get(REG_XBAR_LN_0_1), 0x08);
    assert_eq!(bus.get(REG_XBAR_LN_0_1 + 1), 0x1A);
    assert_eq!(bus.get(REG_SYNCB_GEN_1), 0x00, "F=1 selects half-cycle SYNC~ errors");
    assert_eq!(bus.writes_to(REG_SYNC_CTRL), vec![0xA1, 0xC1], "oneshot: clear then arm");
    assert_eq!(bus.get(REG_GENERAL_JRX_CTRL_0), 0x00, "link still disabled after Setup");
}

#[test]
fn default_carrier_programs_fine_nco_with_zero_word() {
    let mut bus = healthy_bus();
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    dev.on_link_init(LinkReason::Init, &mut link).unwrap();
    dev.on_link_setup(LinkReason::Init, &mut link).unwrap();
    let nco = *dev.nco_config().unwrap();
    drop(dev);

    assert_eq!(nco.mode, ad9144::NcoMode::Fine);
    assert_eq!(nco.ftw, 0);
    assert_eq!(bus.writes_to(REG_NCO_FTW_UPDATE), vec![0x00, 0x01], "word then trigger");
}

#[test]
fn crossbar_follows_board_wiring() {
    let mut bus = healthy_bus();
    let mut cfg = Ad9144Config::fmcdaq2();
    cfg.link.lane_xbar = [3, 2, 1, 0, 0, 0, 0, 0];
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, cfg);
    dev.on_link_init(LinkReason::Init, &mut link).unwrap();
    dev.on_link_setup(LinkReason::Init, &mut link).unwrap();
    drop(dev);

    assert_eq!(bus.get(REG_XBAR_LN_0_1), (2 << 3) | 3);
    assert_eq!(bus.get(REG_XBAR_LN_0_1 + 1), 0x01);
    assert_eq!(bus.get(REG_PHY_PD), 0xF0);
}

#[test]
fn teardown_only_clears_link_enable() {
    let mut bus = healthy_bus();
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    bring_up(&mut dev, &mut link).unwrap();
    let before = dev.release().0.writes().len();

    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    tear_down(&mut dev, &mut link).unwrap();
    drop(dev);

    let writes = bus.writes();
    assert_eq!(writes.len(), before + 1);
    assert_eq!(writes.last(), Some(&(REG_GENERAL_JRX_CTRL_0, 0x00)));
}

#[test]
fn teardown_returns_state_to_setup() {
    let mut bus = healthy_bus();
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    bring_up(&mut dev, &mut link).unwrap();
    tear_down(&mut dev, &mut link).unwrap();
    assert_eq!(dev.state(), Some(LinkState::Setup));
}

#[test]
fn repeated_setup_writes_identical_sequence() {
    let mut bus = healthy_bus();
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    dev.on_link_init(LinkReason::Init, &mut link).unwrap();
    dev.on_link_setup(LinkReason::Init, &mut link).unwrap();
    let (bus, _) = dev.release();
    let first = bus.writes();
    bus.clear_log();

    let mut dev = dac(bus, Ad9144Config::fmcdaq2());
    dev.on_link_init(LinkReason::Init, &mut link).unwrap();
    dev.on_link_setup(LinkReason::Init, &mut link).unwrap();
    let (bus, _) = dev.release();

    assert!(!first.is_empty());
    assert_eq!(bus.writes(), first);
}

// -- Soft failures --------------------------------------------------------

#[test]
fn unlocked_dac_pll_does_not_stop_bring_up() {
    let mut bus = healthy_bus();
    bus.set(REG_DACPLLSTATUS, 0x20);
    let mut cfg = Ad9144Config::fmcdaq2();
    cfg.dac_pll = Some(DacPllSettings { ref_clk_khz: 200_000 });
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, cfg);

    bring_up(&mut dev, &mut link).unwrap();

    let pll = dev.pll_config().copied().unwrap();
    assert_eq!(pll.lo_div_mode, 2);
    assert_eq!(pll.bcount, 10);
    let lock = pll.lock.unwrap();
    assert!(!lock.locked);
    assert_eq!(lock.attempts, 10);

    assert_eq!(
        dev.configure_dac_pll(200_000, 1_000_000),
        Err(Error::Timeout(TimeoutKind::PllNotLocked(Pll::Dac))),
        "standalone call fails hard"
    );
}

#[test]
fn unlocked_serdes_pll_is_caught_by_health_check() {
    let mut bus = healthy_bus();
    bus.set(REG_PLL_STATUS, 0x00).set(REG_CODEGRPSYNCFLG, 0x00);
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());

    let failure = bring_up(&mut dev, &mut link).unwrap_err();
    assert_eq!(failure.state, LinkState::Running);
    assert_eq!(
        failure.error,
        Error::HardwareFault(Fault::CodeGroupSync { flags: 0x00 })
    );
    assert_eq!(dev.state(), Some(LinkState::Enable));
}

// -- Hard failures --------------------------------------------------------

#[test]
fn health_failures_name_their_category() {
    let cases = [
        (REG_CODEGRPSYNCFLG, 0x07, Fault::CodeGroupSync { flags: 0x07 }),
        (REG_FRAMESYNCFLG, 0x07, Fault::FrameSync { flags: 0x07 }),
        (REG_INITLANESYNCFLG, 0x0D, Fault::InitialLaneSync { flags: 0x0D }),
    ];
    for (reg, value, expected) in cases {
        let mut bus = healthy_bus();
        bus.set(reg, value);
        let mut link = JesdLink::default();
        let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
        let failure = bring_up(&mut dev, &mut link).unwrap_err();
        assert_eq!(failure.state, LinkState::Running);
        assert_eq!(failure.error, Error::HardwareFault(expected));
    }
}

#[test]
fn bad_checksum_flags_do_not_fail_the_link() {
    let mut bus = healthy_bus();
    bus.set(REG_GOODCHKSUMFLG, 0x00);
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());
    bring_up(&mut dev, &mut link).unwrap();
}

#[test]
fn too_many_lanes_fails_init_without_bus_traffic() {
    let mut bus = healthy_bus();
    let mut cfg = Ad9144Config::fmcdaq2();
    cfg.link.lanes = 9;
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, cfg);

    let failure = bring_up(&mut dev, &mut link).unwrap_err();
    assert_eq!(failure.state, LinkState::Init);
    assert_eq!(
        failure.error,
        Error::InvalidArgument(ArgumentError::TooManyLanes { requested: 9, max: 8 })
    );
    drop(dev);
    assert!(bus.log().is_empty());
}

#[test]
fn transport_error_is_passed_through() {
    let mut bus = healthy_bus();
    bus.fail_on(REG_PLL_STATUS);
    let mut link = JesdLink::default();
    let mut dev = dac(&mut bus, Ad9144Config::fmcdaq2());

    let failure = bring_up(&mut dev, &mut link).unwrap_err();
    assert_eq!(failure.state, LinkState::Setup);
    assert_eq!(
        failure.error,
        Error::Transport(MockBusError::Injected {
            address: REG_PLL_STATUS
        })
    );
}

// -- SPI framing ----------------------------------------------------------

#[test]
fn probe_over_spi() {
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use platform::SpiRegisterBus;

    let write = |addr: u16, value: u8| {
        let [hi, lo] = addr.to_be_bytes();
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![hi, lo]),
            SpiTransaction::write_vec(vec![value]),
            SpiTransaction::transaction_end(),
        ]
    };
    let read = |addr: u16, value: u8| {
        let [hi, lo] = addr.to_be_bytes();
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x80 | hi, lo]),
            SpiTransaction::read_vec(vec![value]),
            SpiTransaction::transaction_end(),
        ]
    };
    let expectations: Vec<_> = [
        write(0x000, 0x81),
        write(0x000, 0x00),
        read(0x004, 0x44),
        read(0x005, 0x91),
        read(0x006, 0x16),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut spi = SpiMock::new(&expectations);
    let bus = SpiRegisterBus::new(spi.clone());
    let mut dev = Ad9144::new(bus, MockDelay::new(), Ad9144Config::fmcdaq2()).unwrap();

    let info = dev.probe().unwrap();
    assert_eq!(info.product_id, 0x9144);
    assert_eq!(info.grade, 1);
    assert_eq!(info.revision, 6);

    let (_, delay) = dev.release();
    assert_eq!(delay.total_ms(), 1);
    spi.done();
}
