//! JESD204 link orchestration contract.
//!
//! A link is brought up by an external orchestrator that walks every device
//! on the link through the same four states, in order, and calls the
//! matching callback on each:
//!
//! ```text
//! Init ──▶ Setup ──▶ Enable ──▶ Running
//!  │         │         │          │
//!  │         │         │          └─ verify lane alignment
//!  │         │         └─ start / stop the link (reason-sensitive)
//!  │         └─ program clocks, datapath, transport layer, SYNC~
//!  └─ publish link parameters (no register access)
//! ```
//!
//! Every callback receives a [`LinkReason`]: `Init` while bringing the link
//! up, `Other` for teardown and re-entry. Callbacks return `Ok(())` for
//! "done" and `Err` for "fail"; there is no deferral.
//!
//! [`bring_up`] and [`tear_down`] drive a single device through the fixed
//! order. Multi-device fan-out and deferred completion are the orchestrator's
//! business and are not modelled here.

use heapless::Vec;

/// Maximum lanes a single link descriptor can carry.
pub const MAX_LINK_LANES: usize = 8;

/// Link bring-up state.
///
/// Transitions are driven externally; a device never advances itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Link parameters are published.
    Init,
    /// Hardware is programmed but the link is held disabled.
    Setup,
    /// The link-enable field is driven.
    Enable,
    /// Data is flowing; alignment is checked.
    Running,
}

impl LinkState {
    /// Bring-up order.
    pub const SEQUENCE: [LinkState; 4] = [
        LinkState::Init,
        LinkState::Setup,
        LinkState::Enable,
        LinkState::Running,
    ];
}

/// Why a callback is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkReason {
    /// Forward bring-up.
    Init,
    /// Teardown, rollback or re-entry.
    Other,
}

/// JESD204B device subclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Subclass {
    /// No deterministic latency; SYSREF unused.
    Zero,
    /// Deterministic latency referenced to SYSREF.
    #[default]
    One,
    /// Deterministic latency referenced to SYNC~.
    Two,
}

impl Subclass {
    /// Numeric subclass as encoded in the ILAS `SUBCLASSV` field.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Subclass::Zero => 0,
            Subclass::One => 1,
            Subclass::Two => 2,
        }
    }
}

/// How SYSREF is delivered to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysrefMode {
    /// A single SYSREF pulse aligns the LMFC once.
    #[default]
    Oneshot,
    /// SYSREF runs periodically; the device realigns on every edge.
    Continuous,
}

/// Link parameters shared between the orchestrator and the devices on it.
///
/// A device fills this in during `on_link_init` and reads it back in later
/// states. Rates are in Hz as the orchestrator's clock tree works in Hz.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JesdLink {
    /// Orchestrator's link index.
    pub link_id: u8,
    /// `true` for a transmit (DAC) link.
    pub is_transmit: bool,
    /// L: lanes per link.
    pub num_lanes: u8,
    /// M: converters per device.
    pub num_converters: u8,
    /// F: octets per frame per lane.
    pub octets_per_frame: u8,
    /// K: frames per multiframe.
    pub frames_per_multiframe: u8,
    /// S: samples per converter per frame.
    pub samples_per_conv_frame: u8,
    /// N: converter resolution in bits.
    pub converter_resolution: u8,
    /// N': bits per sample including control and tail bits.
    pub bits_per_sample: u8,
    /// CS: control bits per sample.
    pub ctrl_bits_per_sample: u8,
    /// Device subclass.
    pub subclass: Subclass,
    /// Lane data scrambling.
    pub scrambling: bool,
    /// HD: samples may straddle lanes.
    pub high_density: bool,
    /// DID reported in the ILAS.
    pub device_id: u8,
    /// BID reported in the ILAS.
    pub bank_id: u8,
    /// SYSREF delivery mode.
    pub sysref_mode: SysrefMode,
    /// Converter sample rate in Hz (after interpolation).
    pub sample_rate_hz: u64,
    /// Interface rate divider (sample rate / JESD frame rate).
    pub sample_rate_div: u32,
    /// Per-lane lane IDs in logical lane order.
    pub lane_ids: Vec<u8, MAX_LINK_LANES>,
}

/// Callbacks a device implements to take part in link bring-up.
pub trait LinkCallbacks {
    /// Device error reported as the "fail" outcome.
    type Error;

    /// Publish link parameters; no register access.
    fn on_link_init(&mut self, reason: LinkReason, link: &mut JesdLink)
        -> Result<(), Self::Error>;

    /// Program the device while the link is held disabled.
    fn on_link_setup(&mut self, reason: LinkReason, link: &mut JesdLink)
        -> Result<(), Self::Error>;

    /// Enable (reason `Init`) or disable (any other reason) the link.
    fn on_link_enable(&mut self, reason: LinkReason, link: &mut JesdLink)
        -> Result<(), Self::Error>;

    /// Verify the running link.
    fn on_link_running(
        &mut self,
        reason: LinkReason,
        link: &mut JesdLink,
    ) -> Result<(), Self::Error>;

    /// Invoke the callback for `state`.
    fn on_link_state(
        &mut self,
        state: LinkState,
        reason: LinkReason,
        link: &mut JesdLink,
    ) -> Result<(), Self::Error> {
        match state {
            LinkState::Init => self.on_link_init(reason, link),
            LinkState::Setup => self.on_link_setup(reason, link),
            LinkState::Enable => self.on_link_enable(reason, link),
            LinkState::Running => self.on_link_running(reason, link),
        }
    }
}

/// A callback that reported "fail", with the state it failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkFailure<E> {
    /// State whose callback failed.
    pub state: LinkState,
    /// The device's error.
    pub error: E,
}

impl<E: core::fmt::Display> core::fmt::Display for LinkFailure<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "link {:?} failed: {}", self.state, self.error)
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug + core::fmt::Display> std::error::Error for LinkFailure<E> {}

/// Walk one device through Init → Setup → Enable → Running with reason `Init`.
///
/// Stops at the first failing state. The link is left in whatever state the
/// failing callback left it; call [`tear_down`] to disable it.
pub fn bring_up<C: LinkCallbacks + ?Sized>(
    device: &mut C,
    link: &mut JesdLink,
) -> Result<(), LinkFailure<C::Error>> {
    for state in LinkState::SEQUENCE {
        device
            .on_link_state(state, LinkReason::Init, link)
            .map_err(|error| LinkFailure { state, error })?;
    }
    Ok(())
}

/// Disable the link (`on_link_enable` with reason `Other`).
pub fn tear_down<C: LinkCallbacks + ?Sized>(
    device: &mut C,
    link: &mut JesdLink,
) -> Result<(), C::Error> {
    device.on_link_enable(LinkReason::Other, link)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
