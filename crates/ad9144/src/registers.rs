//! AD9144 register map
//!
//! Source: Analog Devices AD9144 datasheet Rev. B, register map table.
//!
//! Only the registers the driver touches are listed. Addresses are 15-bit;
//! every access is a single-byte transfer (address streaming is never used,
//! so the device's address-increment setting does not matter).
//!
//! # Paged registers
//!
//! The datapath block (0x110–0x14D) is duplicated per DAC pair and selected
//! by `REG_SPI_PAGEINDX`. The power-on value `PAGEINDX_ALL` broadcasts writes
//! to both pairs, which is what bring-up relies on. Reads of paged registers
//! require a single pair to be selected.

// ---------------------------------------------------------------------------
// SPI configuration and identification
// ---------------------------------------------------------------------------

/// Interface configuration A: soft reset (bit 0, mirrored in bit 7)
pub const REG_SPI_INTFCONFA: u16 = 0x000;
/// Product ID low byte
pub const REG_SPI_PRODIDL: u16 = 0x004;
/// Product ID high byte
pub const REG_SPI_PRODIDH: u16 = 0x005;
/// Chip grade: bits\[7:4\] speed grade, bits\[3:0\] die revision
pub const REG_SPI_CHIPGRADE: u16 = 0x006;
/// Page pointer for the per-DAC-pair datapath registers
pub const REG_SPI_PAGEINDX: u16 = 0x008;

/// Soft reset, mirrored
pub const SOFTRESET_M: u8 = 1 << 7;
/// Soft reset
pub const SOFTRESET: u8 = 1 << 0;

/// Expected product ID (`PRODIDH:PRODIDL`)
pub const PRODUCT_ID: u16 = 0x9144;
/// Expected low product ID byte
pub const CHIP_ID: u8 = 0x44;

/// Page: DAC0 / DAC1 datapath
pub const PAGEINDX_DAC01: u8 = 0x01;
/// Page: DAC2 / DAC3 datapath
pub const PAGEINDX_DAC23: u8 = 0x02;
/// Page: broadcast to both pairs (power-on value)
pub const PAGEINDX_ALL: u8 = 0x03;

// ---------------------------------------------------------------------------
// Power and clocking
// ---------------------------------------------------------------------------

/// Power control: per-DAC and DAC master power-down bits
pub const REG_PWRCNTRL0: u16 = 0x011;
/// DAC0 power-down; DAC1..DAC3 follow at successively lower bits
pub const PD_DAC_0: u8 = 1 << 6;

/// JESD204 parameter check flags (read-only)
pub const REG_JESD_CHECKS: u16 = 0x030;
/// LMFC delay exceeds K
pub const ERR_DLYOVER: u8 = 1 << 5;
/// Unsupported window limit
pub const ERR_WINLIMIT: u8 = 1 << 4;
/// Unsupported L/M/S/F combination
pub const ERR_JESDBAD: u8 = 1 << 3;
/// Unsupported K
pub const ERR_KUNSUPP: u8 = 1 << 2;
/// Unsupported subclass
pub const ERR_SUBCLASS: u8 = 1 << 1;
/// Unsupported interpolation factor
pub const ERR_INTSUPP: u8 = 1 << 0;

/// SYSREF / SYNC~ alignment control
pub const REG_SYNC_CTRL: u16 = 0x03A;
/// Sync logic enable
pub const SYNCENABLE: u8 = 1 << 7;
/// Arm the one-shot alignment
pub const SYNCARM: u8 = 1 << 6;
/// Clear sticky alignment flags
pub const SYNCCLRSTKY: u8 = 1 << 5;

/// Sync mode field, bits\[3:0\]
#[must_use]
pub const fn syncmode(mode: u8) -> u8 {
    mode & 0x0F
}

/// Sync mode: align once on the next SYSREF edge after arming
pub const SYNCMODE_ONESHOT: u8 = 0x1;
/// Sync mode: realign on every SYSREF edge
pub const SYNCMODE_CONTINUOUS: u8 = 0x2;

/// SYSREF alignment status flags (read-only)
pub const REG_SYNC_STATUS: u16 = 0x03B;
/// Sync machine busy
pub const REFBUSY: u8 = 1 << 7;
/// Alignment locked
pub const REFLOCK: u8 = 1 << 3;
/// Clocks were rotated to align
pub const REFROTA: u8 = 1 << 2;
/// Alignment error exceeded the window limit
pub const REFWLIM: u8 = 1 << 1;
/// Sync tripped after arming
pub const REFTRIP: u8 = 1 << 0;

/// Clock configuration: per-block clock power-down
pub const REG_CLKCFG0: u16 = 0x080;

/// SYSREF receiver analog control
pub const REG_SYSREF_ACTRL0: u16 = 0x081;
/// SYSREF receiver power-down
pub const PD_SYSREF: u8 = 1 << 4;
/// Sample SYSREF on the rising device-clock edge
pub const SYSREF_RISE: u8 = 1 << 2;

// ---------------------------------------------------------------------------
// DAC clock PLL
// ---------------------------------------------------------------------------

/// DAC PLL top-level control
pub const REG_DACPLLCNTRL: u16 = 0x083;
/// Start VCO calibration
pub const SYNTH_RECAL: u8 = 1 << 7;
/// Enable the synthesizer
pub const ENABLE_SYNTH: u8 = 1 << 4;

/// DAC PLL status
pub const REG_DACPLLSTATUS: u16 = 0x084;
/// Charge-pump calibration valid
pub const CP_CAL_VALID: u8 = 1 << 5;
/// PLL locked
pub const RFPLL_LOCK: u8 = 1 << 1;
/// Both bits must be set before the DAC clock is usable
pub const DACPLL_LOCK_MASK: u8 = CP_CAL_VALID | RFPLL_LOCK;

/// Feedback divider (B count)
pub const REG_DACINTEGERWORD0: u16 = 0x085;
/// Loop filter C1/C2
pub const REG_DACLOOPFILT1: u16 = 0x087;
/// Loop filter R1/C3
pub const REG_DACLOOPFILT2: u16 = 0x088;
/// Loop filter bypass/R2
pub const REG_DACLOOPFILT3: u16 = 0x089;
/// Charge pump control
pub const REG_DACCPCNTRL: u16 = 0x08A;
/// LO generator divider mode, bits\[1:0\]
pub const REG_DACLOGENCNTRL: u16 = 0x08B;
/// LDO control and reference divider, bits\[2:0\]
pub const REG_DACLDOCNTRL1: u16 = 0x08C;
/// LDO bypass/trim
pub const REG_DACLDOCNTRL2: u16 = 0x08D;
/// ALC / varactor control
pub const REG_DACPLLT5: u16 = 0x1B5;
/// VCO bias control
pub const REG_DACPLLTB: u16 = 0x1BB;
/// VCO calibration control
pub const REG_DACPLLTD: u16 = 0x1BD;
/// Varactor control
pub const REG_DACPLLT17: u16 = 0x1C4;

// ---------------------------------------------------------------------------
// Datapath and NCO (paged)
// ---------------------------------------------------------------------------

/// Input data format
pub const REG_DATA_FORMAT: u16 = 0x110;
/// Offset-binary input (clear for two's complement)
pub const BINARY_FORMAT: u8 = 1 << 7;

/// Datapath control: modulation type and sideband select
pub const REG_DATAPATH_CTRL: u16 = 0x111;
/// Select the lower sideband (negative carrier)
pub const SEL_SIDEBAND: u8 = 1 << 1;

/// Modulation type field, bits\[3:2\]
#[must_use]
pub const fn modulation_type(kind: u8) -> u8 {
    (kind & 0x3) << 2
}

/// Bits of `REG_DATAPATH_CTRL` owned by the NCO
pub const NCO_CTRL_MASK: u8 = modulation_type(0x3) | SEL_SIDEBAND;

/// Interpolation mode, bits\[2:0\]
pub const REG_INTERP_MODE: u16 = 0x112;

/// NCO tuning word update strobe
pub const REG_NCO_FTW_UPDATE: u16 = 0x113;
/// Latch FTW0..FTW5 into the NCO on the 0 → 1 edge
pub const FTW_UPDATE_REQ: u8 = 1 << 0;

/// Tuning word LSB; FTW1..FTW5 follow at consecutive addresses
pub const REG_FTW0: u16 = 0x114;
/// Phase offset LSB
pub const REG_NCO_PHASE_OFFSET0: u16 = 0x11A;
/// Phase offset MSB
pub const REG_NCO_PHASE_OFFSET1: u16 = 0x11B;

/// Datapath PRBS checker control and good-data flags
pub const REG_PRBS: u16 = 0x14B;
/// Good data, Q channel
pub const PRBS_GOOD_Q: u8 = 1 << 7;
/// Good data, I channel
pub const PRBS_GOOD_I: u8 = 1 << 6;
/// Polynomial select: set for PRBS7, clear for PRBS15
pub const PRBS_MODE: u8 = 1 << 2;
/// Reset the error counters
pub const PRBS_RESET: u8 = 1 << 1;
/// Enable the checker
pub const PRBS_EN: u8 = 1 << 0;
/// PRBS error count, I channel
pub const REG_PRBS_ERROR_I: u16 = 0x14C;
/// PRBS error count, Q channel
pub const REG_PRBS_ERROR_Q: u16 = 0x14D;

// ---------------------------------------------------------------------------
// SERDES PHY and PLL
// ---------------------------------------------------------------------------

/// Master power-down for all receiver PHYs
pub const REG_MASTER_PD: u16 = 0x200;
/// Per-lane PHY power-down (bit n = physical lane n)
pub const REG_PHY_PD: u16 = 0x201;
/// Generic SERDES power-down
pub const REG_GENERIC_PD: u16 = 0x203;
/// CDR operating mode: half-rate enable and division rate
pub const REG_CDR_OPERATING_MODE_REG_0: u16 = 0x230;
/// Equalizer bias
pub const REG_EQ_BIAS_REG: u16 = 0x268;
/// Equalizer bias for the default (low-power) equalizer mode
pub const EQ_BIAS_LOW_POWER: u8 = 0x62;

/// SERDES PLL enable
pub const REG_SYNTH_ENABLE_CNTRL: u16 = 0x280;
/// Force VCO recalibration
pub const SPI_RECAL_SYNTH: u8 = 1 << 2;
/// Enable the SERDES PLL
pub const SPI_ENABLE_SYNTH: u8 = 1 << 0;

/// SERDES PLL status
pub const REG_PLL_STATUS: u16 = 0x281;
/// PLL locked
pub const SPI_PLL_LOCK_RB: u8 = 1 << 0;

/// SERDES PLL reference divider and CDR oversampling
pub const REG_REF_CLK_DIVIDER_LDO: u16 = 0x289;
/// Termination calibration, block 1
pub const REG_TERM_BLK1_CTRLREG0: u16 = 0x2A7;
/// Termination calibration, block 2
pub const REG_TERM_BLK2_CTRLREG0: u16 = 0x2AE;
/// Start termination calibration
pub const SPI_I_TUNE_R_CAL_TERMBLK: u8 = 1 << 0;

// ---------------------------------------------------------------------------
// JESD204B receiver
// ---------------------------------------------------------------------------

/// Link control: checksum mode and link enable
pub const REG_GENERAL_JRX_CTRL_0: u16 = 0x300;
/// Checksum computed over packed registers instead of fields
pub const CHECKSUM_MODE: u8 = 1 << 6;

/// Link enable field, bits\[1:0\]
#[must_use]
pub const fn link_en(links: u8) -> u8 {
    links & 0x3
}

/// Bits of `REG_GENERAL_JRX_CTRL_0` that enable the link
pub const LINK_EN_MASK: u8 = link_en(0x3);

/// Local subclass
pub const REG_GENERAL_JRX_CTRL_1: u16 = 0x301;

/// Local subclass field, bits\[2:0\]
#[must_use]
pub const fn subclassv_local(subclass: u8) -> u8 {
    subclass & 0x7
}

/// Logical-lane crossbar, lanes 0/1; lanes 2/3..6/7 follow consecutively
pub const REG_XBAR_LN_0_1: u16 = 0x308;

/// Pack two logical lanes' physical sources into one crossbar register
#[must_use]
pub const fn xbar_pair(even: u8, odd: u8) -> u8 {
    ((odd & 0x7) << 3) | (even & 0x7)
}

/// SYNC~ generation: pulse durations
pub const REG_SYNCB_GEN_1: u16 = 0x312;

/// SYNC~ low duration reported for an error, bits\[7:4\]
#[must_use]
pub const fn syncb_err_dur(code: u8) -> u8 {
    (code & 0xF) << 4
}

/// Short transport-layer test control
pub const REG_SHORT_TPL_TEST_0: u16 = 0x32C;
/// Expected sample, low byte
pub const REG_SHORT_TPL_TEST_1: u16 = 0x32D;
/// Expected sample, high byte
pub const REG_SHORT_TPL_TEST_2: u16 = 0x32E;
/// Short transport-layer test result
pub const REG_SHORT_TPL_TEST_3: u16 = 0x32F;
/// Reset the checker
pub const SHORT_TPL_TEST_RESET: u8 = 1 << 1;
/// Enable the checker
pub const SHORT_TPL_TEST_EN: u8 = 1 << 0;
/// Mismatch seen
pub const SHORT_TPL_FAIL: u8 = 1 << 0;

/// Sample slot select, bits\[5:4\]
#[must_use]
pub const fn short_tpl_sp_sel(sample: u8) -> u8 {
    (sample & 0x3) << 4
}

/// Converter select, bits\[3:2\]
#[must_use]
pub const fn short_tpl_m_sel(converter: u8) -> u8 {
    (converter & 0x3) << 2
}

// ---------------------------------------------------------------------------
// ILAS configuration (what the receiver expects the transmitter to send)
// ---------------------------------------------------------------------------

/// DID
pub const REG_ILS_DID: u16 = 0x450;
/// BID
pub const REG_ILS_BID: u16 = 0x451;
/// LID of lane 0
pub const REG_ILS_LID0: u16 = 0x452;
/// SCR (bit 7) and L-1 (bits\[4:0\])
pub const REG_ILS_SCR_L: u16 = 0x453;
/// F-1
pub const REG_ILS_F: u16 = 0x454;
/// K-1
pub const REG_ILS_K: u16 = 0x455;
/// M-1
pub const REG_ILS_M: u16 = 0x456;
/// CS (bits\[7:6\]) and N-1 (bits\[4:0\])
pub const REG_ILS_CS_N: u16 = 0x457;
/// SUBCLASSV (bits\[7:5\]) and N'-1 (bits\[4:0\])
pub const REG_ILS_NP: u16 = 0x458;
/// JESDV (bits\[7:5\]) and S-1 (bits\[4:0\])
pub const REG_ILS_S: u16 = 0x459;
/// HD (bit 7) and CF (bits\[4:0\])
pub const REG_ILS_HD_CF: u16 = 0x45A;
/// ILAS checksum for lane 0
pub const REG_ILS_CHECKSUM: u16 = 0x45D;

/// Scrambling enable in `REG_ILS_SCR_L`
pub const ILS_SCR: u8 = 1 << 7;
/// High density in `REG_ILS_HD_CF`
pub const ILS_HD: u8 = 1 << 7;
/// JESD204 version field value for JESD204B
pub const JESDV_B: u8 = 1;

// ---------------------------------------------------------------------------
// Link status (bit n = logical lane n)
// ---------------------------------------------------------------------------

/// Code group synchronisation achieved
pub const REG_CODEGRPSYNCFLG: u16 = 0x470;
/// Frame synchronisation achieved
pub const REG_FRAMESYNCFLG: u16 = 0x471;
/// ILAS checksum matched
pub const REG_GOODCHKSUMFLG: u16 = 0x472;
/// Initial lane synchronisation achieved
pub const REG_INITLANESYNCFLG: u16 = 0x473;

/// Logical lanes enabled in the deframer
pub const REG_LANEENABLE: u16 = 0x47D;
