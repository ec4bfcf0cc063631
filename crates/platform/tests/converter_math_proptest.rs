//! Property-based tests for the clocking newtypes and the SPI frame header.
//! Verifies invariants hold for ALL inputs, not just fixed examples.

use platform::peripheral::{frame_header, ADDRESS_MASK, READ_FLAG};
use platform::{DacClockKhz, Opcode, PhaseDegrees, RefClockKhz};

proptest::proptest! {
    /// RefClockKhz::new accepts exactly the documented range.
    #[test]
    fn ref_clock_range_is_exact(khz in proptest::num::u32::ANY) {
        let in_range = (RefClockKhz::MIN_KHZ..=RefClockKhz::MAX_KHZ).contains(&khz);
        assert_eq!(RefClockKhz::new(khz).is_ok(), in_range);
    }

    /// DacClockKhz::new accepts exactly the documented range.
    #[test]
    fn dac_clock_range_is_exact(khz in proptest::num::u32::ANY) {
        let in_range = (DacClockKhz::MIN_KHZ..=DacClockKhz::MAX_KHZ).contains(&khz);
        assert_eq!(DacClockKhz::new(khz).is_ok(), in_range);
    }

    /// Valid phases round-trip through `get`.
    #[test]
    fn phase_round_trips(deg in -180i16..180) {
        assert_eq!(PhaseDegrees::new(deg).map(PhaseDegrees::get), Ok(deg));
    }

    /// The phase word rises with the phase (as a signed value).
    #[test]
    #[allow(clippy::cast_possible_wrap)]
    fn phase_word_is_monotone(a in -180i16..180, b in -180i16..180) {
        let wa = PhaseDegrees::new(a).map(|p| p.register_word() as i16);
        let wb = PhaseDegrees::new(b).map(|p| p.register_word() as i16);
        if let (Ok(wa), Ok(wb)) = (wa, wb) {
            if a <= b {
                assert!(wa <= wb, "{} -> {:#x}, {} -> {:#x}", a, wa, b, wb);
            }
        }
    }

    /// The header always carries the masked address and the direction flag.
    #[test]
    fn frame_header_encodes_address(address in proptest::num::u16::ANY, read in proptest::bool::ANY) {
        let opcode = if read { Opcode::Read } else { Opcode::Write };
        let [cmd, low] = frame_header(opcode, address);
        assert_eq!(cmd & READ_FLAG != 0, read);
        let decoded = (u16::from(cmd & !READ_FLAG) << 8) | u16::from(low);
        assert_eq!(decoded, address & ADDRESS_MASK);
    }
}
