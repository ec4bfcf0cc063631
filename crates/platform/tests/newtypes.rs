//! Range enforcement tests for the converter clocking newtypes.
//! A value that constructs must be one the hardware can be programmed with.

#![allow(clippy::unwrap_used)]

// ── RefClockKhz ──────────────────────────────────────────────────────────────

#[test]
fn ref_clock_accepts_both_ends() {
    use platform::RefClockKhz;
    assert_eq!(RefClockKhz::new(80_000).map(RefClockKhz::get), Ok(80_000));
    assert_eq!(RefClockKhz::new(1_000_000).map(RefClockKhz::get), Ok(1_000_000));
}

#[test]
fn ref_clock_error_carries_the_bounds() {
    use platform::{OutOfRangeError, RefClockKhz};
    let err = RefClockKhz::new(79_999).unwrap_err();
    assert_eq!(
        err,
        OutOfRangeError {
            value: 79_999,
            min: 80_000,
            max: 1_000_000
        }
    );
}

#[test]
fn ref_clock_is_four_bytes() {
    use platform::RefClockKhz;
    assert_eq!(core::mem::size_of::<RefClockKhz>(), 4);
}

// ── DacClockKhz ──────────────────────────────────────────────────────────────

#[test]
fn dac_clock_rejects_just_outside() {
    use platform::DacClockKhz;
    assert!(DacClockKhz::new(419_999).is_err());
    assert!(DacClockKhz::new(2_250_001).is_err());
    assert!(DacClockKhz::new(1_000_000).is_ok());
}

#[test]
fn dac_clock_orders_by_frequency() {
    use platform::DacClockKhz;
    let slow = DacClockKhz::new(500_000).unwrap();
    let fast = DacClockKhz::new(2_000_000).unwrap();
    assert!(slow < fast);
}

// ── PhaseDegrees ─────────────────────────────────────────────────────────────

#[test]
fn phase_defaults_to_zero_word() {
    use platform::PhaseDegrees;
    assert_eq!(PhaseDegrees::default().register_word(), 0);
}

#[test]
fn phase_plus_180_is_rejected() {
    use platform::PhaseDegrees;
    let err = PhaseDegrees::new(180).unwrap_err();
    assert_eq!((err.min, err.max), (-180, 180));
}

#[test]
fn phase_word_is_odd_symmetric() {
    use platform::PhaseDegrees;
    // Truncation toward zero keeps +x and -x mirror images.
    for deg in 1..180i16 {
        let pos = PhaseDegrees::new(deg).unwrap().register_word();
        let neg = PhaseDegrees::new(-deg).unwrap().register_word();
        assert_eq!(pos.wrapping_add(neg), 0, "deg {deg}");
    }
}

#[test]
fn out_of_range_error_displays_value_and_bounds() {
    use platform::DacClockKhz;
    let err = DacClockKhz::new(3_000_000).unwrap_err();
    assert_eq!(err.to_string(), "3000000 outside [420000, 2250000]");
}
