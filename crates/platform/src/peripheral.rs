//! Register transport abstraction
//!
//! Converter devices are configured through a byte-addressed register file
//! reached over a synchronous serial bus. Every transfer is framed as:
//!
//! ```text
//! [command byte][address low byte][data ...]
//!
//! command byte:  bit 7     = 1 read / 0 write
//!                bits 6..0 = address bits 14..8
//! ```
//!
//! Drivers are written against [`RegisterBus`]; [`SpiRegisterBus`] implements
//! it for any `embedded_hal::spi::SpiDevice`, and `mocks::MockRegisterBus`
//! implements it for host tests.

use embedded_hal::spi::{Operation, SpiDevice};

/// Read flag in the command byte.
pub const READ_FLAG: u8 = 0x80;

/// Highest addressable register (15-bit address space).
pub const ADDRESS_MASK: u16 = 0x7FFF;

/// Direction of a register transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Fill the payload from the device.
    Read,
    /// Send the payload to the device.
    Write,
}

/// Byte-addressed register transport.
///
/// One `transact` call is one bus transaction (chip select held for the
/// header and the whole payload). Devices with address auto-increment accept
/// multi-byte payloads; single-register helpers are provided.
pub trait RegisterBus {
    /// Transport error, propagated unmodified by drivers.
    type Error: core::fmt::Debug;

    /// Perform one framed transfer.
    ///
    /// For [`Opcode::Read`] the payload is overwritten with the bytes read.
    fn transact(
        &mut self,
        opcode: Opcode,
        address: u16,
        payload: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Read a single register.
    fn read_reg(&mut self, address: u16) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.transact(Opcode::Read, address, &mut buf)?;
        let [value] = buf;
        Ok(value)
    }

    /// Write a single register.
    fn write_reg(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
        self.transact(Opcode::Write, address, &mut [value])
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn transact(
        &mut self,
        opcode: Opcode,
        address: u16,
        payload: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::transact(self, opcode, address, payload)
    }
}

/// Encode the two header bytes for a transfer.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // both halves are masked to 8 bits
pub fn frame_header(opcode: Opcode, address: u16) -> [u8; 2] {
    let address = address & ADDRESS_MASK;
    let rw = match opcode {
        Opcode::Read => READ_FLAG,
        Opcode::Write => 0,
    };
    [rw | (address >> 8) as u8, (address & 0xFF) as u8]
}

// ---------------------------------------------------------------------------
// SPI adapter
// ---------------------------------------------------------------------------

/// Errors from [`SpiRegisterBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRegisterBusError<E> {
    /// The underlying SPI device failed.
    Spi(E),
    /// A transfer was requested with no data bytes.
    EmptyPayload,
}

impl<E: core::fmt::Debug> core::fmt::Display for SpiRegisterBusError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI transfer failed: {e:?}"),
            Self::EmptyPayload => write!(f, "register transfer with empty payload"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for SpiRegisterBusError<E> {}

/// [`RegisterBus`] over a blocking `embedded_hal::spi::SpiDevice`.
///
/// The header and payload are issued as two operations inside one
/// `SpiDevice::transaction`, so chip select stays asserted across both.
pub struct SpiRegisterBus<SPI> {
    spi: SPI,
}

impl<SPI> SpiRegisterBus<SPI> {
    /// Wrap an SPI device.
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Return the wrapped SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> RegisterBus for SpiRegisterBus<SPI> {
    type Error = SpiRegisterBusError<SPI::Error>;

    fn transact(
        &mut self,
        opcode: Opcode,
        address: u16,
        payload: &mut [u8],
    ) -> Result<(), Self::Error> {
        if payload.is_empty() {
            return Err(SpiRegisterBusError::EmptyPayload);
        }
        let header = frame_header(opcode, address);
        let result = match opcode {
            Opcode::Read => self
                .spi
                .transaction(&mut [Operation::Write(&header), Operation::Read(payload)]),
            Opcode::Write => self
                .spi
                .transaction(&mut [Operation::Write(&header), Operation::Write(payload)]),
        };
        result.map_err(SpiRegisterBusError::Spi)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
