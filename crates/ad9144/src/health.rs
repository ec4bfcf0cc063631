//! Lane alignment check for a running link.
//!
//! Each of the four status registers carries one bit per lane. A healthy
//! link has code-group sync on exactly `L` lanes, and frame sync and
//! initial lane sync on the same lanes. The ILAS checksum flags are only
//! reported.

use embedded_hal::delay::DelayNs;
use platform::RegisterBus;

use crate::device::Ad9144;
use crate::error::{Error, Fault};
use crate::registers::{
    REG_CODEGRPSYNCFLG, REG_FRAMESYNCFLG, REG_GOODCHKSUMFLG, REG_INITLANESYNCFLG,
};

/// Per-lane status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthStatus {
    /// `REG_CODEGRPSYNCFLG`
    pub code_group_sync: u8,
    /// `REG_FRAMESYNCFLG`
    pub frame_sync: u8,
    /// `REG_GOODCHKSUMFLG`
    pub checksum: u8,
    /// `REG_INITLANESYNCFLG`
    pub initial_lane_sync: u8,
    /// Lanes in use (L).
    pub num_lanes: u8,
}

impl HealthStatus {
    /// `(1 << L) - 1`.
    #[must_use]
    pub fn expected_mask(&self) -> u8 {
        match self.num_lanes {
            0 => 0,
            n if n >= 8 => 0xFF,
            n => (1u8 << n) - 1,
        }
    }

    /// Every lane reports a good ILAS checksum.
    #[must_use]
    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.code_group_sync
    }

    /// Classify the snapshot.
    ///
    /// # Errors
    ///
    /// The first failing category, in the order code-group sync, frame sync,
    /// initial lane sync.
    pub fn evaluate(&self) -> Result<(), Fault> {
        if self.code_group_sync.count_ones() != u32::from(self.num_lanes) {
            return Err(Fault::CodeGroupSync {
                flags: self.code_group_sync,
            });
        }
        if self.frame_sync != self.code_group_sync {
            return Err(Fault::FrameSync {
                flags: self.frame_sync,
            });
        }
        if self.initial_lane_sync != self.code_group_sync {
            return Err(Fault::InitialLaneSync {
                flags: self.initial_lane_sync,
            });
        }
        Ok(())
    }
}

impl<B: RegisterBus, D: DelayNs> Ad9144<B, D> {
    /// Read the four lane status registers for an `num_lanes`-lane link.
    ///
    /// # Errors
    ///
    /// Transport errors only.
    pub fn read_health(&mut self, num_lanes: u8) -> Result<HealthStatus, Error<B::Error>> {
        Ok(HealthStatus {
            code_group_sync: self.read(REG_CODEGRPSYNCFLG)?,
            frame_sync: self.read(REG_FRAMESYNCFLG)?,
            checksum: self.read(REG_GOODCHKSUMFLG)?,
            initial_lane_sync: self.read(REG_INITLANESYNCFLG)?,
            num_lanes,
        })
    }

    /// Read and evaluate lane status for the negotiated link.
    ///
    /// # Errors
    ///
    /// [`Error::HardwareFault`] naming the failed category,
    /// [`Error::InvalidArgument`] before `on_link_init`, or a transport error.
    pub fn verify_link(&mut self) -> Result<HealthStatus, Error<B::Error>> {
        let link = self.negotiated()?;
        let status = self.read_health(link.lanes)?;
        if let Err(fault) = status.evaluate() {
            error!(
                "link check failed: CGS {:#x} FS {:#x} ILS {:#x}",
                status.code_group_sync, status.frame_sync, status.initial_lane_sync
            );
            return Err(fault.into());
        }
        if !status.checksum_ok() {
            warn!("ILAS checksum flags {:#x}", status.checksum);
        }
        info!("JESD204 link up on {} lanes", link.lanes);
        Ok(status)
    }
}
