//! The PHY seam.
//!
//! Everything downstream of the command bus — timing closure, DQ lanes, the
//! DRAM itself — sits behind [`Phy`]. The sequencer only ever hands the PHY
//! the commands driven on each phase this cycle and takes back whatever read
//! data comes up.

pub mod idle_phy;
pub mod testing_phy;

use crate::phase::{PhaseCommand, PhaseRead};
pub use idle_phy::IdlePhy;
pub use testing_phy::{IssuedCommand, TestingPhy};

pub trait Phy<const PHASES: usize> {
    /// Advance the PHY one cycle.
    ///
    /// `phases` is what the current bus owner drives on every phase this
    /// cycle. The return value is the read data coming back this same
    /// cycle; real PHYs answer a read several cycles after `rddata_en`, and
    /// callers must not assume any particular latency.
    fn clock(&mut self, phases: &[PhaseCommand; PHASES]) -> [PhaseRead; PHASES];
}
