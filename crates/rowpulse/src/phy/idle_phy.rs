use crate::phase::{PhaseCommand, PhaseRead};
use crate::phy::Phy;

/// A PHY that swallows commands and never returns read data.
///
/// The simplest possible [`Phy`] implementation, suitable for driving the
/// sequencer when nobody cares about the bus contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePhy;

impl<const PHASES: usize> Phy<PHASES> for IdlePhy {
    fn clock(&mut self, _phases: &[PhaseCommand; PHASES]) -> [PhaseRead; PHASES] {
        [PhaseRead::default(); PHASES]
    }
}
