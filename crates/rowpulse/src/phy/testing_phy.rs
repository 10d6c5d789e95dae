use crate::phase::{PhaseCommand, PhaseRead};
use crate::phy::Phy;
use alloc::{collections::VecDeque, vec::Vec};

/// One command observed on the bus, with the cycle and phase it appeared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedCommand {
    pub cycle: u64,
    pub phase: usize,
    pub command: PhaseCommand,
}

/// An instrumented PHY for tests.
///
/// Records every chip-selected command it sees, and answers `rddata_en` by
/// popping words off a caller-supplied queue on the same cycle. An empty
/// queue leaves `rddata_valid` low, as a PHY with nothing to say would.
pub struct TestingPhy<const PHASES: usize> {
    nranks: u8,
    pub cycles: u64,
    issued: Vec<IssuedCommand>,
    read_data: VecDeque<u64>,
}

impl<const PHASES: usize> TestingPhy<PHASES> {
    #[must_use]
    pub fn new(nranks: u8) -> Self {
        Self {
            nranks,
            cycles: 0,
            issued: Vec::new(),
            read_data: VecDeque::new(),
        }
    }

    /// Queue a word to be returned for the next read.
    pub fn queue_read_data(&mut self, word: u64) {
        self.read_data.push_back(word);
    }

    /// All chip-selected commands seen so far, in bus order.
    #[must_use]
    pub fn issued(&self) -> &[IssuedCommand] {
        &self.issued
    }

    /// Convenience filter for commands matching a predicate.
    pub fn issued_where<F>(&self, mut pred: F) -> Vec<IssuedCommand>
    where
        F: FnMut(&IssuedCommand) -> bool,
    {
        self.issued.iter().copied().filter(|c| pred(c)).collect()
    }
}

impl<const PHASES: usize> Phy<PHASES> for TestingPhy<PHASES> {
    fn clock(&mut self, phases: &[PhaseCommand; PHASES]) -> [PhaseRead; PHASES] {
        let mut reads = [PhaseRead::default(); PHASES];
        for (i, cmd) in phases.iter().enumerate() {
            if cmd.is_selected(self.nranks) {
                self.issued.push(IssuedCommand {
                    cycle: self.cycles,
                    phase: i,
                    command: *cmd,
                });
            }
            if cmd.rddata_en
                && let Some(data) = self.read_data.pop_front()
            {
                reads[i] = PhaseRead::word(data);
            }
        }
        self.cycles += 1;
        reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_selected_commands_only() {
        let mut phy: TestingPhy<2> = TestingPhy::new(1);
        let mut phases = [PhaseCommand::idle(1); 2];
        phases[1] = PhaseCommand::refresh(1);
        phy.clock(&phases);
        phy.clock(&[PhaseCommand::idle(1); 2]);

        assert_eq!(phy.cycles, 2);
        assert_eq!(phy.issued().len(), 1);
        assert_eq!(phy.issued()[0].cycle, 0);
        assert_eq!(phy.issued()[0].phase, 1);
    }

    #[test]
    fn answers_reads_from_the_queue() {
        let mut phy: TestingPhy<1> = TestingPhy::new(1);
        phy.queue_read_data(0xAB);

        let mut read_cmd = PhaseCommand::idle(1);
        read_cmd.cs_n = 0;
        read_cmd.cas_n = false;
        read_cmd.rddata_en = true;

        let reads = phy.clock(&[read_cmd]);
        assert_eq!(reads[0], PhaseRead::word(0xAB));

        // Queue drained: the next read gets nothing back.
        let reads = phy.clock(&[read_cmd]);
        assert!(!reads[0].valid);
    }
}
