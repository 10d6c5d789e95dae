//! Refresh recognition and the free-running refresh counter.

use rowpulse::{MemoryType, PhaseCommand};

/// Counts refresh commands observed on one phase of the command bus.
///
/// The recognition rule depends on the memory type: classic DFI encodes
/// refresh as `cs=0, cas=0, ras=0, we=1`; DDR5 carries commands on the
/// address lines instead, with refresh identified by a 5-bit prefix under an
/// asserted chip select. Mixing the rules up yields wrong counts, so the
/// type is fixed at construction.
#[derive(Debug)]
pub struct RefreshCounter {
    memtype: MemoryType,
    nranks: u8,
    count: u64,
}

/// DDR5 REFab opcode on the low address bits.
const DDR5_REF_PREFIX: u32 = 0b10011;

impl RefreshCounter {
    #[must_use]
    pub fn new(memtype: MemoryType, nranks: u8) -> Self {
        Self {
            memtype,
            nranks,
            count: 0,
        }
    }

    /// Refresh ordinal: the number of refreshes seen since reset.
    #[inline]
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Does this cycle's command match the refresh rule?
    #[must_use]
    pub fn is_refresh(&self, command: &PhaseCommand) -> bool {
        match self.memtype {
            MemoryType::Ddr4 => {
                command.cs_n & cs_mask(self.nranks) == 0
                    && !command.cas_n
                    && !command.ras_n
                    && command.we_n
            }
            MemoryType::Ddr5 => {
                command.cs_n & cs_mask(self.nranks) == 0
                    && command.address & 0x1F == DDR5_REF_PREFIX
            }
        }
    }

    /// Sample one cycle of the bus; returns `true` when a refresh was seen
    /// (and counted).
    pub fn observe(&mut self, command: &PhaseCommand) -> bool {
        let matched = self.is_refresh(command);
        if matched {
            self.count += 1;
        }
        matched
    }
}

#[inline]
fn cs_mask(nranks: u8) -> u8 {
    ((1u16 << nranks) - 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_rule_counts_refresh_commands() {
        let mut counter = RefreshCounter::new(MemoryType::Ddr4, 1);
        let refresh = PhaseCommand::refresh(1);
        let idle = PhaseCommand::idle(1);

        assert!(counter.observe(&refresh));
        assert!(!counter.observe(&idle));
        assert!(counter.observe(&refresh));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn classic_rule_requires_we_high() {
        let counter = RefreshCounter::new(MemoryType::Ddr4, 1);
        let mut almost = PhaseCommand::refresh(1);
        almost.we_n = false;
        assert!(!counter.is_refresh(&almost));
    }

    #[test]
    fn ddr5_rule_keys_on_the_address_prefix() {
        let counter = RefreshCounter::new(MemoryType::Ddr5, 1);
        let mut cmd = PhaseCommand::idle(1);
        cmd.cs_n = 0;
        cmd.address = DDR5_REF_PREFIX | (0x42 << 5);
        assert!(counter.is_refresh(&cmd));

        cmd.address = 0b10010;
        assert!(!counter.is_refresh(&cmd));

        // Deselected: never a refresh, whatever the address says.
        cmd.address = DDR5_REF_PREFIX;
        cmd.cs_n = 1;
        assert!(!counter.is_refresh(&cmd));
    }

    #[test]
    fn multi_rank_refresh_requires_broadcast_select() {
        let counter = RefreshCounter::new(MemoryType::Ddr4, 2);
        let mut cmd = PhaseCommand::refresh(2);
        assert!(counter.is_refresh(&cmd));
        cmd.cs_n = 0b10;
        assert!(!counter.is_refresh(&cmd));
    }
}
