//! Per-phase command-bus wires and read returns.
//!
//! A multi-phase bus carries one potential DRAM command per phase per system
//! cycle. [`PhaseCommand`] is the snapshot of everything driven on one phase
//! for one cycle; [`PhaseRead`] is the read-data return path for the same
//! phase.

use crate::lines::CommandLines;

/// Command wires of a single bus phase for one cycle.
///
/// Chip select and the command lines follow DRAM polarity: active-low, one
/// `cs_n` bit per rank (bit `i` low selects rank `i`; bits above the rank
/// count are meaningless). `cke`, `odt`, and `reset_n` are held all-ones by
/// every driver in this crate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCommand {
    pub cs_n: u8,
    pub cas_n: bool,
    pub ras_n: bool,
    pub we_n: bool,
    pub address: u32,
    pub bank: u8,
    pub cke: u8,
    pub odt: u8,
    pub reset_n: u8,
    pub rddata_en: bool,
}

impl PhaseCommand {
    /// The idle pattern: every rank deselected, all command lines deasserted.
    #[must_use]
    pub fn idle(nranks: u8) -> Self {
        let all = cs_all(nranks);
        Self {
            cs_n: all,
            cas_n: true,
            ras_n: true,
            we_n: true,
            address: 0,
            bank: 0,
            cke: all,
            odt: all,
            reset_n: all,
            rddata_en: false,
        }
    }

    /// A broadcast refresh: all ranks selected, CAS and RAS asserted.
    #[must_use]
    pub fn refresh(nranks: u8) -> Self {
        Self {
            cs_n: 0,
            cas_n: false,
            ras_n: false,
            we_n: true,
            ..Self::idle(nranks)
        }
    }

    /// `true` if any of the first `nranks` chip selects is asserted.
    #[inline]
    #[must_use]
    pub fn is_selected(&self, nranks: u8) -> bool {
        self.cs_n & cs_all(nranks) != cs_all(nranks)
    }

    /// Active-high view of the command lines driven this cycle.
    #[inline]
    #[must_use]
    pub fn lines(&self) -> CommandLines {
        let mut lines = CommandLines::empty();
        lines.set(CommandLines::RAS, !self.ras_n);
        lines.set(CommandLines::CAS, !self.cas_n);
        lines.set(CommandLines::WE, !self.we_n);
        lines
    }
}

/// Read-data return of a single bus phase for one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRead {
    pub valid: bool,
    pub data: u64,
}

impl PhaseRead {
    #[must_use]
    pub fn word(data: u64) -> Self {
        Self { valid: true, data }
    }
}

#[inline]
fn cs_all(nranks: u8) -> u8 {
    ((1u16 << nranks) - 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_pattern_deselects_everything() {
        let idle = PhaseCommand::idle(2);
        assert!(!idle.is_selected(2));
        assert_eq!(idle.cs_n, 0b11);
        assert!(idle.lines().is_empty());
        assert!(!idle.rddata_en);
    }

    #[test]
    fn refresh_selects_all_ranks() {
        let refresh = PhaseCommand::refresh(4);
        assert!(refresh.is_selected(4));
        assert_eq!(refresh.cs_n, 0);
        assert_eq!(refresh.lines(), CommandLines::RAS | CommandLines::CAS);
    }
}
