//! Drives the per-phase command wires from a decoded instruction.
//!
//! Commands are issued on phase 0, except READs, which go out on the
//! configured read phase. Chip-select semantics: NOOP deselects every rank,
//! REF selects them all (refresh is a broadcast), anything else selects the
//! one rank named by the decoded address. The executor registers the
//! emitter's output, so a command appears on the bus one cycle after `exec`.

use crate::decoder::Decoded;
use crate::instruction::OpCode;
use rowpulse::{CommandLines, Geometry, PhaseCommand};

#[derive(Debug)]
pub struct CommandEmitter<const PHASES: usize> {
    nranks: u8,
    cs_all: u8,
    rdphase: usize,
}

impl<const PHASES: usize> CommandEmitter<PHASES> {
    #[must_use]
    pub fn new(geom: &Geometry, rdphase: usize) -> Self {
        Self {
            nranks: geom.nranks,
            cs_all: geom.cs_mask(),
            rdphase,
        }
    }

    /// Compute what every phase carries next cycle.
    ///
    /// With `exec` low, all phases idle. With `exec` high, the selected
    /// phase drives the decoded command and the rest idle.
    #[must_use]
    pub fn drive(&self, d: &Decoded, exec: bool) -> [PhaseCommand; PHASES] {
        let mut phases = [PhaseCommand::idle(self.nranks); PHASES];
        if !exec {
            return phases;
        }

        let index = if d.lines.is_read() { self.rdphase } else { 0 };
        let phase = &mut phases[index];
        phase.cas_n = !d.lines.contains(CommandLines::CAS);
        phase.ras_n = !d.lines.contains(CommandLines::RAS);
        phase.we_n = !d.lines.contains(CommandLines::WE);
        phase.address = d.row_or_col;
        phase.bank = d.bank;
        phase.rddata_en = d.op == Some(OpCode::Read);
        phase.cs_n = match d.op {
            Some(OpCode::Noop) => self.cs_all,
            Some(OpCode::Ref) => 0,
            _ => self.cs_all & !(1 << d.rank),
        };
        phases
    }
}
