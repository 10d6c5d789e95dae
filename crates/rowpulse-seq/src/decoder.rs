//! Combinational instruction decode.
//!
//! Decoding is a pure function of the instruction word and the address
//! geometry; the pipeline re-evaluates it every cycle on whatever sits in
//! the instruction register. All field views are produced unconditionally —
//! a LOOP word still reports a (meaningless) timeslice, a NOOP still
//! reports loop fields — and the executor picks the ones the opcode makes
//! meaningful, exactly as wires would.

use crate::instruction::{
    ADDRESS_BITS, LOOP_COUNT_BITS, LOOP_JUMP_BITS, NOOP_TIMESLICE_BITS, OPCODE_BITS, OpCode,
    TIMESLICE_BITS,
};
use rowpulse::{CommandLines, Geometry};

/// Every field view of one instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// `None` for the reserved `0b011` pattern, which is still driven onto
    /// the bus via `lines`.
    pub op: Option<OpCode>,
    /// Active-high RAS/CAS/WE taken straight from the opcode bits.
    pub lines: CommandLines,
    /// 29 bits for NOOP, 5 bits otherwise.
    pub timeslice: u32,
    /// The 24-bit packed address field.
    pub address: u32,
    pub bank: u8,
    pub row_or_col: u32,
    /// Zero on single-rank geometries.
    pub rank: u8,
    pub loop_count: u16,
    pub loop_jump: u32,
    /// NOOP with a zero timeslice: the STOP instruction.
    pub stop: bool,
}

/// Decode one payload word under the given geometry.
#[must_use]
pub fn decode(word: u32, geom: &Geometry) -> Decoded {
    let op_bits = (word & 0b111) as u8;
    let op = OpCode::from_bits(op_bits);
    let tail = word >> OPCODE_BITS;

    let timeslice = if op == Some(OpCode::Noop) {
        tail & ((1 << NOOP_TIMESLICE_BITS) - 1)
    } else {
        tail & ((1 << TIMESLICE_BITS) - 1)
    };
    let address = (tail >> TIMESLICE_BITS) & ((1 << ADDRESS_BITS) - 1);

    Decoded {
        op,
        lines: CommandLines::from_opcode_bits(op_bits),
        timeslice,
        address,
        bank: geom.bank_of(address),
        row_or_col: geom.rowcol_of(address),
        rank: geom.rank_of(address),
        loop_count: (tail & ((1 << LOOP_COUNT_BITS) - 1)) as u16,
        loop_jump: (tail >> LOOP_COUNT_BITS) & ((1 << LOOP_JUMP_BITS) - 1),
        stop: op == Some(OpCode::Noop) && timeslice == 0,
    }
}
