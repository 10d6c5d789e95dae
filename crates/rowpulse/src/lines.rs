//! DRAM command lines as a bit set.
//!
//! The three payload-instruction opcode bits map one-to-one onto the RAS,
//! CAS, and WE command-bus outputs, so the same bit layout serves both the
//! codec and the wire drivers.

use bitflags::bitflags;

bitflags! {
    /// Active-high view of the RAS/CAS/WE command lines.
    ///
    /// # Bit Layout
    ///
    /// ```text
    /// 2 1 0
    /// R C W
    /// ```
    ///
    /// Bit 0 is WE, bit 1 is CAS, bit 2 is RAS, matching the low three bits
    /// of an instruction word. On the bus itself the lines are active-low;
    /// conversion happens at the wire boundary.
    #[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
    pub struct CommandLines: u8 {
        const WE  = 0b001;
        const CAS = 0b010;
        const RAS = 0b100;
    }
}

impl CommandLines {
    /// Build from the low three bits of an instruction word.
    #[inline]
    #[must_use]
    pub fn from_opcode_bits(bits: u8) -> Self {
        CommandLines::from_bits_truncate(bits)
    }

    /// `true` for the READ pattern (CAS asserted, RAS and WE idle).
    #[inline]
    #[must_use]
    pub fn is_read(self) -> bool {
        self == CommandLines::CAS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_bits_map_to_lines() {
        // ACT = 0b100: RAS only.
        assert_eq!(CommandLines::from_opcode_bits(0b100), CommandLines::RAS);
        // PRE = 0b101: RAS | WE.
        assert_eq!(
            CommandLines::from_opcode_bits(0b101),
            CommandLines::RAS | CommandLines::WE
        );
        // READ = 0b010: CAS only.
        assert!(CommandLines::from_opcode_bits(0b010).is_read());
        assert!(!CommandLines::from_opcode_bits(0b110).is_read());
    }
}
