//! Payload instructions and the build-time encoder.
//!
//! All instructions are one 32-bit word with the opcode in the low three
//! bits. The format of most instructions is the same; LOOP repurposes the
//! tail for its count and jump fields, and NOOP widens the timeslice to the
//! whole tail:
//!
//! ```text
//!       LSB                       MSB
//! dfi:  OP_CODE | TIMESLICE | ADDRESS
//! noop: OP_CODE | TIMESLICE_NOOP
//! loop: OP_CODE | COUNT     | JUMP
//! stop: <NOOP>  | 0
//! ```
//!
//! A NOOP with a timeslice of zero is the STOP instruction. The timeslice is
//! the number of cycles the instruction occupies including the issue cycle;
//! the executor treats a timeslice of zero on other instructions as one, but
//! the encoder rejects it outright.

use alloc::vec::Vec;
use core::error::Error;
use core::fmt;
use rowpulse::{CommandLines, Geometry};

pub const OPCODE_BITS: u32 = 3;
pub const TIMESLICE_BITS: u32 = 5;
pub const ADDRESS_BITS: u32 = 24;
pub const NOOP_TIMESLICE_BITS: u32 = TIMESLICE_BITS + ADDRESS_BITS;
pub const LOOP_COUNT_BITS: u32 = 12;
pub const LOOP_JUMP_BITS: u32 = 17;

/// Largest timeslice a single DFI instruction word can carry.
pub const MAX_TIMESLICE: u32 = (1 << TIMESLICE_BITS) - 1;
/// Largest timeslice a single NOOP word can carry.
pub const MAX_NOOP_TIMESLICE: u32 = (1 << NOOP_TIMESLICE_BITS) - 1;
/// Largest LOOP repetition count (the block runs `count + 1` times).
pub const MAX_LOOP_COUNT: u16 = (1 << LOOP_COUNT_BITS) - 1;
/// Largest LOOP backward distance.
pub const MAX_LOOP_JUMP: u32 = (1 << LOOP_JUMP_BITS) - 1;

/// Instruction opcodes.
///
/// For the DFI-mappable opcodes the value doubles as the command-line
/// pattern: bit 0 is WE, bit 1 is CAS, bit 2 is RAS. `0b011` (a WRITE on
/// those lines) is deliberately unassigned; the executor cannot source
/// write data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Noop = 0b000,
    Zqc = 0b001,
    Read = 0b010,
    Act = 0b100,
    Pre = 0b101,
    Ref = 0b110,
    Loop = 0b111,
}

impl OpCode {
    /// Map the low three bits of a word back to an opcode.
    ///
    /// Returns `None` for the reserved `0b011` pattern.
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b111 {
            0b000 => Some(OpCode::Noop),
            0b001 => Some(OpCode::Zqc),
            0b010 => Some(OpCode::Read),
            0b100 => Some(OpCode::Act),
            0b101 => Some(OpCode::Pre),
            0b110 => Some(OpCode::Ref),
            0b111 => Some(OpCode::Loop),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// The command-line pattern this opcode drives on the bus.
    #[inline]
    #[must_use]
    pub fn lines(self) -> CommandLines {
        CommandLines::from_opcode_bits(self.bits())
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpCode::Noop => "NOOP",
            OpCode::Zqc => "ZQC",
            OpCode::Read => "READ",
            OpCode::Act => "ACT",
            OpCode::Pre => "PRE",
            OpCode::Ref => "REF",
            OpCode::Loop => "LOOP",
        };
        f.write_str(name)
    }
}

/// One payload instruction, before encoding.
///
/// The address-carrying variants take a 24-bit packed address as produced by
/// [`Encoder::address`]; REF is a broadcast and carries none, which is also
/// why "missing address" is not an encode error — it cannot be written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Idle for `timeslice` cycles. A timeslice of zero is [`Stop`](Self::Stop).
    Noop { timeslice: u32 },
    /// Terminate execution.
    Stop,
    /// Re-run the `jump + 1` preceding instructions `count` more times.
    Loop { count: u16, jump: u32 },
    Act { timeslice: u32, address: u32 },
    Pre { timeslice: u32, address: u32 },
    Ref { timeslice: u32 },
    Zqc { timeslice: u32, address: u32 },
    Read { timeslice: u32, address: u32 },
}

impl Instruction {
    #[must_use]
    pub fn op_code(&self) -> OpCode {
        match self {
            Instruction::Noop { .. } | Instruction::Stop => OpCode::Noop,
            Instruction::Loop { .. } => OpCode::Loop,
            Instruction::Act { .. } => OpCode::Act,
            Instruction::Pre { .. } => OpCode::Pre,
            Instruction::Ref { .. } => OpCode::Ref,
            Instruction::Zqc { .. } => OpCode::Zqc,
            Instruction::Read { .. } => OpCode::Read,
        }
    }
}

/// Build-time validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    LoopCountTooLarge { count: u16 },
    LoopJumpTooLarge { jump: u32 },
    NoopTimesliceTooLarge { timeslice: u32 },
    /// A timeslice of zero on anything but NOOP; the hardware would execute
    /// it as one cycle, but the intent is ambiguous so it is rejected.
    ZeroTimeslice { op: OpCode },
    AddressTooWide { address: u32 },
    BankTooLarge { bank: u8 },
    RowTooLarge { row: u32 },
    ColumnTooLarge { column: u32 },
    RankTooLarge { rank: u8 },
    /// Multi-rank geometry, but no rank given.
    RankRequired,
    /// Rank given on a single-rank geometry.
    RankUnsupported,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::LoopCountTooLarge { count } => {
                write!(f, "LOOP count {count} exceeds {MAX_LOOP_COUNT}")
            }
            EncodeError::LoopJumpTooLarge { jump } => {
                write!(f, "LOOP jump {jump} exceeds {MAX_LOOP_JUMP}")
            }
            EncodeError::NoopTimesliceTooLarge { timeslice } => {
                write!(f, "NOOP timeslice {timeslice} exceeds {MAX_NOOP_TIMESLICE}")
            }
            EncodeError::ZeroTimeslice { op } => {
                write!(f, "timeslice for {op} must be greater than zero")
            }
            EncodeError::AddressTooWide { address } => {
                write!(f, "address {address:#x} does not fit in {ADDRESS_BITS} bits")
            }
            EncodeError::BankTooLarge { bank } => write!(f, "bank {bank} out of range"),
            EncodeError::RowTooLarge { row } => write!(f, "row {row:#x} out of range"),
            EncodeError::ColumnTooLarge { column } => {
                write!(f, "column {column:#x} out of range")
            }
            EncodeError::RankTooLarge { rank } => write!(f, "rank {rank} out of range"),
            EncodeError::RankRequired => f.write_str("multi-rank geometry requires a rank"),
            EncodeError::RankUnsupported => {
                f.write_str("rank given but the geometry has a single rank")
            }
        }
    }
}

impl Error for EncodeError {}

/// Row-or-column target of an address. The two are mutually exclusive; an
/// instruction addresses either a row (ACT, PRE) or a column (READ), never
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Row(u32),
    Column(u32),
}

/// Packs [`Instruction`]s into 32-bit payload words for one [`Geometry`].
///
/// # Examples
///
/// ```
/// use rowpulse::Geometry;
/// use rowpulse_seq::{Encoder, Instruction, Target};
///
/// let encoder = Encoder::new(Geometry::new(1, 4, 16, 10).unwrap());
/// let addr = encoder.address(None, 3, Some(Target::Row(0x1234))).unwrap();
/// let words = encoder
///     .encode(&Instruction::Act { timeslice: 4, address: addr })
///     .unwrap();
/// assert_eq!(words.len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    geom: Geometry,
}

impl Encoder {
    #[must_use]
    pub fn new(geom: Geometry) -> Self {
        Self { geom }
    }

    /// Pack rank, bank, and row-or-column into a 24-bit address field.
    ///
    /// `rank` is required exactly when the geometry has more than one rank.
    /// `None` as the target addresses row/column zero (REF-style commands
    /// that only care about the bank).
    pub fn address(
        &self,
        rank: Option<u8>,
        bank: u8,
        target: Option<Target>,
    ) -> Result<u32, EncodeError> {
        let rank = match (rank, self.geom.nranks) {
            (None, 1) => 0,
            (Some(_), 1) => return Err(EncodeError::RankUnsupported),
            (None, _) => return Err(EncodeError::RankRequired),
            (Some(r), n) if r >= n => return Err(EncodeError::RankTooLarge { rank: r }),
            (Some(r), _) => r,
        };
        if self.geom.bankbits < 8 && bank >= 1 << self.geom.bankbits {
            return Err(EncodeError::BankTooLarge { bank });
        }
        let rowcol = match target {
            None => 0,
            Some(Target::Row(row)) => {
                if self.geom.rowbits < 32 && row >= 1 << self.geom.rowbits {
                    return Err(EncodeError::RowTooLarge { row });
                }
                row
            }
            Some(Target::Column(column)) => {
                if self.geom.colbits < 32 && column >= 1 << self.geom.colbits {
                    return Err(EncodeError::ColumnTooLarge { column });
                }
                column
            }
        };
        Ok(self.geom.pack(rank, bank, rowcol))
    }

    /// Encode one instruction into one or more payload words.
    ///
    /// A DFI instruction whose timeslice exceeds [`MAX_TIMESLICE`] is split:
    /// the base word is clamped to the maximum and trailing NOOP words cover
    /// the remainder, so the total encoded duration equals the request.
    pub fn encode(&self, instruction: &Instruction) -> Result<Vec<u32>, EncodeError> {
        let mut words = Vec::new();
        self.encode_into(instruction, &mut words)?;
        Ok(words)
    }

    /// Encode a whole program into a flat word list.
    pub fn encode_program(&self, program: &[Instruction]) -> Result<Vec<u32>, EncodeError> {
        let mut words = Vec::with_capacity(program.len());
        for instruction in program {
            self.encode_into(instruction, &mut words)?;
        }
        Ok(words)
    }

    fn encode_into(
        &self,
        instruction: &Instruction,
        words: &mut Vec<u32>,
    ) -> Result<(), EncodeError> {
        match *instruction {
            Instruction::Stop => words.push(0),
            Instruction::Noop { timeslice } => {
                if timeslice > MAX_NOOP_TIMESLICE {
                    return Err(EncodeError::NoopTimesliceTooLarge { timeslice });
                }
                words.push(u32::from(OpCode::Noop.bits()) | (timeslice << OPCODE_BITS));
            }
            Instruction::Loop { count, jump } => {
                if count > MAX_LOOP_COUNT {
                    return Err(EncodeError::LoopCountTooLarge { count });
                }
                if jump > MAX_LOOP_JUMP {
                    return Err(EncodeError::LoopJumpTooLarge { jump });
                }
                words.push(
                    u32::from(OpCode::Loop.bits())
                        | (u32::from(count) << OPCODE_BITS)
                        | (jump << (OPCODE_BITS + LOOP_COUNT_BITS)),
                );
            }
            Instruction::Act { timeslice, address }
            | Instruction::Pre { timeslice, address }
            | Instruction::Zqc { timeslice, address }
            | Instruction::Read { timeslice, address } => {
                self.encode_dfi(instruction.op_code(), timeslice, address, words)?;
            }
            Instruction::Ref { timeslice } => {
                self.encode_dfi(OpCode::Ref, timeslice, 0, words)?;
            }
        }
        Ok(())
    }

    fn encode_dfi(
        &self,
        op: OpCode,
        timeslice: u32,
        address: u32,
        words: &mut Vec<u32>,
    ) -> Result<(), EncodeError> {
        if timeslice == 0 {
            return Err(EncodeError::ZeroTimeslice { op });
        }
        if address >> ADDRESS_BITS != 0 {
            return Err(EncodeError::AddressTooWide { address });
        }
        let base = timeslice.min(MAX_TIMESLICE);
        words.push(
            u32::from(op.bits())
                | (base << OPCODE_BITS)
                | (address << (OPCODE_BITS + TIMESLICE_BITS)),
        );
        let mut remaining = timeslice - base;
        if remaining > 0 {
            log::warn!(
                "{op} timeslice {timeslice} exceeds {MAX_TIMESLICE}; padding with NOOPs for the \
                 remaining {remaining} cycles"
            );
        }
        while remaining > 0 {
            let wait = remaining.min(MAX_NOOP_TIMESLICE);
            words.push(u32::from(OpCode::Noop.bits()) | (wait << OPCODE_BITS));
            remaining -= wait;
        }
        Ok(())
    }
}
