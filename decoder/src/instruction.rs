//! The decoded instruction value and its per-operation views.
//!
//! An [`Instruction`] is a 64-bit packed value. Every layout keeps the
//! [`Operation`] in bits 0-7 and the [`Condition`] in bits 8-11; the remaining
//! bits depend on the operation. The views below are the layouts for the
//! operations the decoder produces:
//!
//! ```text
//!                  16        24        32             48        56
//! BranchAndExchange                    destination
//! Branch           link                offset (32 bits)
//! DataProcessing   op s      rd   rn   second operand
//! MoveFromPsr      rd (5)    rs (5)
//! MoveToPsr        psr (5)             source operand  flags_only
//! Multiply         rd_hi     acc       rn             rm        s a l u
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DecodeError;
use crate::bitwise::{BitIndex, BitRange, BitSize, Doubleword, insert};
use crate::packed::{Packed, packed_enum, packed_struct};
use crate::shift_operand::ShiftOperand;
use crate::types::{AddressOffset, Condition, Register};

/// What an instruction does, independent of how it was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Operation {
    BranchAndExchange = 0,
    Branch = 1,
    DataProcessing = 2,
    MoveFromPsr = 3,
    MoveToPsr = 4,
    Multiply = 5,
    Load = 6,
    Store = 7,
    LoadMultiple = 8,
    StoreMultiple = 9,
    Swap = 10,
    SoftwareInterrupt = 11,
    CoprocessorDataOperation = 12,
    CoprocessorLoad = 13,
    CoprocessorStore = 14,
    LoadCoprocessorRegister = 15,
    StoreCoprocessorRegister = 16,
    Undefined = 17,
}

impl Operation {
    #[must_use]
    pub const fn from_repr(repr: u8) -> Option<Self> {
        Some(match repr {
            0 => Self::BranchAndExchange,
            1 => Self::Branch,
            2 => Self::DataProcessing,
            3 => Self::MoveFromPsr,
            4 => Self::MoveToPsr,
            5 => Self::Multiply,
            6 => Self::Load,
            7 => Self::Store,
            8 => Self::LoadMultiple,
            9 => Self::StoreMultiple,
            10 => Self::Swap,
            11 => Self::SoftwareInterrupt,
            12 => Self::CoprocessorDataOperation,
            13 => Self::CoprocessorLoad,
            14 => Self::CoprocessorStore,
            15 => Self::LoadCoprocessorRegister,
            16 => Self::StoreCoprocessorRegister,
            17 => Self::Undefined,
            _ => return None,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BranchAndExchange => "branch and exchange",
            Self::Branch => "branch",
            Self::DataProcessing => "data processing",
            Self::MoveFromPsr => "move from psr",
            Self::MoveToPsr => "move to psr",
            Self::Multiply => "multiply",
            Self::Load => "load",
            Self::Store => "store",
            Self::LoadMultiple => "load multiple",
            Self::StoreMultiple => "store multiple",
            Self::Swap => "swap",
            Self::SoftwareInterrupt => "software interrupt",
            Self::CoprocessorDataOperation => "coprocessor data operation",
            Self::CoprocessorLoad => "coprocessor load",
            Self::CoprocessorStore => "coprocessor store",
            Self::LoadCoprocessorRegister => "load coprocessor register",
            Self::StoreCoprocessorRegister => "store coprocessor register",
            Self::Undefined => "undefined",
        })
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataProcessingOpCode {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl DataProcessingOpCode {
    #[must_use]
    pub const fn from_repr(repr: u8) -> Option<Self> {
        Some(match repr {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Sub,
            0x3 => Self::Rsb,
            0x4 => Self::Add,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Rsc,
            0x8 => Self::Tst,
            0x9 => Self::Teq,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mov,
            0xE => Self::Bic,
            0xF => Self::Mvn,
            _ => return None,
        })
    }

    /// `tst`, `teq`, `cmp` and `cmn` only set flags and have no destination.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// `mov` and `mvn` ignore the first operand register.
    #[must_use]
    pub const fn is_move(self) -> bool {
        matches!(self, Self::Mov | Self::Mvn)
    }
}

impl fmt::Display for DataProcessingOpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Eor => "eor",
            Self::Sub => "sub",
            Self::Rsb => "rsb",
            Self::Add => "add",
            Self::Adc => "adc",
            Self::Sbc => "sbc",
            Self::Rsc => "rsc",
            Self::Tst => "tst",
            Self::Teq => "teq",
            Self::Cmp => "cmp",
            Self::Cmn => "cmn",
            Self::Orr => "orr",
            Self::Mov => "mov",
            Self::Bic => "bic",
            Self::Mvn => "mvn",
        })
    }
}

packed_enum!(Operation, DataProcessingOpCode);

packed_struct! {
    struct Header: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
    }
}

packed_struct! {
    /// `bx rm`: jump to the address in a register, switching to Thumb when bit 0 is set.
    pub struct BranchAndExchange: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
        destination: Register = [32, 4],
    }
}

packed_struct! {
    /// `b` and `bl`. The offset is already in bytes, relative to the
    /// instruction address plus 8.
    pub struct Branch: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
        link: bool = [16, 1],
        offset: AddressOffset = [32, 32],
    }
}

packed_struct! {
    pub struct DataProcessing: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
        op_code: DataProcessingOpCode = [16, 4],
        set_condition_codes: bool = [20, 1],
        destination: Register = [24, 4],
        first: Register = [28, 4],
        second: ShiftOperand = [32, 16],
    }
}

packed_struct! {
    /// `mrs rd, psr`
    pub struct MoveFromPsr: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
        destination: Register = [16, 5],
        source: Register = [24, 5],
    }
}

packed_struct! {
    /// `msr psr, rm` and `msr psr_flg, operand`. With `flags_only` set only
    /// the condition flags of the PSR are written.
    pub struct MoveToPsr: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
        destination: Register = [16, 5],
        source: ShiftOperand = [32, 16],
        flags_only: bool = [48, 1],
    }
}

packed_struct! {
    /// `mul`, `mla` and their long forms. `destination_high` only matters
    /// for the long forms, which write a 64-bit result.
    pub struct Multiply: Doubleword {
        operation: Operation = [0, 8],
        condition: Condition = [8, 4],
        destination_high: Register = [16, 4],
        accumulator: Register = [24, 4],
        first: Register = [32, 4],
        second: Register = [48, 4],
        set_condition_codes: bool = [56, 1],
        accumulate: bool = [57, 1],
        long: bool = [58, 1],
        unsigned: bool = [59, 1],
    }
}

/// A view of an [`Instruction`] specific to one [`Operation`].
pub trait InstructionKind: Packed<Underlying = Doubleword> {
    const OPERATION: Operation;
}

impl InstructionKind for BranchAndExchange {
    const OPERATION: Operation = Operation::BranchAndExchange;
}

impl InstructionKind for Branch {
    const OPERATION: Operation = Operation::Branch;
}

impl InstructionKind for DataProcessing {
    const OPERATION: Operation = Operation::DataProcessing;
}

impl InstructionKind for MoveFromPsr {
    const OPERATION: Operation = Operation::MoveFromPsr;
}

impl InstructionKind for MoveToPsr {
    const OPERATION: Operation = Operation::MoveToPsr;
}

impl InstructionKind for Multiply {
    const OPERATION: Operation = Operation::Multiply;
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction(Doubleword);

impl Instruction {
    /// Wraps a view, stamping its operation tag so the two can't disagree.
    #[must_use]
    pub fn new<V: InstructionKind>(view: V) -> Self {
        let operation = Doubleword::new(V::OPERATION as u64);
        let tag = BitRange::new(BitIndex::new(0), BitSize::new(8));
        Self(insert(view.to_underlying(), operation, tag))
    }

    #[must_use]
    pub const fn from_underlying(underlying: Doubleword) -> Self {
        Self(underlying)
    }

    #[must_use]
    pub const fn to_underlying(self) -> Doubleword {
        self.0
    }

    pub fn operation(self) -> Result<Operation, DecodeError> {
        Header::from_underlying(self.0).operation()
    }

    pub fn condition(self) -> Result<Condition, DecodeError> {
        Header::from_underlying(self.0).condition()
    }

    /// Reinterprets the instruction as view `V` without checking the operation.
    #[must_use]
    pub fn get<V: InstructionKind>(self) -> V {
        V::from_underlying(self.0)
    }

    /// The instruction as view `V`, if it holds that operation.
    #[must_use]
    pub fn as_kind<V: InstructionKind>(self) -> Option<V> {
        (self.operation().ok()? == V::OPERATION).then(|| self.get())
    }
}
