//! Renders decoded instructions as ARM assembly text.
//!
//! The output uses the pre-UAL syntax: the condition comes right after the
//! mnemonic and the `s` suffix after the condition (`addeqs`), immediates are
//! printed in hexadecimal and branch targets as signed offsets.

use std::fmt;

use decoder::DecodeError;
use decoder::instruction::{
    Branch, BranchAndExchange, DataProcessing, Instruction, MoveFromPsr, MoveToPsr, Operation,
};
use decoder::shift_operand::{
    ImmediateOperand, ImmediateShiftedRegisterOperand, RegisterShiftedRegisterOperand,
    RotatedImmediateOperand, ShiftOperand, ShiftOperandKind,
};
use decoder::types::{AddressOffset, Register, ShiftType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// The instruction holds an operation nothing renders yet.
    UnimplementedOperation(Operation),
    /// A field failed validation while being read for rendering.
    Decode(DecodeError),
    /// A PSR transfer names a general register where a status register belongs.
    NotAStatusRegister(Register),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnimplementedOperation(operation) => {
                write!(f, "{operation} instructions can't be disassembled yet")
            }
            Self::Decode(error) => write!(f, "{error}"),
            Self::NotAStatusRegister(register) => {
                write!(f, "{register} is not a program status register")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnimplementedOperation(_) | Self::NotAStatusRegister(_) => None,
            Self::Decode(error) => Some(error),
        }
    }
}

impl From<DecodeError> for RenderError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

/// Assembly text for a decoded value.
pub trait Disassemble {
    fn disassemble(&self) -> Result<String, RenderError>;
}

/// Renders `instruction`, dispatching on its operation.
pub fn disassemble(instruction: &Instruction) -> Result<String, RenderError> {
    instruction.disassemble()
}

impl Disassemble for Instruction {
    fn disassemble(&self) -> Result<String, RenderError> {
        match self.operation()? {
            Operation::BranchAndExchange => self.get::<BranchAndExchange>().disassemble(),
            Operation::Branch => self.get::<Branch>().disassemble(),
            Operation::DataProcessing => self.get::<DataProcessing>().disassemble(),
            Operation::MoveFromPsr => self.get::<MoveFromPsr>().disassemble(),
            Operation::MoveToPsr => self.get::<MoveToPsr>().disassemble(),
            operation => {
                tracing::debug!(%operation, "no renderer for operation");
                Err(RenderError::UnimplementedOperation(operation))
            }
        }
    }
}

impl Disassemble for ShiftOperand {
    fn disassemble(&self) -> Result<String, RenderError> {
        Ok(match self.kind()? {
            ShiftOperandKind::Immediate => {
                let (_, value) = self.get::<ImmediateOperand>().fields()?;
                format!("#{:#x}", value.get())
            }
            ShiftOperandKind::RotatedImmediate => {
                format!("#{:#x}", self.get::<RotatedImmediateOperand>().value()?)
            }
            ShiftOperandKind::ImmediateShiftedRegister => {
                let (_, source, shift_type, amount) =
                    self.get::<ImmediateShiftedRegisterOperand>().fields()?;
                match shift_type {
                    ShiftType::RotateRightExtended => format!("{source}, rrx"),
                    _ if amount.get() == 0 => source.to_string(),
                    _ => format!("{source}, {shift_type} #{amount}"),
                }
            }
            ShiftOperandKind::RegisterShiftedRegister => {
                let (_, source, shift_type, amount) =
                    self.get::<RegisterShiftedRegisterOperand>().fields()?;
                format!("{source}, {shift_type} {amount}")
            }
        })
    }
}

impl Disassemble for BranchAndExchange {
    fn disassemble(&self) -> Result<String, RenderError> {
        let (_, condition, destination) = self.fields()?;
        Ok(format!("bx{condition} {destination}"))
    }
}

fn signed_hex(offset: AddressOffset) -> String {
    let offset = offset.signed();
    if offset < 0 {
        format!("-{:#x}", offset.unsigned_abs())
    } else {
        format!("{offset:#x}")
    }
}

impl Disassemble for Branch {
    fn disassemble(&self) -> Result<String, RenderError> {
        let (_, condition, link, offset) = self.fields()?;
        let link = if link { "l" } else { "" };
        Ok(format!("b{link}{condition} {}", signed_hex(offset)))
    }
}

impl Disassemble for DataProcessing {
    fn disassemble(&self) -> Result<String, RenderError> {
        let (_, condition, op_code, set_condition_codes, destination, first, second) =
            self.fields()?;
        let second = second.disassemble()?;
        let s = if set_condition_codes { "s" } else { "" };

        Ok(if op_code.is_test() {
            format!("{op_code}{condition} {first}, {second}")
        } else if op_code.is_move() {
            format!("{op_code}{condition}{s} {destination}, {second}")
        } else {
            format!("{op_code}{condition}{s} {destination}, {first}, {second}")
        })
    }
}

fn status_register(register: Register) -> Result<Register, RenderError> {
    if register.is_psr() {
        Ok(register)
    } else {
        Err(RenderError::NotAStatusRegister(register))
    }
}

impl Disassemble for MoveFromPsr {
    fn disassemble(&self) -> Result<String, RenderError> {
        let (_, condition, destination, source) = self.fields()?;
        let source = status_register(source)?;
        Ok(format!("mrs{condition} {destination}, {source}"))
    }
}

impl Disassemble for MoveToPsr {
    fn disassemble(&self) -> Result<String, RenderError> {
        let (_, condition, destination, source, flags_only) = self.fields()?;
        let destination = status_register(destination)?;
        let flags = if flags_only { "_flg" } else { "" };
        Ok(format!(
            "msr{condition} {destination}{flags}, {}",
            source.disassemble()?
        ))
    }
}
