//! Decoder for 32-bit `ARMv4` instruction words.
//!
//! [`decode`] classifies a word into its encoding [`Format`] and lowers it into
//! an [`Instruction`]: a compact, copyable value tagged with its [`Operation`]
//! that can be inspected through per-operation views such as
//! [`instruction::Branch`] or [`instruction::DataProcessing`].
//!
//! ```
//! use decoder::instruction::{BranchAndExchange, Operation};
//! use decoder::types::{Condition, Register};
//!
//! let instruction = decoder::decode_raw(0xE12F_FF1E).unwrap();
//! assert_eq!(instruction.operation(), Ok(Operation::BranchAndExchange));
//! assert_eq!(instruction.condition(), Ok(Condition::AL));
//!
//! let bx = instruction.as_kind::<BranchAndExchange>().unwrap();
//! assert_eq!(bx.destination(), Ok(Register::LR));
//! ```

pub mod arm;
pub mod bitwise;
mod error;
pub mod instruction;
pub mod packed;
pub mod shift_operand;
pub mod types;

pub use arm::{Format, classify, decode, decode_raw};
pub use error::DecodeError;
pub use instruction::{Instruction, InstructionKind, Operation};
