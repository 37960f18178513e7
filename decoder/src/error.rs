use std::fmt;

use crate::arm::Format;
use crate::bitwise::Word;

/// Why a word couldn't be turned into a usable [`crate::Instruction`] or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// No entry of the format table matched the word.
    Classification { word: Word },
    /// The word belongs to a format the decoder doesn't lower yet.
    UnimplementedFormat { format: Format, word: Word },
    /// A packed field holds a bit pattern outside the domain of its type.
    InvalidField { field: &'static str, bits: u64 },
    /// A value given to a packed constructor needs more bits than its field has.
    FieldOverflow { field: &'static str, bits: u64 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification { word } => {
                write!(f, "{word:#010x} does not match any instruction format")
            }
            Self::UnimplementedFormat { format, word } => {
                write!(f, "{word:#010x} is a {format} instruction, which is not decoded yet")
            }
            Self::InvalidField { field, bits } => {
                write!(f, "field `{field}` holds invalid bits {bits:#x}")
            }
            Self::FieldOverflow { field, bits } => {
                write!(f, "value {bits:#x} does not fit field `{field}`")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
