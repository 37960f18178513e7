//! Classification of ARM words into encoding formats.
//!
//! Each format is recognised by a pair of masks: the bits it checks and the
//! values those bits must hold. Formats overlap (a multiply looks like a data
//! processing instruction with odd bits 4-7), so the table is ordered from the
//! most specific mask to the least and the first match wins. The order is
//! checked at compile time.
//!
//! ```text
//! 31  28 27 26 25 24   21 20 19  16 15  12 11          0
//!  cond   0  0  I  opcode  S   rn     rd     operand 2      data processing
//!  cond   1  0  1  L  offset                                branch
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DecodeError;
use crate::bitwise::Word;

/// Encoding families of the ARM instruction set, in the order they are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Format {
    BranchAndExchange,
    SingleDataSwap,
    Multiply,
    HalfwordDataTransferRegisterOffset,
    MultiplyLong,
    HalfwordDataTransferImmediateOffset,
    CoprocessorDataOperation,
    CoprocessorRegisterTransfer,
    Undefined,
    SoftwareInterrupt,
    BlockDataTransfer,
    Branch,
    CoprocessorDataTransfer,
    DataProcessingPsrTransfer,
    SingleDataTransfer,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BranchAndExchange => "branch and exchange",
            Self::SingleDataSwap => "single data swap",
            Self::Multiply => "multiply",
            Self::HalfwordDataTransferRegisterOffset => "halfword data transfer (register offset)",
            Self::MultiplyLong => "multiply long",
            Self::HalfwordDataTransferImmediateOffset => "halfword data transfer (immediate offset)",
            Self::CoprocessorDataOperation => "coprocessor data operation",
            Self::CoprocessorRegisterTransfer => "coprocessor register transfer",
            Self::Undefined => "undefined",
            Self::SoftwareInterrupt => "software interrupt",
            Self::BlockDataTransfer => "block data transfer",
            Self::Branch => "branch",
            Self::CoprocessorDataTransfer => "coprocessor data transfer",
            Self::DataProcessingPsrTransfer => "data processing / psr transfer",
            Self::SingleDataTransfer => "single data transfer",
        })
    }
}

/// Recognises one [`Format`]: a word matches when its `checked` bits equal `required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatMask {
    format: Format,
    checked: Word,
    required: Word,
}

impl FormatMask {
    #[must_use]
    pub const fn new(format: Format, checked: Word, required: Word) -> Self {
        Self {
            format,
            checked,
            required,
        }
    }

    #[must_use]
    pub const fn format(self) -> Format {
        self.format
    }

    #[must_use]
    pub const fn checked(self) -> Word {
        self.checked
    }

    #[must_use]
    pub const fn required(self) -> Word {
        self.required
    }

    #[must_use]
    pub fn matches(self, word: Word) -> bool {
        word & self.checked == self.required
    }

    /// Number of bits the mask looks at.
    #[must_use]
    pub const fn specificity(self) -> u32 {
        self.checked.get().count_ones()
    }
}

const fn mask(format: Format, checked: u32, required: u32) -> FormatMask {
    FormatMask::new(format, Word::new(checked), Word::new(required))
}

/// Formats ordered from most to least specific.
#[rustfmt::skip]
pub const FORMAT_MASKS: [FormatMask; 15] = [
    mask(Format::BranchAndExchange,                   0b0000_1111_1111_1111_1111_1111_1111_0000, 0b0000_0001_0010_1111_1111_1111_0001_0000),
    mask(Format::SingleDataSwap,                      0b0000_1111_1011_0000_0000_1111_1111_0000, 0b0000_0001_0000_0000_0000_0000_1001_0000),
    mask(Format::Multiply,                            0b0000_1111_1100_0000_0000_0000_1111_0000, 0b0000_0000_0000_0000_0000_0000_1001_0000),
    mask(Format::HalfwordDataTransferRegisterOffset,  0b0000_1110_0100_0000_0000_1111_1001_0000, 0b0000_0000_0000_0000_0000_0000_1001_0000),
    mask(Format::MultiplyLong,                        0b0000_1111_1000_0000_0000_0000_1111_0000, 0b0000_0000_1000_0000_0000_0000_1001_0000),
    mask(Format::HalfwordDataTransferImmediateOffset, 0b0000_1110_0100_0000_0000_0000_1001_0000, 0b0000_0000_0100_0000_0000_0000_1001_0000),
    mask(Format::CoprocessorDataOperation,            0b0000_1111_0000_0000_0000_0000_0001_0000, 0b0000_1110_0000_0000_0000_0000_0000_0000),
    mask(Format::CoprocessorRegisterTransfer,         0b0000_1111_0000_0000_0000_0000_0001_0000, 0b0000_1110_0000_0000_0000_0000_0001_0000),
    mask(Format::Undefined,                           0b0000_1110_0000_0000_0000_0000_0001_0000, 0b0000_0110_0000_0000_0000_0000_0001_0000),
    mask(Format::SoftwareInterrupt,                   0b0000_1111_0000_0000_0000_0000_0000_0000, 0b0000_1111_0000_0000_0000_0000_0000_0000),
    mask(Format::BlockDataTransfer,                   0b0000_1110_0000_0000_0000_0000_0000_0000, 0b0000_1000_0000_0000_0000_0000_0000_0000),
    mask(Format::Branch,                              0b0000_1110_0000_0000_0000_0000_0000_0000, 0b0000_1010_0000_0000_0000_0000_0000_0000),
    mask(Format::CoprocessorDataTransfer,             0b0000_1110_0000_0000_0000_0000_0000_0000, 0b0000_1100_0000_0000_0000_0000_0000_0000),
    mask(Format::DataProcessingPsrTransfer,           0b0000_1100_0000_0000_0000_0000_0000_0000, 0b0000_0000_0000_0000_0000_0000_0000_0000),
    mask(Format::SingleDataTransfer,                  0b0000_1100_0000_0000_0000_0000_0000_0000, 0b0000_0100_0000_0000_0000_0000_0000_0000),
];

/// Whether no mask checks more bits than the one before it, and every
/// required pattern lies inside its checked bits.
const fn is_well_formed(masks: &[FormatMask]) -> bool {
    let mut index = 0;
    while index < masks.len() {
        let entry = masks[index];
        if entry.required.get() & !entry.checked.get() != 0 {
            return false;
        }
        if index > 0 && entry.specificity() > masks[index - 1].specificity() {
            return false;
        }
        index += 1;
    }
    true
}

const _: () = assert!(
    is_well_formed(&FORMAT_MASKS),
    "format masks must go from most to least specific"
);

/// Finds the first format of `masks` matching `word`.
pub fn classify_with(word: Word, masks: &[FormatMask]) -> Result<Format, DecodeError> {
    masks
        .iter()
        .find(|entry| entry.matches(word))
        .map(|entry| entry.format)
        .ok_or(DecodeError::Classification { word })
}

/// Classifies `word` against [`FORMAT_MASKS`].
pub fn classify(word: Word) -> Result<Format, DecodeError> {
    classify_with(word, &FORMAT_MASKS)
}
