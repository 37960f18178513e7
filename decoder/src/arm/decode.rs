use crate::DecodeError;
use crate::bitwise::{BitShiftAmount, BitSize, Word, sign_extend_unchecked};
use crate::instruction::{
    Branch, BranchAndExchange, DataProcessing, DataProcessingOpCode, Instruction, MoveFromPsr,
    MoveToPsr, Operation,
};
use crate::packed::packed_struct;
use crate::shift_operand::decode_data_processing_second_operand;
use crate::types::{AddressOffset, Condition, Register};

use super::format::{Format, classify};

packed_struct! {
    struct BranchAndExchangeFields: Word {
        destination: Register = [0, 4],
        condition: Condition = [28, 4],
    }
}

packed_struct! {
    struct BranchFields: Word {
        raw_offset: Word = [0, 24],
        link: bool = [24, 1],
        condition: Condition = [28, 4],
    }
}

packed_struct! {
    struct DataProcessingFields: Word {
        destination: Register = [12, 4],
        first: Register = [16, 4],
        set_condition_codes: bool = [20, 1],
        op_code: DataProcessingOpCode = [21, 4],
        condition: Condition = [28, 4],
    }
}

/// Decodes one ARM instruction word.
///
/// Branches, branch and exchange, data processing and PSR transfers are
/// decoded; words of any other format are reported as
/// [`DecodeError::UnimplementedFormat`].
pub fn decode(word: Word) -> Result<Instruction, DecodeError> {
    let format = classify(word).inspect_err(|_| {
        tracing::debug!(word = format_args!("{word:#010x}"), "no instruction format matched");
    })?;
    tracing::trace!(word = format_args!("{word:#010x}"), %format, "classified");

    match format {
        Format::BranchAndExchange => decode_branch_and_exchange(word),
        Format::Branch => decode_branch(word),
        Format::DataProcessingPsrTransfer => decode_data_processing_psr_transfer(word),
        Format::SingleDataSwap
        | Format::Multiply
        | Format::HalfwordDataTransferRegisterOffset
        | Format::MultiplyLong
        | Format::HalfwordDataTransferImmediateOffset
        | Format::CoprocessorDataOperation
        | Format::CoprocessorRegisterTransfer
        | Format::Undefined
        | Format::SoftwareInterrupt
        | Format::BlockDataTransfer
        | Format::CoprocessorDataTransfer
        | Format::SingleDataTransfer => {
            tracing::debug!(word = format_args!("{word:#010x}"), %format, "format is not decoded");
            Err(DecodeError::UnimplementedFormat { format, word })
        }
    }
}

/// [`decode`] for a bare machine word.
pub fn decode_raw(word: u32) -> Result<Instruction, DecodeError> {
    decode(Word::new(word))
}

fn decode_branch_and_exchange(word: Word) -> Result<Instruction, DecodeError> {
    let (destination, condition) = BranchAndExchangeFields::from_underlying(word).fields()?;

    Ok(Instruction::new(BranchAndExchange::new(
        Operation::BranchAndExchange,
        condition,
        destination,
    )?))
}

fn decode_branch(word: Word) -> Result<Instruction, DecodeError> {
    let (raw_offset, link, condition) = BranchFields::from_underlying(word).fields()?;

    Ok(Instruction::new(Branch::new(
        Operation::Branch,
        condition,
        link,
        branch_offset(raw_offset),
    )?))
}

/// The 24-bit word offset of a branch, as a signed byte offset.
fn branch_offset(raw_offset: Word) -> AddressOffset {
    let bytes = raw_offset << BitShiftAmount::new(2);
    AddressOffset::new(sign_extend_unchecked(bytes, BitSize::new(26)))
}

/// Data processing with `S` clear and a test op code is how PSR transfers are encoded.
fn decode_data_processing_psr_transfer(word: Word) -> Result<Instruction, DecodeError> {
    let (destination, first, set_condition_codes, op_code, condition) =
        DataProcessingFields::from_underlying(word).fields()?;

    if !set_condition_codes {
        match op_code {
            DataProcessingOpCode::Tst | DataProcessingOpCode::Cmp => {
                let source = if op_code == DataProcessingOpCode::Cmp {
                    Register::Spsr
                } else {
                    Register::Cpsr
                };
                return Ok(Instruction::new(MoveFromPsr::new(
                    Operation::MoveFromPsr,
                    condition,
                    destination,
                    source,
                )?));
            }
            DataProcessingOpCode::Teq | DataProcessingOpCode::Cmn => {
                let psr = if op_code == DataProcessingOpCode::Cmn {
                    Register::Spsr
                } else {
                    Register::Cpsr
                };
                return Ok(Instruction::new(MoveToPsr::new(
                    Operation::MoveToPsr,
                    condition,
                    psr,
                    decode_data_processing_second_operand(word)?,
                    first == Register::R8,
                )?));
            }
            _ => {}
        }
    }

    Ok(Instruction::new(DataProcessing::new(
        Operation::DataProcessing,
        condition,
        op_code,
        set_condition_codes,
        destination,
        first,
        decode_data_processing_second_operand(word)?,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitwise::Byte;
    use crate::shift_operand::{
        ImmediateShiftedRegisterOperand, RegisterShiftedRegisterOperand, RotatedImmediateOperand,
        ShiftOperand,
    };
    use crate::types::ShiftType;
    use pretty_assertions::assert_eq;

    fn decoded(word: u32) -> Instruction {
        decode_raw(word).unwrap()
    }

    #[test]
    fn branch_and_exchange() {
        let instruction = decoded(0xE12F_FF10);
        assert_eq!(instruction.operation(), Ok(Operation::BranchAndExchange));
        assert_eq!(instruction.condition(), Ok(Condition::AL));
        assert_eq!(
            instruction.get::<BranchAndExchange>().destination(),
            Ok(Register::R0)
        );

        let instruction = decoded(0x012F_FF1E);
        assert_eq!(instruction.condition(), Ok(Condition::EQ));
        assert_eq!(
            instruction.get::<BranchAndExchange>().destination(),
            Ok(Register::LR)
        );
    }

    #[test]
    fn branch_offsets_are_sign_extended_bytes() {
        assert_eq!(branch_offset(Word::new(1)).signed(), 4);
        assert_eq!(branch_offset(Word::new(0x00FF_FFFF)).signed(), -4);
        assert_eq!(branch_offset(Word::new(0x0080_0000)).signed(), -0x0200_0000);
        assert_eq!(branch_offset(Word::new(0x007F_FFFF)).signed(), 0x01FF_FFFC);
        assert_eq!(branch_offset(Word::ZERO).signed(), 0);
    }

    #[test]
    fn branch_and_link() {
        let branch = decoded(0xEA00_0001).as_kind::<Branch>().unwrap();
        assert_eq!(
            branch.fields(),
            Ok((
                Operation::Branch,
                Condition::AL,
                false,
                AddressOffset::new(Word::new(4))
            ))
        );

        let call = decoded(0x4BFF_FFFF).as_kind::<Branch>().unwrap();
        assert_eq!(call.condition(), Ok(Condition::MI));
        assert_eq!(call.link(), Ok(true));
        assert_eq!(call.offset().map(AddressOffset::signed), Ok(-4));
    }

    #[test]
    fn data_processing_with_rotated_immediate() {
        // movs r0, #0x3f0
        let view = decoded(0xE3B0_0E3F).as_kind::<DataProcessing>().unwrap();
        let (_, condition, op_code, set_condition_codes, destination, _, second) =
            view.fields().unwrap();
        assert_eq!(condition, Condition::AL);
        assert_eq!(op_code, DataProcessingOpCode::Mov);
        assert!(set_condition_codes);
        assert_eq!(destination, Register::R0);
        assert_eq!(
            second.as_variant::<RotatedImmediateOperand>().unwrap().value(),
            Ok(Word::new(0x3F0))
        );
    }

    #[test]
    fn data_processing_with_shifted_register() {
        // addne r3, r4, r5, lsl #2
        let view = decoded(0x1084_3105).as_kind::<DataProcessing>().unwrap();
        assert_eq!(
            view.fields(),
            Ok((
                Operation::DataProcessing,
                Condition::NE,
                DataProcessingOpCode::Add,
                false,
                Register::R3,
                Register::R4,
                ShiftOperand::immediate_shifted_register(
                    Register::R5,
                    ShiftType::LogicalLeft,
                    BitShiftAmount::new(2)
                )
                .unwrap()
            ))
        );
        assert!(
            view.second()
                .unwrap()
                .as_variant::<ImmediateShiftedRegisterOperand>()
                .is_some()
        );
    }

    #[test]
    fn tests_with_flags_stay_data_processing() {
        // cmp r1, r2, lsr r3
        let view = decoded(0xE151_0332).as_kind::<DataProcessing>().unwrap();
        assert_eq!(view.op_code(), Ok(DataProcessingOpCode::Cmp));
        assert_eq!(view.set_condition_codes(), Ok(true));
        assert_eq!(view.first(), Ok(Register::R1));
        assert!(
            view.second()
                .unwrap()
                .as_variant::<RegisterShiftedRegisterOperand>()
                .is_some()
        );
    }

    #[test]
    fn move_from_psr() {
        // mrs r0, cpsr
        let mrs = decoded(0xE10F_0000).as_kind::<MoveFromPsr>().unwrap();
        assert_eq!(
            mrs.fields(),
            Ok((Operation::MoveFromPsr, Condition::AL, Register::R0, Register::Cpsr))
        );

        // mrs r3, spsr
        let mrs = decoded(0xE14F_3000).as_kind::<MoveFromPsr>().unwrap();
        assert_eq!(mrs.destination(), Ok(Register::R3));
        assert_eq!(mrs.source(), Ok(Register::Spsr));
    }

    #[test]
    fn move_to_psr_flags() {
        // msr cpsr_flg, r1: teq op code, s clear, first register r8
        let msr = decoded(0xE128_F001).as_kind::<MoveToPsr>().unwrap();
        assert_eq!(msr.condition(), Ok(Condition::AL));
        assert_eq!(msr.destination(), Ok(Register::Cpsr));
        assert_eq!(msr.flags_only(), Ok(true));
        assert_eq!(
            msr.source(),
            Ok(ShiftOperand::immediate_shifted_register(
                Register::R1,
                ShiftType::LogicalLeft,
                BitShiftAmount::new(0)
            )
            .unwrap())
        );

        // the same word with the cmn op code targets the saved status register
        let msr = decoded(0xE168_F001).as_kind::<MoveToPsr>().unwrap();
        assert_eq!(msr.destination(), Ok(Register::Spsr));
        assert_eq!(msr.flags_only(), Ok(true));
    }

    #[test]
    fn move_to_psr_whole_register() {
        // msr spsr, r2: first register r9
        let msr = decoded(0xE169_F002).as_kind::<MoveToPsr>().unwrap();
        assert_eq!(msr.destination(), Ok(Register::Spsr));
        assert_eq!(msr.flags_only(), Ok(false));

        // msr cpsr_flg, #0xf0000000
        let msr = decoded(0xE328_F20F).as_kind::<MoveToPsr>().unwrap();
        assert_eq!(msr.flags_only(), Ok(true));
        assert_eq!(
            msr.source(),
            Ok(ShiftOperand::rotated_immediate(Byte::new(0x0F), BitShiftAmount::new(4)).unwrap())
        );
    }

    #[test]
    fn reserved_condition_is_rejected() {
        assert_eq!(
            decode_raw(0xFA00_0000),
            Err(DecodeError::InvalidField {
                field: "BranchFields::condition",
                bits: 0xF,
            })
        );
    }

    #[test]
    fn undecoded_formats() {
        for (word, format) in [
            (0xE109_1092, Format::SingleDataSwap),
            (0xE002_0193, Format::Multiply),
            (0xE191_00B2, Format::HalfwordDataTransferRegisterOffset),
            (0xE081_0392, Format::MultiplyLong),
            (0xE1D1_00B4, Format::HalfwordDataTransferImmediateOffset),
            (0xEE01_0A02, Format::CoprocessorDataOperation),
            (0xEE01_0A12, Format::CoprocessorRegisterTransfer),
            (0xE600_0010, Format::Undefined),
            (0xEF00_0000, Format::SoftwareInterrupt),
            (0xE92D_4000, Format::BlockDataTransfer),
            (0xED91_0100, Format::CoprocessorDataTransfer),
            (0xE591_0004, Format::SingleDataTransfer),
        ] {
            assert_eq!(
                decode_raw(word),
                Err(DecodeError::UnimplementedFormat {
                    format,
                    word: Word::new(word)
                })
            );
        }
    }

    #[test]
    fn decoded_operation_matches_the_view() {
        for word in [0xE12F_FF10, 0xEA00_0001, 0xE081_0002, 0xE10F_0000, 0xE128_F001] {
            let instruction = decoded(word);
            let operation = instruction.operation().unwrap();
            let matches = match operation {
                Operation::BranchAndExchange => instruction.as_kind::<BranchAndExchange>().is_some(),
                Operation::Branch => instruction.as_kind::<Branch>().is_some(),
                Operation::DataProcessing => instruction.as_kind::<DataProcessing>().is_some(),
                Operation::MoveFromPsr => instruction.as_kind::<MoveFromPsr>().is_some(),
                Operation::MoveToPsr => instruction.as_kind::<MoveToPsr>().is_some(),
                _ => false,
            };
            assert!(matches, "{word:#010x} decoded to {operation}");
        }
    }
}
