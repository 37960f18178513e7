//! The second operand of data processing and PSR transfer instructions.
//!
//! A [`ShiftOperand`] is a 16-bit value whose two low bits say which of four
//! layouts the rest follows. The layouts are exposed as views sharing that
//! kind field, reachable through [`ShiftOperand::get`].

use serde::{Deserialize, Serialize};

use crate::DecodeError;
use crate::bitwise::{BitShiftAmount, Byte, Halfword, Word};
use crate::packed::{Packed, PackedField, packed_enum, packed_struct};
use crate::types::{Register, ShiftType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShiftOperandKind {
    Immediate = 0,
    RotatedImmediate = 1,
    ImmediateShiftedRegister = 2,
    RegisterShiftedRegister = 3,
}

impl ShiftOperandKind {
    #[must_use]
    pub const fn from_repr(repr: u8) -> Option<Self> {
        Some(match repr {
            0 => Self::Immediate,
            1 => Self::RotatedImmediate,
            2 => Self::ImmediateShiftedRegister,
            3 => Self::RegisterShiftedRegister,
            _ => return None,
        })
    }
}

packed_enum!(ShiftOperandKind);

/// A 12-bit immediate, as found in the plain immediate operand.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImmediateValue(Halfword);

impl ImmediateValue {
    #[must_use]
    pub const fn new(value: Halfword) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> Halfword {
        self.0
    }
}

impl PackedField for ImmediateValue {
    const BITS: usize = 16;

    fn to_bits(self) -> u64 {
        self.0.widen()
    }

    fn from_bits(bits: u64) -> Option<Self> {
        Some(Self(Halfword::truncate(bits)))
    }
}

packed_struct! {
    pub struct ImmediateOperand: Halfword {
        kind: ShiftOperandKind = [0, 2],
        value: ImmediateValue = [4, 12],
    }
}

packed_struct! {
    /// An 8-bit value rotated right by an even amount.
    pub struct RotatedImmediateOperand: Halfword {
        kind: ShiftOperandKind = [0, 2],
        source: Byte = [8, 8],
        amount: BitShiftAmount = [2, 5],
    }
}

packed_struct! {
    /// A register shifted by a constant amount.
    pub struct ImmediateShiftedRegisterOperand: Halfword {
        kind: ShiftOperandKind = [0, 2],
        source: Register = [2, 4],
        shift_type: ShiftType = [6, 3],
        amount: BitShiftAmount = [10, 6],
    }
}

packed_struct! {
    /// A register shifted by the bottom byte of another register.
    pub struct RegisterShiftedRegisterOperand: Halfword {
        kind: ShiftOperandKind = [0, 2],
        source: Register = [4, 4],
        shift_type: ShiftType = [8, 2],
        amount: Register = [12, 4],
    }
}

impl RotatedImmediateOperand {
    /// The 32-bit immediate the operand stands for.
    pub fn value(self) -> Result<Word, DecodeError> {
        let (_, source, amount) = self.fields()?;
        Ok(Word::new(u32::from(source.get())).rotate_right(amount))
    }
}

/// One of the layouts a [`ShiftOperand`] can take.
pub trait ShiftOperandVariant: Packed<Underlying = Halfword> {
    const KIND: ShiftOperandKind;
}

impl ShiftOperandVariant for ImmediateOperand {
    const KIND: ShiftOperandKind = ShiftOperandKind::Immediate;
}

impl ShiftOperandVariant for RotatedImmediateOperand {
    const KIND: ShiftOperandKind = ShiftOperandKind::RotatedImmediate;
}

impl ShiftOperandVariant for ImmediateShiftedRegisterOperand {
    const KIND: ShiftOperandKind = ShiftOperandKind::ImmediateShiftedRegister;
}

impl ShiftOperandVariant for RegisterShiftedRegisterOperand {
    const KIND: ShiftOperandKind = ShiftOperandKind::RegisterShiftedRegister;
}

/// Tagged second operand. The constructors always write a matching kind and
/// fail when a value doesn't fit the layout of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftOperand(Halfword);

impl ShiftOperand {
    #[must_use]
    pub const fn from_underlying(underlying: Halfword) -> Self {
        Self(underlying)
    }

    #[must_use]
    pub const fn to_underlying(self) -> Halfword {
        self.0
    }

    pub fn immediate(value: ImmediateValue) -> Result<Self, DecodeError> {
        ImmediateOperand::new(ShiftOperandKind::Immediate, value).map(Self::from_variant)
    }

    pub fn rotated_immediate(source: Byte, amount: BitShiftAmount) -> Result<Self, DecodeError> {
        RotatedImmediateOperand::new(ShiftOperandKind::RotatedImmediate, source, amount)
            .map(Self::from_variant)
    }

    pub fn immediate_shifted_register(
        source: Register,
        shift_type: ShiftType,
        amount: BitShiftAmount,
    ) -> Result<Self, DecodeError> {
        ImmediateShiftedRegisterOperand::new(
            ShiftOperandKind::ImmediateShiftedRegister,
            source,
            shift_type,
            amount,
        )
        .map(Self::from_variant)
    }

    /// Only the four shifts with a register amount exist, so
    /// [`ShiftType::RotateRightExtended`] is rejected.
    pub fn register_shifted_register(
        source: Register,
        shift_type: ShiftType,
        amount: Register,
    ) -> Result<Self, DecodeError> {
        RegisterShiftedRegisterOperand::new(
            ShiftOperandKind::RegisterShiftedRegister,
            source,
            shift_type,
            amount,
        )
        .map(Self::from_variant)
    }

    fn from_variant<V: ShiftOperandVariant>(variant: V) -> Self {
        Self(variant.to_underlying())
    }

    pub fn kind(self) -> Result<ShiftOperandKind, DecodeError> {
        ImmediateOperand::from_underlying(self.0).kind()
    }

    /// Reinterprets the operand as layout `V` without looking at the kind.
    #[must_use]
    pub fn get<V: ShiftOperandVariant>(self) -> V {
        V::from_underlying(self.0)
    }

    /// The operand as layout `V`, if that's the layout its kind names.
    #[must_use]
    pub fn as_variant<V: ShiftOperandVariant>(self) -> Option<V> {
        (self.kind().ok()? == V::KIND).then(|| self.get())
    }
}

impl PackedField for ShiftOperand {
    const BITS: usize = 16;

    fn to_bits(self) -> u64 {
        self.0.widen()
    }

    fn from_bits(bits: u64) -> Option<Self> {
        Some(Self(Halfword::truncate(bits)))
    }
}

packed_struct! {
    struct OperandFormFields: Word {
        is_immediate: bool = [25, 1],
    }
}

packed_struct! {
    struct RawRotatedImmediate: Halfword {
        value: Byte = [0, 8],
        half_rotation: Byte = [8, 4],
    }
}

packed_struct! {
    struct RawShiftedRegister: Halfword {
        source: Register = [0, 4],
        by_register: bool = [4, 1],
        shift_type: ShiftType = [5, 2],
    }
}

packed_struct! {
    struct RawRegisterShiftAmount: Halfword {
        amount: Register = [8, 4],
    }
}

packed_struct! {
    struct RawImmediateShiftAmount: Halfword {
        amount: BitShiftAmount = [7, 5],
    }
}

/// Decodes the operand-2 field (bits 0-11) of a data processing or PSR
/// transfer word, with bit 25 telling immediates from registers.
///
/// Immediates come out as [`RotatedImmediateOperand`] with the rotation doubled,
/// as the encoding counts it in steps of two. A register shifted by an
/// immediate zero is normalised: `lsr #0` and `asr #0` encode a shift by 32,
/// `ror #0` encodes `rrx`.
pub fn decode_data_processing_second_operand(word: Word) -> Result<ShiftOperand, DecodeError> {
    let operand = Halfword::truncate(word.widen());

    if OperandFormFields::from_underlying(word).is_immediate()? {
        let (value, half_rotation) = RawRotatedImmediate::from_underlying(operand).fields()?;
        let amount = BitShiftAmount::new((half_rotation << BitShiftAmount::new(1)).get());
        return ShiftOperand::rotated_immediate(value, amount);
    }

    let (source, by_register, shift_type) = RawShiftedRegister::from_underlying(operand).fields()?;
    if by_register {
        let amount = RawRegisterShiftAmount::from_underlying(operand).amount()?;
        return ShiftOperand::register_shifted_register(source, shift_type, amount);
    }

    let amount = RawImmediateShiftAmount::from_underlying(operand).amount()?;
    let (shift_type, amount) = match (shift_type, amount.get()) {
        (ShiftType::LogicalRight | ShiftType::ArithmeticRight, 0) => {
            (shift_type, BitShiftAmount::new(32))
        }
        (ShiftType::RotateRight, 0) => (ShiftType::RotateRightExtended, amount),
        _ => (shift_type, amount),
    };
    ShiftOperand::immediate_shifted_register(source, shift_type, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn constructors_tag_the_kind() {
        let immediate = ShiftOperand::immediate(ImmediateValue::new(Halfword::new(0xABC))).unwrap();
        assert_eq!(immediate.kind(), Ok(ShiftOperandKind::Immediate));
        assert_eq!(
            immediate.get::<ImmediateOperand>().value(),
            Ok(ImmediateValue::new(Halfword::new(0xABC)))
        );

        let rotated =
            ShiftOperand::rotated_immediate(Byte::new(0xD5), BitShiftAmount::new(30)).unwrap();
        assert_eq!(rotated.kind(), Ok(ShiftOperandKind::RotatedImmediate));
        assert_eq!(
            rotated.get::<RotatedImmediateOperand>().fields(),
            Ok((
                ShiftOperandKind::RotatedImmediate,
                Byte::new(0xD5),
                BitShiftAmount::new(30)
            ))
        );

        let shifted = ShiftOperand::immediate_shifted_register(
            Register::R7,
            ShiftType::RotateRightExtended,
            BitShiftAmount::new(63),
        )
        .unwrap();
        assert_eq!(
            shifted.get::<ImmediateShiftedRegisterOperand>().fields(),
            Ok((
                ShiftOperandKind::ImmediateShiftedRegister,
                Register::R7,
                ShiftType::RotateRightExtended,
                BitShiftAmount::new(63)
            ))
        );

        let by_register = ShiftOperand::register_shifted_register(
            Register::PC,
            ShiftType::ArithmeticRight,
            Register::R3,
        )
        .unwrap();
        assert_eq!(
            by_register.get::<RegisterShiftedRegisterOperand>().fields(),
            Ok((
                ShiftOperandKind::RegisterShiftedRegister,
                Register::PC,
                ShiftType::ArithmeticRight,
                Register::R3
            ))
        );
    }

    #[test]
    fn as_variant_checks_the_kind() {
        let rotated = ShiftOperand::rotated_immediate(Byte::new(1), BitShiftAmount::new(0)).unwrap();
        assert!(rotated.as_variant::<RotatedImmediateOperand>().is_some());
        assert_eq!(rotated.as_variant::<ImmediateOperand>(), None);
        assert_eq!(rotated.as_variant::<RegisterShiftedRegisterOperand>(), None);
    }

    #[test]
    fn rotated_immediate_doubles_the_rotation() {
        // mov r0, #0x3f0, encoded as 0x3f rotated right by 28
        let operand = decode_data_processing_second_operand(Word::new(0xE3A0_0E3F)).unwrap();
        assert_eq!(
            operand.as_variant::<RotatedImmediateOperand>().unwrap().fields(),
            Ok((
                ShiftOperandKind::RotatedImmediate,
                Byte::new(0x3F),
                BitShiftAmount::new(28)
            ))
        );
    }

    #[test]
    fn register_shifted_by_immediate() {
        // add r0, r1, r2, asr #17
        let operand = decode_data_processing_second_operand(Word::new(0xE081_08C2)).unwrap();
        assert_eq!(
            operand.as_variant::<ImmediateShiftedRegisterOperand>().unwrap().fields(),
            Ok((
                ShiftOperandKind::ImmediateShiftedRegister,
                Register::R2,
                ShiftType::ArithmeticRight,
                BitShiftAmount::new(17)
            ))
        );
    }

    #[test]
    fn register_shifted_by_register() {
        // add r0, r1, r2, ror r9
        let operand = decode_data_processing_second_operand(Word::new(0xE081_0972)).unwrap();
        assert_eq!(
            operand.as_variant::<RegisterShiftedRegisterOperand>().unwrap().fields(),
            Ok((
                ShiftOperandKind::RegisterShiftedRegister,
                Register::R2,
                ShiftType::RotateRight,
                Register::R9
            ))
        );
    }

    fn shifted_by_immediate(word: u32) -> (Register, ShiftType, BitShiftAmount) {
        let operand = decode_data_processing_second_operand(Word::new(word)).unwrap();
        let (_, source, shift_type, amount) = operand
            .as_variant::<ImmediateShiftedRegisterOperand>()
            .unwrap()
            .fields()
            .unwrap();
        (source, shift_type, amount)
    }

    #[test]
    fn zero_immediate_shifts_are_normalised() {
        // mov r0, r1, lsr #32
        assert_eq!(
            shifted_by_immediate(0xE1A0_0021),
            (Register::R1, ShiftType::LogicalRight, BitShiftAmount::new(32))
        );
        // mov r0, r1, asr #32
        assert_eq!(
            shifted_by_immediate(0xE1A0_0041),
            (Register::R1, ShiftType::ArithmeticRight, BitShiftAmount::new(32))
        );
        // mov r0, r1, rrx
        assert_eq!(
            shifted_by_immediate(0xE1A0_0061),
            (Register::R1, ShiftType::RotateRightExtended, BitShiftAmount::new(0))
        );
        // mov r0, r1
        assert_eq!(
            shifted_by_immediate(0xE1A0_0001),
            (Register::R1, ShiftType::LogicalLeft, BitShiftAmount::new(0))
        );
    }

    #[test]
    fn rotated_immediate_value() {
        let operand = RotatedImmediateOperand::new(
            ShiftOperandKind::RotatedImmediate,
            Byte::new(0x3F),
            BitShiftAmount::new(28),
        )
        .unwrap();
        assert_eq!(operand.value(), Ok(Word::new(0x3F0)));

        let operand = RotatedImmediateOperand::new(
            ShiftOperandKind::RotatedImmediate,
            Byte::new(0xFF),
            BitShiftAmount::new(0),
        )
        .unwrap();
        assert_eq!(operand.value(), Ok(Word::new(0xFF)));
    }

    #[test]
    fn out_of_range_shift_type_is_rejected() {
        let operand = ShiftOperand::from_underlying(Halfword::new(0b0000_0001_1100_0010));
        assert_eq!(operand.kind(), Ok(ShiftOperandKind::ImmediateShiftedRegister));
        assert_eq!(
            operand.get::<ImmediateShiftedRegisterOperand>().shift_type(),
            Err(DecodeError::InvalidField {
                field: "ImmediateShiftedRegisterOperand::shift_type",
                bits: 7,
            })
        );
    }

    fn every_register() -> impl Iterator<Item = Register> {
        (0..=17).filter_map(Register::from_repr)
    }

    fn every_shift_type() -> impl Iterator<Item = ShiftType> {
        (0..=4).filter_map(ShiftType::from_repr)
    }

    #[test]
    fn immediate_shifted_register_fields_round_trip() {
        for source in every_register() {
            for shift_type in every_shift_type() {
                let built = ShiftOperand::immediate_shifted_register(
                    source,
                    shift_type,
                    BitShiftAmount::new(32),
                );
                if source.is_psr() {
                    assert_eq!(
                        built,
                        Err(DecodeError::FieldOverflow {
                            field: "ImmediateShiftedRegisterOperand::source",
                            bits: u64::from(source as u8),
                        })
                    );
                    continue;
                }
                assert_eq!(
                    built.unwrap().get::<ImmediateShiftedRegisterOperand>().fields(),
                    Ok((
                        ShiftOperandKind::ImmediateShiftedRegister,
                        source,
                        shift_type,
                        BitShiftAmount::new(32)
                    ))
                );
            }
        }
    }

    #[test]
    fn register_shifted_register_fields_round_trip() {
        for source in every_register().filter(|register| !register.is_psr()) {
            for amount in every_register().filter(|register| !register.is_psr()) {
                for shift_type in every_shift_type() {
                    let built = ShiftOperand::register_shifted_register(source, shift_type, amount);
                    if shift_type == ShiftType::RotateRightExtended {
                        assert_eq!(
                            built,
                            Err(DecodeError::FieldOverflow {
                                field: "RegisterShiftedRegisterOperand::shift_type",
                                bits: 4,
                            })
                        );
                        continue;
                    }
                    assert_eq!(
                        built.unwrap().get::<RegisterShiftedRegisterOperand>().fields(),
                        Ok((
                            ShiftOperandKind::RegisterShiftedRegister,
                            source,
                            shift_type,
                            amount
                        ))
                    );
                }
            }
        }

        assert_eq!(
            ShiftOperand::register_shifted_register(Register::R1, ShiftType::LogicalLeft, Register::Spsr),
            Err(DecodeError::FieldOverflow {
                field: "RegisterShiftedRegisterOperand::amount",
                bits: 17,
            })
        );
    }

    #[test]
    fn immediates_too_wide_are_rejected() {
        assert_eq!(
            ShiftOperand::rotated_immediate(Byte::new(0xFF), BitShiftAmount::new(32)),
            Err(DecodeError::FieldOverflow {
                field: "RotatedImmediateOperand::amount",
                bits: 32,
            })
        );
        let widest = ShiftOperand::rotated_immediate(Byte::new(0xFF), BitShiftAmount::new(31)).unwrap();
        assert_eq!(
            widest.get::<RotatedImmediateOperand>().amount(),
            Ok(BitShiftAmount::new(31))
        );

        assert_eq!(
            ShiftOperand::immediate(ImmediateValue::new(Halfword::new(0x1000))),
            Err(DecodeError::FieldOverflow {
                field: "ImmediateOperand::value",
                bits: 0x1000,
            })
        );
        assert_eq!(
            ShiftOperand::immediate_shifted_register(
                Register::R0,
                ShiftType::LogicalLeft,
                BitShiftAmount::new(64)
            ),
            Err(DecodeError::FieldOverflow {
                field: "ImmediateShiftedRegisterOperand::amount",
                bits: 64,
            })
        );
    }
}
