// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

/* *
 * Value types shared by the x86 (32-bit, protected mode) encoder and decoder.
 *
 * - `Size` and `OperandKind` categorize operands.
 * - `Register` names the 24 general-purpose registers.
 * - `AbstractOperand` and `AbstractCommand` describe the instruction templates.
 * - `Operand` and `Command` hold fully resolved instructions.
 */

pub mod command;
pub mod endian;
pub mod operand;
pub mod register;

use serde::Serialize;

pub use command::{AbstractCommand, Command, Immediate};
pub use operand::{AbstractOperand, Operand, UnknownOperandError};
pub use register::Register;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum Size {
    Byte,     // 8-bit
    Word,     // 16-bit
    Extended, // 32-bit
    Undefined,
}

impl Size {
    pub fn bits(&self) -> u32 {
        match self {
            Size::Byte => 8,
            Size::Word => 16,
            Size::Extended => 32,
            Size::Undefined => 0,
        }
    }

    /// Whether a value of size `other` can be held by an operand of this size.
    pub fn fits(&self, other: Size) -> bool {
        match self {
            Size::Byte => other == Size::Byte,
            Size::Word => matches!(other, Size::Byte | Size::Word),
            Size::Extended => other != Size::Undefined,
            Size::Undefined => false,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum OperandKind {
    Register,
    Memory,
    Constant,
    Undefined,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::Size;

    #[test]
    fn test_size_fits() {
        assert!(Size::Byte.fits(Size::Byte));
        assert!(!Size::Byte.fits(Size::Word));
        assert!(!Size::Byte.fits(Size::Extended));

        assert!(Size::Word.fits(Size::Byte));
        assert!(Size::Word.fits(Size::Word));
        assert!(!Size::Word.fits(Size::Extended));

        assert!(Size::Extended.fits(Size::Byte));
        assert!(Size::Extended.fits(Size::Word));
        assert!(Size::Extended.fits(Size::Extended));
        assert!(!Size::Extended.fits(Size::Undefined));

        assert!(!Size::Undefined.fits(Size::Undefined));
        assert!(!Size::Undefined.fits(Size::Byte));
    }

    #[test]
    fn test_size_bits() {
        assert_eq!(Size::Byte.bits(), 8);
        assert_eq!(Size::Word.bits(), 16);
        assert_eq!(Size::Extended.bits(), 32);
        assert_eq!(Size::Undefined.bits(), 0);
    }
}
