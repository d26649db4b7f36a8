// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{OperandKind, Register, Size};

/// The operand slot of an instruction template.
///
/// `Reg8`, `Reg16` and `Reg32` are the generalized registers, they match
/// any register of the given size, while `Register(..)` matches only
/// the named register (e.g. the accumulator in `MOV EAX, imm32` short form).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum AbstractOperand {
    NoOperand,

    Constant8,
    Constant16,
    Constant32,

    Memory8,
    Memory16,
    Memory32,

    Reg8,
    Reg16,
    Reg32,

    Register(Register),
}

impl AbstractOperand {
    pub fn kind(&self) -> OperandKind {
        match self {
            AbstractOperand::NoOperand => OperandKind::Undefined,
            AbstractOperand::Constant8
            | AbstractOperand::Constant16
            | AbstractOperand::Constant32 => OperandKind::Constant,
            AbstractOperand::Memory8 | AbstractOperand::Memory16 | AbstractOperand::Memory32 => {
                OperandKind::Memory
            }
            AbstractOperand::Reg8
            | AbstractOperand::Reg16
            | AbstractOperand::Reg32
            | AbstractOperand::Register(_) => OperandKind::Register,
        }
    }

    pub fn size(&self) -> Size {
        match self {
            AbstractOperand::NoOperand => Size::Undefined,
            AbstractOperand::Constant8 | AbstractOperand::Memory8 | AbstractOperand::Reg8 => {
                Size::Byte
            }
            AbstractOperand::Constant16 | AbstractOperand::Memory16 | AbstractOperand::Reg16 => {
                Size::Word
            }
            AbstractOperand::Constant32 | AbstractOperand::Memory32 | AbstractOperand::Reg32 => {
                Size::Extended
            }
            AbstractOperand::Register(register) => register.size(),
        }
    }

    /// The named register, `None` for wildcards.
    pub fn register(&self) -> Option<Register> {
        match self {
            AbstractOperand::Register(register) => Some(*register),
            _ => None,
        }
    }

    pub fn is_register(&self) -> bool {
        self.kind() == OperandKind::Register
    }

    pub fn is_memory(&self) -> bool {
        self.kind() == OperandKind::Memory
    }

    pub fn is_constant(&self) -> bool {
        self.kind() == OperandKind::Constant
    }

    pub fn generalized_register(size: Size) -> Option<AbstractOperand> {
        match size {
            Size::Byte => Some(AbstractOperand::Reg8),
            Size::Word => Some(AbstractOperand::Reg16),
            Size::Extended => Some(AbstractOperand::Reg32),
            Size::Undefined => None,
        }
    }

    pub fn memory(size: Size) -> Option<AbstractOperand> {
        match size {
            Size::Byte => Some(AbstractOperand::Memory8),
            Size::Word => Some(AbstractOperand::Memory16),
            Size::Extended => Some(AbstractOperand::Memory32),
            Size::Undefined => None,
        }
    }

    pub fn constant(size: Size) -> Option<AbstractOperand> {
        match size {
            Size::Byte => Some(AbstractOperand::Constant8),
            Size::Word => Some(AbstractOperand::Constant16),
            Size::Extended => Some(AbstractOperand::Constant32),
            Size::Undefined => None,
        }
    }

    /// The coarse gate between a destination and a source before the
    /// templates are filtered: a constant never receives a value,
    /// any other destination accepts a missing source.
    pub fn fits(&self, source: &AbstractOperand) -> bool {
        match (self.kind(), source) {
            (OperandKind::Constant, _) => false,
            (_, AbstractOperand::NoOperand) => true,
            _ => self.size().fits(source.size()),
        }
    }

    /// Whether this (resolved) operand may fill the `template` slot.
    pub fn can_cast_to(&self, template: &AbstractOperand) -> bool {
        if self.kind() != template.kind() {
            return false;
        }

        match self.kind() {
            OperandKind::Register => {
                self.size() == template.size()
                    && (self == template
                        || AbstractOperand::generalized_register(template.size()).as_ref()
                            == Some(self)
                        || AbstractOperand::generalized_register(self.size()).as_ref()
                            == Some(template))
            }
            OperandKind::Memory | OperandKind::Constant => template.size().fits(self.size()),
            OperandKind::Undefined => {
                *self == AbstractOperand::NoOperand && *template == AbstractOperand::NoOperand
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("unknown operand template \"{0}\"")]
pub struct UnknownOperandError(pub String);

impl Display for AbstractOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AbstractOperand::NoOperand => "NoOperand",
            AbstractOperand::Constant8 => "Constant8",
            AbstractOperand::Constant16 => "Constant16",
            AbstractOperand::Constant32 => "Constant32",
            AbstractOperand::Memory8 => "Memory8",
            AbstractOperand::Memory16 => "Memory16",
            AbstractOperand::Memory32 => "Memory32",
            AbstractOperand::Reg8 => "Reg8",
            AbstractOperand::Reg16 => "Reg16",
            AbstractOperand::Reg32 => "Reg32",
            AbstractOperand::Register(register) => return write!(f, "{}", register),
        };
        f.write_str(name)
    }
}

impl FromStr for AbstractOperand {
    type Err = UnknownOperandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let operand = match s {
            "NoOperand" => AbstractOperand::NoOperand,
            "Constant8" => AbstractOperand::Constant8,
            "Constant16" => AbstractOperand::Constant16,
            "Constant32" => AbstractOperand::Constant32,
            "Memory8" => AbstractOperand::Memory8,
            "Memory16" => AbstractOperand::Memory16,
            "Memory32" => AbstractOperand::Memory32,
            "Reg8" => AbstractOperand::Reg8,
            "Reg16" => AbstractOperand::Reg16,
            "Reg32" => AbstractOperand::Reg32,
            _ => AbstractOperand::Register(
                s.parse::<Register>()
                    .map_err(|_| UnknownOperandError(s.to_owned()))?,
            ),
        };
        Ok(operand)
    }
}

// table files write the templates by name, e.g. `"dest": "Memory32"`
impl Serialize for AbstractOperand {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AbstractOperand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A resolved operand of a produced instruction,
/// e.g. `EAX`, `[EBX*4][11223344]` or `1F`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Operand {
    pub text: String,
    pub kind: OperandKind,
    pub size: Size,
}

impl Operand {
    pub fn new(text: &str, kind: OperandKind, size: Size) -> Self {
        Self {
            text: text.to_owned(),
            kind,
            size,
        }
    }

    pub fn from_register(register: Register) -> Self {
        Self {
            text: register.to_string(),
            kind: OperandKind::Register,
            size: register.size(),
        }
    }
}
