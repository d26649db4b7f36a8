// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{AbstractOperand, Operand, Size, endian::to_little_endian_bytes};

/// Definition of an instruction form, i.e. one entry of the instruction table.
///
/// Instruction list:
/// - http://ref.x86asm.net/coder32.html
/// - https://www.felixcloutier.com/x86/
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AbstractCommand {
    pub name: String,
    pub opcode: u8,
    pub source: AbstractOperand,
    pub dest: AbstractOperand,
}

impl AbstractCommand {
    pub fn new(name: &str, opcode: u8, dest: AbstractOperand, source: AbstractOperand) -> Self {
        Self {
            name: name.to_owned(),
            opcode,
            source,
            dest,
        }
    }
}

/// 8/16/32-bit immediate, the width is the size of the source operand.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct Immediate {
    pub value: u32,
    pub size: Size,
}

/* *
 * A fully resolved instruction.
 *
 * Instruction Format (subset):
 * - legacy prefix: 0,1 byte
 * - Opcode: 1 byte
 * - ModRM: 0,1 byte (Mod: 2-bit, Reg: 3-bit, R/M: 3-bit)
 * - SIB: 0,1 byte (Scale: 2-bit, Index: 3-bit, Base: 3-bit)
 * - Displacement: 0,4 bytes
 * - Immediate: 0,1,2,4 bytes
 *
 * References:
 * - Intel Software Developer's Manual
 *   Volume 2, Chapter 2.1 INSTRUCTION FORMAT FOR PROTECTED MODE, REAL-ADDRESS MODE, AND VIRTUAL-8086 MODE
 */
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Command {
    pub prefix: Option<u8>,
    pub opcode: u8,
    pub modrm: Option<u8>,
    pub sib: Option<u8>,
    pub displacement: Option<u32>,
    pub immediate: Option<Immediate>,
    pub name: String,
    pub source: Option<Operand>,
    pub dest: Option<Operand>,
}

impl Command {
    pub fn new(name: &str, opcode: u8) -> Self {
        Self {
            prefix: None,
            opcode,
            modrm: None,
            sib: None,
            displacement: None,
            immediate: None,
            name: name.to_owned(),
            source: None,
            dest: None,
        }
    }

    /// The machine code: prefix, opcode, ModRM, SIB, disp32 and immediate.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = [self.prefix, Some(self.opcode), self.modrm, self.sib]
            .into_iter()
            .flatten()
            .collect();

        if let Some(displacement) = self.displacement {
            bytes.extend(to_little_endian_bytes(displacement, Size::Extended));
        }

        if let Some(immediate) = self.immediate {
            bytes.extend(to_little_endian_bytes(immediate.value, immediate.size));
        }

        bytes
    }

    /// The machine code as upper-case hex digits, e.g. `8B0533221100`.
    pub fn to_hex_string(&self) -> String {
        hex::encode_upper(self.to_bytes())
    }
}

// the assembly text, e.g. `MOV EAX, [00112233]`
impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(dest) = &self.dest {
            write!(f, " {}", dest.text)?;
        }
        if let Some(source) = &self.source {
            write!(f, ", {}", source.text)?;
        }
        Ok(())
    }
}
