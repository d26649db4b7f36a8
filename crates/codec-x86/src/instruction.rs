// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// ModRM.mod field
//
// | Effective Address  | Mod | R/M |
// | ------------------ | --- | --- |
// | [EAX]              | 00  | 000 |
// | [ECX]              |     | 001 |
// | [EDX]              |     | 010 |
// | [EBX]              |     | 011 |
// | [--][--]           |     | 100 |
// | disp32             |     | 101 |
// | [ESI]              |     | 110 |
// | [EDI]              |     | 111 |
// | ------------------ | --- | --- |
// | [EAX]+disp8        | 01  | 000 |
// | ...                |     |     |
// | ------------------ | --- | --- |
// | [EAX]+disp32       | 10  | 000 |
// | [ECX]+disp32       |     | 001 |
// | [EDX]+disp32       |     | 010 |
// | [EBX]+disp32       |     | 011 |
// | [--][--]+disp32    |     | 100 |
// | [EBP]+disp32       |     | 101 |
// | [ESI]+disp32       |     | 110 |
// | [EDI]+disp32       |     | 111 |
// | ------------------ | --- | --- |
// | EAX/AX/AL          | 11  | 000 |
// | ECX/CX/CL          |     | 001 |
// | EDX/DX/DL          |     | 010 |
// | EBX/BX/BL          |     | 011 |
// | ESP/SP/AH          |     | 100 |
// | EBP/BP/CH          |     | 101 |
// | ESI/SI/DH          |     | 110 |
// | EDI/DI/BH          |     | 111 |
//
// Note:
// - The disp8 forms (Mod=01) are not generated, and are read as disp32 when decoding.
// - When Mod=00 and R/M=101, the addressing mode is disp32 (no base register).
// - When Mod=11, the addressing mode is register to register (no memory).
// - R/M=100 indicates that a SIB byte follows the ModRM byte.
//
// References:
// - Volume 2, Section 2.1.5 Addressing-Mode Encoding of ModR/M and SIB Bytes
//   Table 2-2. 32-Bit Addressing Forms with the ModR/M Byte
//   Table 2-3. 32-Bit Addressing Forms with the SIB Byte

pub const MODE_INDIRECT: u8 = 0b00;
pub const MODE_DISPLACEMENT32: u8 = 0b10;
pub const MODE_REGISTER: u8 = 0b11;

/// ModRM.rm value that escapes to a SIB byte.
pub const RM_SIB: u8 = 0b100;

/// ModRM.rm value of the disp32-only form (Mod=00).
pub const RM_DISPLACEMENT32: u8 = 0b101;

/// SIB.base value meaning "no base register, disp32 follows" (Mod=00).
pub const BASE_NONE: u8 = 0b101;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ModRM {
    pub mode: u8, // 2 bits
    pub reg: u8,  // 3 bits
    pub rm: u8,   // 3 bits
}

impl ModRM {
    pub fn new(mode: u8, reg: u8, rm: u8) -> Self {
        Self { mode, reg, rm }
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            mode: byte >> 6,
            reg: (byte >> 3) & 0b111,
            rm: byte & 0b111,
        }
    }

    pub fn to_byte(&self) -> u8 {
        ((self.mode & 0b11) << 6) | ((self.reg & 0b111) << 3) | (self.rm & 0b111)
    }
}

/* *
 * SIB byte
 *
 * `( Scale 2-bit | Index 3-bit | Base 3-bit )`
 *
 * Scale:
 * 00 = *1
 * 01 = *2
 * 10 = *4
 * 11 = *8
 *
 * Index:
 * 000 = EAX
 * 001 = ECX
 * 010 = EDX
 * 011 = EBX
 * 100 = none (ESP can not be an index)
 * 101 = EBP
 * 110 = ESI
 * 111 = EDI
 *
 * Base:
 * 000 = EAX
 * 001 = ECX
 * 010 = EDX
 * 011 = EBX
 * 100 = ESP
 * 101 = EBP/disp32 (disp32 if Mod=00, EBP if Mod!=00)
 * 110 = ESI
 * 111 = EDI
 */
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Sib {
    pub scale: u8, // 2 bits
    pub index: u8, // 3 bits
    pub base: u8,  // 3 bits
}

impl Sib {
    pub fn new(scale: u8, index: u8, base: u8) -> Self {
        Self { scale, index, base }
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            scale: byte >> 6,
            index: (byte >> 3) & 0b111,
            base: byte & 0b111,
        }
    }

    pub fn to_byte(&self) -> u8 {
        ((self.scale & 0b11) << 6) | ((self.index & 0b111) << 3) | (self.base & 0b111)
    }

    /// The multiplier of the index register, i.e. 1, 2, 4 or 8.
    pub fn factor(&self) -> u8 {
        1 << (self.scale & 0b11)
    }
}

/// Converts the multiplier 1/2/4/8 into the 2-bit SIB.scale field.
pub fn scale_bits(factor: u8) -> Option<u8> {
    match factor {
        1 => Some(0b00),
        2 => Some(0b01),
        4 => Some(0b10),
        8 => Some(0b11),
        _ => None,
    }
}
