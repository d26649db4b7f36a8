// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::Size;

/* *
 * General-purpose registers of the IA-32 architecture.
 *
 * Registers in the same row share one 3-bit address, i.e. they are the
 * byte, word and doubleword views of the same hardware register
 * (except AH/CH/DH/BH, which reuse addresses 100-111 in byte instructions).
 *
 * | Address | Byte | Word | Extended |
 * | ---     | ---  | ---  | ---      |
 * | 000     | AL   | AX   | EAX      |
 * | 001     | CL   | CX   | ECX      |
 * | 010     | DL   | DX   | EDX      |
 * | 011     | BL   | BX   | EBX      |
 * | 100     | AH   | SP   | ESP      |
 * | 101     | CH   | BP   | EBP      |
 * | 110     | DH   | SI   | ESI      |
 * | 111     | BH   | DI   | EDI      |
 *
 * Not supported:
 *
 * - Segment registers (CS, DS, ES, SS, FS, GS)
 * - x87, MMX and SSE registers
 * - Control, debug and test registers
 *
 * See:
 * - Volume 1, Section 3.4.1 General-Purpose Registers
 * - Volume 2, Table 2-1. 16-Bit Addressing Forms with the ModR/M Byte
 *
 * From:
 * - Intel® 64 and IA-32 Architectures Software Developer Manuals
 *   https://www.intel.com/content/www/us/en/developer/articles/technical/intel-sdm.html
 */
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumString, EnumIter, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum Register {
    AL, AX, EAX, /* ModRM.reg/rm = 000 */
    CL, CX, ECX, /* ModRM.reg/rm = 001 */
    DL, DX, EDX, /* ModRM.reg/rm = 010 */
    BL, BX, EBX, /* ModRM.reg/rm = 011 */
    AH, SP, ESP, /* ModRM.reg/rm = 100, stack pointer, also the SIB escape in ModRM.rm */
    CH, BP, EBP, /* ModRM.reg/rm = 101, frame pointer, also the disp32 escape when Mod=00 */
    DH, SI, ESI, /* ModRM.reg/rm = 110 */
    BH, DI, EDI, /* ModRM.reg/rm = 111 */
}

impl Register {
    pub fn size(&self) -> Size {
        use Register::*;
        match self {
            AL | CL | DL | BL | AH | CH | DH | BH => Size::Byte,
            AX | CX | DX | BX | SP | BP | SI | DI => Size::Word,
            EAX | ECX | EDX | EBX | ESP | EBP | ESI | EDI => Size::Extended,
        }
    }

    /// The 3-bit value that selects this register in the ModRM and SIB fields.
    pub fn address(&self) -> u8 {
        use Register::*;
        match self {
            AL | AX | EAX => 0b000,
            CL | CX | ECX => 0b001,
            DL | DX | EDX => 0b010,
            BL | BX | EBX => 0b011,
            AH | SP | ESP => 0b100,
            CH | BP | EBP => 0b101,
            DH | SI | ESI => 0b110,
            BH | DI | EDI => 0b111,
        }
    }

    pub fn from_address(address: u8, size: Size) -> Option<Register> {
        Register::iter().find(|register| register.address() == address && register.size() == size)
    }

    /// ESP and EBP, whose addresses double as the SIB and disp32 escapes.
    pub fn is_stack_register(&self) -> bool {
        matches!(self, Register::ESP | Register::EBP)
    }
}
