// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

/* *
 * The limitations of this codec:
 * - Only support the x86 32-bit (protected mode) instruction format
 * - Only support the instruction forms of the table, i.e. MOV and INC by default
 * - Only support a subset of addressing modes:
 *   - displacement only
 *   - base (optional) + index*scale (optional) + displacement (optional)
 * - Displacement is always 32-bit, i.e. the disp8 forms are not generated
 * - Effective address only accepts 32-bit registers,
 *   e.g. "mov eax, [bx]" is invalid.
 * - Legacy prefixes (operand size, segment override) are not generated
 */

pub mod addressing;
pub mod classify;
pub mod decode;
pub mod encode;
pub mod error;
pub mod instruction;
pub mod table;

pub use classify::classify;
pub use decode::decode;
pub use encode::encode;
pub use error::{CodecError, DecodeError};
pub use instruction::{ModRM, Sib};
pub use table::Table;
