// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Multi-byte fields (displacement and immediate) are stored in little-endian
// order, so in the hex text the 2-digit byte groups are reversed while the
// digits within a group are not, e.g.
//
// 0x00112233 (32-bit) <-> 33 22 11 00 <-> "33221100"
// 0x0012     (16-bit) <-> 12 00       <-> "1200"

use crate::Size;

/// The low `size.bits()` bits of `value` in little-endian byte order.
pub fn to_little_endian_bytes(value: u32, size: Size) -> Vec<u8> {
    let count = (size.bits() / 8) as usize;
    value.to_le_bytes()[..count].to_vec()
}

/// Reads 1 to 4 little-endian bytes.
pub fn from_little_endian_bytes(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 4 {
        return None;
    }

    let mut buffer = [0u8; 4];
    buffer[..bytes.len()].copy_from_slice(bytes);
    Some(u32::from_le_bytes(buffer))
}
