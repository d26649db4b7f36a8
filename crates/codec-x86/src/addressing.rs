// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use anna_x86_types::{Register, Size};

use crate::{
    classify::parse_constant,
    error::CodecError,
    instruction::{
        BASE_NONE, MODE_DISPLACEMENT32, MODE_INDIRECT, ModRM, RM_DISPLACEMENT32, RM_SIB, Sib,
        scale_bits,
    },
};

/* *
 * Effective address
 * -----------------
 *
 * EA = Base + (Index * Scale) + Displacement
 *
 * The address text is 1 to 3 blocks, each block is one of:
 *
 * - displacement: 1 to 8 hex digits, e.g. `[00112233]`
 * - register: a 32-bit register, e.g. `[ECX]`
 * - scaled register: `[ECX*4]` or `[4*ECX]`, the scale is 1, 2, 4 or 8
 *
 * Blocks can be written in any order, e.g. `[00112233][ECX]` is the
 * same address as `[ECX][00112233]`.
 *
 * | Blocks                | Mod | R/M | SIB (scale, index, base) | disp32    |
 * | ---                   | --- | --- | ---                      | ---       |
 * | [disp]                | 00  | 101 | -                        | disp      |
 * | [reg]                 | 00  | reg | -                        | -         |
 * | [idx*n]               | 00  | 100 | n, idx, 101              | 00000000  |
 * | [reg][disp]           | 10  | reg | -                        | disp      |
 * | [idx][base]           | 00  | 100 | 1, idx, base             | -         |
 * | [idx*n][base]         | 00  | 100 | n, idx, base             | -         |
 * | [idx*n][disp]         | 00  | 100 | n, idx, 101              | disp      |
 * | [idx*n][base][disp]   | 10  | 100 | n, idx, base             | disp      |
 *
 * Register restrictions:
 *
 * - ESP and EBP are never an index.
 * - ESP and EBP can not be the `reg` of `[reg]` and `[reg][disp]`,
 *   R/M=100 is the SIB escape and R/M=101 (Mod=00) is the disp32 escape.
 * - ESP is never a base, EBP is a base only in the Mod=10 form.
 *
 * `[idx][base]` is symmetric, so both registers are tried as the index,
 * e.g. `[ECX][EBX]` yields SIB 0b (index ECX) and SIB 19 (index EBX).
 */

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Block {
    Displacement(u32),
    Register(Register),
    Scaled { index: Register, scale: u8 },
}

/// An encoded effective address, i.e. the ModRM fields except `reg`,
/// the optional SIB byte and the optional disp32.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Address {
    pub mode: u8,
    pub rm: u8,
    pub sib: Option<Sib>,
    pub displacement: Option<u32>,
}

impl Address {
    pub fn modrm(&self, reg: u8) -> ModRM {
        ModRM::new(self.mode, reg, self.rm)
    }
}

/// Encodes the address text, e.g. `"[EBX*4][EDX][11223344]"`.
///
/// The text must be upper-case, without the size keyword.
/// Returns every valid encoding (two for `[reg][reg]`, one otherwise).
pub fn encode_address(text: &str) -> Result<Vec<Address>, CodecError> {
    parse_blocks(text)
        .and_then(|blocks| encode_blocks(&blocks))
        .map_err(|reason| CodecError::InvalidAddress {
            address: text.to_owned(),
            reason,
        })
}

fn encode_blocks(blocks: &[Block]) -> Result<Vec<Address>, &'static str> {
    match *blocks {
        [block] => Ok(vec![encode_single(block)?]),
        [first, second] => {
            let mut addresses = vec![];
            for (a, b) in [(first, second), (second, first)] {
                if let Some(address) = encode_pair(a, b)? {
                    if !addresses.contains(&address) {
                        addresses.push(address);
                    }
                }
            }

            if addresses.is_empty() {
                Err("ambiguous blocks")
            } else {
                Ok(addresses)
            }
        }
        [first, second, third] => Ok(vec![encode_triple([first, second, third])?]),
        _ => Err("expected 1 to 3 blocks"),
    }
}

pub fn parse_blocks(text: &str) -> Result<Vec<Block>, &'static str> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or("expected brackets")?;

    inner.split("][").map(parse_block).collect()
}

fn parse_block(text: &str) -> Result<Block, &'static str> {
    if let Some((left, right)) = text.split_once('*') {
        // "REG*n" or "n*REG"
        let (register, factor) = match left.parse::<Register>() {
            Ok(register) => (register, right),
            Err(_) => (right.parse::<Register>().map_err(|_| "unknown register")?, left),
        };

        let scale = factor
            .parse::<u8>()
            .ok()
            .and_then(scale_bits)
            .ok_or("the scale must be 1, 2, 4 or 8")?;

        return Ok(Block::Scaled {
            index: extended_register(register)?,
            scale,
        });
    }

    if let Ok(register) = text.parse::<Register>() {
        return Ok(Block::Register(extended_register(register)?));
    }

    parse_constant(text)
        .map(Block::Displacement)
        .ok_or("unknown block")
}

fn extended_register(register: Register) -> Result<Register, &'static str> {
    if register.size() == Size::Extended {
        Ok(register)
    } else {
        Err("only 32-bit registers can be used in addresses")
    }
}

fn check_index(index: Register) -> Result<u8, &'static str> {
    if index.is_stack_register() {
        Err("ESP and EBP can not be an index")
    } else {
        Ok(index.address())
    }
}

fn encode_single(block: Block) -> Result<Address, &'static str> {
    let address = match block {
        Block::Displacement(value) => Address {
            mode: MODE_INDIRECT,
            rm: RM_DISPLACEMENT32,
            sib: None,
            displacement: Some(value),
        },
        Block::Register(register) => {
            if register.is_stack_register() {
                return Err("ESP and EBP can not be addressed without an index");
            }
            Address {
                mode: MODE_INDIRECT,
                rm: register.address(),
                sib: None,
                displacement: None,
            }
        }
        // SIB.base=101 with Mod=00 requires a disp32
        Block::Scaled { index, scale } => Address {
            mode: MODE_INDIRECT,
            rm: RM_SIB,
            sib: Some(Sib::new(scale, check_index(index)?, BASE_NONE)),
            displacement: Some(0),
        },
    };

    Ok(address)
}

// `Ok(None)` if the blocks in this order are not a known form.
fn encode_pair(first: Block, second: Block) -> Result<Option<Address>, &'static str> {
    let address = match (first, second) {
        (Block::Register(register), Block::Displacement(value)) => {
            if register.is_stack_register() {
                return Err("ESP and EBP can not be addressed without an index");
            }
            Address {
                mode: MODE_DISPLACEMENT32,
                rm: register.address(),
                sib: None,
                displacement: Some(value),
            }
        }
        (Block::Register(index), Block::Register(base)) => Address {
            mode: MODE_INDIRECT,
            rm: RM_SIB,
            sib: Some(Sib::new(0b00, check_index(index)?, indirect_base(base)?)),
            displacement: None,
        },
        (Block::Scaled { index, scale }, Block::Register(base)) => Address {
            mode: MODE_INDIRECT,
            rm: RM_SIB,
            sib: Some(Sib::new(scale, check_index(index)?, indirect_base(base)?)),
            displacement: None,
        },
        (Block::Scaled { index, scale }, Block::Displacement(value)) => Address {
            mode: MODE_INDIRECT,
            rm: RM_SIB,
            sib: Some(Sib::new(scale, check_index(index)?, BASE_NONE)),
            displacement: Some(value),
        },
        _ => return Ok(None),
    };

    Ok(Some(address))
}

// the base of the Mod=00 SIB forms
fn indirect_base(base: Register) -> Result<u8, &'static str> {
    if base.is_stack_register() {
        Err("ESP and EBP can not be a base without a displacement")
    } else {
        Ok(base.address())
    }
}

fn encode_triple(blocks: [Block; 3]) -> Result<Address, &'static str> {
    let mut displacements = vec![];
    let mut scaled = vec![];
    let mut registers = vec![];

    for block in blocks {
        match block {
            Block::Displacement(value) => displacements.push(value),
            Block::Scaled { index, scale } => scaled.push((index, scale)),
            Block::Register(register) => registers.push(register),
        }
    }

    let ([value], [(index, scale)], [base]) =
        (displacements.as_slice(), scaled.as_slice(), registers.as_slice())
    else {
        return Err("ambiguous blocks");
    };

    if *base == Register::ESP {
        return Err("ESP can not be a base");
    }

    Ok(Address {
        mode: MODE_DISPLACEMENT32,
        rm: RM_SIB,
        sib: Some(Sib::new(*scale, check_index(*index)?, base.address())),
        displacement: Some(*value),
    })
}
