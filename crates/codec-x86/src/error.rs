// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use anna_x86_types::{AbstractOperand, Register, Size};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The operand text matches none of the register, memory and constant forms.
    #[error("invalid operand \"{0}\"")]
    InvalidOperand(String),

    /// No instruction form accepts the operands.
    #[error("instruction not found: {0}")]
    InstructionNotFound(String),

    #[error("invalid memory address \"{address}\": {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// The machine code is empty, has an odd number of digits or is not hexadecimal.
    #[error("invalid machine code \"{0}\"")]
    InvalidCode(String),

    /// Every instruction form with the opcode failed to decode the machine code.
    #[error("no commands match the machine code \"{0}\"")]
    NoCommands(String),

    #[error("failed to load the instruction table: {0}")]
    Table(#[from] serde_json::Error),
}

/// Why a single instruction form can not decode the machine code.
///
/// Instruction forms share opcodes, so this error only removes
/// the form from the candidates.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum DecodeError {
    #[error("unexpected end of the machine code")]
    UnexpectedEnd,

    #[error("{0} bytes left over")]
    TrailingBytes(usize),

    #[error("ModRM.mod {mode:#04b} does not address the operand {operand}")]
    OperandMismatch { mode: u8, operand: AbstractOperand },

    #[error("register {0} can not be an index")]
    IllegalIndex(Register),

    #[error("register {0} can not be a base")]
    UnsupportedBase(Register),

    #[error("no {size:?} register at address {address:#05b}")]
    UnknownRegister { address: u8, size: Size },
}
