// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use anna_x86_types::{
    AbstractCommand, AbstractOperand, Command, Immediate, Operand, OperandKind, Register, Size,
    endian::from_little_endian_bytes,
};
use tracing::{debug, trace};

use crate::{
    error::{CodecError, DecodeError},
    instruction::{BASE_NONE, MODE_INDIRECT, MODE_REGISTER, ModRM, RM_DISPLACEMENT32, RM_SIB, Sib},
    table::Table,
};

/* *
 * Decodes the machine code of one instruction, e.g. `8B8133221100`.
 *
 * The machine code is hex digits, the multi-byte fields (displacement and
 * immediate) are little-endian, i.e. `33221100` is the value `00112233`.
 *
 * Every instruction form with the opcode (the first byte) is tried,
 * forms that can not consume exactly the rest of the code are dropped,
 * e.g. `88 C4` is both `MOV r8, r8` and `MOV m8, r8` (Mod=11 selects
 * a register in the r/m side), while `88 01` is only `MOV m8, r8`.
 *
 * The direction bit (bit 1 of the opcode) selects the operand of ModRM.reg:
 *
 * | Opcode     | d | ModRM.reg   | ModRM.r/m   |
 * | ---        | - | ---         | ---         |
 * | 88, 89     | 0 | source      | destination |
 * | 8A, 8B     | 1 | destination | source      |
 * | C6, C7     | 0 | (/0)        | destination |
 *
 * Forms with a memory destination always use ModRM.r/m for the destination.
 */
pub fn decode(table: &Table, code: &str) -> Result<Vec<Command>, CodecError> {
    let code: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let bytes = hex::decode(&code).map_err(|_| CodecError::InvalidCode(code.clone()))?;
    let Some(&opcode) = bytes.first() else {
        return Err(CodecError::InvalidCode(code));
    };

    let commands: Vec<Command> = table
        .by_opcode(opcode)
        .filter_map(|template| match decode_command(template, &bytes) {
            Ok(command) => {
                trace!("decoded {} as \"{}\"", code, command);
                Some(command)
            }
            Err(error) => {
                debug!(
                    "{} {}, {} does not match {}: {}",
                    template.name, template.dest, template.source, code, error
                );
                None
            }
        })
        .collect();

    if commands.is_empty() {
        Err(CodecError::NoCommands(code))
    } else {
        Ok(commands)
    }
}

/// Reads the machine code from left to right.
struct CodeReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> CodeReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self
            .bytes
            .get(self.position..self.position + count)
            .ok_or(DecodeError::UnexpectedEnd)?;
        self.position += count;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    /// Reads a little-endian field.
    fn read_field(&mut self, size: Size) -> Result<u32, DecodeError> {
        let bytes = self.take((size.bits() / 8) as usize)?;
        from_little_endian_bytes(bytes).ok_or(DecodeError::UnexpectedEnd)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }
}

fn decode_command(template: &AbstractCommand, bytes: &[u8]) -> Result<Command, DecodeError> {
    let mut reader = CodeReader::new(bytes);
    let mut command = Command::new(&template.name, reader.read_byte()?);

    let inverted = template.dest.is_memory() || command.opcode & 0b10 == 0;

    // e.g. `B8+ rd` and `40+ rd`
    let fixed_register = template.dest.register().filter(|_| {
        matches!(
            template.source.kind(),
            OperandKind::Constant | OperandKind::Undefined
        )
    });

    if let Some(register) = fixed_register {
        // the register is a part of the opcode
        command.dest = Some(Operand::from_register(register));
    } else {
        let modrm = ModRM::from_byte(reader.read_byte()?);
        command.modrm = Some(modrm.to_byte());

        let (reg_slot, rm_slot) = if inverted {
            (&template.source, &template.dest)
        } else {
            (&template.dest, &template.source)
        };

        let reg_operand = if reg_slot.is_register() {
            Some(register_operand(modrm.reg, reg_slot)?)
        } else {
            None
        };

        let rm_operand = if modrm.mode == MODE_REGISTER {
            if !(rm_slot.is_register() || rm_slot.is_memory()) {
                return Err(DecodeError::OperandMismatch {
                    mode: modrm.mode,
                    operand: *rm_slot,
                });
            }
            register_operand(modrm.rm, rm_slot)?
        } else {
            if !rm_slot.is_memory() {
                return Err(DecodeError::OperandMismatch {
                    mode: modrm.mode,
                    operand: *rm_slot,
                });
            }
            decode_memory(&mut reader, &mut command, modrm, rm_slot.size())?
        };

        if inverted {
            command.source = reg_operand;
            command.dest = Some(rm_operand);
        } else {
            command.dest = reg_operand;
            command.source = Some(rm_operand);
        }
    }

    if template.source.is_constant() {
        let size = template.source.size();
        let value = reader.read_field(size)?;
        command.immediate = Some(Immediate { value, size });
        command.source = Some(Operand::new(
            &format!("{:X}", value),
            OperandKind::Constant,
            size,
        ));
    }

    match reader.remaining() {
        0 => Ok(command),
        count => Err(DecodeError::TrailingBytes(count)),
    }
}

// The register of a `Reg8`/`Reg32`/`EAX`... slot, or of the register
// form of a `Memory8`/`Memory32` (r/m) slot when Mod=11.
fn register_operand(address: u8, slot: &AbstractOperand) -> Result<Operand, DecodeError> {
    let register = Register::from_address(address, slot.size()).ok_or(
        DecodeError::UnknownRegister {
            address,
            size: slot.size(),
        },
    )?;

    match slot.register() {
        Some(expected) if expected != register => Err(DecodeError::OperandMismatch {
            mode: MODE_REGISTER,
            operand: *slot,
        }),
        _ => Ok(Operand::from_register(register)),
    }
}

fn extended_register(address: u8) -> Result<Register, DecodeError> {
    Register::from_address(address, Size::Extended).ok_or(DecodeError::UnknownRegister {
        address,
        size: Size::Extended,
    })
}

/* *
 * Memory operand text
 *
 * | Mod | R/M | SIB.base | Text                          |
 * | --- | --- | ---      | ---                           |
 * | 00  | reg |          | [reg]                         |
 * | 00  | 101 |          | [disp]                        |
 * | 00  | 100 | base     | [index*n][base]               |
 * | 00  | 100 | 101      | [index*n][disp]               |
 * | 10  | reg |          | [reg][disp]                   |
 * | 10  | 100 | base     | [index*n][base][disp]         |
 *
 * - `*n` is omitted when the scale is 1.
 * - A zero displacement is omitted unless it is the only term.
 * - Mod=01 is read as Mod=10, i.e. the displacement is always 32-bit.
 */
fn decode_memory(
    reader: &mut CodeReader<'_>,
    command: &mut Command,
    modrm: ModRM,
    size: Size,
) -> Result<Operand, DecodeError> {
    let mut text = String::new();
    let mut has_displacement = modrm.mode != MODE_INDIRECT;

    if modrm.rm == RM_SIB {
        let sib = Sib::from_byte(reader.read_byte()?);
        command.sib = Some(sib.to_byte());

        let index = extended_register(sib.index)?;
        if index.is_stack_register() {
            return Err(DecodeError::IllegalIndex(index));
        }

        if sib.factor() > 1 {
            text.push_str(&format!("[{}*{}]", index, sib.factor()));
        } else {
            text.push_str(&format!("[{}]", index));
        }

        let base = extended_register(sib.base)?;
        if base == Register::ESP {
            return Err(DecodeError::UnsupportedBase(base));
        }

        if sib.base == BASE_NONE && modrm.mode == MODE_INDIRECT {
            has_displacement = true;
        } else {
            text.push_str(&format!("[{}]", base));
        }
    } else if modrm.rm == RM_DISPLACEMENT32 && modrm.mode == MODE_INDIRECT {
        has_displacement = true;
    } else {
        text.push_str(&format!("[{}]", extended_register(modrm.rm)?));
    }

    if has_displacement {
        let value = reader.read_field(Size::Extended)?;
        command.displacement = Some(value);

        if text.is_empty() || value != 0 {
            text.push_str(&format!("[{:08X}]", value));
        }
    }

    let text = match size {
        Size::Byte => format!("BYTE PTR {}", text),
        Size::Word => format!("WORD PTR {}", text),
        _ => text,
    };

    Ok(Operand::new(&text, OperandKind::Memory, size))
}
