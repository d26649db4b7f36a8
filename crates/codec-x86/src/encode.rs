// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use anna_x86_types::{AbstractCommand, AbstractOperand, Command, Immediate, Operand, OperandKind};
use tracing::{debug, trace};

use crate::{
    addressing::{Address, encode_address},
    classify::{classify, parse_constant, split_size_keyword},
    error::CodecError,
    instruction::{MODE_REGISTER, ModRM},
    table::Table,
};

/* *
 * Encodes one line of assembly, e.g. `MOV EAX, [EBX*4][00112233]`.
 *
 * Line format:
 *
 * `MNEMONIC DEST[, SOURCE]`
 *
 * Steps:
 *
 * 1. classify the destination and the source (`NoOperand` if absent),
 * 2. check that the destination can hold the source,
 * 3. select the instruction forms with the mnemonic whose operands
 *    the classified operands can be cast to,
 * 4. build a command for each selected form (and each encoding of
 *    the memory address, see `addressing`).
 *
 * | Destination     | Source   | Opcode | ModRM            | Other           |
 * | ---             | ---      | ---    | ---              | ---             |
 * | reg             | reg      | op     | 11, dest, source | -               |
 * | reg (fixed)     | imm      | op+r   | -                | imm             |
 * | reg (fixed)     | -        | op+r   | -                | -               |
 * | reg (any)       | imm / -  | op     | 11, 0, dest      | imm             |
 * | reg             | mem      | op     | mod, dest, rm    | SIB, disp32     |
 * | mem             | reg      | op     | mod, source, rm  | SIB, disp32     |
 * | mem             | imm / -  | op     | mod, 0, rm       | SIB, disp32, imm|
 *
 * "fixed" is a form whose destination is a concrete register
 * (e.g. `B8+ rd`), "any" is a form with `Reg8`/`Reg16`/`Reg32`.
 *
 * Multiple commands may be returned, e.g. `MOV AL, AH` is both
 * `88 C4` and `8A C4`, the caller can pick any of them.
 */
pub fn encode(table: &Table, line: &str) -> Result<Vec<Command>, CodecError> {
    let line = line.trim().to_ascii_uppercase();

    let (name, arguments) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line.as_str(), ""));
    let (dest_text, source_text) = arguments.split_once(',').unwrap_or((arguments, ""));
    let (dest_text, source_text) = (dest_text.trim(), source_text.trim());

    let not_found = || CodecError::InstructionNotFound(line.clone());

    let dest = match classify(dest_text) {
        Ok(Some(operand)) => Argument::new(operand, dest_text),
        _ => return Err(not_found()),
    };

    let source = if source_text.is_empty() {
        Argument::new(AbstractOperand::NoOperand, source_text)
    } else {
        match classify(source_text)? {
            Some(operand) => Argument::new(operand, source_text),
            None => return Err(CodecError::InvalidOperand(source_text.to_owned())),
        }
    };

    if !dest.operand.fits(&source.operand) {
        debug!(
            "destination {} can not hold source {} in \"{}\"",
            dest.operand, source.operand, line
        );
        return Err(not_found());
    }

    let mut commands = vec![];

    for template in table.by_name(name) {
        if !(source.operand.can_cast_to(&template.source)
            && dest.operand.can_cast_to(&template.dest))
        {
            continue;
        }

        for command in build_commands(template, &dest, &source)? {
            trace!("encoded \"{}\" as {}", command, command.to_hex_string());
            commands.push(command);
        }
    }

    if commands.is_empty() {
        debug!("no instruction form of {} accepts \"{}\"", name, line);
        Err(not_found())
    } else {
        Ok(commands)
    }
}

// A classified operand and its normalized text.
struct Argument<'a> {
    operand: AbstractOperand,
    text: &'a str,
}

impl<'a> Argument<'a> {
    fn new(operand: AbstractOperand, text: &'a str) -> Self {
        Self { operand, text }
    }

    // Registers take the canonical name, the others take the text and
    // the size of the form's operand.
    fn to_operand(&self, slot: &AbstractOperand) -> Operand {
        match self.operand.register() {
            Some(register) => Operand::from_register(register),
            None if self.operand.is_memory() => {
                Operand::new(&memory_text(self.text), slot.kind(), slot.size())
            }
            None => Operand::new(self.text, slot.kind(), slot.size()),
        }
    }

    fn address(&self) -> u8 {
        self.operand
            .register()
            .map(|register| register.address())
            .unwrap_or(0)
    }

    fn immediate(&self, slot: &AbstractOperand) -> Result<Immediate, CodecError> {
        let value = parse_constant(self.text)
            .ok_or_else(|| CodecError::InvalidOperand(self.text.to_owned()))?;

        Ok(Immediate {
            value,
            size: slot.size(),
        })
    }

    fn addresses(&self) -> Result<Vec<Address>, CodecError> {
        let (_, address) = split_size_keyword(self.text);
        encode_address(address)
    }
}

fn build_commands(
    template: &AbstractCommand,
    dest: &Argument,
    source: &Argument,
) -> Result<Vec<Command>, CodecError> {
    let mut command = Command::new(&template.name, template.opcode);

    if template.dest.kind() != OperandKind::Undefined {
        command.dest = Some(dest.to_operand(&template.dest));
    }

    if template.source.kind() != OperandKind::Undefined {
        command.source = Some(source.to_operand(&template.source));
    }

    if template.source.is_constant() {
        command.immediate = Some(source.immediate(&template.source)?);
    }

    let commands = match template.dest.kind() {
        OperandKind::Register => match template.source.kind() {
            OperandKind::Register => {
                let modrm = ModRM::new(MODE_REGISTER, dest.address(), source.address());
                vec![Command {
                    modrm: Some(modrm.to_byte()),
                    ..command
                }]
            }
            OperandKind::Memory => with_addresses(command, dest.address(), &source.addresses()?),
            OperandKind::Constant | OperandKind::Undefined => {
                // the register is a part of the opcode, e.g. `B8+ rd`
                if template.dest.register().is_some() {
                    vec![command]
                } else {
                    let modrm = ModRM::new(MODE_REGISTER, 0, dest.address());
                    vec![Command {
                        modrm: Some(modrm.to_byte()),
                        ..command
                    }]
                }
            }
        },
        OperandKind::Memory => {
            // ModRM.reg is the source register, or 0 for `/0` forms
            let reg = if template.source.is_register() {
                source.address()
            } else {
                0
            };
            with_addresses(command, reg, &dest.addresses()?)
        }
        OperandKind::Constant => vec![],
        OperandKind::Undefined => vec![command],
    };

    Ok(commands)
}

// Drops a zero displacement next to another block,
// e.g. `[EBX*4][ECX][00000000]` -> `[EBX*4][ECX]`.
fn memory_text(text: &str) -> String {
    let (_, address) = split_size_keyword(text);
    let keyword = text.strip_suffix(address).unwrap_or("");

    let address: String = address.chars().filter(|c| !c.is_whitespace()).collect();
    let Some(inner) = address
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return text.to_owned();
    };

    let blocks: Vec<&str> = inner.split("][").collect();
    let kept: Vec<&str> = blocks
        .iter()
        .copied()
        .filter(|block| parse_constant(block) != Some(0))
        .collect();

    if kept.is_empty() || kept.len() == blocks.len() {
        text.to_owned()
    } else {
        format!("{}[{}]", keyword, kept.join("]["))
    }
}

fn with_addresses(command: Command, reg: u8, addresses: &[Address]) -> Vec<Command> {
    addresses
        .iter()
        .map(|address| Command {
            modrm: Some(address.modrm(reg).to_byte()),
            sib: address.sib.map(|sib| sib.to_byte()),
            displacement: address.displacement,
            ..command.clone()
        })
        .collect()
}
