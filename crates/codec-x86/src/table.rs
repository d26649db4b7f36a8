// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use anna_x86_types::{AbstractCommand, AbstractOperand, Register};

use crate::error::CodecError;

/// The read-only list of instruction forms.
///
/// Several forms may share a mnemonic (overloads) or an opcode
/// (e.g. `88 /r` is both `MOV r8, r8` and `MOV m8, r8`),
/// the encoder and decoder tell them apart by the operands.
#[derive(Debug, PartialEq, Clone)]
pub struct Table {
    commands: Vec<AbstractCommand>,
}

impl Table {
    pub fn new(commands: Vec<AbstractCommand>) -> Self {
        Self { commands }
    }

    /// Loads the forms from a JSON array, e.g.
    ///
    /// ```json
    /// [{ "name": "MOV", "opcode": 139, "source": "Memory32", "dest": "Reg32" }]
    /// ```
    pub fn from_json(text: &str) -> Result<Self, CodecError> {
        let commands: Vec<AbstractCommand> = serde_json::from_str(text)?;
        Ok(Self::new(commands))
    }

    pub fn commands(&self) -> &[AbstractCommand] {
        &self.commands
    }

    /// Forms with the given mnemonic, case-insensitive.
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AbstractCommand> + 'a {
        self.commands
            .iter()
            .filter(move |command| command.name.eq_ignore_ascii_case(name))
    }

    pub fn by_opcode(&self, opcode: u8) -> impl Iterator<Item = &AbstractCommand> + '_ {
        self.commands
            .iter()
            .filter(move |command| command.opcode == opcode)
    }
}

/* *
 * The built-in table, MOV and INC.
 *
 * | Opcode   | Instruction      | Op/En | Description          |
 * | ---      |  ---             | ---   |  ---                 |
 * | 88 /r    | MOV r/m8, r8     | MR    | Move r8 to r/m8.     |
 * | 89 /r    | MOV r/m32, r32   | MR    | Move r32 to r/m32.   |
 * | 8A /r    | MOV r8, r/m8     | RM    | Move r/m8 to r8.     |
 * | 8B /r    | MOV r32, r/m32   | RM    | Move r/m32 to r32.   |
 * | B0+ rb   | MOV r8, imm8     | OI    | Move imm8 to r8.     |
 * | B8+ rd   | MOV r32, imm32   | OI    | Move imm32 to r32.   |
 * | C6 /0 ib | MOV r/m8, imm8   | MI    | Move imm8 to r/m8.   |
 * | C7 /0 id | MOV r/m32, imm32 | MI    | Move imm32 to r/m32. |
 * | 40+ rd   | INC r32          | O     | Increment r32 by 1.  |
 *
 * The 16-bit forms (operand-size prefix 66) are not included.
 *
 * References:
 * - http://ref.x86asm.net/coder32.html
 * - https://www.felixcloutier.com/x86/mov
 * - https://www.felixcloutier.com/x86/inc
 */
impl Default for Table {
    fn default() -> Self {
        use AbstractOperand::{Constant8, Constant32, Memory8, Memory32, NoOperand, Reg8, Reg32};

        const MOV: &str = "MOV";
        const INC: &str = "INC";

        let byte_registers = [
            Register::AL,
            Register::CL,
            Register::DL,
            Register::BL,
            Register::AH,
            Register::CH,
            Register::DH,
            Register::BH,
        ];

        let extended_registers = [
            Register::EAX,
            Register::ECX,
            Register::EDX,
            Register::EBX,
            Register::ESP,
            Register::EBP,
            Register::ESI,
            Register::EDI,
        ];

        let mut commands = vec![
            AbstractCommand::new(MOV, 0x88, Reg8, Reg8),
            AbstractCommand::new(MOV, 0x88, Memory8, Reg8),
            AbstractCommand::new(MOV, 0x89, Memory32, Reg32),
            AbstractCommand::new(MOV, 0x8a, Reg8, Reg8),
            AbstractCommand::new(MOV, 0x8a, Reg8, Memory8),
            AbstractCommand::new(MOV, 0x8b, Reg32, Reg32),
            AbstractCommand::new(MOV, 0x8b, Reg32, Memory32),
        ];

        // the register is encoded in the low 3 bits of the opcode
        for register in byte_registers {
            commands.push(AbstractCommand::new(
                MOV,
                0xb0 + register.address(),
                AbstractOperand::Register(register),
                Constant8,
            ));
        }

        for register in extended_registers {
            commands.push(AbstractCommand::new(
                MOV,
                0xb8 + register.address(),
                AbstractOperand::Register(register),
                Constant32,
            ));
        }

        commands.push(AbstractCommand::new(MOV, 0xc6, Memory8, Constant8));
        commands.push(AbstractCommand::new(MOV, 0xc7, Memory32, Constant32));

        for register in extended_registers {
            commands.push(AbstractCommand::new(
                INC,
                0x40 + register.address(),
                AbstractOperand::Register(register),
                NoOperand,
            ));
        }

        Self::new(commands)
    }
}
