// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use anna_x86_types::{AbstractOperand, Register, Size};

use crate::error::CodecError;

/* *
 * Operand text forms
 *
 * | Form     | Examples                                  | Result                   |
 * | ---      | ---                                       | ---                      |
 * | register | `EAX`, `al`, `Si`                         | Register(..)             |
 * | memory   | `[00112233]`, `[EBX*4][EDX]`              | Memory32                 |
 * |          | `BYTE PTR [EAX]`, `word [ECX][10]`        | Memory8, Memory16        |
 * | constant | `12` (hex)                                | Constant8/16/32, minimal |
 *
 * Constants are hexadecimal without prefix or suffix, and must have
 * fewer than 32 significant bits, e.g. `7FFFFFFF` is the largest one.
 */

/// Classifies one operand text.
///
/// Returns `Ok(None)` if the text is empty or matches none of the forms,
/// and `Err` if the text starts with a size keyword but the rest is
/// not a memory expression, or the text is a constant that is too large.
pub fn classify(text: &str) -> Result<Option<AbstractOperand>, CodecError> {
    let text = text.trim().to_ascii_uppercase();

    if text.is_empty() {
        return Ok(None);
    }

    if let Ok(register) = text.parse::<Register>() {
        return Ok(Some(AbstractOperand::Register(register)));
    }

    let (keyword_size, address) = split_size_keyword(&text);

    if is_memory_expression(address) {
        let size = keyword_size.unwrap_or(Size::Extended);
        return Ok(AbstractOperand::memory(size));
    } else if keyword_size.is_some() {
        return Err(CodecError::InvalidOperand(text));
    }

    if !text.is_empty() && text.chars().all(|c| c.is_ascii_hexdigit()) {
        return match parse_constant(&text).and_then(constant_size) {
            Some(size) => Ok(AbstractOperand::constant(size)),
            None => Err(CodecError::InvalidOperand(text)),
        };
    }

    Ok(None)
}

/// Splits the optional `BYTE`/`WORD`/`DWORD` keyword (with or without `PTR`)
/// off a memory operand, e.g. `"DWORD PTR [EAX]"` -> `(Some(Extended), "[EAX]")`.
///
/// The text must be upper-case.
pub fn split_size_keyword(text: &str) -> (Option<Size>, &str) {
    let keywords = [
        ("BYTE", Size::Byte),
        ("WORD", Size::Word),
        ("DWORD", Size::Extended),
    ];

    for (keyword, size) in keywords {
        let Some(rest) = text.strip_prefix(keyword) else {
            continue;
        };

        // e.g. "BYTES" is not a keyword
        if rest.starts_with(|c: char| c.is_whitespace() || c == '[') {
            let rest = rest.trim_start();
            let rest = rest.strip_prefix("PTR").unwrap_or(rest).trim_start();
            return (Some(size), rest);
        }
    }

    (None, text)
}

/// Parses a hex constant of at most 8 significant digits,
/// leading zeros are ignored, e.g. `000000012`.
pub fn parse_constant(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}

/// The smallest size whose width is greater than the number of
/// significant bits of the value, e.g. `7F` is a byte, `80` is a word.
fn constant_size(value: u32) -> Option<Size> {
    match 32 - value.leading_zeros() {
        0..8 => Some(Size::Byte),
        8..16 => Some(Size::Word),
        16..32 => Some(Size::Extended),
        _ => None,
    }
}

// `[` block `]` { `[` block `]` }, where block is letters, digits and `*`.
fn is_memory_expression(text: &str) -> bool {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let Some(inner) = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return false;
    };

    inner.split("][").all(|block| {
        !block.is_empty()
            && block
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '*')
    })
}

#[cfg(test)]
mod tests {
    use anna_x86_types::{AbstractOperand, Register, Size};
    use pretty_assertions::assert_eq;

    use crate::{
        CodecError,
        classify::{classify, parse_constant, split_size_keyword},
    };

    #[test]
    fn test_classify_register() {
        assert_eq!(
            classify("EAX").unwrap(),
            Some(AbstractOperand::Register(Register::EAX))
        );
        assert_eq!(
            classify(" ah ").unwrap(),
            Some(AbstractOperand::Register(Register::AH))
        );
        assert_eq!(
            classify("Si").unwrap(),
            Some(AbstractOperand::Register(Register::SI))
        );
    }

    #[test]
    fn test_classify_memory() {
        assert_eq!(
            classify("[00112233]").unwrap(),
            Some(AbstractOperand::Memory32)
        );
        assert_eq!(
            classify("[EBX * 4][EDX]").unwrap(),
            Some(AbstractOperand::Memory32)
        );
        assert_eq!(
            classify("[11223344] [ebx*4] [edx]").unwrap(),
            Some(AbstractOperand::Memory32)
        );

        assert_eq!(
            classify("BYTE PTR [EAX]").unwrap(),
            Some(AbstractOperand::Memory8)
        );
        assert_eq!(
            classify("byte [EAX]").unwrap(),
            Some(AbstractOperand::Memory8)
        );
        assert_eq!(
            classify("WORD PTR [ECX][10]").unwrap(),
            Some(AbstractOperand::Memory16)
        );
        assert_eq!(
            classify("DWORD PTR [ECX]").unwrap(),
            Some(AbstractOperand::Memory32)
        );

        // the content of blocks is checked by the addressing encoder
        assert_eq!(classify("[FOO]").unwrap(), Some(AbstractOperand::Memory32));

        assert_eq!(classify("[]").unwrap(), None);
        assert_eq!(classify("[EAX").unwrap(), None);
        assert_eq!(classify("[EAX+4]").unwrap(), None);
        assert!(matches!(
            classify("DWORD PTR EAX"),
            Err(CodecError::InvalidOperand(_))
        ));
        assert!(matches!(
            classify("BYTE PTR [EAX+1]"),
            Err(CodecError::InvalidOperand(_))
        ));
    }

    #[test]
    fn test_classify_constant() {
        // mov al, 12  -> b0 12, 0x12 has 5 significant bits
        assert_eq!(classify("12").unwrap(), Some(AbstractOperand::Constant8));
        assert_eq!(classify("0").unwrap(), Some(AbstractOperand::Constant8));
        assert_eq!(classify("7f").unwrap(), Some(AbstractOperand::Constant8));
        assert_eq!(classify("80").unwrap(), Some(AbstractOperand::Constant16));
        assert_eq!(
            classify("7FFF").unwrap(),
            Some(AbstractOperand::Constant16)
        );
        assert_eq!(
            classify("8000").unwrap(),
            Some(AbstractOperand::Constant32)
        );
        assert_eq!(
            classify("7FFFFFFF").unwrap(),
            Some(AbstractOperand::Constant32)
        );
        assert_eq!(
            classify("00000001").unwrap(),
            Some(AbstractOperand::Constant8)
        );
        assert_eq!(
            classify("000000012").unwrap(),
            Some(AbstractOperand::Constant8)
        );

        assert!(matches!(
            classify("80000000"),
            Err(CodecError::InvalidOperand(_))
        ));
        assert!(matches!(
            classify("112233445"),
            Err(CodecError::InvalidOperand(_))
        ));
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("").unwrap(), None);
        assert_eq!(classify("   ").unwrap(), None);
        assert_eq!(classify("RAX").unwrap(), None);
        assert_eq!(classify("0x10").unwrap(), None);
        assert_eq!(classify("-1").unwrap(), None);
    }

    #[test]
    fn test_split_size_keyword() {
        assert_eq!(
            split_size_keyword("BYTE PTR [EAX]"),
            (Some(Size::Byte), "[EAX]")
        );
        assert_eq!(
            split_size_keyword("WORD[EAX]"),
            (Some(Size::Word), "[EAX]")
        );
        assert_eq!(
            split_size_keyword("DWORD PTR  [EAX][10]"),
            (Some(Size::Extended), "[EAX][10]")
        );
        assert_eq!(split_size_keyword("[EAX]"), (None, "[EAX]"));
        assert_eq!(split_size_keyword("BYTE"), (None, "BYTE"));
    }

    #[test]
    fn test_parse_constant() {
        assert_eq!(parse_constant("12"), Some(0x12));
        assert_eq!(parse_constant("00112233"), Some(0x00112233));
        assert_eq!(parse_constant("FFFFFFFF"), Some(0xffffffff));
        assert_eq!(parse_constant(""), None);
        assert_eq!(parse_constant("100000000"), None);
        assert_eq!(parse_constant("EAX"), None);
        assert_eq!(parse_constant("+12"), None);

        // leading zeros
        assert_eq!(parse_constant("000000012"), Some(0x12));
        assert_eq!(parse_constant("0000000000"), Some(0));
        assert_eq!(parse_constant("0FFFFFFFF"), Some(0xffffffff));
    }
}
