// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! Property-based tests of the addressing modes, over randomly
//! generated registers, scales and displacements.

use std::collections::BTreeSet;

use anna_codec_x86::{CodecError, Table, decode, encode};
use proptest::prelude::*;

// Strategies

/// Registers that can take any role in an address.
fn general_register() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["EAX", "ECX", "EDX", "EBX", "ESI", "EDI"])
}

fn stack_register() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["ESP", "EBP"])
}

fn extended_register() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "EAX", "ECX", "EDX", "EBX", "ESP", "EBP", "ESI", "EDI",
    ])
}

fn byte_register() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["AL", "CL", "DL", "BL", "AH", "CH", "DH", "BH"])
}

fn factor() -> impl Strategy<Value = u8> {
    prop::sample::select(vec![1u8, 2, 4, 8])
}

fn displacement() -> impl Strategy<Value = String> {
    any::<u32>().prop_map(|value| format!("{:08X}", value))
}

fn nonzero_displacement() -> impl Strategy<Value = String> {
    (1u32..=u32::MAX).prop_map(|value| format!("{:08X}", value))
}

/// A single address block, e.g. `ECX`, `00112233` or `ECX*4`.
fn block() -> impl Strategy<Value = String> {
    prop_oneof![
        general_register().prop_map(|register| register.to_owned()),
        displacement(),
        (general_register(), factor()).prop_map(|(register, n)| format!("{register}*{n}")),
    ]
}

/// A valid address whose text is the same as the decoded text, i.e. the
/// blocks are in the decoding order (index, base, displacement), the scale
/// of a lone index is not 1, and displacements after a register are not 0.
fn canonical_address() -> impl Strategy<Value = String> {
    let scale = || prop::sample::select(vec![2u8, 4, 8]);

    prop_oneof![
        displacement().prop_map(|disp| format!("[{disp}]")),
        general_register().prop_map(|base| format!("[{base}]")),
        (general_register(), scale()).prop_map(|(index, n)| format!("[{index}*{n}]")),
        (general_register(), nonzero_displacement())
            .prop_map(|(base, disp)| format!("[{base}][{disp}]")),
        (general_register(), general_register())
            .prop_map(|(index, base)| format!("[{index}][{base}]")),
        (general_register(), scale(), general_register())
            .prop_map(|(index, n, base)| format!("[{index}*{n}][{base}]")),
        (general_register(), scale(), nonzero_displacement())
            .prop_map(|(index, n, disp)| format!("[{index}*{n}][{disp}]")),
        (general_register(), scale(), general_register(), nonzero_displacement())
            .prop_map(|(index, n, base, disp)| format!("[{index}*{n}][{base}][{disp}]")),
    ]
}

fn encode_hex_set(line: &str) -> Option<BTreeSet<String>> {
    encode(&Table::default(), line).ok().map(|commands| {
        commands
            .iter()
            .map(|command| command.to_hex_string())
            .collect()
    })
}

fn decode_texts(code: &str) -> Vec<String> {
    decode(&Table::default(), code)
        .map(|commands| commands.iter().map(|command| command.to_string()).collect())
        .unwrap_or_default()
}

fn is_invalid_address(line: &str) -> bool {
    matches!(
        encode(&Table::default(), line),
        Err(CodecError::InvalidAddress { .. })
    )
}

// Block order

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn block_order_does_not_change_encodings(a in block(), b in block()) {
        prop_assume!(a != b);

        prop_assert_eq!(
            encode_hex_set(&format!("MOV EAX, [{a}][{b}]")),
            encode_hex_set(&format!("MOV EAX, [{b}][{a}]"))
        );
        prop_assert_eq!(
            encode_hex_set(&format!("MOV [{a}][{b}], ECX")),
            encode_hex_set(&format!("MOV [{b}][{a}], ECX"))
        );
    }

    #[test]
    fn three_block_order_does_not_change_encoding(
        index in general_register(),
        n in factor(),
        base in extended_register(),
        disp in displacement(),
    ) {
        prop_assume!(base != "ESP");

        let index = format!("{index}*{n}");
        let expected = encode_hex_set(&format!("MOV EDX, [{index}][{base}][{disp}]"));
        prop_assert!(expected.is_some());

        for address in [
            format!("[{index}][{disp}][{base}]"),
            format!("[{base}][{index}][{disp}]"),
            format!("[{base}][{disp}][{index}]"),
            format!("[{disp}][{index}][{base}]"),
            format!("[{disp}][{base}][{index}]"),
        ] {
            prop_assert_eq!(&encode_hex_set(&format!("MOV EDX, {address}")), &expected);
        }
    }
}

// Register roles

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn stack_register_is_never_an_index(
        stack in stack_register(),
        n in factor(),
        other in general_register(),
        disp in displacement(),
    ) {
        for address in [
            format!("[{stack}*{n}]"),
            format!("[{stack}*{n}][{other}]"),
            format!("[{disp}][{stack}*{n}]"),
            format!("[{other}][{stack}*{n}][{disp}]"),
        ] {
            prop_assert!(is_invalid_address(&format!("MOV EAX, {address}")), "{}", address);
            prop_assert!(is_invalid_address(&format!("MOV {address}, EAX")), "{}", address);
        }
    }

    #[test]
    fn stack_register_is_never_a_plain_address(
        stack in stack_register(),
        other in general_register(),
        disp in displacement(),
    ) {
        for address in [
            format!("[{stack}]"),
            format!("[{stack}][{disp}]"),
            format!("[{stack}][{other}]"),
            format!("[{other}][{stack}]"),
        ] {
            prop_assert!(is_invalid_address(&format!("MOV ECX, {address}")), "{}", address);
        }
    }

    #[test]
    fn esp_is_never_a_base(
        index in general_register(),
        n in factor(),
        disp in displacement(),
    ) {
        for line in [
            format!("MOV EAX, [{index}*{n}][ESP]"),
            format!("MOV EAX, [{index}*{n}][ESP][{disp}]"),
        ] {
            prop_assert!(is_invalid_address(&line), "{}", line);
        }
    }

    #[test]
    fn decoder_rejects_stack_register_index(
        mode in prop::sample::select(vec![0b00u8, 0b10]),
        reg in 0u8..8,
        scale in 0u8..4,
        index in 0b100u8..=0b101,
        base in 0u8..8,
        disp in any::<u32>(),
    ) {
        let modrm = (mode << 6) | (reg << 3) | 0b100;
        let sib = (scale << 6) | (index << 3) | base;
        let mut code = format!("8B{modrm:02X}{sib:02X}");
        if mode != 0b00 || base == 0b101 {
            code.push_str(&format!("{:08X}", disp.swap_bytes()));
        }

        prop_assert!(
            matches!(decode(&Table::default(), &code), Err(CodecError::NoCommands(_))),
            "{}", code
        );
    }

    #[test]
    fn decoder_rejects_esp_base(
        mode in prop::sample::select(vec![0b00u8, 0b10]),
        reg in 0u8..8,
        scale in 0u8..4,
        index in prop::sample::select(vec![0b000u8, 0b001, 0b010, 0b011, 0b110, 0b111]),
        disp in any::<u32>(),
    ) {
        let modrm = (mode << 6) | (reg << 3) | 0b100;
        let sib = (scale << 6) | (index << 3) | 0b100;
        let mut code = format!("89{modrm:02X}{sib:02X}");
        if mode != 0b00 {
            code.push_str(&format!("{:08X}", disp.swap_bytes()));
        }

        prop_assert!(
            matches!(decode(&Table::default(), &code), Err(CodecError::NoCommands(_))),
            "{}", code
        );
    }
}

// Zero displacement

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn zero_displacement_is_not_rendered_after_a_register(
        dest in extended_register(),
        index in general_register(),
        n in factor(),
        base in general_register(),
    ) {
        for address in [
            format!("[{index}*{n}]"),
            format!("[{index}*{n}][00000000]"),
            format!("[{base}][00000000]"),
            format!("[{index}*{n}][{base}][00000000]"),
        ] {
            let line = format!("MOV {dest}, {address}");
            let commands = encode(&Table::default(), &line).unwrap_or_default();
            prop_assert!(!commands.is_empty(), "{}", line);
            for command in &commands {
                let text = command.to_string();
                prop_assert!(!text.contains("[00000000]"), "{} -> {}", line, text);
            }

            let codes = encode_hex_set(&line);
            prop_assert!(codes.is_some(), "{}", line);

            for code in codes.unwrap_or_default() {
                let texts = decode_texts(&code);
                prop_assert!(!texts.is_empty(), "{}", code);
                for text in texts {
                    prop_assert!(!text.contains("[00000000]"), "{} -> {}", code, text);
                }
            }
        }
    }
}

// Encoder and decoder agreement

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn decoded_load_matches_encoded_text(
        dest in extended_register(),
        address in canonical_address(),
    ) {
        let line = format!("MOV {dest}, {address}");
        let commands = encode(&Table::default(), &line);
        prop_assert!(commands.is_ok(), "{}", line);

        for command in commands.unwrap_or_default() {
            let code = command.to_hex_string();
            let decoded = decode(&Table::default(), &code);
            prop_assert!(decoded.is_ok(), "{} -> {}", line, code);

            // the decoded text encodes to the same machine code again
            for text in decode_texts(&code) {
                let codes = encode_hex_set(&text).unwrap_or_default();
                prop_assert!(codes.contains(&code), "{} -> {} -> {}", line, code, text);
            }
        }

        let first = encode(&Table::default(), &line)
            .ok()
            .and_then(|commands| commands.first().map(|command| command.to_hex_string()))
            .unwrap_or_default();
        prop_assert!(decode_texts(&first).contains(&line), "{} -> {}", line, first);
    }

    #[test]
    fn decoded_store_matches_encoded_text(
        source in extended_register(),
        address in canonical_address(),
    ) {
        let line = format!("MOV {address}, {source}");
        let codes = encode_hex_set(&line);
        prop_assert!(codes.is_some(), "{}", line);

        let texts: Vec<String> = codes
            .unwrap_or_default()
            .iter()
            .flat_map(|code| decode_texts(code))
            .collect();
        prop_assert!(texts.contains(&line), "{} -> {:?}", line, texts);
    }

    #[test]
    fn decoded_byte_store_matches_encoded_text(
        source in byte_register(),
        address in canonical_address(),
    ) {
        let line = format!("MOV BYTE PTR {address}, {source}");
        let codes = encode_hex_set(&line).unwrap_or_default();
        prop_assert!(!codes.is_empty(), "{}", line);

        for code in codes {
            prop_assert!(code.starts_with("88"), "{}", code);
            prop_assert!(decode_texts(&code).iter().all(|text| text.contains("BYTE PTR")));
        }
    }

    #[test]
    fn decoded_immediate_matches_encoded_text(
        dest in extended_register(),
        address in canonical_address(),
        value in 0u32..0x8000_0000,
    ) {
        let line = format!("MOV {dest}, {value:X}");
        let codes = encode_hex_set(&line).unwrap_or_default();
        prop_assert_eq!(codes.len(), 1, "{}", &line);

        let texts: Vec<String> = codes.iter().flat_map(|code| decode_texts(code)).collect();
        prop_assert_eq!(texts, vec![line]);

        // `[index][base]` has two encodings
        let line = format!("MOV {address}, {value:X}");
        let codes = encode_hex_set(&line).unwrap_or_default();
        prop_assert!(!codes.is_empty(), "{}", &line);

        let texts: Vec<String> = codes.iter().flat_map(|code| decode_texts(code)).collect();
        prop_assert!(texts.contains(&line), "{} -> {:?}", line, texts);
    }
}
