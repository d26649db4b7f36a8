// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! Command-line front end of the x86 (32-bit) instruction codec.
//!
//! ```text
//! $ anna-x86 encode "MOV EAX, [ECX][00112233]"
//! MOV EAX, [ECX][00112233]  8B8133221100
//!
//! $ anna-x86 decode 8B8133221100
//! MOV EAX, [ECX][00112233]  8B8133221100
//! ```

use std::{fs, path::PathBuf};

use anna_codec_x86::{Table, decode, encode};
use anna_x86_types::Command;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "anna-x86")]
#[command(version)]
#[command(about = "Encode and decode x86 (32-bit) MOV and INC instructions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Instruction table (JSON), the built-in MOV/INC table is used if absent
    #[arg(long, value_name = "FILE", env = "ANNA_X86_TABLE", global = true)]
    table: Option<PathBuf>,

    /// Print the commands as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode one line of assembly, e.g. "MOV EAX, [EBX*4]"
    Encode {
        #[arg(value_name = "LINE")]
        line: String,
    },

    /// Decode the machine code (hex digits) of one instruction, e.g. "8B0C9D00000000"
    Decode {
        #[arg(value_name = "HEX")]
        code: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let table = load_table(cli.table.as_ref())?;

    let commands = match &cli.command {
        Commands::Encode { line } => {
            encode(&table, line).with_context(|| format!("failed to encode \"{}\"", line))?
        }
        Commands::Decode { code } => {
            decode(&table, code).with_context(|| format!("failed to decode \"{}\"", code))?
        }
    };

    print_commands(&commands, cli.json)
}

fn load_table(path: Option<&PathBuf>) -> Result<Table> {
    let Some(path) = path else {
        return Ok(Table::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read the table file {}", path.display()))?;
    let table = Table::from_json(&text)
        .with_context(|| format!("invalid table file {}", path.display()))?;

    debug!(
        "loaded {} instruction forms from {}",
        table.commands().len(),
        path.display()
    );
    Ok(table)
}

fn print_commands(commands: &[Command], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(commands)?);
    } else {
        for command in commands {
            println!("{}  {}", command, command.to_hex_string());
        }
    }
    Ok(())
}
