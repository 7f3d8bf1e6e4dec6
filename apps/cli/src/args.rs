//! Command-line flags, plus the interactive fallback used when the
//! binary is started with no arguments.

use std::io::{BufRead, Write};

use clap::Parser;

/// Batch video uploader with throughput reporting.
#[derive(Debug, Parser)]
#[command(name = "fastpush", version, about)]
pub struct Args {
    /// Upload at most N files (default: all).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Recurse into subdirectories of the download directory.
    #[arg(long)]
    pub recursive: bool,

    /// Ignore any proxy configured in the environment.
    #[arg(long)]
    pub no_proxy: bool,

    /// Force the per-file connection count (default: sized by the
    /// transport from the file size).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub connections: Option<u32>,
}

/// Parses flags, or prompts for the same values when invoked bare.
pub fn resolve() -> Args {
    if std::env::args().len() == 1 {
        println!("interactive mode: answer the prompts below\n");
        interactive()
    } else {
        Args::parse()
    }
}

fn interactive() -> Args {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    Args {
        limit: prompt_number(&mut input, "max files to upload", None, 1)
            .map(|n| n as usize),
        recursive: prompt_yes_no(&mut input, "recurse into subdirectories?", false),
        no_proxy: prompt_yes_no(&mut input, "ignore proxy configuration?", true),
        connections: prompt_number(&mut input, "connection count (8-20 suggested)", Some(16), 1)
            .map(|n| n as u32),
    }
}

fn prompt_yes_no(input: &mut impl BufRead, prompt: &str, default_yes: bool) -> bool {
    let suffix = if default_yes { " (Y/n): " } else { " (y/N): " };
    loop {
        print!("{prompt}{suffix}");
        let _ = std::io::stdout().flush();
        let Some(line) = read_line(input) else {
            return default_yes;
        };
        match line.to_lowercase().as_str() {
            "" => return default_yes,
            "y" | "yes" | "1" | "true" | "on" => return true,
            "n" | "no" | "0" | "false" | "off" => return false,
            _ => println!("please answer y or n"),
        }
    }
}

fn prompt_number(
    input: &mut impl BufRead,
    prompt: &str,
    default: Option<u64>,
    min: u64,
) -> Option<u64> {
    let hint = match default {
        Some(d) => format!(" (default {d})"),
        None => " (empty for default)".to_string(),
    };
    loop {
        print!("{prompt}{hint}: ");
        let _ = std::io::stdout().flush();
        let Some(line) = read_line(input) else {
            return default;
        };
        if line.is_empty() {
            return default;
        }
        match line.parse::<u64>() {
            Ok(v) if v >= min => return Some(v),
            Ok(_) => println!("please enter a number >= {min}"),
            Err(_) => println!("please enter a whole number"),
        }
    }
}

fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}
