mod config;
mod logging;

use std::process::ExitCode;

use config::{Config, USAGE};
use decoder::arm::FORMAT_MASKS;
use decoder::bitwise::Word;
use disassembler::Disassemble;

fn main() -> ExitCode {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}\n\n{USAGE}");
            return ExitCode::from(1);
        }
    };

    if config.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let _guard = logging::init(config.log_level.as_deref(), config.log_file);
    tracing::info!(words = config.words.len(), "decoding");

    let failures = config
        .words
        .iter()
        .filter(|&&word| !print_word(word, config.raw))
        .count();

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        tracing::warn!(failures, "some words could not be decoded");
        ExitCode::from(2)
    }
}

/// Prints one line for `word`, or reports on stderr why there is none.
/// `false` when it failed to decode or render.
fn print_word(word: Word, raw: bool) -> bool {
    if raw {
        println!("{word:#010x}  {}", describe_format(word));
    }

    let instruction = match decoder::decode(word) {
        Ok(instruction) => instruction,
        Err(error) => {
            eprintln!("{word:#010x}  <{error}>");
            return false;
        }
    };

    if raw {
        println!("{word:#010x}  {instruction:?}");
    }

    match instruction.disassemble() {
        Ok(text) => {
            println!("{word:#010x}  {text}");
            true
        }
        Err(error) => {
            eprintln!("{word:#010x}  <{error}>");
            false
        }
    }
}

/// The format `word` falls in, with the masks that recognised it.
fn describe_format(word: Word) -> String {
    let format = match decoder::classify(word) {
        Ok(format) => format,
        Err(error) => return error.to_string(),
    };

    FORMAT_MASKS
        .iter()
        .find(|mask| mask.format() == format)
        .map_or_else(
            || format.to_string(),
            |mask| {
                format!(
                    "{format}: checked {:#010x}, required {:#010x}",
                    mask.checked(),
                    mask.required()
                )
            },
        )
}
