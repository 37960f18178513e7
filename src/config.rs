use std::fmt;

use decoder::bitwise::Word;

pub const USAGE: &str = "\
usage: armscope [options] <word>...

Decodes and disassembles 32-bit ARM instruction words.
Words are hexadecimal, with or without a 0x prefix. Underscores are ignored.

options:
    --log-level <filter>  tracing filter, e.g. `debug` or `decoder=trace`
                          (defaults to RUST_LOG, then `warn`)
    --log-file            log to a file in the temp directory instead of stderr
    --raw                 also print the format masks and the decoded value
    -h, --help            print this help";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub words: Vec<Word>,
    pub log_level: Option<String>,
    pub log_file: bool,
    pub raw: bool,
    pub help: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingValue(&'static str),
    UnknownOption(String),
    InvalidWord(String),
    NoWords,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue(option) => write!(f, "{option} needs a value"),
            Self::UnknownOption(option) => write!(f, "unknown option {option}"),
            Self::InvalidWord(word) => write!(f, "{word} is not a 32-bit instruction word"),
            Self::NoWords => f.write_str("no instruction words given"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Parses the arguments following the program name.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => config.help = true,
                "--raw" => config.raw = true,
                "--log-file" => config.log_file = true,
                "--log-level" => {
                    let level = args.next().ok_or(ConfigError::MissingValue("--log-level"))?;
                    config.log_level = Some(level);
                }
                option if option.starts_with('-') => {
                    return Err(ConfigError::UnknownOption(option.to_owned()));
                }
                word => config.words.push(parse_word(word)?),
            }
        }

        if config.words.is_empty() && !config.help {
            return Err(ConfigError::NoWords);
        }
        Ok(config)
    }
}

fn parse_word(text: &str) -> Result<Word, ConfigError> {
    let digits = text.replace('_', "");
    let hex = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);
    let invalid = || ConfigError::InvalidWord(text.to_owned());

    // from_str_radix takes a leading sign
    if !hex.bytes().all(|digit| digit.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(hex, 16)
        .map(Word::new)
        .map_err(|_| invalid())
}
