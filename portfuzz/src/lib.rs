//! Command-line glue for the `portfuzz` binary: argument parsing,
//! `--help`/`--version` short-circuiting, logging setup, and handing
//! fully-resolved [`Arguments`] off to [`portfuzz_engine::run`].

use portfuzz_common::arg::{options_parser, Arguments, CommandLineArguments};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage(options: &getopts::Options) -> String {
    options.usage(&format!("Usage: {NAME} [OPTIONS]"))
}

fn init_logging(args: &Arguments) {
    let level = if args.debug {
        log::LevelFilter::Debug
    } else if args.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();
}

/// Parses `argv` (excluding `argv[0]`) and runs the fuzzer, returning the
/// process's exit code. `--help` and `--version` both print and return a
/// failure status, per the CLI's documented (if unusual) behavior.
pub fn run(argv: &[String]) -> i32 {
    let options = options_parser();

    if CommandLineArguments::wants_version(&options, argv) {
        println!("{NAME} {VERSION}");
        return 1;
    }

    let args = match Arguments::from_parser(&options, argv) {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{NAME}: {message}");
            }
            eprintln!("{}", usage(&options));
            return 1;
        }
    };

    init_logging(&args);

    if let Err(e) = portfuzz_engine::run(&args) {
        log::error!("{e}");
        eprintln!("{NAME}: {e}");
        return 1;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_flag_prints_usage_and_fails() {
        assert_eq!(run(&["--help".to_string()]), 1);
    }

    #[test]
    fn version_flag_prints_version_and_fails() {
        assert_eq!(run(&["--version".to_string()]), 1);
    }

    #[test]
    fn unparseable_args_fail() {
        assert_eq!(run(&["--not-a-real-flag".to_string()]), 1);
    }
}
