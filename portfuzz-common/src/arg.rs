use getopts::Options;
use std::path::PathBuf;

pub const DEBUG_FLAG: &str = "debug";
pub const HELP_FLAG: &str = "help";
pub const NUM_THREADS_FLAG: &str = "num-threads";
pub const OUTPUT_FLAG: &str = "output";
pub const PORTS_FLAG: &str = "ports";
pub const QUIET_FLAG: &str = "quiet";
pub const SILENT_FLAG: &str = "silent";
pub const STACK_SIZE_FLAG: &str = "stack-size";
pub const STATE_FLAG: &str = "state";
pub const VERBOSE_FLAG: &str = "verbose";
pub const VERSION_FLAG: &str = "version";

#[derive(Clone)]
pub struct DefaultArguments {
    pub num_threads: usize,
    pub state: u64,
}
impl Default for DefaultArguments {
    fn default() -> Self {
        Self {
            num_threads: 1,
            state: 0,
        }
    }
}

/// Fully resolved settings for one run of the fuzzer, after defaults have
/// been applied to whatever the user passed on the command line.
#[derive(Debug, Clone)]
pub struct Arguments {
    pub debug: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub num_threads: usize,
    pub output: Option<PathBuf>,
    pub ports: Option<String>,
    pub stack_size: Option<usize>,
    pub state: u64,
}

#[derive(Default, Debug, Clone)]
pub struct CommandLineArguments {
    pub debug: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub num_threads: Option<usize>,
    pub output: Option<PathBuf>,
    pub ports: Option<String>,
    pub stack_size: Option<usize>,
    pub state: Option<u64>,
}

#[must_use]
pub fn options_parser() -> Options {
    let mut options = Options::new();

    options.optflag("d", DEBUG_FLAG, "enable debug verbosity");
    options.optflag("h", HELP_FLAG, "print this help menu");
    options.optopt("", NUM_THREADS_FLAG, "number of worker threads (default: 1)", "N");
    options.optopt("o", OUTPUT_FLAG, "append the log to this file instead of stdout", "PATH");
    options.optopt(
        "p",
        PORTS_FLAG,
        "comma-separated port addresses or LOW-HIGH ranges, e.g. 0x70,0x80-0x82",
        "SPEC",
    );
    options.optflag("q", QUIET_FLAG, "suppress the destructive-operation banner and countdown");
    options.optflag("", SILENT_FLAG, "alias for --quiet");
    options.optopt("", STACK_SIZE_FLAG, "per-worker stack size in bytes", "N");
    options.optopt(
        "",
        STATE_FLAG,
        "initial 8-byte RNG seed, parsed as 0x hex / 0 octal / decimal",
        "N",
    );
    options.optflag("v", VERBOSE_FLAG, "enable verbose output");
    options.optflag("", VERSION_FLAG, "print name and version, then exit");

    options
}

/// Parses the seed grammar: `0x`-prefixed hex, `0`-prefixed octal, or
/// plain decimal, same as a C integer literal.
pub fn parse_state(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8).map_err(|e| e.to_string())
    } else {
        s.parse::<u64>().map_err(|e| e.to_string())
    }
}

impl CommandLineArguments {
    pub fn from_parser(options: &Options, args: &[String]) -> Result<Self, String> {
        let matches = options.parse(args).map_err(|e| e.to_string())?;

        if matches.opt_present(HELP_FLAG) {
            return Err(String::new());
        }

        let num_threads = matches
            .opt_str(NUM_THREADS_FLAG)
            .map(|x| x.parse::<usize>().map_err(|e| e.to_string()))
            .transpose()?;

        let output = matches.opt_str(OUTPUT_FLAG).map(PathBuf::from);

        let ports = matches.opt_str(PORTS_FLAG);

        let stack_size = matches
            .opt_str(STACK_SIZE_FLAG)
            .map(|x| x.parse::<usize>().map_err(|e| e.to_string()))
            .transpose()?;

        let state = matches.opt_str(STATE_FLAG).map(|x| parse_state(&x)).transpose()?;

        Ok(Self {
            debug: matches.opt_present(DEBUG_FLAG),
            verbose: matches.opt_present(VERBOSE_FLAG),
            quiet: matches.opt_present(QUIET_FLAG) || matches.opt_present(SILENT_FLAG),
            num_threads,
            output,
            ports,
            stack_size,
            state,
        })
    }

    pub fn resolved(&self, defaults: DefaultArguments) -> Arguments {
        Arguments {
            debug: self.debug,
            verbose: self.verbose,
            quiet: self.quiet,
            num_threads: self.num_threads.unwrap_or(defaults.num_threads).max(1),
            output: self.output.clone(),
            ports: self.ports.clone(),
            stack_size: self.stack_size,
            state: self.state.unwrap_or(defaults.state),
        }
    }

    pub fn wants_version(options: &Options, args: &[String]) -> bool {
        options
            .parse(args)
            .map(|m| m.opt_present(VERSION_FLAG))
            .unwrap_or(false)
    }
}

impl Arguments {
    /// Parses the process's command-line arguments into fully resolved settings.
    pub fn from_parser(options: &Options, args: &[String]) -> Result<Self, String> {
        Ok(CommandLineArguments::from_parser(options, args)?.resolved(DefaultArguments::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let options = options_parser();
        let args = Arguments::from_parser(&options, &[]).unwrap();
        assert_eq!(args.num_threads, 1);
        assert_eq!(args.state, 0);
        assert!(!args.quiet);
        assert!(args.output.is_none());
    }

    #[test]
    fn parses_state_hex() {
        let options = options_parser();
        let args = Arguments::from_parser(&options, &["--state".to_string(), "0x0123456789ABCDEF".to_string()]).unwrap();
        assert_eq!(args.state, 0x0123_4567_89AB_CDEF);
    }

    #[test]
    fn parses_state_octal_and_decimal() {
        assert_eq!(parse_state("010").unwrap(), 8);
        assert_eq!(parse_state("10").unwrap(), 10);
        assert_eq!(parse_state("0").unwrap(), 0);
    }

    #[test]
    fn quiet_accepts_either_alias() {
        let options = options_parser();
        let args = Arguments::from_parser(&options, &["--silent".to_string()]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn help_short_circuits() {
        let options = options_parser();
        assert!(Arguments::from_parser(&options, &["-h".to_string()]).is_err());
    }
}
