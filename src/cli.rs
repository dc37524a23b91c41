use clap::Parser;

use crate::settings::Mode;

/// XCord, Discord Rich Presence for Xcode.
#[derive(Parser, Debug)]
#[command(name = "xcord", version, about)]
pub struct Args {
    /// Timer mode to save and use (strict pauses while Xcode is inactive).
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Start with the presence switched off.
    #[arg(long)]
    pub inactive: bool,

    /// Log filter override (e.g. debug, xcord=trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["xcord"]).unwrap();
        assert_eq!(args.mode, None);
        assert!(!args.inactive);
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn mode_and_flags() {
        let args =
            Args::try_parse_from(["xcord", "--mode", "flaunt", "--inactive", "--log-level", "debug"])
                .unwrap();
        assert_eq!(args.mode, Some(Mode::Flaunt));
        assert!(args.inactive);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["xcord", "--mode", "lenient"]).is_err());
    }
}
