//! Command-line parsing.

use crate::AppError;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: thinkink [--config <settings.json>] [--data-dir <dir>] <command>

Commands:
  export-png <board.json> <out.png> [--scale <n>] [--dark] [--font <font.ttf>]
  export-svg <board.json> <out.svg>
  info <board.json>
  save <board.json>        Store a board as the local autosave
  restore <out.json>       Write the local autosave to a file
  help";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ExportPng {
        input: PathBuf,
        output: PathBuf,
        scale: f64,
        dark: bool,
        font: Option<PathBuf>,
    },
    ExportSvg {
        input: PathBuf,
        output: PathBuf,
    },
    Info {
        input: PathBuf,
    },
    Save {
        input: PathBuf,
    },
    Restore {
        output: PathBuf,
    },
    Help,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    /// Overrides the platform data directory used by `save`/`restore`.
    pub data_dir: Option<PathBuf>,
    pub command: Command,
}

impl Cli {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = None;
        let mut data_dir = None;
        let mut scale = 1.0;
        let mut dark = false;
        let mut font = None;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(PathBuf::from(value(&mut args, "--config")?)),
                "--data-dir" => data_dir = Some(PathBuf::from(value(&mut args, "--data-dir")?)),
                "--font" => font = Some(PathBuf::from(value(&mut args, "--font")?)),
                "--scale" => {
                    let raw = value(&mut args, "--scale")?;
                    scale = raw
                        .parse::<f64>()
                        .ok()
                        .filter(|s| s.is_finite() && *s > 0.0)
                        .ok_or_else(|| AppError::Usage(format!("Invalid scale: {}", raw)))?;
                }
                "--dark" => dark = true,
                "-h" | "--help" => positional.insert(0, "help".to_string()),
                flag if flag.starts_with("--") => {
                    return Err(AppError::Usage(format!("Unknown option: {}", flag)));
                }
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let name = positional.next().unwrap_or_else(|| "help".to_string());
        let mut path = |what: &str| {
            positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| AppError::Usage(format!("{} expects {}", name, what)))
        };

        let command = match name.as_str() {
            "export-png" => Command::ExportPng {
                input: path("an input file")?,
                output: path("an output file")?,
                scale,
                dark,
                font,
            },
            "export-svg" => Command::ExportSvg {
                input: path("an input file")?,
                output: path("an output file")?,
            },
            "info" => Command::Info {
                input: path("an input file")?,
            },
            "save" => Command::Save {
                input: path("an input file")?,
            },
            "restore" => Command::Restore {
                output: path("an output file")?,
            },
            "help" => Command::Help,
            other => return Err(AppError::Usage(format!("Unknown command: {}", other))),
        };

        Ok(Self {
            config,
            data_dir,
            command,
        })
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, AppError> {
    args.next()
        .ok_or_else(|| AppError::Usage(format!("{} expects a value", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, AppError> {
        Cli::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_export_png_with_options() {
        let cli = parse(&["--config", "s.json", "export-png", "a.json", "a.png", "--scale", "2", "--dark"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("s.json")));
        assert_eq!(
            cli.command,
            Command::ExportPng {
                input: "a.json".into(),
                output: "a.png".into(),
                scale: 2.0,
                dark: true,
                font: None,
            }
        );
    }

    #[test]
    fn test_defaults_to_help() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&["info", "--help"]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_missing_argument() {
        assert!(matches!(parse(&["export-svg", "a.json"]), Err(AppError::Usage(_))));
        assert!(matches!(parse(&["info", "--config"]), Err(AppError::Usage(_))));
    }

    #[test]
    fn test_rejects_bad_scale_and_unknowns() {
        assert!(matches!(parse(&["export-png", "a", "b", "--scale", "0"]), Err(AppError::Usage(_))));
        assert!(matches!(parse(&["export-png", "a", "b", "--scale", "big"]), Err(AppError::Usage(_))));
        assert!(matches!(parse(&["frobnicate"]), Err(AppError::Usage(_))));
        assert!(matches!(parse(&["info", "a", "--verbose"]), Err(AppError::Usage(_))));
    }

    #[test]
    fn test_data_dir() {
        let cli = parse(&["--data-dir", "/tmp/boards", "restore", "out.json"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/boards")));
        assert_eq!(cli.command, Command::Restore { output: "out.json".into() });
    }
}
