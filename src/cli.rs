use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "folderzip")]
#[command(version)]
#[command(about = "Bundle a folder into a ZIP archive and back", long_about = None)]
#[command(after_help = "Examples:\n  \
  folderzip create photos photos.zip      archive the photos folder\n  \
  folderzip extract photos.zip restored   unpack into ./restored\n  \
  folderzip list photos.zip               show what is inside")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// No progress output
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Archive the contents of a folder
    Create {
        /// Folder to archive
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        /// Archive to write (overwritten if it exists)
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Store entries without compression
        #[arg(long)]
        store: bool,

        /// Copy chunk size in bytes
        #[arg(long, value_name = "BYTES", default_value_t = crate::DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
    },

    /// Extract an archive into a folder
    Extract {
        /// Archive to read
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Destination folder (created if missing)
        #[arg(value_name = "DEST")]
        dest: PathBuf,
    },

    /// List the entries of an archive
    List {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub fn shows_progress(&self) -> bool {
        !self.quiet && !matches!(self.command, Command::List { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create() {
        let cli = Cli::parse_from(["folderzip", "create", "src", "out.zip", "--store", "-vv"]);
        match cli.command {
            Command::Create {
                ref folder,
                ref archive,
                store,
                buffer_size,
            } => {
                assert_eq!(folder, &PathBuf::from("src"));
                assert_eq!(archive, &PathBuf::from("out.zip"));
                assert!(store);
                assert_eq!(buffer_size, 81_920);
            }
            _ => panic!("expected create"),
        }
        assert_eq!(cli.log_level(), "debug");
        assert!(cli.shows_progress());
    }

    #[test]
    fn list_has_no_progress() {
        let cli = Cli::parse_from(["folderzip", "list", "a.zip"]);
        assert!(!cli.shows_progress());
        assert_eq!(cli.log_level(), "warn");
    }
}
