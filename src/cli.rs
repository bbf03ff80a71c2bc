// Command-line arguments, parsed with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::history::DEFAULT_LIST_LIMIT;

const EXAMPLES: &str = "\
Examples:
  $ pinme upload
  $ pinme upload ./my-website
  $ pinme rm <hash>
  $ pinme list -l 5
  $ pinme ls
  $ pinme help upload

For more information, visit: https://github.com/glitternetwork/pinme";

/// A command-line tool for uploading files to IPFS.
#[derive(Parser, Debug)]
#[command(name = "pinme")]
#[command(version)]
#[command(about = "A command-line tool for uploading files to IPFS")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file or directory to IPFS.
    ///
    /// Without a path the command asks for one interactively.
    Upload {
        /// File or directory to upload.
        path: Option<PathBuf>,
    },

    /// Remove content from the IPFS network.
    ///
    /// Accepts a content hash, a preview URL (https://<hash>.pinme.dev),
    /// a subname or a subname URL (https://<subname>.pinit.eth.limo).
    Rm {
        /// Hash, subname or URL to remove.
        target: Option<String>,
    },

    /// Show upload history.
    #[command(visible_alias = "ls")]
    List {
        /// Limit the number of records to show.
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,

        /// Clear all upload history.
        #[arg(short, long)]
        clear: bool,
    },
}
