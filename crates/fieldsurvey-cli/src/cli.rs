use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fieldsurvey_core::models::SessionKind;

#[derive(Debug, Parser)]
#[command(name = "fieldsurvey", version, about = "Offline-first health survey records")]
pub struct Cli {
    /// Treat the device as offline regardless of configuration
    #[arg(long, global = true)]
    pub offline: bool,

    /// Collector id to stamp on new records
    #[arg(long, global = true, env = "FIELDSURVEY_COLLECTOR")]
    pub collector: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show record counts, sync backlog and mirror ages
    Status,

    /// Screening records
    #[command(subcommand)]
    Screening(ScreeningCommand),

    /// Awareness session records
    #[command(subcommand)]
    Session(SessionCommand),

    /// Apply a JSON patch to one record
    Update {
        /// Record id
        id: String,
        /// Patch file (`-` for stdin), e.g. {"record": "screening", "name": "..."}
        patch: PathBuf,
    },

    /// Mark every record as synced
    Sync,

    /// Write a spreadsheet export
    #[command(subcommand)]
    Export(ExportCommand),

    /// Persist the offline preference
    Offline {
        #[arg(value_enum)]
        mode: Toggle,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScreeningCommand {
    /// Add one record from a JSON object
    Add {
        /// Payload file (`-` for stdin)
        file: PathBuf,
        /// Insert even when a same-day duplicate exists
        #[arg(long)]
        force: bool,
    },
    /// Add a batch from a JSON array, all or nothing
    Import {
        /// Payload file (`-` for stdin)
        file: PathBuf,
        /// Insert even when same-day duplicates exist
        #[arg(long)]
        force: bool,
    },
    /// List stored records
    List,
}

/// Sessions are never deduplicated, so there is nothing to force.
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Add one session from a JSON object
    Add {
        /// Payload file (`-` for stdin)
        file: PathBuf,
    },
    /// Add a batch of one session kind from a JSON array
    Import {
        /// Payload file (`-` for stdin)
        file: PathBuf,
    },
    /// List stored sessions of both kinds
    List,
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Export screenings
    Screening {
        #[command(flatten)]
        range: RangeArgs,
        /// Only severe (MUAC <= 11)
        #[arg(long)]
        sam: bool,
        /// Only moderate (11 < MUAC <= 12)
        #[arg(long)]
        mam: bool,
        /// One sheet per collector
        #[arg(long)]
        split: bool,
    },
    /// Export one session kind
    Session {
        #[arg(value_enum)]
        kind: KindArg,
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Only records collected today
    #[arg(long)]
    pub today: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Fmt,
    Sm,
}

impl From<KindArg> for SessionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Fmt => SessionKind::Fmt,
            KindArg::Sm => SessionKind::Sm,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screening_add_accepts_force() {
        let cli = Cli::try_parse_from(["fieldsurvey", "screening", "add", "a.json", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Screening(ScreeningCommand::Add { force: true, .. })
        ));
    }

    #[test]
    fn test_session_add_has_no_force_flag() {
        assert!(Cli::try_parse_from(["fieldsurvey", "session", "add", "a.json", "--force"]).is_err());
        assert!(Cli::try_parse_from(["fieldsurvey", "session", "import", "a.json"]).is_ok());
    }

    #[test]
    fn test_export_session_kind() {
        let cli = Cli::try_parse_from(["fieldsurvey", "export", "session", "sm", "--today"]).unwrap();
        match cli.command {
            Command::Export(ExportCommand::Session { kind, range }) => {
                assert_eq!(SessionKind::from(kind), SessionKind::Sm);
                assert!(range.today);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
