use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sticky_core::{NoteId, View};

#[derive(Parser)]
#[command(name = "sticky")]
#[command(about = "Sticky notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Notes service base URL (overrides the profile)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Path to the local session file
    #[arg(long, global = true, value_name = "PATH")]
    pub storage_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes in a view
    #[command(alias = "ls")]
    List {
        /// Which notes to show
        #[arg(long, value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,
        /// Case-insensitive filter on title and content
        #[arg(short, long)]
        search: Option<String>,
        /// PIN for the private view (creates one if none is set)
        #[arg(long, value_name = "PIN")]
        pin: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title (defaults to the first line of content)
        #[arg(short, long)]
        title: Option<String>,
        /// Hide the note behind the private PIN
        #[arg(long)]
        private: bool,
        /// Note content
        content: Vec<String>,
    },
    /// Edit an existing note
    Edit {
        /// Note ID
        id: NoteId,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New content (opens $EDITOR when no field is given)
        #[arg(short, long)]
        content: Option<String>,
        /// Mark the note private
        #[arg(long, conflicts_with = "public")]
        private: bool,
        /// Mark the note public
        #[arg(long)]
        public: bool,
        /// PIN, required when the note is private
        #[arg(long, value_name = "PIN")]
        pin: Option<String>,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: NoteId,
    },
    /// Show the change history of a note
    History {
        /// Note ID
        id: NoteId,
        /// PIN, required when the note is private
        #[arg(long, value_name = "PIN")]
        pin: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List users a note can be shared with
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Share a note with another user
    Share {
        /// Note ID
        id: NoteId,
        /// Username to share with
        username: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ViewArg {
    All,
    Shared,
    Private,
}

impl From<ViewArg> for View {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::All => Self::All,
            ViewArg::Shared => Self::Shared,
            ViewArg::Private => Self::Private,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile (uses --profile and --api-url)
    Init {
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a session token issued by the notes service
    Login {
        /// Account username
        #[arg(long, value_name = "USERNAME")]
        username: String,
        /// Bearer token from the service login page
        #[arg(long, value_name = "TOKEN")]
        token: String,
    },
    /// Show the stored session for the profile
    Status,
    /// Clear the stored session
    Logout,
}
