use clap::{Parser, Subcommand};

/// Command-line interface definition for rAttendance
#[derive(Parser)]
#[command(
    name = "rattendance",
    version = env!("CARGO_PKG_VERSION"),
    about = "Check in and out, keep a live work timer across restarts and see who is present",
    long_about = None
)]
pub struct Cli {
    /// Override local database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the time-entry backend base URL
    #[arg(global = true, long = "api")]
    pub api: Option<String>,

    /// Act as this user id instead of the configured one
    #[arg(global = true, long = "user")]
    pub user: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the local database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Show whether a session is running and for how long
    Status {
        #[arg(
            long = "sync",
            help = "If no session is known locally, resume an open session found on the server"
        )]
        sync: bool,
    },

    /// Start a work session
    CheckIn,

    /// Close the running work session
    CheckOut,

    /// Show a live elapsed-time counter (Ctrl-C to quit)
    Watch {
        #[arg(long = "seconds", help = "Stop after this many seconds")]
        seconds: Option<u64>,
    },

    /// Team presence for the configured roster
    Presence {
        #[arg(
            long,
            default_value = "all",
            help = "Show only one bucket: all, present, break, absent"
        )]
        filter: String,

        #[arg(long, help = "Sort rows: user or elapsed (default: roster order)")]
        sort: Option<String>,
    },

    /// Weekly summary of closed sessions for the acting user
    Summary {
        #[arg(long, value_name = "YYYY-MM-DD", help = "Any day of the week to summarize")]
        week: Option<String>,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}
