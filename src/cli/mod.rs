//! CLI argument definitions for Bearing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bearing - personal planning: themes, OKRs, a yearly calendar, and a task board.
///
/// Start with `bearing init`, then create a theme with `bearing theme create`.
#[derive(Parser, Debug)]
#[command(name = "bearing")]
#[command(author, version, about = "Personal planning with themes, OKRs, and a versioned task board", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory (defaults to the platform data dir + /bearing).
    /// Can also be set via BEARING_DATA_DIR environment variable.
    #[arg(short = 'D', long = "data-dir", global = true, env = "BEARING_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Maximum number of tasks in the doing column for this invocation
    #[arg(long, global = true)]
    pub wip_limit: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the data directory and its version history
    Init,

    /// Theme management commands
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },

    /// Objective management commands
    Objective {
        #[command(subcommand)]
        command: ObjectiveCommands,
    },

    /// Key result management commands
    Kr {
        #[command(subcommand)]
        command: KeyResultCommands,
    },

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show the board layout
    Board,

    /// Yearly calendar commands
    Calendar {
        #[command(subcommand)]
        command: CalendarCommands,
    },

    /// Navigation state commands (not versioned)
    Nav {
        #[command(subcommand)]
        command: NavCommands,
    },

    /// Show version history of the data directory
    History {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show version and build information
    Version,
}

/// Theme subcommands
#[derive(Subcommand, Debug)]
pub enum ThemeCommands {
    /// List themes with their objective trees
    List,

    /// Show one theme
    Show {
        /// Theme ID (e.g., H)
        id: String,
    },

    /// Create a theme
    Create {
        /// Theme name
        name: String,

        /// Color as #RRGGBB
        #[arg(short, long)]
        color: String,

        /// Explicit ID (1-3 uppercase letters); derived from the name if omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Rename or recolor a theme
    Update {
        /// Theme ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New color
        #[arg(long)]
        color: Option<String>,
    },

    /// Replace a whole theme tree from a JSON file ("-" for stdin)
    Save {
        /// Path to a theme JSON document
        file: PathBuf,
    },

    /// Delete a theme and its objectives
    Delete {
        /// Theme ID
        id: String,
    },

    /// Suggest a free abbreviation for a name
    Suggest {
        /// Theme name
        name: String,
    },
}

/// Objective subcommands
#[derive(Subcommand, Debug)]
pub enum ObjectiveCommands {
    /// Create an objective under a theme or objective
    Create {
        /// Parent ID (theme ID or objective ID)
        parent: String,

        /// Objective title
        title: String,
    },

    /// Change an objective's title
    Update {
        /// Objective ID (e.g., H-O1)
        id: String,

        /// New title
        title: String,
    },

    /// Delete an objective and everything below it
    Delete {
        /// Objective ID
        id: String,
    },

    /// Move an objective under another parent in the same theme
    Move {
        /// Objective ID
        id: String,

        /// New parent ID (theme ID or objective ID)
        parent: String,
    },

    /// Set lifecycle status (active, completed, archived)
    Status {
        /// Objective ID
        id: String,

        /// New status
        status: String,
    },
}

/// Key result subcommands
#[derive(Subcommand, Debug)]
pub enum KeyResultCommands {
    /// Create a key result on an objective
    Create {
        /// Objective ID
        objective: String,

        /// Description
        description: String,

        /// Start value
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        start: i64,

        /// Target value (0 = untracked, 1 = checkbox)
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        target: i64,
    },

    /// Edit a key result
    Update {
        /// Key result ID (e.g., H-KR1)
        id: String,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New start value
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,

        /// New target value
        #[arg(long, allow_hyphen_values = true)]
        target: Option<i64>,
    },

    /// Record current progress
    Progress {
        /// Key result ID
        id: String,

        /// Current value
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Delete a key result
    Delete {
        /// Key result ID
        id: String,
    },

    /// Set lifecycle status (active, completed, archived)
    Status {
        /// Key result ID
        id: String,

        /// New status
        status: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Task title
        title: String,

        /// Owning theme ID
        #[arg(short = 'T', long)]
        theme: String,

        /// Priority (important-urgent, important-not-urgent, not-important-urgent)
        #[arg(short, long)]
        priority: Option<String>,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Planned day (YYYY-MM-DD)
        #[arg(long)]
        day: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Promote to important-urgent on this date (YYYY-MM-DD)
        #[arg(long)]
        promote_on: Option<String>,

        /// Tags for the task
        #[arg(short, long)]
        tag: Vec<String>,

        /// Parent task ID
        #[arg(long)]
        parent: Option<String>,
    },

    /// List tasks in board order
    List {
        /// Filter by theme
        #[arg(long)]
        theme: Option<String>,

        /// Filter by status (todo, doing, done, archived)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID (e.g., H-T1)
        id: String,
    },

    /// Update task fields
    Update {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// New planned day ("none" clears)
        #[arg(long)]
        day: Option<String>,

        /// New due date ("none" clears)
        #[arg(long)]
        due: Option<String>,

        /// New promotion date ("none" clears)
        #[arg(long)]
        promote_on: Option<String>,

        /// Replace tags (repeatable)
        #[arg(long)]
        tag: Vec<String>,

        /// Remove all tags
        #[arg(long, conflicts_with = "tag")]
        clear_tags: bool,

        /// New parent task ("none" detaches)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Move a task to another column (todo, doing, done)
    Move {
        /// Task ID
        id: String,

        /// Target column
        status: String,

        /// Destination zone order as a comma-separated ID list
        #[arg(long, value_delimiter = ',')]
        order: Vec<String>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// Archive a done task and its subtasks
    Archive {
        /// Task ID
        id: String,
    },

    /// Archive every top-level done task
    ArchiveDone,

    /// Restore an archived task (and archived subtasks) to done
    Restore {
        /// Task ID
        id: String,
    },

    /// Set the manual order of one drop zone
    Reorder {
        /// Drop zone (a todo priority, doing, done)
        zone: String,

        /// Task IDs in order
        ids: Vec<String>,
    },

    /// Show the manual order of every zone
    Order,

    /// Promote tasks whose promotion date has arrived
    Promote {
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
}

/// Calendar subcommands
#[derive(Subcommand, Debug)]
pub enum CalendarCommands {
    /// Show every focus entry of a year
    Show {
        /// Year (e.g., 2026)
        year: i32,
    },

    /// Set the focus for a day
    Set {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Theme in focus
        #[arg(short = 'T', long)]
        theme: Option<String>,

        /// Short focus text
        #[arg(long, default_value = "")]
        text: String,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Remove the focus entry for a day
    Clear {
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

/// Navigation subcommands
#[derive(Subcommand, Debug)]
pub enum NavCommands {
    /// Show stored navigation state
    Show,

    /// Update navigation state
    Set {
        /// Current view
        #[arg(long)]
        view: Option<String>,

        /// Current item
        #[arg(long)]
        item: Option<String>,

        /// Theme filter ("none" clears)
        #[arg(long)]
        theme: Option<String>,

        /// Date filter ("none" clears)
        #[arg(long)]
        date: Option<String>,

        /// Show completed items
        #[arg(long)]
        show_completed: Option<bool>,

        /// Show archived items
        #[arg(long)]
        show_archived: Option<bool>,

        /// Expanded OKR IDs (replaces the list)
        #[arg(long, value_delimiter = ',')]
        expanded: Option<Vec<String>>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get a resolved configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,

        /// Write to the system config instead of the data directory
        #[arg(long)]
        system: bool,
    },

    /// List all resolved configuration values with their sources
    List,
}
