use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Function-point project estimation")]
pub struct Cli {
    /// Path to the store file
    #[clap(long)]
    pub file: Option<String>,

    /// Store name to use from the registry
    #[clap(long, short = 's')]
    pub store: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Add a new project
    Add {
        /// Name of the project
        #[clap(long)]
        name: Option<String>,
    },

    /// List all projects
    List,

    /// Show details for a project
    Show {
        /// Project code or UUID
        id: String,
    },

    /// Delete a project and everything it owns
    Del {
        /// Project code or UUID
        id: String,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Record the real effort for a project, in workdays
    Real {
        /// Project code or UUID
        id: String,

        /// Real effort in workdays (0 clears the record)
        days: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum NeedCommand {
    /// Add a new need under a project
    Add {
        /// Parent project code or UUID
        #[clap(long)]
        project: Option<String>,

        /// Name of the need
        #[clap(long)]
        name: Option<String>,

        /// Body text
        #[clap(long)]
        body: Option<String>,

        /// Import the body from a text file
        #[clap(long)]
        from_file: Option<PathBuf>,

        /// Reference URL for the source document
        #[clap(long)]
        url: Option<String>,
    },

    /// List needs, optionally for one project
    List {
        /// Project code or UUID
        #[clap(long)]
        project: Option<String>,
    },

    /// Show details for a need
    Show {
        /// Need code or UUID
        id: String,
    },

    /// Delete a need and its requirements
    Del {
        /// Need code or UUID
        id: String,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReqCommand {
    /// Add a new requirement under a need
    Add {
        /// Parent need code or UUID
        #[clap(long)]
        need: Option<String>,

        /// Name of the requirement
        #[clap(long)]
        name: Option<String>,

        /// Body text
        #[clap(long)]
        body: Option<String>,
    },

    /// List requirements, optionally for one need
    List {
        /// Need code or UUID
        #[clap(long)]
        need: Option<String>,
    },

    /// Show details for a requirement
    Show {
        /// Requirement code or UUID
        id: String,
    },

    /// Edit an existing requirement
    Edit {
        /// Requirement code or UUID
        id: String,

        /// New name
        #[clap(long)]
        name: Option<String>,

        /// New body text
        #[clap(long)]
        body: Option<String>,
    },

    /// Delete a requirement and its entries
    Del {
        /// Requirement code or UUID
        id: String,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    /// Record the estimated quantity of an element type on a requirement
    Set {
        /// Requirement code or UUID
        #[clap(long)]
        req: String,

        /// Affected element type id
        #[clap(long)]
        element: u32,

        /// Estimated quantity
        #[clap(long)]
        quantity: u32,
    },

    /// Select a parameter (e.g. the complexity level) for a requirement
    Select {
        /// Requirement code or UUID
        #[clap(long)]
        req: String,

        /// Parameter name or UUID
        #[clap(long)]
        parameter: String,
    },

    /// Record real figures on an existing quantity entry
    Real {
        /// Requirement code or UUID
        #[clap(long)]
        req: String,

        /// Affected element type id
        #[clap(long)]
        element: u32,

        /// Real quantity delivered
        #[clap(long)]
        quantity: Option<u32>,

        /// Real effort in workdays
        #[clap(long)]
        days: Option<f64>,
    },

    /// List the entries of a requirement
    List {
        /// Requirement code or UUID
        req: String,
    },

    /// Delete a quantity entry
    Del {
        /// Requirement code or UUID
        #[clap(long)]
        req: String,

        /// Affected element type id
        #[clap(long)]
        element: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List the affected element types
    Elements,

    /// List the parameter types
    Types,

    /// List the estimation parameters
    Params,

    /// Add an estimation parameter
    AddParam {
        /// Name of the parameter
        #[clap(long)]
        name: Option<String>,

        /// Parameter type name
        #[clap(long = "type")]
        type_name: Option<String>,

        /// Manually curated factor
        #[clap(long)]
        factor: Option<f64>,

        /// AI-suggested factor
        #[clap(long)]
        factor_ia: Option<f64>,
    },

    /// Edit an estimation parameter's factors
    EditParam {
        /// Parameter name or UUID
        id: String,

        /// Manually curated factor
        #[clap(long)]
        factor: Option<f64>,

        /// AI-suggested factor
        #[clap(long)]
        factor_ia: Option<f64>,
    },

    /// Set the complexity factor for an element type under a parameter
    SetFactor {
        /// Affected element type id
        #[clap(long)]
        element: u32,

        /// Complexity parameter name or UUID
        #[clap(long)]
        parameter: String,

        /// Manually curated multiplier
        #[clap(long)]
        factor: Option<f64>,

        /// AI-suggested multiplier
        #[clap(long)]
        factor_ia: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum EstimateCommand {
    /// Estimate one requirement
    Req {
        /// Requirement code or UUID
        id: String,

        /// Write the per-element efforts back onto the entries
        #[clap(long)]
        refresh: bool,
    },

    /// Estimate all requirements under a need
    Need {
        /// Need code or UUID
        id: String,
    },

    /// Estimate a whole project
    Project {
        /// Project code or UUID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Register a store in the registry
    Register {
        /// Name of the store
        #[clap(long)]
        name: String,

        /// Path to the store file
        #[clap(long)]
        path: PathBuf,

        /// Description of the store
        #[clap(long, default_value = "")]
        description: String,

        /// Set this store as the default
        #[clap(long)]
        default: bool,
    },

    /// List the registered stores
    Registry,

    /// Print the path of the store in use
    Path,

    /// Show store statistics
    Stats,

    /// Migrate the store to another backend file
    Migrate {
        /// Destination file (.yaml or .db)
        to: PathBuf,
    },

    /// Back up the store to a JSON file
    Backup {
        /// Destination JSON file
        output: PathBuf,
    },

    /// Restore the store from a JSON file
    Restore {
        /// Source JSON file
        input: PathBuf,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show the estimator settings
    Show,

    /// Change an estimator setting
    Set {
        /// Setting key (additive-on-empty)
        key: String,

        /// New value
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage projects
    #[clap(subcommand)]
    Project(ProjectCommand),

    /// Manage needs (client requirement documents)
    #[clap(subcommand)]
    Need(NeedCommand),

    /// Manage requirements
    #[clap(subcommand)]
    Req(ReqCommand),

    /// Manage function point entries
    #[clap(subcommand)]
    Entry(EntryCommand),

    /// Inspect and edit the estimation catalogs
    #[clap(subcommand)]
    Catalog(CatalogCommand),

    /// Compute estimates
    #[clap(subcommand)]
    Estimate(EstimateCommand),

    /// Compare a project's estimate against its recorded real effort
    Deviation {
        /// Project code or UUID
        id: String,
    },

    /// Extract requirements from a need document with AI assistance
    Extract {
        /// Need code or UUID
        id: String,

        /// Number of concurrent description calls
        #[clap(long, default_value_t = 4)]
        workers: usize,

        /// Save the extracted requirements instead of just printing them
        #[clap(long)]
        apply: bool,
    },

    /// Export a project estimate report
    Export {
        /// Project code or UUID
        id: String,

        /// Output format (json, csv, markdown)
        #[clap(long, default_value = "json")]
        format: String,

        /// Output file (stdout when omitted)
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Store maintenance
    #[clap(subcommand)]
    Db(DbCommand),

    /// Estimator settings
    #[clap(subcommand)]
    Settings(SettingsCommand),
}
