//! Command-line parsing for the catalog checker.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! checks themselves: every subcommand maps onto one function in
//! `crate::checks`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{KeyStyle, TextRule};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "catcheck", version, about = "Product-catalog export validator")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every check.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Directory reports are written into [env: CATCHECK_OUT_DIR, default: .].
    #[arg(long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// JSON rule book overriding the built-in tables [env: CATCHECK_RULES].
    #[arg(long, global = true, value_name = "JSON")]
    pub rules: Option<PathBuf>,

    /// Fail the run when any row was skipped.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Also write a JSON run summary to this path.
    #[arg(long, global = true, value_name = "JSON")]
    pub summary_json: Option<PathBuf>,

    /// Log progress to stderr (same as RUST_LOG=catalog_checks=info).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a part-number column against a named format family.
    PartNumber(PartNumberArgs),
    /// Per option_part_no, listed dimm_ranks must equal every ranks × rank_width combination.
    DimmRanks(InputArgs),
    /// Per row, the ranks/rank_width code must be listed in dimm_ranks.
    DimmRanksRows(InputArgs),
    /// Per row, every dimm_ranks code must appear in server_dimm_ranks.
    ServerDimmRanks(InputArgs),
    /// Numeric columns must be numbers (or blank) and non-negative.
    Numeric(NumericArgs),
    /// The file's headers must equal the brand's required columns.
    Columns(ColumnsArgs),
    /// The store's categories must be exactly those it is expected to carry.
    Categories(InputArgs),
    /// Every row's category must be a valid category.
    CategoryValues(CategoryValuesArgs),
    /// Per-cell text rules over one or more columns.
    Text(TextArgs),
    /// Compare a processor mapping against a vendor reference list.
    Processors(ProcessorsArgs),
    /// Summarize distinct values of one column grouped by another.
    Group(GroupArgs),
    /// Reconcile a free-text processor/chipset mapping with its normalized destination.
    Mapping(MappingArgs),
}

/// Input file shared by single-file checks.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// CSV or workbook (.xlsx, .xlsm, .xls, .ods) to check.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct PartNumberArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Column holding the part numbers.
    #[arg(long, default_value = "option_part_no")]
    pub column: String,

    /// Format family name (built-in: cisco-option, hpe-mfr).
    #[arg(long, default_value = "cisco-option")]
    pub format: String,

    /// Column echoed into the report when present.
    #[arg(long, default_value = "A")]
    pub context: String,
}

#[derive(Debug, Args, Clone)]
pub struct NumericArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Columns to check.
    #[arg(long, value_delimiter = ',', default_value = "speed,ranks,rank_width")]
    pub columns: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Brand whose required columns apply (inferred from the file name when omitted).
    #[arg(long)]
    pub brand: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CategoryValuesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Also require every valid category to occur at least once.
    #[arg(long)]
    pub require_all: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TextArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Columns to check.
    #[arg(long, value_delimiter = ',', required = true)]
    pub columns: Vec<String>,

    /// Rule applied to each cell.
    #[arg(long, value_enum, default_value_t = TextRule::Charset)]
    pub rule: TextRule,
}

#[derive(Debug, Args, Clone)]
pub struct ProcessorsArgs {
    /// Vendor reference list (e.g. AMD or Intel products).
    #[arg(long, value_name = "FILE")]
    pub reference: PathBuf,

    /// Mapped export to verify.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Only rows whose processor list mentions this vendor are checked ("" for all).
    #[arg(long, default_value = "AMD")]
    pub vendor: String,

    /// Key column in the reference.
    #[arg(long, default_value = "processor_series")]
    pub reference_key: String,

    /// Processor list column in the reference.
    #[arg(long, default_value = "processor")]
    pub reference_list: String,

    /// Key column in the input.
    #[arg(long, default_value = "processor_series")]
    pub input_key: String,

    /// Processor list column in the input.
    #[arg(long, default_value = "final_processor_data")]
    pub input_list: String,

    /// How keys are normalized before matching.
    #[arg(long, value_enum, default_value_t = KeyStyle::Series)]
    pub key_style: KeyStyle,

    /// Also fail rows listing processors absent from the reference.
    #[arg(long)]
    pub fail_on_extra: bool,
}

#[derive(Debug, Args, Clone)]
pub struct GroupArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Grouping column (default: first column).
    #[arg(long)]
    pub key: Option<String>,

    /// Column whose distinct values are collected (default: second column).
    #[arg(long)]
    pub values: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct MappingArgs {
    /// Source mapping with a free-text `processor` column.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Destination export with `all_amd_processor` per part/server/chipset.
    #[arg(long, value_name = "FILE")]
    pub destination: PathBuf,
}
