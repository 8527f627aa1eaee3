use calcbridge::cli::{self, ConvertArgs};
use calcbridge::core::SourceKind;
use calcbridge::error::BridgeResult;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calcbridge")]
#[command(about = "Convert worksheet math into canonical calculation text")]
#[command(long_about = "calcbridge - worksheet math to canonical calculation text

Reads already-parsed worksheet content and writes one canonical statement
per line: `name = expression`, unit suffixes (`25cm`), matrix literals
(`[1; 3 | 2; 4]`) and `name(a; b)` calls.

COMMANDS:
  tokens  - Postfix token streams from a math-editor worksheet
  tree    - Expression trees from a CAS worksheet
  sheet   - Spreadsheet cells with values and formulas

EXAMPLES:
  calcbridge tokens regions.yaml
  calcbridge tree worksheet.json -o worksheet.cpd
  calcbridge sheet beam.yaml --no-headings

Warnings never stop a conversion; they are listed on stderr.
Set RUST_LOG (e.g. RUST_LOG=calcbridge=debug) for step-by-step logs.")]
#[command(version)]
struct Cli {
    /// Show progress and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Convert postfix token streams.

Each region is a list of tokens with a kind (operand, operator, function,
bracket), a text and an arity. Operands are pushed; operators and
functions pop as many operands as their arity.

EXAMPLE INPUT:
  regions:
    - tokens:
        - { kind: operand, text: F }
        - { kind: operand, text: m }
        - { kind: operand, text: a }
        - { kind: operator, text: '·', arity: 2 }
        - { kind: operator, text: '≔', arity: 2 }

OUTPUT:
  F = m*a")]
    /// Convert postfix token streams
    Tokens {
        #[command(flatten)]
        args: ConvertArgs,
    },

    #[command(long_about = "Convert expression trees.

Each region is a tree of nodes with a kind (define, eval, apply, id, real,
matrix, ...), optional attributes, children and text. Matrices declare
rows/cols and list their elements column by column.")]
    /// Convert expression trees
    Tree {
        #[command(flatten)]
        args: ConvertArgs,
    },

    #[command(long_about = "Convert spreadsheet cells.

Each sheet lists cells with an address and a value and/or formula. Text to
the left of a value becomes its variable name; a unit to the right becomes
its unit. Output lists labelled inputs, then formulas in dependency order.")]
    /// Convert spreadsheet cells
    Sheet {
        #[command(flatten)]
        args: ConvertArgs,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "calcbridge=debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> BridgeResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Tokens { args } => cli::convert(SourceKind::Tokens, args, cli.verbose),
        Commands::Tree { args } => cli::convert(SourceKind::Tree, args, cli.verbose),
        Commands::Sheet { args } => cli::convert(SourceKind::Sheet, args, cli.verbose),
    }
}
