use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use rules_query::cli::{self, CliError, CompileOptions, CompileResult, Target};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "rules")]
#[command(about = "Rules - Compile product filter rules into document-store and search-engine queries")]
#[command(version)]
struct Cli {
    /// Log pipeline stages to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and compile query specs
    Compile {
        /// Attribute schema JSON file
        #[arg(short, long)]
        schema: String,

        /// Output target
        #[arg(short, long, value_enum, default_value_t = TargetArg::Document)]
        target: TargetArg,

        /// Query spec JSON, one spec or an array (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate and coerce, don't emit
        #[arg(long)]
        validate_only: bool,

        /// Compiler config JSON file
        #[arg(long)]
        config: Option<String>,

        /// Identity field exempt from the exact-match suffix
        #[arg(long)]
        identity_field: Option<String>,

        /// Suffix of the exact-match sub-field in the search index
        #[arg(long)]
        keyword_suffix: Option<String>,
    },

    /// Show the relationship and connective table
    Operators,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Document,
    Search,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Document => Target::Document,
            TargetArg::Search => Target::Search,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            schema,
            target,
            input,
            pretty,
            validate_only,
            config,
            identity_field,
            keyword_suffix,
        } => run_compile(CompileArgs {
            schema,
            target: target.into(),
            input,
            pretty,
            validate_only,
            config,
            identity_field,
            keyword_suffix,
        }),
        Commands::Operators => {
            print!("{}", cli::get_operator_table());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("rules_query=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

struct CompileArgs {
    schema: String,
    target: Target,
    input: Option<String>,
    pretty: bool,
    validate_only: bool,
    config: Option<String>,
    identity_field: Option<String>,
    keyword_suffix: Option<String>,
}

fn run_compile(args: CompileArgs) -> Result<(), CliError> {
    let input = match args.input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let mut config = match &args.config {
        Some(path) => cli::load_config(path)?,
        None => Default::default(),
    };
    if let Some(field) = args.identity_field {
        config.identity_field = field;
    }
    if let Some(suffix) = args.keyword_suffix {
        config.keyword_suffix = suffix;
    }

    let options = CompileOptions {
        schema: cli::load_schema(&args.schema)?,
        input,
        target: args.target,
        config,
        validate_only: args.validate_only,
    };

    match cli::execute_compile(&options)? {
        CompileResult::Valid(count) => println!("{} query spec(s) valid", count),
        CompileResult::Success(output) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
