use anyhow::Result;
use clap::Parser;
use fjspm::commands::{self, ImportSource};
use fjspm::config::{DEFAULT_MAX_FILES, DEFAULT_NAMESPACE, MaterializeOptions, ResolutionMode, ResolverConfig};
use std::path::PathBuf;

/// fjspm - package resolver and materializer
///
/// Resolves import specifiers against the builtin SDK, local paths and
/// node_modules, then copies the resolved packages into a deduplicated
/// output tree.
///
/// Examples:
///   fjspm resolve @builtin/widgets ./local/helpers left-pad
///   fjspm install --imports imports.json --out build/deps
///   fjspm check-export left-pad Pad
#[derive(Parser, Debug)]
#[command(author, version = env!("FJSPM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root to resolve from (defaults to the current directory)
    #[arg(long = "root", short = 'r', env = "FJSPM_ROOT", value_name = "PATH", global = true)]
    pub root: Option<PathBuf>,

    /// Replace missing packages with empty stubs instead of failing
    #[arg(long, env = "FJSPM_TOLERANT", global = true)]
    pub tolerant: bool,

    /// Warn about packages with more files than this
    #[arg(long = "max-files", value_name = "N", default_value_t = DEFAULT_MAX_FILES, global = true)]
    pub max_files: usize,

    /// Reserved namespace for builtin packages
    #[arg(long, value_name = "SCOPE", default_value = DEFAULT_NAMESPACE, global = true)]
    pub namespace: String,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve imports and print the result
    Resolve(ResolveArgs),

    /// Resolve imports and copy the packages into an output directory
    Install(InstallArgs),

    /// Check whether a package exports a symbol
    #[command(name = "check-export")]
    CheckExport(CheckExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Import specifiers, e.g. "@builtin/widgets", "./local/helpers", "left-pad"
    #[arg(value_name = "SPECIFIER")]
    pub specifiers: Vec<String>,

    /// JSON file holding an import list
    #[arg(long, value_name = "FILE")]
    pub imports: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: ImportArgs,

    /// Print the resolution map as JSON instead of a report
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub input: ImportArgs,

    /// Output directory
    #[arg(long = "out", short = 'o', env = "FJSPM_OUT", value_name = "DIR")]
    pub out: PathBuf,

    /// Copy packages one at a time
    #[arg(long)]
    pub sequential: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckExportArgs {
    /// Package name
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Export symbol, e.g. "default"
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,
}

impl Cli {
    fn mode(&self) -> ResolutionMode {
        if self.tolerant {
            ResolutionMode::Tolerant
        } else {
            ResolutionMode::Strict
        }
    }

    fn resolver_config(&self, root: PathBuf) -> ResolverConfig {
        ResolverConfig::new(root)
            .with_mode(self.mode())
            .with_max_files(self.max_files)
            .with_namespace(&self.namespace)
    }
}

impl From<ImportArgs> for ImportSource {
    fn from(args: ImportArgs) -> Self {
        ImportSource::new(args.specifiers, args.imports)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = fjspm::runtime::RealRuntime;

    let root = commands::project_root(&runtime, cli.root.clone())?;
    let config = cli.resolver_config(root);
    let mode = cli.mode();

    match cli.command {
        Commands::Resolve(args) => {
            commands::resolve(runtime, &config, &args.input.into(), args.json)?
        }
        Commands::Install(args) => {
            let mut options = MaterializeOptions::new(args.out).with_mode(mode);
            if args.sequential {
                options = options.sequential();
            }
            commands::install(runtime, &config, &args.input.into(), &options)?
        }
        Commands::CheckExport(args) => {
            commands::check_export(runtime, &config, &args.package, &args.symbol)?
        }
    }
    Ok(())
}
