//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use headerpack::util::shell::ColorChoice;

/// headerpack - package header-only C/C++ libraries
#[derive(Parser)]
#[command(name = "headerpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", env = "HEADERPACK_COLOR")]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter Headerpack.toml
    Init(InitArgs),

    /// Copy every file under SRC into DST, preserving relative paths
    Copy(CopyArgs),

    /// Stage the exported sources into the work directory
    Export(ExportArgs),

    /// Build the package tree, manifest and archive
    Package(PackageArgs),

    /// Show the package descriptor
    Info(InfoArgs),

    /// Check a package tree against its manifest
    Verify(VerifyArgs),

    /// Compile and run test_package/ against the package tree
    Test(TestArgs),

    /// Add the built archive to a local index
    Publish(PublishArgs),

    /// List packages in a local index
    List(ListArgs),

    /// Remove the staged sources, package tree and archives
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Recipe selection shared by recipe-driven commands.
#[derive(Args)]
pub struct RecipeArgs {
    /// Path to Headerpack.toml (searched upward from the cwd by default)
    #[arg(long, env = "HEADERPACK_MANIFEST_PATH")]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,

    /// Package name (defaults to directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Don't write a starter header
    #[arg(long)]
    pub no_header: bool,
}

#[derive(Args)]
pub struct CopyArgs {
    /// Source root
    pub src: PathBuf,

    /// Destination root
    pub dst: PathBuf,

    /// Only copy files matching this glob
    #[arg(long)]
    pub pattern: Option<String>,

    /// Copy matched files directly into DST, dropping subdirectories
    #[arg(long)]
    pub flatten: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct PackageArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Skip the .tar.gz archive
    #[arg(long)]
    pub no_archive: bool,

    /// Remove earlier staged sources, package tree and archives first
    #[arg(long)]
    pub clean: bool,

    /// Show what would be packaged without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Package tree to check (defaults to the recipe's package directory)
    pub package_dir: Option<PathBuf>,

    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct TestArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// C++ compiler to use (defaults to $CXX, then c++, g++, clang++ on PATH)
    #[arg(long)]
    pub compiler: Option<PathBuf>,

    /// Compile only, don't run the test program
    #[arg(long)]
    pub no_run: bool,
}

#[derive(Args)]
pub struct PublishArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Index directory (defaults to index.path from config)
    #[arg(long, env = "HEADERPACK_INDEX")]
    pub index: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only list this package
    pub name: Option<String>,

    /// Resolve one version of NAME (`latest` included)
    #[arg(long, requires = "name")]
    pub version: Option<String>,

    /// Index directory (defaults to index.path from config)
    #[arg(long, env = "HEADERPACK_INDEX")]
    pub index: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
