use anyhow::Result;
use clap::Parser;
use modkeep::commands;
use std::path::PathBuf;

/// modkeep - keep per-instance Minecraft mod sets
///
/// Installs, removes, updates and enables/disables mods of named game
/// instances, resolving them against the Modrinth registry.
///
/// Examples:
///   modkeep instance create Vanilla117 1.19.2
///   modkeep add Vanilla117 sodium
///   modkeep update Vanilla117
#[derive(Parser, Debug)]
#[command(author, version = env!("MODKEEP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Work directory (defaults to the user data directory; also via MODKEEP_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "MODKEEP_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Modrinth API URL (defaults to https://api.modrinth.com/v2)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage game instances
    #[command(subcommand)]
    Instance(InstanceCommands),

    /// Install a mod into an instance
    Add(AddArgs),

    /// Delete a mod from an instance
    Remove(ModArgs),

    /// Enable a disabled mod
    Enable(ModArgs),

    /// Disable a mod without removing it
    Disable(ModArgs),

    /// List the mods of an instance
    List(InstanceArgs),

    /// Show mods with a newer release
    Check(InstanceArgs),

    /// Update mods to their newest release
    Update(UpdateArgs),

    /// Show the compatibility tier of a mod
    Compat(CompatArgs),
}

#[derive(clap::Subcommand, Debug)]
enum InstanceCommands {
    /// Register a new instance
    Create {
        name: String,
        #[arg(value_name = "GAME_VERSION")]
        game_version: String,
    },

    /// List instances
    List,
}

#[derive(clap::Args, Debug)]
pub struct InstanceArgs {
    pub instance: String,
}

#[derive(clap::Args, Debug)]
pub struct ModArgs {
    pub instance: String,
    pub slug: String,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    pub instance: String,
    pub slug: String,

    /// Registry to install from
    #[arg(long, default_value = "modrinth")]
    pub platform: String,

    /// Game version to resolve against (defaults to the instance's)
    #[arg(long = "game-version", value_name = "VERSION")]
    pub game_version: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    pub instance: String,

    /// Mods to update (defaults to every mod with a newer release)
    pub slugs: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct CompatArgs {
    pub name: String,

    #[arg(long, default_value = "modrinth")]
    pub platform: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let manager = commands::open(modkeep::runtime::RealRuntime, cli.root, cli.api_url)?;

    match cli.command {
        Commands::Instance(InstanceCommands::Create { name, game_version }) => {
            commands::create_instance(&manager, &name, &game_version).await?
        }
        Commands::Instance(InstanceCommands::List) => commands::list_instances(&manager)?,
        Commands::Add(args) => {
            commands::add(
                &manager,
                &args.instance,
                &args.platform,
                &args.slug,
                args.game_version.as_deref(),
            )
            .await?
        }
        Commands::Remove(args) => commands::remove(&manager, &args.instance, &args.slug).await?,
        Commands::Enable(args) => {
            commands::set_active(&manager, &args.instance, &args.slug, true).await?
        }
        Commands::Disable(args) => {
            commands::set_active(&manager, &args.instance, &args.slug, false).await?
        }
        Commands::List(args) => commands::list(&manager, &args.instance)?,
        Commands::Check(args) => commands::check(&manager, &args.instance).await?,
        Commands::Update(args) => commands::update(&manager, &args.instance, args.slugs).await?,
        Commands::Compat(args) => commands::compat(&manager, &args.platform, &args.name),
    }
    Ok(())
}
