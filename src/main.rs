use clap::{Parser, Subcommand};
use inkpress::cms::{ContentSource, PrismicClient, ResponseCache};
use inkpress::{config, fetch, generate, output};
use std::path::{Path, PathBuf};

/// Shared flags for commands that talk to the CMS.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Ignore cached CMS responses and request everything again
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(about = "Static blog generator for a headless CMS")]
#[command(long_about = "\
Static blog generator for a headless CMS

Posts live in a Prismic repository. Inkpress pulls the post listing batch by
batch, loads every post by its UID, and writes a plain HTML site: a home page
that grows one batch at a time through a \"load more\" link, and one page per
post with its reading time.

Site structure:

  site/
  ├── config.toml                  # Site config (optional, overrides defaults)
  └── assets/                      # Static assets (logo, favicon) → copied to output root

Environment:
  PRISMIC_API_ENDPOINT   Overrides cms.endpoint
  PRISMIC_ACCESS_TOKEN   Access token for private repositories
  RUST_LOG               Log level (default: warn)

Run 'inkpress gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site directory (config.toml and assets/)
    #[arg(long, default_value = "site", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest, CMS response cache)
    #[arg(long, default_value = ".inkpress-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch posts from the CMS into a manifest
    Fetch(CacheArgs),
    /// Produce the final HTML site from the manifest
    Generate,
    /// Run the full pipeline: fetch → generate
    Build(CacheArgs),
    /// Validate config and CMS access without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let manifest_path = cli.temp_dir.join("manifest.json");

    match cli.command {
        Command::Fetch(cache_args) => {
            run_fetch(&cli.source, &cli.temp_dir, !cache_args.no_cache)?;
        }
        Command::Generate => {
            let manifest = fetch::load_manifest(&manifest_path)?;
            init_thread_pool(&manifest.config.processing);
            generate::generate(&manifest, &cli.source, &cli.output)?;
            output::print_generate_output(&manifest);
        }
        Command::Build(cache_args) => {
            println!("==> Stage 1: Fetching posts");
            let manifest = run_fetch(&cli.source, &cli.temp_dir, !cache_args.no_cache)?;

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            init_thread_pool(&manifest.config.processing);
            generate::generate(&manifest, &cli.source, &cli.output)?;
            output::print_generate_output(&manifest);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site_config = config::load_config(&cli.source)?;
            let client = PrismicClient::new(&site_config, ResponseCache::empty())?;
            let first = client.first_page(site_config.cms.page_size)?;
            output::print_check_output(
                &site_config.cms.endpoint,
                &first,
                site_config.site.date_locale,
            );
            println!("==> Config and CMS are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the fetch stage and write its manifest to the temp directory.
///
/// The response cache is always saved afterwards; `use_cache` only decides
/// whether the run starts from it.
fn run_fetch(
    source: &Path,
    temp_dir: &Path,
    use_cache: bool,
) -> Result<fetch::Manifest, Box<dyn std::error::Error>> {
    let site_config = config::load_config(source)?;
    let cache = if use_cache {
        ResponseCache::load(temp_dir)
    } else {
        ResponseCache::empty()
    };

    let client = PrismicClient::new(&site_config, cache)?;
    let manifest = fetch::fetch(&client, &site_config)?;
    let stats = client.cache_stats();

    std::fs::create_dir_all(temp_dir)?;
    client.into_cache().save(temp_dir)?;
    fetch::write_manifest(&manifest, &temp_dir.join("manifest.json"))?;

    output::print_fetch_output(&manifest);
    println!("Cache: {}", stats);
    Ok(manifest)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
