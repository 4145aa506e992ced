use clap::{Parser, Subcommand};
use cmsgen::pipeline::{self, BuildOutcome};
use cmsgen::source::HttpSource;
use cmsgen::{assets, config, output};
use std::path::{Path, PathBuf};
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

fn version_string() -> &'static str {
    if env!("CMSGEN_ON_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    let hash = env!("CMSGEN_GIT_HASH");
    if hash.is_empty() {
        return concat!(env!("CARGO_PKG_VERSION"), "-dev");
    }
    let dirty = if env!("CMSGEN_GIT_DIRTY") == "true" { ".dirty" } else { "" };
    // Leaked once at startup
    Box::leak(format!("{}-dev+{hash}{dirty}", env!("CARGO_PKG_VERSION")).into_boxed_str())
}

#[derive(Parser)]
#[command(name = "cmsgen")]
#[command(about = "Render a headless-CMS blog into static HTML")]
#[command(long_about = "\
Render a headless-CMS blog into static HTML

Articles and categories are fetched from a microCMS-style list API and
rendered through your Tera templates. The output directory is deleted and
rebuilt on every run.

Resources layout:

  resources/
  ├── static/                      # Copied verbatim into the output root
  └── templates/
      ├── blog/
      │   ├── index.html           # Main and category listings
      │   └── article.html         # One page per article
      ├── singles/                 # Each *.html → same path in the output
      │   └── about.html
      └── components/              # Shared partials ({% include %}, {% extends %})
          └── base.html

Output layout:

  output/
  ├── index.html, page/N/index.html
  ├── articles/<id>.html
  ├── articles/category/<id>/index.html, .../page/N/index.html
  ├── latest.json, category.json
  └── <singles>

Environment variables override the config file; a .env file in the working
directory is read as a fallback for them: MICROCMS_API_KEY,
SERVICE_DOMAIN, RESOURCES_PATH, EXPORT_PATH, TEMPLATES_PATH,
BLOG_TEMPLATES_PATH, SINGLES_TEMPLATES_PATH, COMPONENTS_PATH, STATIC_PATH,
PAGE_SHOW_LIMIT, LATEST_ARTICLES, TIMEZONE, CATEGORY_TAG_NAME.

Run 'cmsgen gen-config' to generate a documented cmsgen.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Show debug logs (request URLs, timings)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch content and render the whole site
    Build,
    /// Parse every template without fetching or writing anything
    Check,
    /// Create an empty resources directory skeleton
    Init,
    /// Print a stock cmsgen.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Build => {
            let settings = load_settings(&cli.config)?;
            init_thread_pool(&settings.processing);
            let (domain, api_key) = settings.credentials()?;
            let source = HttpSource::new(domain, api_key, settings.timeout)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_build_event(&event);
                }
            });
            let result = pipeline::build(&settings, &source, Some(tx));
            printer.join().map_err(|_| "progress printer panicked")?;

            if let BuildOutcome::Scaffolded(_) = result? {
                println!("==> Nothing to build yet");
            }
        }
        Command::Check => {
            let settings = load_settings(&cli.config)?;
            println!("==> Checking templates");
            let report = pipeline::check(&settings)?;
            output::print_check_report(&report, &settings.paths.blog_templates);
            println!("==> Templates are valid");
        }
        Command::Init => {
            let settings = load_settings(&cli.config)?;
            let created = assets::scaffold_resources(&settings.paths)?;
            if created.is_empty() {
                println!("==> {} already exists", settings.paths.resources.display());
            }
            for dir in created {
                println!("Created {}", dir.display());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file, apply environment overrides (shell, then `.env`),
/// and resolve.
fn load_settings(path: &Path) -> Result<config::BuildSettings, config::ConfigError> {
    let dotenv = config::load_dotenv(Path::new(config::DEFAULT_DOTENV_FILE))?;
    let lookup = config::env_lookup(|key| std::env::var(key).ok(), &dotenv);
    let (site_config, env_warnings) = config::load_config(path, lookup)?;
    let (settings, warnings) = site_config.resolve()?;
    for warning in env_warnings.iter().chain(&warnings) {
        warn!("{warning}");
    }
    Ok(settings)
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
