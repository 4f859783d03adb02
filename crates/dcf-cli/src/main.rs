//! Default config filter CLI
//!
//! Runs the filter flows outside a live host: inspect the base dependency
//! set, provision the entry from `configuration.yaml`, or check
//! extra-domain text the way the form would.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dcf_config::FilterConfig;
use dcf_config_entries::ConfigEntries;
use dcf_flow::{
    parse_extra_domains, ConfigFlow, FileManifestSource, FlowManager, ManifestSource,
    StaticManifestSource,
};
use dcf_service_registry::ServiceRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Stand-in manifest for flows that never offer the domain list
const EMPTY_MANIFEST: &str = r#"{"domain": "default_config", "name": "Default Config"}"#;

#[derive(Parser)]
#[command(name = "default-config-filter")]
#[command(about = "Choose which default_config integrations to disable", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the domains default_config depends on (minus `config`)
    Dependencies {
        /// Host components directory containing default_config/
        #[arg(long, env = "DCF_COMPONENTS_DIR")]
        components: PathBuf,
    },
    /// Import the default_config_filter section of configuration.yaml
    Import {
        /// Directory containing configuration.yaml
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,
        /// Host components directory; import never reads the manifest
        #[arg(long, env = "DCF_COMPONENTS_DIR")]
        components: Option<PathBuf>,
    },
    /// Check comma-separated extra domains
    Validate {
        /// Text as it would be typed into the form
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Dependencies { components } => {
            let entries = Arc::new(ConfigEntries::new());
            let mut flow = ConfigFlow::new(Arc::new(FileManifestSource::new(&components)), entries);
            for domain in flow.base_dependencies().await? {
                println!("{}", domain);
            }
        }
        Commands::Import {
            config_dir,
            components,
        } => {
            let config = FilterConfig::load(&config_dir)
                .with_context(|| format!("loading {}", config_dir.display()))?;

            let manifests: Arc<dyn ManifestSource> = match components {
                Some(components) => Arc::new(FileManifestSource::new(&components)),
                None => Arc::new(StaticManifestSource::from_json(EMPTY_MANIFEST)?),
            };

            let manager = FlowManager::new(
                manifests,
                Arc::new(ConfigEntries::new()),
                Arc::new(ServiceRegistry::new()),
            );

            let Some(response) = manager.setup_from_config(config.as_ref()).await? else {
                bail!("no {} section in configuration.yaml", dcf_core::DOMAIN);
            };

            info!(result = %response.result_type, "Import finished");
            match response.result {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry["options"])?),
                None => bail!(
                    "import did not create an entry: {}",
                    response.reason.unwrap_or_default()
                ),
            }
        }
        Commands::Validate { text } => match parse_extra_domains(&text) {
            Ok(domains) => {
                for domain in domains {
                    println!("{}", domain);
                }
            }
            Err(invalid) => bail!("{}", invalid),
        },
    }

    Ok(())
}
