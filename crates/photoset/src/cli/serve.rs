//! The `photoset serve` command.

use crate::server;
use clap::Args;
use photoset_core::Config;
use std::path::PathBuf;

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Use canned descriptions instead of calling a vision API
    #[arg(long, env = "PHOTOSET_DEMO")]
    pub demo: bool,

    /// Directory for uploaded images
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Directory for generated datasets
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Layer command-line overrides on top of the loaded config.
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.demo {
            config.demo.enabled = true;
        }
        if let Some(dir) = self.upload_dir {
            config.storage.upload_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.storage.output_dir = dir;
        }
    }
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;
    server::serve(config).await
}
