//! The `photoset describe` command: one image, one description, no dataset.

use clap::Args;
use photoset_core::{Config, ImageInput, VisionProvider, VisionProviderFactory};
use std::path::PathBuf;

/// Arguments for the `describe` command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Image file to describe
    #[arg(required = true)]
    pub image: PathBuf,

    /// Vision API endpoint (DashScope or OpenAI-compatible); not needed with --demo
    #[arg(short, long, env = "PHOTOSET_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API key sent as a bearer token
    #[arg(short = 'k', long, env = "PHOTOSET_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// System prompt
    #[arg(short, long, default_value = "请详细描述这张图片的内容")]
    pub system_prompt: String,

    /// Sampling temperature
    #[arg(short, long, default_value = "0.7")]
    pub temperature: f32,

    /// Use canned descriptions instead of calling the API
    #[arg(long)]
    pub demo: bool,
}

impl DescribeArgs {
    /// Endpoint to call, required outside demo mode.
    fn live_endpoint(&self) -> anyhow::Result<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            anyhow::anyhow!("--endpoint (or PHOTOSET_ENDPOINT) is required unless --demo is set")
        })
    }
}

/// Execute the describe command.
pub async fn execute(args: DescribeArgs, config: Config) -> anyhow::Result<()> {
    let demo = args.demo || config.demo.enabled;
    let endpoint = if demo { None } else { Some(args.live_endpoint()?) };

    let bytes = tokio::fs::read(&args.image)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.image.display()))?;

    let description = if let Some(endpoint) = endpoint {
        photoset_core::describe(
            &bytes,
            endpoint,
            args.api_key.as_deref(),
            &args.system_prompt,
            args.temperature,
            &config.llm,
        )
        .await?
    } else {
        let provider = VisionProviderFactory::demo(&config.demo);
        provider
            .describe(&ImageInput::jpeg(&bytes), &args.system_prompt, args.temperature)
            .await?
    };

    println!("{description}");
    Ok(())
}
