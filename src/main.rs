use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cochart::assets::AssetLoader;
use cochart::clock::{Clock, TokioClock};
use cochart::data::top_n;
use cochart::pipeline::ChartPipeline;
use cochart::platform::{DeviceMetrics, Page, Viewport};
use cochart::rendering::{RendererOptions, SvgBarRenderer};
use cochart::spec::{assemble, attach_data};
use cochart::{PipelineConfig, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cochart", version, about = "Render the Colorado city population chart headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and write the chart container markup
    Render(RenderArgs),
    /// Print the assembled chart specification as JSON
    Spec(CommonArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Asset directory or base URL
    #[arg(long, default_value = "public")]
    assets: String,
    #[arg(long, default_value_t = 1280)]
    width: u32,
    #[arg(long, default_value_t = 720)]
    height: u32,
    /// JSON file overriding pipeline defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Treat the device as touch-capable
    #[arg(long)]
    touch: bool,
    #[arg(long)]
    no_animations: bool,
    /// Pin the chart to scroll and seek the animation to this progress (0..1)
    #[arg(long)]
    scroll_progress: Option<f64>,
    /// Output file; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
    /// Print the SHA-256 of the rendered chart instead of its markup
    #[arg(long)]
    digest: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_json_file(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

async fn render(args: RenderArgs) -> Result<()> {
    let config = load_config(args.common.config.as_ref())?;
    if let Some(p) = args.scroll_progress {
        if !(0.0..=1.0).contains(&p) {
            bail!("--scroll-progress must be between 0 and 1, got {}", p);
        }
    }

    let viewport = Viewport { width: args.common.width, height: args.common.height };
    let page = Arc::new(Page::new(DeviceMetrics { viewport, touch: args.touch, ..DeviceMetrics::default() }));
    let container = page.add_container(&config.container_id);

    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
    let loader = AssetLoader::from_location(&args.common.assets, &config).context("resolving asset location")?;
    let renderer = Arc::new(SvgBarRenderer::new(clock.clone(), RendererOptions::default()));
    let mut settings = Settings::default();
    if args.no_animations {
        settings = settings.with_animations(false).settings;
    }
    if args.scroll_progress.is_some() {
        settings = settings.with_scroll_pin(true).settings;
    }

    let container_id = config.container_id.clone();
    let pipeline = ChartPipeline::new(config, page, loader, renderer, clock, settings);
    match pipeline.init().await.into_result(&container_id) {
        Ok(rows) => log::info!("rendered {} rows", rows),
        Err(e @ cochart::Error::ContainerNotFound(_)) => return Err(e.into()),
        Err(e) => log::warn!("render failed: {}", e),
    }
    pipeline.settle().await;
    if let Some(p) = args.scroll_progress {
        if !pipeline.seek_scroll_pin(p) {
            log::warn!("no scroll pin to seek; chart has no bars");
        }
    }

    let output = if args.digest {
        match container.with_document(|doc| doc.digest()) {
            Some(d) => format!("{}\n", d),
            None => bail!("nothing rendered to digest"),
        }
    } else {
        container.to_markup()
    };
    match args.out {
        Some(path) => std::fs::write(&path, output).with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", output),
    }
    Ok(())
}

async fn spec(args: CommonArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let loader = AssetLoader::from_location(&args.assets, &config).context("resolving asset location")?;
    let assets = loader.load_all().await;
    let rows = top_n(assets.rows, config.top_n);
    let viewport = Viewport { width: args.width, height: args.height };
    let spec = attach_data(assemble(&assets.chart, &assets.theme, viewport.state()), &rows)?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Render(args) => render(args).await,
        Command::Spec(args) => spec(args).await,
    }
}
