//! Cochart
//!
//! An animated, responsive bar chart of Colorado's most populous cities, built
//! from a GeoJSON feature collection and rendered headlessly to SVG.
//!
//! # Pipeline
//!
//! - **Data**: GeoJSON features become `CityRow`s with a computed density;
//!   invalid records are dropped and the top 15 by population are kept.
//! - **Specification**: base chart spec, theme and viewport-dependent
//!   overrides are merged into one fresh specification per render.
//! - **Animation**: once the renderer's markup appears, bars either grow in
//!   with a staggered entrance or follow the page's scroll position.
//!
//! # Example
//!
//! ```no_run
//! use cochart::assets::AssetLoader;
//! use cochart::clock::{Clock, TokioClock};
//! use cochart::pipeline::ChartPipeline;
//! use cochart::platform::Page;
//! use cochart::rendering::{RendererOptions, SvgBarRenderer};
//! use cochart::{PipelineConfig, Settings};
//! use std::sync::Arc;
//!
//! # async fn run() -> cochart::Result<()> {
//! let config = PipelineConfig::default();
//! let page = Arc::new(Page::default());
//! let container = page.add_container(&config.container_id);
//! let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
//! let loader = AssetLoader::from_location("public", &config)?;
//! let renderer = Arc::new(SvgBarRenderer::new(clock.clone(), RendererOptions::default()));
//!
//! let pipeline = ChartPipeline::new(config, page, loader, renderer, clock, Settings::default());
//! pipeline.init().await;
//! pipeline.settle().await;
//! println!("{}", container.to_markup());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::PipelineConfig;

pub mod settings;
pub use settings::Settings;

pub mod clock;
pub mod readiness;

pub mod data;
pub mod spec;
pub mod assets;

// Headless page surface the chart is mounted into
pub mod dom;
pub mod platform;
pub use platform::Viewport;

pub mod rendering;
pub mod axis;
pub mod animation;
pub mod smooth_scroll;
pub mod selection;
pub mod resize;

pub mod pipeline;
pub use pipeline::{ChartPipeline, RenderOutcome};
