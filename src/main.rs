use anyhow::Result;
use clap::Parser;
use desktop2::browser::SystemBrowser;
use desktop2::wallhaven::WallhavenSource;
use desktop2::wallpaper::SwwwSink;
use desktop2::window::HeadlessWindow;
use desktop2::{Config, Desktop, DesktopOptions, ScreenRegistry, WallpaperController, console, state};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "desktop2")]
#[command(about = "Desktop backdrop with a wallpaper search overlay")]
struct Cli {
    /// `random` applies a random wallpaper on startup
    mode: Option<String>,

    /// Config file (default: ~/.config/desktop2/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config back to disk and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "desktop2=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    if cli.write_config {
        return config.save(cli.config.as_deref());
    }

    info!("Starting Desktop2");

    if let Some(path) = state::default_path() {
        if let Some(current) = state::load_state(&path)?.current {
            info!(
                "Last wallpaper: {:?} ({:?}, {})",
                current.path, current.style, current.applied_at
            );
        }
    }

    let screens = ScreenRegistry::detect(
        config.display.primary.as_deref(),
        &config.display.surfaces,
    )
    .await?;

    let source = Arc::new(WallhavenSource::new(config.search.clone())?);
    let wallpapers = WallpaperController::new(
        Box::new(SwwwSink::new(&config.wallpaper)),
        config.wallpaper.cache_dir(),
    );

    let desktop = Desktop::new(
        screens,
        Box::new(HeadlessWindow::new("desktop")),
        Box::new(HeadlessWindow::new("overlay")),
        source,
        wallpapers,
        Box::new(SystemBrowser),
        DesktopOptions {
            desktop_opacity: config.display.desktop_opacity,
            overlay_opacity: config.display.overlay_opacity,
            style: config.wallpaper.style,
            fetch_concurrency: config.search.fetch_concurrency,
            random_on_start: cli.mode.as_deref() == Some("random"),
        },
    );

    let (tx, rx) = mpsc::channel(16);
    let reader = console::spawn_reader(tx);

    desktop.run(rx).await?;
    reader.abort();

    // the stdin reader parks a blocking thread the runtime would wait on
    std::process::exit(0)
}
