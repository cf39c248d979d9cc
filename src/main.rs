mod config;

use std::path::PathBuf;

use clap::Parser;
use imgpreload::{DefaultSource, Loader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about=None)]
struct CLIArguments {
    /// Images to preload: http(s) URLs, data: URLs or file paths
    urls: Vec<String>,

    /// Load one image at a time, in order
    #[arg(short, long, default_value_t = false)]
    serial: bool,

    /// Directory that relative file paths are resolved against
    #[arg(short, long)]
    root: Option<String>,

    #[arg(short, long, default_value = "./imgpreload.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let CLIArguments {
        urls,
        serial,
        root,
        config: config_path,
    } = CLIArguments::parse();

    if urls.is_empty() {
        anyhow::bail!("Nothing to preload, pass at least one URL.");
    }

    let mut preload_config = config::read(&PathBuf::from(&config_path)).await?;
    preload_config.apply_flags(serial, root);
    let config::LoaderSection { root, options } = preload_config.loader;

    let root = root.unwrap_or_else(|| PathBuf::from("."));
    info!(
        "Preloading {} images, relative paths from `{}`.",
        urls.len(),
        root.display()
    );

    let options = options
        .auto_start(false)
        .on_progress(|event| {
            info!(
                "[{}/{}] #{} {} {}",
                event.completed + event.failed,
                event.total,
                event.index,
                event.status,
                event.url
            );
        })
        .on_complete(|event| {
            info!(
                "Done: {} loaded, {} failed, {} total.",
                event.completed, event.failed, event.total
            );
        });

    let loader = Loader::with_source(urls, options, DefaultSource::with_root(root));
    loader.load().wait().await;

    let failed = loader.get_failed();
    if !failed.is_empty() {
        let names = failed
            .iter()
            .map(|handle| handle.url().to_owned())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::bail!("{} of {} images failed to load: {}", failed.len(), loader.total(), names);
    }

    Ok(())
}
