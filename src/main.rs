use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mesh2motion_bridge::{
    BridgeConfig, ComfyClient, Graph, HostApi, HostGraph, ImageExport, ImageSource, ModelExport,
    WriteBack, locate_asset_url, server,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mesh2motion-bridge", version)]
struct Cli {
    /// YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the editor pages under /mesh2motion.
    Serve,
    /// Print the view URL of the asset a workflow node points at.
    Locate {
        #[arg(long)]
        workflow: PathBuf,
        #[arg(long)]
        node: i64,
    },
    /// Upload an edited asset and point a workflow node at it.
    Push {
        #[arg(long)]
        workflow: PathBuf,
        #[arg(long)]
        node: i64,
        #[arg(long)]
        file: PathBuf,
        /// Treat the file as an image export instead of a model.
        #[arg(long)]
        image: bool,
        /// Name to upload under; defaults to a timestamped name.
        #[arg(long)]
        filename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    match cli.cmd {
        Command::Serve => server::serve(&config.ui.bind, config.ui.root.clone())
            .await
            .context("UI server stopped")?,
        Command::Locate { workflow, node } => {
            let graph = read_workflow(&workflow).await?;
            let client = ComfyClient::new(&config.server_url, &config.api_prefix)?;
            let Some(target) = graph.node(node) else {
                bail!("node {} not in {}", node, workflow.display());
            };
            match locate_asset_url(&client, &config.classifier(), target) {
                Some(url) => println!("{url}"),
                None => println!("new asset"),
            }
        }
        Command::Push {
            workflow,
            node,
            file,
            image,
            filename,
        } => {
            let mut graph = read_workflow(&workflow).await?;
            if graph.node(node).is_none() {
                bail!("node {} not in {}", node, workflow.display());
            }
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = filename.or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            });

            let api: Arc<dyn HostApi> =
                Arc::new(ComfyClient::new(&config.server_url, &config.api_prefix)?);
            let write_back = WriteBack::new(api, Arc::new(config.classifier()));
            let report = if image {
                let export = ImageExport {
                    source: ImageSource::Bytes(data),
                    filename,
                };
                write_back.save_image(&mut graph, export, Some(node)).await?
            } else {
                write_back
                    .save_model(&mut graph, ModelExport { data, filename }, Some(node))
                    .await?
            };

            tokio::fs::write(&workflow, graph.to_json_pretty()?)
                .await
                .with_context(|| format!("Failed to write {}", workflow.display()))?;
            println!("{}", report.widget_value);
            if let Some(err) = report.thumbnail_error {
                eprintln!("thumbnail not refreshed: {err}");
            }
        }
    }
    Ok(())
}

async fn read_workflow(path: &Path) -> Result<Graph> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read workflow {}", path.display()))?;
    Graph::from_json(&text).with_context(|| format!("Failed to parse workflow {}", path.display()))
}
