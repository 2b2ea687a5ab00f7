use async_trait::async_trait;
use clap::Parser;
use katachi::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Renders a node from a metadata catalog and prints the result as JSON
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the node metadata catalog JSON file
    catalog_path: PathBuf,
    /// Path to the node instance JSON file (`{ id, type, data }`)
    node_path: PathBuf,
    /// Optional path to a runtime data JSON file
    runtime_path: Option<PathBuf>,

    /// Optional engine configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll the runtime file through the binder for this many render passes
    #[arg(short, long, value_name = "TICKS")]
    watch: Option<u32>,

    /// Pretty-print the rendered node
    #[arg(short, long)]
    pretty: bool,
}

/// Serves runtime data from a JSON file, re-read on every poll tick.
struct FileDataSource {
    path: PathBuf,
}

#[async_trait]
impl RuntimeDataSource for FileDataSource {
    async fn fetch(
        &self,
        _node_id: &str,
        endpoint: &str,
        fields: &[String],
    ) -> std::result::Result<RuntimeData, FetchError> {
        let content = fs::read_to_string(&self.path).map_err(|e| FetchError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        let data: RuntimeData = serde_json::from_str(&content).map_err(|e| FetchError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        if fields.is_empty() {
            return Ok(data);
        }
        Ok(data
            .into_iter()
            .filter(|(key, _)| key == "inputs" || key == "outputs" || fields.contains(key))
            .collect())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    let catalog = MemoryCatalog::from_file(&cli.catalog_path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => EngineConfig::default(),
    };
    let node: NodeInstance = read_json(&cli.node_path);
    let renderer = NodeRenderer::builder(catalog).with_config(config).build();
    tracing::info!(catalog = %cli.catalog_path.display(), node_id = %node.id, elapsed = ?start.elapsed(), "loaded inputs");

    match (cli.watch, cli.runtime_path) {
        (Some(ticks), Some(runtime_path)) => {
            watch(&renderer, &node, runtime_path, ticks, cli.pretty).await;
        }
        (Some(_), None) => exit_with_error("--watch needs a runtime data file to poll"),
        (None, runtime_path) => {
            let runtime: Option<RuntimeData> = runtime_path.as_deref().map(read_json);
            let rendered = renderer.render(&node, runtime.as_ref());
            print_node(&rendered, cli.pretty);
        }
    }
}

/// Renders the node once per poll interval while the binder polls the runtime file.
async fn watch(renderer: &NodeRenderer, node: &NodeInstance, runtime_path: PathBuf, ticks: u32, pretty: bool) {
    let source = Arc::new(FileDataSource { path: runtime_path });
    let mut binder = renderer.binder(node, source);
    let interval = renderer
        .metadata(&node.node_type)
        .and_then(|m| m.visual.as_ref())
        .and_then(|v| v.runtime.as_ref())
        .map(|r| renderer.config().polling.interval(r.update_interval))
        .unwrap_or_else(|| renderer.config().polling.interval(None));

    let mut updates = binder.subscribe();
    for tick in 0..ticks {
        let rendered = renderer.render_bound(node, &mut binder);
        tracing::debug!(tick, state = ?binder.state(), "render pass");
        print_node(&rendered, pretty);
        if tokio::time::timeout(interval, updates.changed()).await.is_err() {
            tracing::debug!(tick, "no new runtime data this interval");
        }
    }
    binder.teardown();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read '{}': {}", path.display(), e))
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to parse '{}': {}", path.display(), e))
    })
}

fn print_node(rendered: &RenderedNode, pretty: bool) {
    let value: Value = serde_json::to_value(rendered)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialise rendered node: {}", e)));
    let text = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => exit_with_error(&format!("Failed to serialise rendered node: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
