mod server;

use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use switchyard_config::GraphDef;
use switchyard_graph::Graph;
use switchyard_invoker::{HttpInvoker, InvokerConfig};
use switchyard_router::{DEFAULT_MAX_DEPTH, Router, RouterConfig};

/// Switchyard - An inference graph router
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Serve the graph over HTTP
  Serve {
    #[command(flatten)]
    graph: GraphSource,

    #[command(flatten)]
    routing: RoutingArgs,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
  },

  /// Route a single payload read from stdin and print the response
  Run {
    #[command(flatten)]
    graph: GraphSource,

    #[command(flatten)]
    routing: RoutingArgs,

    /// Start at this node instead of the root
    #[arg(long)]
    node: Option<String>,
  },
}

/// Where the graph definition comes from. `--graph-file` wins when both are set.
#[derive(Args)]
struct GraphSource {
  /// Graph definition as inline JSON
  #[arg(long, env = "GRAPH_JSON", hide_env_values = true)]
  graph_json: Option<String>,

  /// Path to a graph definition file (JSON)
  #[arg(long)]
  graph_file: Option<PathBuf>,
}

#[derive(Args)]
struct RoutingArgs {
  /// Per-call timeout for downstream services, in milliseconds
  #[arg(long)]
  timeout_ms: Option<u64>,

  /// Deepest chain of nested nodes a request may reach
  #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
  max_depth: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr so `run` output can be piped
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("switchyard=info,warn")),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Serve {
      graph,
      routing,
      bind,
    } => serve(graph, routing, bind).await,
    Commands::Run {
      graph,
      routing,
      node,
    } => run(graph, routing, node).await,
  }
}

async fn serve(source: GraphSource, routing: RoutingArgs, bind: SocketAddr) -> Result<()> {
  let graph = load_graph(&source)?;
  let router = Arc::new(build_router(graph, &routing)?);

  let shutdown = CancellationToken::new();
  let signal = shutdown.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("shutdown_requested");
    }
    signal.cancel();
  });

  server::serve(bind, router, shutdown).await
}

async fn run(source: GraphSource, routing: RoutingArgs, node: Option<String>) -> Result<()> {
  let graph = load_graph(&source)?;
  let router = build_router(graph, &routing)?;

  let payload = read_payload_from_stdin()?;

  let response = match node {
    Some(node) => router.execute_node(&node, payload).await,
    None => router.execute(payload).await,
  }
  .context("routing failed")?;

  println!("{}", String::from_utf8_lossy(&response));

  Ok(())
}

fn load_graph(source: &GraphSource) -> Result<Graph> {
  let def = match (&source.graph_file, &source.graph_json) {
    (Some(path), _) => GraphDef::from_file(path)
      .with_context(|| format!("failed to load graph file: {}", path.display()))?,
    (None, Some(json)) => GraphDef::from_json(json).context("failed to parse --graph-json")?,
    (None, None) => bail!("no graph given: pass --graph-file or --graph-json (or set GRAPH_JSON)"),
  };

  let graph = Graph::new(def);
  if graph.root().is_none() {
    warn!("graph_has_no_root");
  }
  for (node, step, error) in graph.condition_errors() {
    warn!(node = %node.name, step = step.index, error = %error, "condition_invalid");
  }
  info!(nodes = graph.len(), "graph_loaded");

  Ok(graph)
}

fn build_router(graph: Graph, routing: &RoutingArgs) -> Result<Router> {
  let invoker = HttpInvoker::new(InvokerConfig {
    timeout: routing.timeout_ms.map(Duration::from_millis),
    connect_timeout: None,
  })
  .context("failed to create http client")?;

  Ok(Router::new(graph, Arc::new(invoker)).with_config(RouterConfig {
    max_depth: routing.max_depth,
  }))
}

fn read_payload_from_stdin() -> Result<Bytes> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    return Ok(Bytes::from_static(b"{}"));
  }

  let mut input = Vec::new();
  io::stdin()
    .read_to_end(&mut input)
    .context("failed to read payload from stdin")?;

  if input.iter().all(u8::is_ascii_whitespace) {
    Ok(Bytes::from_static(b"{}"))
  } else {
    Ok(Bytes::from(input))
  }
}
