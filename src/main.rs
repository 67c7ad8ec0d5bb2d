use std::path::Path;

use kube::Client;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use kube_wait_hook::{HookContext, HookFile, ProjectConfig, WaitHook, hook_schema, run_hooks};

const USAGE: &str = "usage: kube-wait-hook <hooks.yaml> [project.yaml] | kube-wait-hook schema";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kube_wait_hook=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let hooks_path = match args.next().or_else(|| std::env::var("WAIT_HOOKS_FILE").ok()) {
        Some(path) if path == "schema" => {
            println!("{}", hook_schema()?);
            return Ok(());
        }
        Some(path) => path,
        None => return Err(USAGE.into()),
    };
    let project_path = args
        .next()
        .or_else(|| std::env::var("WAIT_PROJECT_CONFIG").ok());

    let hooks = HookFile::from_path(&hooks_path)?;
    let (project, dependencies) = match project_path {
        Some(path) => {
            let project = ProjectConfig::from_path(&path)?;
            let base_dir = Path::new(&path).parent().unwrap_or(Path::new("."));
            let dependencies = project.load_dependencies(base_dir)?;
            (Some(project), dependencies)
        }
        None => {
            info!("No project config given, image filters are unavailable");
            (None, Vec::new())
        }
    };

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let cancel = CancellationToken::new();
    let ctx = HookContext::new(client).with_cancellation(cancel.clone());

    // Cancel running waits on Ctrl-C
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received Ctrl-C, cancelling wait");
                cancel.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let waiter = WaitHook::new();
    if let Err(e) = run_hooks(&waiter, &ctx, &hooks, project.as_ref(), &dependencies).await {
        error!("{}", e);
        return Err(e.into());
    }

    info!("All hooks from {} completed", hooks_path);
    Ok(())
}
