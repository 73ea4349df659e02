//! elbgate CLI
//!
//! Lifecycle hook invoked by the deployment agent to take this host out of its
//! classic load balancers during a deployment and put it back afterwards.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elbgate_core::config::loader::{load_settings, resolve_config_path};
use elbgate_core::{AssociationCache, DeploymentGroupId, MetadataClient, Reporter, Settings};
use elbgate_loadbalance::{
    AwsElbClient, HealthPolicy, HookAction, HookContext, LifecycleError, LifecycleEvent,
    LoadBalancerClient,
};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "elbgate")]
#[command(about = "Drain and restore this host on its load balancers during a deployment")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults to $ELBGATE_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the load balancers this instance belongs to and cache them
    Discover,
    /// Deregister this instance from every cached load balancer
    Deregister,
    /// Register this instance with every cached load balancer
    Register,
    /// Wait until this instance is InService on every cached load balancer
    WaitHealthy,
    /// Run the operation mapped to a lifecycle event
    Run {
        /// Lifecycle event name; read from $LIFECYCLE_EVENT when omitted
        event: Option<String>,
    },
    /// Print the cached load balancer names for this deployment group
    Show,
    /// Validate configuration file
    ValidateConfig,
    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "elbgate.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 日志输出到stderr，stdout留给钩子结果行
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    let status = match cli.command {
        Commands::Discover => run_hook(config_path.as_deref(), HookAction::Discover).await?,
        Commands::Deregister => run_hook(config_path.as_deref(), HookAction::Deregister).await?,
        Commands::Register => run_hook(config_path.as_deref(), HookAction::Register).await?,
        Commands::WaitHealthy => {
            run_hook(config_path.as_deref(), HookAction::WaitUntilHealthy).await?
        }
        Commands::Run { event } => {
            let event = match event {
                Some(name) => name.parse::<LifecycleEvent>()?,
                None => LifecycleEvent::from_env()?,
            };
            info!("Lifecycle event {} maps to {}", event, event.action());
            run_hook(config_path.as_deref(), event.action()).await?
        }
        Commands::Show => {
            let settings = load_settings(config_path.as_deref())?;
            let cache = group_cache(&settings)?;
            let record = cache.load().await?;
            println!("{}", cache.path().display());
            for name in &record {
                println!("  {name}");
            }
            0
        }
        Commands::ValidateConfig => {
            let path = config_path
                .context("no configuration file given; pass --config or set ELBGATE_CONFIG")?;
            println!("Validating configuration file: {}", path);
            match load_settings(Some(&path)) {
                Ok(settings) => {
                    println!("✅ Configuration is valid");
                    println!("  - metadata document: {}", settings.metadata.document_url);
                    println!("  - cache directory: {}", settings.cache.directory);
                    println!(
                        "  - health check: {} attempts, {}s apart",
                        settings.health_check.max_attempts,
                        settings.health_check.retry_interval_seconds
                    );
                    0
                }
                Err(e) => {
                    eprintln!("❌ Configuration validation failed: {:#}", e);
                    1
                }
            }
        }
        Commands::GenerateConfig { output } => {
            println!("Generating configuration file: {}", output);
            generate_config_file(&output)?;
            println!("✅ Configuration file generated successfully");
            0
        }
    };

    Ok(ExitCode::from(status))
}

/// 当前部署组的缓存文件
fn group_cache(settings: &Settings) -> Result<AssociationCache> {
    let group = DeploymentGroupId::from_env()?;
    Ok(AssociationCache::for_group(&settings.cache.directory, &group))
}

/// 启动时构建一次钩子上下文
async fn build_context(settings: &Settings) -> Result<HookContext<AwsElbClient>> {
    // 先检查环境变量，避免无谓的网络请求
    let cache = group_cache(settings)?;

    let identity = MetadataClient::new(&settings.metadata)?
        .resolve()
        .await
        .context("failed to read instance identity")?;

    let region = settings.effective_region(&identity.region).to_string();
    let client = AwsElbClient::from_region(region).await;

    Ok(HookContext::new(
        identity,
        client,
        cache,
        HealthPolicy::from(&settings.health_check),
    ))
}

async fn run_hook(config_path: Option<&str>, action: HookAction) -> Result<u8> {
    let settings = load_settings(config_path)?;
    let context = build_context(&settings).await?;
    execute(&context, action).await
}

/// 执行钩子操作并得到进程退出状态
async fn execute<C: LoadBalancerClient>(
    context: &HookContext<C>,
    action: HookAction,
) -> Result<u8> {
    exit_status(action, context.run(action).await, context.reporter())
}

/// 健康检查未通过时输出 [FATAL] 并返回 1，通知部署代理停止部署；
/// 其余错误附加操作名后向上返回
fn exit_status(
    action: HookAction,
    result: Result<(), LifecycleError>,
    reporter: &Reporter,
) -> Result<u8> {
    match result {
        Ok(()) => Ok(0),
        Err(err @ LifecycleError::NotInService { .. }) => {
            reporter.fatal(&err);
            Ok(1)
        }
        Err(err) => Err(err).with_context(|| format!("{action} failed")),
    }
}

/// 生成配置文件
fn generate_config_file(output_path: &str) -> Result<()> {
    let config_content = r#"# elbgate configuration file
# Every key is optional; the values below are the built-in defaults.

[metadata]
document_url = "http://169.254.169.254/latest/dynamic/instance-identity/document"
token_url = "http://169.254.169.254/latest/api/token"
use_token = true
token_ttl_seconds = 21600
timeout_seconds = 5

[cache]
# Cache file: <directory>/deploy_<DEPLOYMENT_GROUP_ID>_elbs.json
directory = "/tmp"

[health_check]
max_attempts = 10
retry_interval_seconds = 4

[aws]
# Overrides the region reported by the instance identity document
# region = "us-east-1"
"#;

    std::fs::write(output_path, config_content)?;
    Ok(())
}
