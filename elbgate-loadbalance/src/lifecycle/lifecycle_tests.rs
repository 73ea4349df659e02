use super::mock::{Call, RecordingClient};
use super::*;
use crate::client::{InstanceHealth, LoadBalancerMembership};
use elbgate_core::{
    AssociationCache, AssociationRecord, CacheError, DeploymentGroupId, InstanceIdentity,
    MemorySink, Reporter,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

const INSTANCE: &str = "i-0123456789abcdef0";

fn test_cache(dir: &TempDir) -> AssociationCache {
    let group = DeploymentGroupId::new("d-TESTGROUP").unwrap();
    AssociationCache::for_group(dir.path(), &group)
}

fn test_context(client: RecordingClient, dir: &TempDir) -> HookContext<RecordingClient> {
    captured_context(client, dir).0
}

/// 结果行写入内存，返回上下文和输出端
fn captured_context(
    client: RecordingClient,
    dir: &TempDir,
) -> (HookContext<RecordingClient>, MemorySink) {
    let sink = MemorySink::default();
    let context = HookContext::new(
        InstanceIdentity::new(INSTANCE, "us-east-1"),
        client,
        test_cache(dir),
        HealthPolicy::default(),
    )
    .with_reporter(Reporter::new(sink.clone()));
    (context, sink)
}

/// 暂停时钟下计时器按毫秒取整，只比较整秒
fn assert_waited(start: Instant, seconds: u64) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_secs(seconds) && elapsed < Duration::from_secs(seconds + 1),
        "expected about {seconds}s of waiting, got {elapsed:?}"
    );
}

async fn seed_cache(dir: &TempDir, names: &[&str]) {
    let record: AssociationRecord = names.iter().map(|n| n.to_string()).collect();
    test_cache(dir).store(&record).await.unwrap();
}

#[test]
fn test_associated_load_balancers_exact_match_only() {
    let memberships = vec![
        LoadBalancerMembership::new("lb-a", vec![INSTANCE.to_string()]),
        LoadBalancerMembership::new("lb-other", vec!["i-999".to_string()]),
        LoadBalancerMembership::new("lb-prefix", vec![format!("{INSTANCE}1")]),
        LoadBalancerMembership::new("lb-b", vec!["i-111".to_string(), INSTANCE.to_string()]),
    ];

    let record = associated_load_balancers(&memberships, INSTANCE);
    assert_eq!(record.names(), ["lb-a", "lb-b"]);
}

#[test]
fn test_associated_load_balancers_repeats_on_duplicate_membership() {
    let memberships = vec![LoadBalancerMembership::new(
        "lb-a",
        vec![INSTANCE.to_string(), INSTANCE.to_string()],
    )];

    let record = associated_load_balancers(&memberships, INSTANCE);
    assert_eq!(record.names(), ["lb-a", "lb-a"]);
}

#[tokio::test]
async fn test_discover_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let client = RecordingClient::new()
        .with_membership("lb-a", &[INSTANCE, "i-aaa"])
        .with_membership("lb-unrelated", &["i-bbb"])
        .with_membership("lb-b", &[INSTANCE]);
    let context = test_context(client, &dir);

    let discovered = context.discover().await.unwrap();
    let loaded = context.cache().load().await.unwrap();

    assert_eq!(discovered.names(), ["lb-a", "lb-b"]);
    assert_eq!(loaded, discovered);
    assert_eq!(context.client().calls(), vec![Call::ListAll]);
}

#[tokio::test]
async fn test_discover_overwrites_stale_cache() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-old"]).await;
    let context = test_context(RecordingClient::new().with_membership("lb-new", &[INSTANCE]), &dir);

    context.discover().await.unwrap();

    assert_eq!(context.cache().load().await.unwrap().names(), ["lb-new"]);
}

#[tokio::test]
async fn test_discover_with_no_membership_writes_empty_record() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(RecordingClient::new().with_membership("lb-a", &["i-aaa"]), &dir);

    context.discover().await.unwrap();

    assert!(context.cache().load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_operations_fail_without_cache() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(RecordingClient::new(), &dir);

    assert!(matches!(
        context.deregister_all().await,
        Err(LifecycleError::Cache(CacheError::Missing { .. }))
    ));
    assert!(matches!(
        context.register_all().await,
        Err(LifecycleError::Cache(CacheError::Missing { .. }))
    ));
    assert!(matches!(
        context.wait_until_healthy().await,
        Err(LifecycleError::Cache(CacheError::Missing { .. }))
    ));
    assert!(context.client().calls().is_empty());
}

#[tokio::test]
async fn test_deregister_then_register_in_record_order() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-b", "lb-a", "lb-c"]).await;
    let context = test_context(RecordingClient::new(), &dir);

    context.deregister_all().await.unwrap();
    context.register_all().await.unwrap();

    let expected: Vec<Call> = ["lb-b", "lb-a", "lb-c"]
        .iter()
        .map(|lb| Call::Deregister(lb.to_string(), INSTANCE.to_string()))
        .chain(
            ["lb-b", "lb-a", "lb-c"]
                .iter()
                .map(|lb| Call::Register(lb.to_string(), INSTANCE.to_string())),
        )
        .collect();
    assert_eq!(context.client().calls(), expected);
}

#[tokio::test]
async fn test_deregister_aborts_on_provider_error() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a", "lb-broken", "lb-c"]).await;
    let (context, output) = captured_context(RecordingClient::new().failing_on("lb-broken"), &dir);

    let result = context.deregister_all().await;

    assert!(matches!(result, Err(LifecycleError::Client(_))));
    assert_eq!(
        context.client().calls(),
        vec![
            Call::Deregister("lb-a".to_string(), INSTANCE.to_string()),
            Call::Deregister("lb-broken".to_string(), INSTANCE.to_string()),
        ]
    );
    assert_eq!(output.lines().len(), 1);
    assert!(output.lines()[0].starts_with("deregistered instance from elb"));
}

#[tokio::test]
async fn test_register_aborts_on_provider_error() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a", "lb-broken", "lb-c"]).await;
    let (context, output) = captured_context(RecordingClient::new().failing_on("lb-broken"), &dir);

    let result = context.register_all().await;

    assert!(matches!(result, Err(LifecycleError::Client(_))));
    assert_eq!(
        context.client().calls(),
        vec![
            Call::Register("lb-a".to_string(), INSTANCE.to_string()),
            Call::Register("lb-broken".to_string(), INSTANCE.to_string()),
        ]
    );
    assert_eq!(
        output.lines(),
        [format!(
            "registered instance with elb, instance: {INSTANCE}, elb: lb-a; \
             registered instances: [\"{INSTANCE}\"]"
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_in_service_on_first_check() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a"]).await;
    let (context, output) =
        captured_context(RecordingClient::new().with_health("lb-a", &["InService"]), &dir);

    let start = Instant::now();
    let outcomes = context.wait_until_healthy().await.unwrap();

    assert_eq!(output.lines(), [format!("[OK] instance {INSTANCE}, is now in service")]);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].checks, 1);
    assert_eq!(outcomes[0].state, InstanceHealth::InService);
    assert_eq!(context.client().health_queries(), vec!["lb-a"]);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_wait_retries_until_in_service_then_moves_on() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a", "lb-b"]).await;
    let client = RecordingClient::new()
        .with_health("lb-a", &["OutOfService", "OutOfService", "InService"])
        .with_health("lb-b", &["InService"]);
    let (context, output) = captured_context(client, &dir);

    let start = Instant::now();
    let outcomes = context.wait_until_healthy().await.unwrap();

    let retry = format!("[WARN] instance {INSTANCE} not in service yet, retrying");
    let ok = format!("[OK] instance {INSTANCE}, is now in service");
    assert_eq!(output.lines(), [retry.clone(), retry, ok.clone(), ok]);

    // 两次等待，共 8 秒
    assert_waited(start, 8);
    assert_eq!(outcomes[0].checks, 3);
    assert_eq!(outcomes[1].checks, 1);
    assert_eq!(
        context.client().health_queries(),
        vec!["lb-a", "lb-a", "lb-a", "lb-b"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_gives_up_and_skips_remaining_load_balancers() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a", "lb-b"]).await;
    let client = RecordingClient::new().with_health("lb-b", &["InService"]);
    let (context, output) = captured_context(client, &dir);

    let start = Instant::now();
    let result = context.wait_until_healthy().await;

    match result {
        Err(LifecycleError::NotInService {
            load_balancer,
            instance_id,
            last_state,
            attempts,
        }) => {
            assert_eq!(load_balancer, "lb-a");
            assert_eq!(instance_id, INSTANCE);
            assert_eq!(last_state, "OutOfService");
            assert_eq!(attempts, 10);
        }
        other => panic!("expected NotInService, got {other:?}"),
    }

    // 最坏情况 10 次 * 4 秒，lb-b 从未被查询
    assert_waited(start, 40);
    assert_eq!(context.client().health_queries(), vec!["lb-a"; 10]);
    let retry = format!("[WARN] instance {INSTANCE} not in service yet, retrying");
    assert_eq!(output.lines(), vec![retry; 10]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_honours_custom_policy() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a"]).await;
    let mut context = test_context(RecordingClient::new(), &dir);
    context.policy = HealthPolicy {
        max_attempts: 3,
        retry_interval: Duration::from_secs(1),
    };

    let start = Instant::now();
    let result = context.wait_until_healthy().await;

    assert!(matches!(result, Err(LifecycleError::NotInService { attempts: 3, .. })));
    assert_waited(start, 3);
}

#[tokio::test]
async fn test_wait_propagates_provider_error() {
    let dir = tempfile::tempdir().unwrap();
    seed_cache(&dir, &["lb-a", "lb-b"]).await;
    let context = test_context(RecordingClient::new().failing_on("lb-a"), &dir);

    let result = context.wait_until_healthy().await;

    assert!(matches!(result, Err(LifecycleError::Client(_))));
    assert_eq!(context.client().health_queries(), vec!["lb-a"]);
}

#[tokio::test]
async fn test_run_dispatches_event_actions() {
    let dir = tempfile::tempdir().unwrap();
    let client = RecordingClient::new()
        .with_membership("lb-a", &[INSTANCE])
        .with_health("lb-a", &["InService"]);
    let context = test_context(client, &dir);

    for event in ["BeforeInstall", "BeforeBlockTraffic", "AfterInstall", "AfterAllowTraffic"] {
        let event: LifecycleEvent = event.parse().unwrap();
        context.run(event.action()).await.unwrap();
    }

    assert_eq!(
        context.client().calls(),
        vec![
            Call::ListAll,
            Call::Deregister("lb-a".to_string(), INSTANCE.to_string()),
            Call::Register("lb-a".to_string(), INSTANCE.to_string()),
            Call::DescribeHealth("lb-a".to_string(), INSTANCE.to_string()),
        ]
    );
}
