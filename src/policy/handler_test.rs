use std::sync::Arc;

use tracing_test::traced_test;

use super::*;
use crate::test_utils::deployment;
use crate::test_utils::pod;
use crate::test_utils::ClusterAction;
use crate::test_utils::FakeCluster;
use crate::ActionExecutor;
use crate::ChangeEvent;
use crate::ClusterError;
use crate::Error;
use crate::EventHandler;
use crate::MockClusterApi;
use crate::ResourceCache;
use crate::ResourceKind;
use crate::ResourceRef;

#[tokio::test]
async fn handler_executes_every_decision_in_plan_order() {
    let pods = Arc::new(ResourceCache::new(ResourceKind::Pod));
    pods.bulk_load(vec![pod("ns1", "p1")]).unwrap();
    let d1 = deployment("ns1", "d1", Some(3), 1);
    let cluster = Arc::new(FakeCluster::with_resources(vec![pod("ns1", "p1"), pod("ns1", "p2"), d1.clone()]));
    let handler = PolicyHandler::new(
        Arc::new(DeploymentPolicy::new(pods.clone())),
        Arc::new(ActionExecutor::inline(cluster.clone())),
    );

    handler.handle(&ChangeEvent::Added(d1.clone())).await.unwrap();
    assert!(cluster.actions().is_empty());

    pods.apply(&ChangeEvent::Added(pod("ns1", "p2"))).unwrap();
    handler
        .handle(&ChangeEvent::Updated {
            old: d1.clone(),
            new: d1.clone(),
        })
        .await
        .unwrap();

    assert_eq!(
        cluster.actions(),
        vec![
            ClusterAction::Delete(ResourceRef::pod("ns1", "p1")),
            ClusterAction::Delete(ResourceRef::pod("ns1", "p2")),
            ClusterAction::PatchReplicas {
                target: ResourceRef::deployment("ns1", "d1"),
                replicas: 0,
            },
        ]
    );
    assert_eq!(
        cluster.get(&ResourceRef::deployment("ns1", "d1")).unwrap().replicas,
        Some(0)
    );
}

#[tokio::test]
async fn empty_plan_touches_nothing() {
    let mut api = MockClusterApi::new();
    api.expect_delete_resource().never();
    api.expect_patch_replicas().never();
    let handler = PolicyHandler::new(Arc::new(PodPolicy::new()), Arc::new(ActionExecutor::inline(Arc::new(api))));

    let result = handler.handle(&ChangeEvent::Added(pod(crate::PROTECTED_NAMESPACE, "dns"))).await;

    assert!(result.is_ok());
}

#[tokio::test]
#[traced_test]
async fn later_decisions_still_run_after_a_failure() {
    let pods = Arc::new(ResourceCache::new(ResourceKind::Pod));
    pods.bulk_load(vec![pod("ns1", "p1")]).unwrap();
    let d1 = deployment("ns1", "d1", Some(1), 1);
    let policy = Arc::new(DeploymentPolicy::new(pods.clone()));
    policy.evaluate(&ChangeEvent::Added(d1.clone()));
    pods.apply(&ChangeEvent::Added(pod("ns1", "p2"))).unwrap();

    let mut api = MockClusterApi::new();
    api.expect_delete_resource()
        .times(2)
        .returning(|_, _, name| match name {
            "p1" => Err(ClusterError::Request("timeout".to_string()).into()),
            _ => Ok(()),
        });
    api.expect_patch_replicas().times(1).returning(|_, _, _| Ok(()));
    let handler = PolicyHandler::new(policy, Arc::new(ActionExecutor::inline(Arc::new(api))));

    let result = handler
        .handle(&ChangeEvent::Updated {
            old: d1.clone(),
            new: d1,
        })
        .await;

    assert!(matches!(result, Err(Error::Cluster(ClusterError::Request(_)))));
    assert!(logs_contain("failed"));
}
