use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::OwnerReference;
use super::Resource;
use super::ResourceKind;

impl Resource {
    pub fn from_deployment(deployment: &Deployment) -> Self {
        let replicas = deployment.spec.as_ref().and_then(|spec| spec.replicas);
        from_meta(ResourceKind::Deployment, &deployment.metadata, replicas)
    }

    pub fn from_pod(pod: &Pod) -> Self {
        from_meta(ResourceKind::Pod, &pod.metadata, None)
    }
}

fn from_meta(
    kind: ResourceKind,
    meta: &ObjectMeta,
    replicas: Option<i32>,
) -> Resource {
    let owner_references = meta
        .owner_references
        .as_ref()
        .map(|owners| {
            owners
                .iter()
                .map(|owner| OwnerReference {
                    kind: owner.kind.clone(),
                    name: owner.name.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Resource {
        kind,
        namespace: meta.namespace.clone().unwrap_or_default(),
        name: meta.name.clone().unwrap_or_default(),
        generation: meta.generation.unwrap_or(0),
        owner_references,
        replicas,
    }
}
