//! Snapshot reconciliation.
//!
//! The incoming snapshot is authoritative for every field of every server
//! and pod. The single exception is a non-empty in-progress image edit on a
//! pod of the server selected at merge time, which is copied onto the
//! matching incoming pod (matched by `pod_id`). Servers and pods absent
//! from the incoming snapshot are dropped: deletion is detected by absence,
//! not by a tombstone.

use api_types::Server;

/// Merge an incoming snapshot into the local one.
///
/// Consumes the incoming snapshot and returns it with preserved edits
/// grafted on; the caller installs the result as the new local snapshot.
pub fn merge_snapshot(
    local: &[Server],
    mut incoming: Vec<Server>,
    selected_id: Option<&str>,
) -> Vec<Server> {
    let Some(selected_id) = selected_id else {
        return incoming;
    };
    let Some(local_server) = local.iter().find(|server| server.id == selected_id) else {
        return incoming;
    };

    if let Some(incoming_server) = incoming.iter_mut().find(|server| server.id == selected_id) {
        for pod in &mut incoming_server.pods {
            let edit = local_server
                .pods
                .iter()
                .find(|local_pod| local_pod.pod_id == pod.pod_id)
                .filter(|local_pod| local_pod.has_pending_edit())
                .and_then(|local_pod| local_pod.editing_image.clone());
            if edit.is_some() {
                pod.editing_image = edit;
            }
        }
    }

    incoming
}

#[cfg(test)]
mod tests {
    use api_types::{Pod, RequestedResources, ResourceUsage, ServerResources};
    use similar_asserts::assert_eq;

    use super::*;

    fn resources() -> ServerResources {
        ServerResources {
            cpu: ResourceUsage {
                allocated: 1.0,
                total: 8.0,
                unit: "cores".to_string(),
            },
            ram: ResourceUsage {
                allocated: 2.0,
                total: 16.0,
                unit: "GB".to_string(),
            },
            storage: ResourceUsage {
                allocated: 5.0,
                total: 100.0,
                unit: "GB".to_string(),
            },
        }
    }

    fn pod(pod_id: &str, image: &str) -> Pod {
        Pod {
            pod_id: pod_id.to_string(),
            image_url: image.to_string(),
            namespace: Some(pod_id.to_string()),
            route: None,
            replicas: Some(1),
            requested: RequestedResources {
                cpus: 0.5,
                ram_gb: 0.5,
                storage_gb: 1.0,
            },
            status: "running".to_string(),
            pod_ip: None,
            external_ip: None,
            editing_image: None,
        }
    }

    fn server(id: &str, pods: Vec<Pod>) -> Server {
        Server {
            id: id.to_string(),
            resources: resources(),
            pods,
        }
    }

    #[test]
    fn pending_edit_survives_refresh() {
        // Scenario: the service reports nginx:1.0 while the user has typed
        // nginx:2.0 into the row but not submitted it.
        let mut local_pod = pod("p1", "nginx:1.0");
        local_pod.editing_image = Some("nginx:2.0".to_string());
        let local = vec![server("s1", vec![local_pod])];
        let incoming = vec![server("s1", vec![pod("p1", "nginx:1.0")])];

        let merged = merge_snapshot(&local, incoming, Some("s1"));

        assert_eq!(merged[0].pods[0].image_url, "nginx:1.0");
        assert_eq!(
            merged[0].pods[0].editing_image,
            Some("nginx:2.0".to_string())
        );
    }

    #[test]
    fn incoming_fields_are_authoritative() {
        // No pending edit: every field must equal the incoming pod exactly.
        let local = vec![server("s1", vec![pod("p1", "nginx:1.0")])];

        let mut updated = pod("p1", "nginx:1.1");
        updated.status = "updating".to_string();
        updated.pod_ip = Some("10.0.0.9".to_string());
        let incoming = vec![server("s1", vec![updated.clone()])];

        let merged = merge_snapshot(&local, incoming, Some("s1"));
        assert_eq!(merged[0].pods[0], updated);
    }

    #[test]
    fn empty_edit_is_not_preserved() {
        let mut local_pod = pod("p1", "nginx:1.0");
        local_pod.editing_image = Some(String::new());
        let local = vec![server("s1", vec![local_pod])];
        let incoming = vec![server("s1", vec![pod("p1", "nginx:1.0")])];

        let merged = merge_snapshot(&local, incoming, Some("s1"));
        assert_eq!(merged[0].pods[0].editing_image, None);
    }

    #[test]
    fn deleted_pod_disappears_with_its_edit() {
        let mut local_pod = pod("p1", "nginx:1.0");
        local_pod.editing_image = Some("nginx:2.0".to_string());
        let local = vec![server("s1", vec![local_pod, pod("p2", "redis:7")])];
        // p1 is gone from the incoming snapshot.
        let incoming = vec![server("s1", vec![pod("p2", "redis:7")])];

        let merged = merge_snapshot(&local, incoming, Some("s1"));
        assert_eq!(merged[0].pods.len(), 1);
        assert_eq!(merged[0].pods[0].pod_id, "p2");
    }

    #[test]
    fn edit_is_never_invented_for_new_pods() {
        let local = vec![server("s1", vec![])];
        let incoming = vec![server("s1", vec![pod("p1", "nginx:1.0")])];

        let merged = merge_snapshot(&local, incoming, Some("s1"));
        assert_eq!(merged[0].pods[0].editing_image, None);
    }

    #[test]
    fn only_the_selected_server_is_reconciled() {
        let mut edited = pod("p1", "nginx:1.0");
        edited.editing_image = Some("nginx:2.0".to_string());
        let local = vec![
            server("s1", vec![edited.clone()]),
            server("s2", vec![edited]),
        ];
        let incoming = vec![
            server("s1", vec![pod("p1", "nginx:1.0")]),
            server("s2", vec![pod("p1", "nginx:1.0")]),
        ];

        // s2 is selected at merge time, so only its edit survives.
        let merged = merge_snapshot(&local, incoming, Some("s2"));
        assert_eq!(merged[0].pods[0].editing_image, None);
        assert_eq!(
            merged[1].pods[0].editing_image,
            Some("nginx:2.0".to_string())
        );
    }

    #[test]
    fn no_selection_means_plain_replacement() {
        let mut edited = pod("p1", "nginx:1.0");
        edited.editing_image = Some("nginx:2.0".to_string());
        let local = vec![server("s1", vec![edited])];
        let incoming = vec![server("s1", vec![pod("p1", "nginx:1.0")])];

        let merged = merge_snapshot(&local, incoming, None);
        assert_eq!(merged[0].pods[0].editing_image, None);
    }

    #[test]
    fn deleted_server_is_dropped() {
        let local = vec![
            server("s1", vec![pod("p1", "nginx:1.0")]),
            server("s2", vec![]),
        ];
        let incoming = vec![server("s1", vec![pod("p1", "nginx:1.0")])];

        let merged = merge_snapshot(&local, incoming, Some("s2"));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "s1");
    }
}
