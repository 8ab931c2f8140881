//! Shared wire-type definitions
//!
//! This crate contains the wire types exchanged with the fleet service:
//! server and pod snapshots, scan payloads, and the request bodies of the
//! mutating calls. Unknown fields in service responses are ignored so the
//! core stays agnostic to payload extensions.

use serde::Deserialize;
use serde::Serialize;

/// Usage of one resource on a server: how much is currently allocated out
/// of the total capacity, in the server's display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Currently allocated amount
    pub allocated: f64,
    /// Total capacity
    pub total: f64,
    /// Display unit, e.g. "cores" or "GB"
    pub unit: String,
}

impl ResourceUsage {
    /// Allocated fraction clamped to `[0, 1]`, for gauges.
    pub fn ratio(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.allocated / self.total).clamp(0.0, 1.0)
    }
}

/// Resource totals and current allocations reported by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResources {
    pub cpu: ResourceUsage,
    pub ram: ResourceUsage,
    pub storage: ResourceUsage,
}

/// A compute host hosting zero or more pods.
///
/// Identity is immutable; every other attribute is replaced wholesale on
/// each refresh except where the reconciler preserves pod edit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Stable server identity
    pub id: String,
    /// Resource capacity and allocation
    pub resources: ServerResources,
    /// Pods deployed on this server
    #[serde(default)]
    pub pods: Vec<Pod>,
}

/// Resources requested for a pod.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestedResources {
    pub cpus: f64,
    pub ram_gb: f64,
    pub storage_gb: f64,
}

/// A single deployed container workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    /// Pod identity, unique within its server
    pub pod_id: String,
    /// Container image reference
    pub image_url: String,
    /// Namespace the workload runs in
    #[serde(default)]
    pub namespace: Option<String>,
    /// External route, if the workload is exposed
    #[serde(default)]
    pub route: Option<String>,
    /// Replica count, when reported
    #[serde(default)]
    pub replicas: Option<u32>,
    /// Requested resources
    pub requested: RequestedResources,
    /// Server-reported lifecycle status. The vocabulary is owned by the
    /// remote service (e.g. provisioning/running/updating/error) and is
    /// treated as an opaque string here.
    #[serde(default)]
    pub status: String,
    /// Cluster-internal address, when assigned
    #[serde(default)]
    pub pod_ip: Option<String>,
    /// Externally reachable address, when assigned
    #[serde(default)]
    pub external_ip: Option<String>,
    /// In-progress, unsaved image edit typed by the user. Never sent to or
    /// received from the service; survives refreshes only through the
    /// reconciler's merge rule.
    #[serde(skip)]
    pub editing_image: Option<String>,
}

impl Pod {
    /// Whether the user has typed an unsaved image edit.
    pub fn has_pending_edit(&self) -> bool {
        self.editing_image.as_deref().is_some_and(|edit| !edit.is_empty())
    }
}

/// Status of a security scan. Unlike pod status this is a closed vocabulary:
/// pending → running → {success|error}, with no transition out of a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl ScanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanStatus::Success | ScanStatus::Error)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Response to a scan start call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStartResponse {
    /// Opaque token assigned by the service; all status polls carry it
    pub scan_id: String,
}

/// One scan status poll. `logs` is the complete current sequence, not a
/// delta; `result` is an opaque payload present only once the status is
/// terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatusResponse {
    pub status: ScanStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// Request body for `POST /create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePodRequest {
    pub server_id: String,
    pub pod_id: String,
    pub image_url: String,
    pub namespace: Option<String>,
    pub route: Option<String>,
    pub requested: RequestedResources,
}

/// Request body for `POST /update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePodRequest {
    pub server_id: String,
    pub pod_id: String,
    pub image_url: String,
}

/// Request body for `POST /delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePodRequest {
    pub server_id: String,
    pub pod_id: String,
}
