//! Typed role permission documents, as returned by the Morpheus roles API.
//!
//! Every field defaults when absent, so a document that only declares a few
//! permissions decodes into a struct whose other fields are zero. That is what
//! lets a partially declared document be checked against a fully computed one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Access to a named platform feature (e.g. `admin-roles`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePermission {
    /// Feature code
    #[serde(default)]
    pub code: String,
    /// Access level, e.g. `full`, `read`, `none`
    #[serde(default)]
    pub access: String,
    /// Display name, filled in by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server-side id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Access to an object identified by numeric id (a group, cloud, blueprint...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntry {
    /// Object id
    #[serde(default)]
    pub id: u64,
    /// Access level
    #[serde(default)]
    pub access: String,
    /// Display name, filled in by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Access to an object identified by code (an instance type, persona...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAccess {
    /// Object code
    #[serde(default)]
    pub code: String,
    /// Access level
    #[serde(default)]
    pub access: String,
    /// Display name, filled in by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The full permission set of a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RolePermissions {
    /// Per-feature access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feature_permissions: Vec<FeaturePermission>,

    /// Default access to groups
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_site_access: String,
    /// Per-group access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<AccessEntry>,

    /// Default access to clouds
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_zone_access: String,
    /// Per-cloud access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<AccessEntry>,

    /// Default access to instance types
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_instance_type_access: String,
    /// Per-instance-type access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instance_type_permissions: Vec<CodeAccess>,

    /// Default access to blueprints
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_app_template_access: String,
    /// Per-blueprint access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub app_template_permissions: Vec<AccessEntry>,

    /// Default access to catalog item types
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_catalog_item_type_access: String,
    /// Per-catalog-item-type access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub catalog_item_type_permissions: Vec<AccessEntry>,

    /// Default access to personas
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_persona_access: String,
    /// Per-persona access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub persona_permissions: Vec<CodeAccess>,

    /// Default access to VDI pools
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_vdi_pool_access: String,
    /// Per-VDI-pool access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vdi_pool_permissions: Vec<AccessEntry>,

    /// Default access to report types
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_report_type_access: String,
    /// Per-report-type access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub report_type_permissions: Vec<CodeAccess>,

    /// Default access to tasks
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_task_access: String,
    /// Per-task access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_permissions: Vec<AccessEntry>,

    /// Default access to workflows
    #[serde(skip_serializing_if = "String::is_empty")]
    pub global_task_set_access: String,
    /// Per-workflow access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_set_permissions: Vec<AccessEntry>,
}

impl RolePermissions {
    /// Parse a permission document.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Deserializing role permissions")
    }

    /// Serialize to compact JSON, leaving out everything unset.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Serializing role permissions")
    }
}
