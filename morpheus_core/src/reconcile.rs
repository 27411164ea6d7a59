//! Decide which permission document becomes the role's current state.
//!
//! After a refresh the server returns a fully computed permission set, often
//! with default entries the user never declared. If the stored document is
//! still contained in what the server returned, the stored text is kept so the
//! plan shows no spurious diff. Otherwise the server's document wins.

use std::fmt::Display;

use anyhow::{Context, Result};

use crate::config::{DecodeMode, ReconcileConfig};
use crate::logging::{debug, info};
use crate::permissions::RolePermissions;
use crate::subset::{contains_subset, SubsetError};
use crate::value::{to_value_with_hidden, Value};

/// Which side a reconciled document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The locally stored declaration was kept.
    Stored,
    /// The server's computed document replaced it.
    Server,
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Stored => write!(f, "stored"),
            Source::Server => write!(f, "server"),
        }
    }
}

/// Outcome of [`reconcile_permissions`].
#[derive(Debug)]
pub struct Reconciled {
    /// Where `permissions` came from.
    pub source: Source,
    /// The document to record as current state, verbatim.
    pub permissions: String,
    /// Why the stored document was rejected, if it was compared and failed.
    pub mismatch: Option<SubsetError>,
}

/// Decode a permission document into a value tree according to `config`.
pub fn decode_permissions(raw: &str, config: &ReconcileConfig) -> Result<Value> {
    match config.mode {
        DecodeMode::Typed => {
            let perms = RolePermissions::from_json(raw)?;
            to_value_with_hidden(&perms, &config.hidden_field_names())
                .context("Converting role permissions")
        }
        DecodeMode::Generic => {
            let json: serde_json::Value =
                serde_json::from_str(raw).context("Deserializing permission document")?;
            Ok(json.into())
        }
    }
}

/// Pick the document that should become current state: `stored` if the server
/// document contains it, `server` otherwise. Both documents are decoded the
/// same way so the comparison is shape-for-shape.
pub fn reconcile_permissions(
    stored: &str,
    server: &str,
    config: &ReconcileConfig,
) -> Result<Reconciled> {
    if stored.trim().is_empty() {
        debug!("no stored permissions, using the server's");
        return Ok(Reconciled {
            source: Source::Server,
            permissions: server.to_owned(),
            mismatch: None,
        });
    }

    let stored_value = decode_permissions(stored, config).context("Decoding stored permissions")?;
    let server_value = decode_permissions(server, config).context("Decoding server permissions")?;

    let result = crate::log_runtime!(
        "permission subset check",
        contains_subset(&server_value, &stored_value)
    );

    match result {
        Ok(()) => {
            debug!("stored permissions are satisfied by the server ({} mode)", config.mode);
            Ok(Reconciled {
                source: Source::Stored,
                permissions: stored.to_owned(),
                mismatch: None,
            })
        }
        Err(e) => {
            info!("stored permissions drifted from the server: {e}");
            Ok(Reconciled {
                source: Source::Server,
                permissions: server.to_owned(),
                mismatch: Some(e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    const SERVER: &str = r#"{
        "featurePermissions": [
            {"code": "admin-roles", "access": "full", "name": "Roles", "id": 10},
            {"code": "admin-users", "access": "none", "name": "Users", "id": 11}
        ],
        "globalZoneAccess": "none",
        "zones": [{"id": 1, "access": "full", "name": "aws"}]
    }"#;

    fn generic() -> ReconcileConfig {
        ReconcileConfig {
            mode: DecodeMode::Generic,
            ..Default::default()
        }
    }

    #[test]
    fn keeps_stored_when_contained() -> Result<()> {
        let stored = r#"{"featurePermissions": [{"code": "admin-users", "access": "none"}]}"#;
        for config in [ReconcileConfig::default(), generic()] {
            let reconciled = reconcile_permissions(stored, SERVER, &config)?;
            assert_eq!(reconciled.source, Source::Stored);
            assert_eq!(reconciled.permissions, stored);
            assert!(reconciled.mismatch.is_none());
        }
        Ok(())
    }

    #[test]
    fn falls_back_to_server_on_drift() -> Result<()> {
        let stored = r#"{"featurePermissions": [{"code": "admin-roles", "access": "read"}]}"#;
        let reconciled = reconcile_permissions(stored, SERVER, &ReconcileConfig::default())?;
        assert_eq!(reconciled.source, Source::Server);
        assert_eq!(reconciled.permissions, SERVER);
        let mismatch = reconciled.mismatch.expect("a mismatch");
        assert!(mismatch.is_mismatch());
        Ok(())
    }

    #[test]
    fn typed_mode_ignores_zero_values_generic_mode_does_not() -> Result<()> {
        let stored = r#"{"globalSiteAccess": "", "zones": [{"id": 1, "access": "full"}]}"#;

        let typed = reconcile_permissions(stored, SERVER, &ReconcileConfig::default())?;
        assert_eq!(typed.source, Source::Stored);

        let generic = reconcile_permissions(stored, SERVER, &generic())?;
        assert_eq!(generic.source, Source::Server);
        Ok(())
    }

    #[test]
    fn rewritten_numbers_are_not_drift() -> Result<()> {
        let stored = r#"{"zones": [{"id": 1.0, "access": "full"}]}"#;
        let reconciled = reconcile_permissions(stored, SERVER, &generic())?;
        assert_eq!(reconciled.source, Source::Stored);
        Ok(())
    }

    #[test]
    fn hidden_fields_are_not_compared() -> Result<()> {
        let stored = r#"{"featurePermissions": [{"code": "admin-roles", "access": "full", "id": 99}]}"#;

        let strict = reconcile_permissions(stored, SERVER, &ReconcileConfig::default())?;
        assert_eq!(strict.source, Source::Server);

        let config = ReconcileConfig {
            hidden_fields: vec!["id".to_owned()],
            ..Default::default()
        };
        let lenient = reconcile_permissions(stored, SERVER, &config)?;
        assert_eq!(lenient.source, Source::Stored);
        Ok(())
    }

    #[test]
    fn empty_stored_document_uses_server() -> Result<()> {
        let reconciled = reconcile_permissions("  \n", SERVER, &ReconcileConfig::default())?;
        assert_eq!(reconciled.source, Source::Server);
        assert!(reconciled.mismatch.is_none());
        Ok(())
    }

    #[test]
    fn malformed_documents_are_errors_not_mismatches() {
        assert!(reconcile_permissions("{", SERVER, &ReconcileConfig::default()).is_err());
        assert!(reconcile_permissions("{}", "[", &generic()).is_err());
    }
}
