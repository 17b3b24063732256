//! The policy export dialog and its supporting logic.

mod dialog;
mod message;
mod selection;

use async_trait::async_trait;

pub use dialog::{ExportDialog, ExportDialogOptions, ExportEvent};
pub use selection::{applicable_services, services_of_type};

use crate::client::ApiError;

/// The export endpoint, seen from the dialog.
///
/// The check and the download target the same endpoint; only the
/// `checkPoliciesExists` flag differs.
#[async_trait]
pub trait ExportApi: Send + Sync {
    /// Existence pre-check: would an export for these services be non-empty?
    async fn check_policies_exist(&self, service_names: &str) -> Result<bool, ApiError>;

    /// URL of the actual export for these services.
    fn export_url(&self, service_names: &str) -> String;
}
