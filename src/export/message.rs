use std::path::PathBuf;

use crate::client::ApiError;
use crate::download::DownloadError;

/// Messages delivered back to the dialog by its spawned tasks.
#[derive(Debug)]
pub enum ExportMsg {
    /// The existence check confirmed there are policies to export.
    CheckPassed { service_names: String },
    /// The existence check came back empty.
    CheckEmpty,
    /// The existence check failed on the wire or at the server.
    CheckFailed(ApiError),
    /// The export file landed on disk.
    Downloaded(PathBuf),
    DownloadFailed(DownloadError),
}
