use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "polex",
    version,
    about = "Export access policies from a policy administration service"
)]
pub struct Args {
    /// Base URL of the admin server (overrides the config file)
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Scope the dialog to a single component type (e.g. "hdfs")
    #[arg(short = 't', long)]
    pub service_type: Option<String>,

    /// Directory the export file is written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
