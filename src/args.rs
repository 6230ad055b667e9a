use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use icon_number_scan::template_library::DEFAULT_CATEGORY;

#[derive(Debug, Parser)]
#[command(name = "icon-number-scan")]
#[command(about = "Find known icons in screenshots and read the numbers printed next to them")]
#[command(version = env!("APP_VERSION_DISPLAY"))]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, global = true, default_value = "config/config.json")]
    pub config: PathBuf,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Detect icons in one or more screenshots and store the readings
    Process(ProcessArgs),

    /// Add a new icon template
    AddTemplate(AddTemplateArgs),

    /// List loaded templates by category
    List,

    /// Show database statistics
    Stats,

    /// Show the most recent detections
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ProcessArgs {
    /// Screenshot(s) to process
    #[arg(long = "image", required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Do not write visualisation images
    #[arg(long)]
    pub no_viz: bool,
}

#[derive(Debug, Clone, Args)]
pub struct AddTemplateArgs {
    /// Image to use as the template
    #[arg(long)]
    pub image: PathBuf,

    /// Template name
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = DEFAULT_CATEGORY)]
    pub category: String,
}
