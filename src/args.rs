use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Grades sign language attempts against lesson references", long_about = None)]
pub struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract the feature snapshot of one landmark frame
    Extract {
        /// Holistic landmark payload (JSON)
        #[arg(long)]
        frame: PathBuf,

        /// Facial expression label from the classifier
        #[arg(long)]
        expression: Option<String>,

        /// Zero-pad short landmark lists
        #[arg(long, default_value_t = false)]
        pad: bool,
    },

    /// Grade one frame against a static lesson reference
    Grade {
        #[arg(long)]
        lesson: u64,

        /// Directory holding `<lesson>.json` reference files
        #[arg(long)]
        references: PathBuf,

        #[arg(long)]
        frame: PathBuf,

        #[arg(long)]
        expression: Option<String>,

        #[arg(long, default_value_t = false)]
        pad: bool,
    },

    /// Grade a sampled clip against a dynamic lesson reference
    GradeSequence {
        #[arg(long)]
        lesson: u64,

        #[arg(long)]
        references: PathBuf,

        /// JSON array of holistic landmark payloads
        #[arg(long)]
        frames: PathBuf,

        #[arg(long)]
        expression: Option<String>,

        #[arg(long, default_value_t = false)]
        pad: bool,

        /// Write per-frame scores and the evaluation under this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Compare two feature snapshots directly
    Compare {
        #[arg(long)]
        reference: PathBuf,

        #[arg(long)]
        learner: PathBuf,
    },
}
