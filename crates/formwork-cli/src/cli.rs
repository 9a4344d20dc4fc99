use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "formwork",
    about = "Formwork: normalize declarative form schemas and resolve their submissions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a schema and print the canonical document
    Normalize {
        /// Path to the schema (JSON, or YAML by `.yaml`/`.yml` extension)
        schema: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the sections and fields visible under the current variables
    Active {
        /// Path to the schema (JSON, or YAML by `.yaml`/`.yml` extension)
        schema: String,

        /// Variable edits applied after registration (inline JSON object or file path)
        #[arg(long)]
        vars: Option<String>,

        /// Engine config (TOML)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute required field ids and the variable-to-field map
    Required {
        /// Path to the schema (JSON, or YAML by `.yaml`/`.yml` extension)
        schema: String,

        /// Variable edits applied after registration (inline JSON object or file path)
        #[arg(long)]
        vars: Option<String>,

        /// Engine config (TOML)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and resolve the submission payload
    Resolve {
        /// Path to the schema (JSON, or YAML by `.yaml`/`.yml` extension)
        schema: String,

        /// Variable edits applied after registration (inline JSON object or file path)
        #[arg(long)]
        vars: Option<String>,

        /// Engine config (TOML)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
