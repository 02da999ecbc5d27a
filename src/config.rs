use crate::error::ConfigError;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_ROOT: &str = ".";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Materialize the RDFS hierarchy closure before checking constraints
    #[default]
    Rdfs,
    /// Check the union of data and ontology as asserted
    None,
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceMode::Rdfs => write!(f, "rdfs"),
            InferenceMode::None => write!(f, "none"),
        }
    }
}

/// Settings shared by every pipeline stage. Passed explicitly to constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub root_directory: PathBuf,
    pub inference_mode: InferenceMode,
    /// Log stage progress at info level instead of debug
    pub verbose: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from(DEFAULT_ROOT),
            inference_mode: InferenceMode::default(),
            verbose: false,
        }
    }
}

impl ValidatorConfig {
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            ..Self::default()
        }
    }

    pub fn with_inference_mode(mut self, mode: InferenceMode) -> Self {
        self.inference_mode = mode;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Merges command line arguments over an optional config file. The
    /// command line wins.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            root_directory: file_root,
            inference_mode: file_inference,
            verbose: file_verbose,
        } = file_config;

        let root_directory = args
            .root
            .clone()
            .or(file_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));

        let config = Self {
            root_directory,
            inference_mode: args.inference.or(file_inference).unwrap_or_default(),
            verbose: args.verbose || file_verbose.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root_directory.exists() {
            return Err(ConfigError::RootNotFound(self.root_directory.clone()));
        }
        if !self.root_directory.is_dir() {
            return Err(ConfigError::RootNotDirectory(self.root_directory.clone()));
        }
        Ok(())
    }

    pub fn resolve_path<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root_directory.join(relative)
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ontology-conformance",
    about = "Validate instance documents against registry-discovered ontologies and SHACL shapes",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "ONTOLOGY_CONFORMANCE_ROOT",
        value_name = "DIR",
        help = "Repository root holding the registry and catalogs",
        global = true
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        env = "ONTOLOGY_CONFORMANCE_INFERENCE",
        value_enum,
        value_name = "MODE",
        help = "Inference applied before constraint checking",
        global = true
    )]
    pub inference: Option<InferenceMode>,

    #[arg(
        long,
        short,
        env = "ONTOLOGY_CONFORMANCE_VERBOSE",
        help = "Report stage progress",
        global = true
    )]
    pub verbose: bool,

    #[arg(long, help = "Print the result as JSON", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Validate instance documents (files or directories of JSON-LD)
    Validate {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Check that documents parse
    Syntax {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Check shape target classes against ontology classes
    Coherence {
        /// Domains to check; all registered domains when omitted
        #[arg(value_name = "DOMAIN")]
        domains: Vec<String>,
    },
    /// List registered domains
    Domains,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    root_directory: Option<PathBuf>,
    inference_mode: Option<InferenceMode>,
    verbose: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
