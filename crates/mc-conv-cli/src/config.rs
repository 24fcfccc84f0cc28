use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use mc_conv_core::{Options, Schedule};
use mc_conv_world::{Dimension, Pos2i, Pos2iSet};

#[derive(Debug, Deserialize)]
pub struct ConvConfig {
    pub conversion: ConversionSection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    JavaToBedrock,
    BedrockToJava,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleName {
    #[default]
    Region,
    Chunk,
}

#[derive(Debug, Deserialize)]
pub struct ConversionSection {
    pub direction: Direction,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Scratch directory. Default: the system temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Worker count. 0 = available parallelism.
    #[serde(default)]
    pub concurrency: usize,
    #[serde(default)]
    pub schedule: ScheduleName,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterSection {
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Explicit `[x, z]` chunk list; absent means every chunk.
    #[serde(default)]
    pub chunks: Option<Vec<[i32; 2]>>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

impl ConvConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Engine options; fails on unknown dimension names.
    pub fn options(&self) -> Result<Options, String> {
        let mut dimensions = BTreeSet::new();
        for name in &self.filter.dimensions {
            let dim = Dimension::from_config_name(name).ok_or_else(|| format!("unknown dimension `{name}`"))?;
            dimensions.insert(dim);
        }
        let chunks = self
            .filter
            .chunks
            .as_ref()
            .map(|list| list.iter().map(|&[x, z]| Pos2i::new(x, z)).collect::<Pos2iSet>());
        let mut options = Options {
            concurrency: self.conversion.concurrency,
            schedule: match self.conversion.schedule {
                ScheduleName::Region => Schedule::Region,
                ScheduleName::Chunk => Schedule::Chunk,
            },
            dimensions,
            chunks,
            ..Options::default()
        };
        if let Some(dir) = &self.conversion.temp_dir {
            options.temp_dir = dir.clone();
        }
        Ok(options)
    }
}
