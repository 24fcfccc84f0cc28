//! The three vanilla dimensions and their vertical extents per edition.

use std::fmt;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Overworld,
    Nether,
    End,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Overworld, Dimension::Nether, Dimension::End];

    /// Bedrock numeric id, as stored in chunk keys.
    pub fn bedrock_id(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
            Dimension::End => 2,
        }
    }

    pub fn from_bedrock_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Dimension::Overworld),
            1 => Some(Dimension::Nether),
            2 => Some(Dimension::End),
            _ => None,
        }
    }

    /// Java namespaced id, as used in player data and POI.
    pub fn java_name(self) -> &'static str {
        match self {
            Dimension::Overworld => "minecraft:overworld",
            Dimension::Nether => "minecraft:the_nether",
            Dimension::End => "minecraft:the_end",
        }
    }

    pub fn from_java_name(name: &str) -> Option<Self> {
        match name.strip_prefix("minecraft:").unwrap_or(name) {
            "overworld" => Some(Dimension::Overworld),
            "the_nether" => Some(Dimension::Nether),
            "the_end" => Some(Dimension::End),
            _ => None,
        }
    }

    /// Short name accepted in configuration filters.
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "overworld" => Some(Dimension::Overworld),
            "nether" | "the_nether" => Some(Dimension::Nether),
            "end" | "the_end" => Some(Dimension::End),
            _ => None,
        }
    }

    /// Directory of this dimension inside a Java world, relative to the root.
    pub fn java_directory(self) -> &'static str {
        match self {
            Dimension::Overworld => "",
            Dimension::Nether => "DIM-1",
            Dimension::End => "DIM1",
        }
    }

    /// Java section-y range written for this dimension.
    pub fn java_sections(self) -> RangeInclusive<i32> {
        match self {
            Dimension::Overworld => -4..=19,
            Dimension::Nether | Dimension::End => 0..=15,
        }
    }

    /// Bedrock sub-chunk-y range for this dimension.
    pub fn bedrock_sections(self) -> RangeInclusive<i32> {
        match self {
            Dimension::Overworld => -4..=19,
            Dimension::Nether => 0..=7,
            Dimension::End => 0..=15,
        }
    }

    pub fn min_block_y(self) -> i32 {
        self.java_sections().start() * 16
    }

    /// Biome used to fill sections without biome data.
    pub fn default_biome(self) -> &'static str {
        match self {
            Dimension::Overworld => "minecraft:plains",
            Dimension::Nether => "minecraft:nether_wastes",
            Dimension::End => "minecraft:the_end",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Overworld => "overworld",
            Dimension::Nether => "nether",
            Dimension::End => "end",
        })
    }
}
