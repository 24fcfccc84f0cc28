//! Bedrock block states as stored in sub-chunk palettes.

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};

/// Block-state schema version written with every palette entry.
pub const BLOCK_STATE_VERSION: i32 = 18_100_737;

/// A Bedrock block state: `{name, states, version}`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    pub name: String,
    pub states: NbtCompound,
    pub version: i32,
}

impl BlockState {
    pub fn new(name: &str) -> Self {
        let name = if name.contains(':') {
            name.to_string()
        } else {
            format!("minecraft:{name}")
        };
        Self {
            name,
            states: NbtCompound::new(),
            version: BLOCK_STATE_VERSION,
        }
    }

    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    pub fn with(mut self, key: &str, value: impl Into<NbtTag>) -> Self {
        self.states.put(key, value);
        self
    }

    pub fn is_air(&self) -> bool {
        self.name == "minecraft:air"
    }

    pub fn local_name(&self) -> &str {
        self.name.strip_prefix("minecraft:").unwrap_or(&self.name)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.states.get_integer(key).and_then(|v| i32::try_from(v).ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.states.get_bool(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.states.get_str(key)
    }

    pub fn to_nbt(&self) -> NbtCompound {
        let mut c = NbtCompound::new();
        c.put("name", self.name.as_str());
        c.put("states", self.states.clone());
        c.put("version", self.version);
        c
    }

    /// Parse a palette entry. A missing `states` compound is treated as
    /// empty and a missing `version` as the current one.
    pub fn from_nbt(c: &NbtCompound) -> Option<Self> {
        let name = c.get_str("name")?;
        let mut state = Self::new(name);
        if let Some(states) = c.get_compound("states") {
            state.states = states.clone();
        }
        if let Some(v) = c.get_int("version") {
            state.version = v;
        }
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_entry_shape() {
        let s = BlockState::new("stone_stairs")
            .with("weirdo_direction", 2)
            .with("upside_down_bit", false);
        let nbt = s.to_nbt();
        assert_eq!(nbt.get_str("name"), Some("minecraft:stone_stairs"));
        assert_eq!(nbt.get_int("version"), Some(BLOCK_STATE_VERSION));
        assert_eq!(BlockState::from_nbt(&nbt), Some(s.clone()));
        assert_eq!(s.get_int("weirdo_direction"), Some(2));
        assert_eq!(s.get_bool("upside_down_bit"), Some(false));
    }

    #[test]
    fn missing_states_is_empty() {
        let mut c = NbtCompound::new();
        c.put("name", "minecraft:dirt");
        let s = BlockState::from_nbt(&c).unwrap();
        assert!(s.states.is_empty());
        assert_eq!(s.version, BLOCK_STATE_VERSION);
    }
}
