//! Java block states: a namespaced name plus string properties.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};

/// An immutable Java block state.
///
/// Properties are kept sorted so equal states compare, hash and
/// serialize identically. Palettes share states through `Arc<Block>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl Block {
    /// Create a property-less block; the `minecraft:` namespace is added
    /// when missing.
    pub fn new(name: &str) -> Self {
        let name = if name.contains(':') {
            name.to_string()
        } else {
            format!("minecraft:{name}")
        };
        Self {
            name,
            properties: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    /// Builder-style property setter.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Copy of this block with the given properties replaced or added.
    pub fn with_properties(&self, overrides: &[(&str, &str)]) -> Self {
        let mut copy = self.clone();
        for &(k, v) in overrides {
            copy.properties.insert(k.to_string(), v.to_string());
        }
        copy
    }

    /// Copy of this block with the given properties removed.
    pub fn without(&self, keys: &[&str]) -> Self {
        let mut copy = self.clone();
        for k in keys {
            copy.properties.remove(*k);
        }
        copy
    }

    /// Copy under a different name, keeping properties.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            properties: self.properties.clone(),
            ..Self::new(name)
        }
    }

    /// Name without the `minecraft:` namespace.
    pub fn local_name(&self) -> &str {
        self.name.strip_prefix("minecraft:").unwrap_or(&self.name)
    }

    pub fn is_air(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
        )
    }

    pub fn is_waterlogged(&self) -> bool {
        self.property("waterlogged") == Some("true")
    }

    /// Palette entry form: `{Name, Properties?}`.
    pub fn to_nbt(&self) -> NbtCompound {
        let mut c = NbtCompound::new();
        c.put("Name", self.name.as_str());
        if !self.properties.is_empty() {
            let props: NbtCompound = self
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), NbtTag::String(v.clone())))
                .collect();
            c.put("Properties", props);
        }
        c
    }

    pub fn from_nbt(c: &NbtCompound) -> Option<Self> {
        let mut block = Self::new(c.get_str("Name")?);
        if let Some(props) = c.get_compound("Properties") {
            for (k, v) in props {
                if let Some(s) = v.as_string() {
                    block.properties.insert(k.clone(), s.to_string());
                }
            }
        }
        Some(block)
    }

    /// Parse the textual form `minecraft:name[key=value,...]`.
    pub fn parse(s: &str) -> Option<Self> {
        let (name, rest) = match s.find('[') {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        };
        if name.is_empty() {
            return None;
        }
        let mut block = Self::new(name);
        if let Some(rest) = rest {
            let body = rest.strip_suffix(']')?;
            for pair in body.split(',').filter(|p| !p.is_empty()) {
                let (k, v) = pair.split_once('=')?;
                block.properties.insert(k.to_string(), v.to_string());
            }
        }
        Some(block)
    }

    pub fn into_arc(self) -> Arc<Block> {
        Arc::new(self)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let b = Block::parse("minecraft:oak_stairs[half=bottom,facing=north]").unwrap();
        assert_eq!(b.name, "minecraft:oak_stairs");
        assert_eq!(b.property("facing"), Some("north"));
        assert_eq!(b.to_string(), "minecraft:oak_stairs[facing=north,half=bottom]");
        assert_eq!(Block::parse("stone").unwrap(), Block::new("minecraft:stone"));
        assert!(Block::parse("x[broken").is_none());
    }

    #[test]
    fn overrides_leave_the_source_untouched() {
        let b = Block::new("lever").with("powered", "false");
        let c = b.with_properties(&[("powered", "true"), ("face", "wall")]);
        assert_eq!(b.property("powered"), Some("false"));
        assert_eq!(c.property("powered"), Some("true"));
        assert_eq!(c.without(&["face"]).properties.len(), 1);
    }

    #[test]
    fn nbt_form() {
        let b = Block::new("water").with("level", "0");
        let nbt = b.to_nbt();
        assert_eq!(nbt.get_str("Name"), Some("minecraft:water"));
        assert_eq!(Block::from_nbt(&nbt), Some(b));
        assert!(!Block::air().to_nbt().contains_key("Properties"));
    }

    #[test]
    fn air_variants() {
        assert!(Block::new("cave_air").is_air());
        assert!(!Block::new("glass").is_air());
    }
}
