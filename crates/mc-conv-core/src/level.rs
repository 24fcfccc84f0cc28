//! World metadata files of both editions.
//!
//! Bedrock keeps `level.dat` as a little-endian tree behind an 8-byte
//! header (storage version, payload length) plus a `levelname.txt` next
//! to it. Java keeps a gzip-compressed big-endian tree whose root holds a
//! single `Data` compound.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use bytes::BufMut;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mc_conv_nbt::{read_nbt_be, read_nbt_le, to_be_bytes, write_nbt_le, CompoundExt, NbtCompound, NbtRoot, NbtTag};

use crate::error::{ConvertError, Result, ResultExt};
use crate::here;

pub const BEDROCK_STORAGE_VERSION: i32 = 10;

/// Java 1.21 world version id stored next to `DataVersion`.
pub const JAVA_VERSION_NAME: &str = "1.21";

/// Game rules: Bedrock's lowercase key and Java's camel-case key.
pub const GAME_RULES: &[(&str, &str)] = &[
    ("commandblockoutput", "commandBlockOutput"),
    ("commandblocksenabled", "commandBlocksEnabled"),
    ("dodaylightcycle", "doDaylightCycle"),
    ("doentitydrops", "doEntityDrops"),
    ("dofiretick", "doFireTick"),
    ("doimmediaterespawn", "doImmediateRespawn"),
    ("doinsomnia", "doInsomnia"),
    ("dolimitedcrafting", "doLimitedCrafting"),
    ("domobloot", "doMobLoot"),
    ("domobspawning", "doMobSpawning"),
    ("dotiledrops", "doTileDrops"),
    ("doweathercycle", "doWeatherCycle"),
    ("drowningdamage", "drowningDamage"),
    ("falldamage", "fallDamage"),
    ("firedamage", "fireDamage"),
    ("freezedamage", "freezeDamage"),
    ("keepinventory", "keepInventory"),
    ("maxcommandchainlength", "maxCommandChainLength"),
    ("mobgriefing", "mobGriefing"),
    ("naturalregeneration", "naturalRegeneration"),
    ("playerssleepingpercentage", "playersSleepingPercentage"),
    ("randomtickspeed", "randomTickSpeed"),
    ("sendcommandfeedback", "sendCommandFeedback"),
    ("showcoordinates", "reducedDebugInfo"),
    ("showdeathmessages", "showDeathMessages"),
    ("spawnradius", "spawnRadius"),
    ("tntexplodes", "tntExplodes"),
];

/// Rules that invert when crossing editions.
pub fn is_inverted_rule(bedrock: &str) -> bool {
    bedrock == "showcoordinates"
}

// ─── Bedrock ────────────────────────────────────────────────────────────────

pub fn read_bedrock_level_dat(path: &Path) -> Result<NbtCompound> {
    let data = fs::read(path).wrap_with(|| here!("reading {}", path.display()))?;
    if data.len() < 8 {
        return Err(ConvertError::invalid("level.dat too short", here!("{}", path.display())));
    }
    let len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let Some(payload) = data.get(8..8 + len) else {
        return Err(ConvertError::invalid("level.dat data truncated", here!("{}", path.display())));
    };
    let root = read_nbt_le(&mut &payload[..]).wrap_with(|| here!("parsing {}", path.display()))?;
    Ok(root.compound)
}

pub fn write_bedrock_level_dat(path: &Path, data: &NbtCompound) -> Result<()> {
    let version = data.get_int("StorageVersion").unwrap_or(BEDROCK_STORAGE_VERSION);
    let mut nbt = Vec::new();
    write_nbt_le(&mut nbt, &NbtRoot::unnamed(data.clone()));
    let mut file = Vec::with_capacity(8 + nbt.len());
    file.put_i32_le(version);
    file.put_i32_le(nbt.len() as i32);
    file.extend_from_slice(&nbt);
    fs::write(path, file).wrap_with(|| here!("writing {}", path.display()))
}

/// World name from `levelname.txt`, falling back to `LevelName`.
pub fn read_level_name(world: &Path, level_dat: &NbtCompound) -> String {
    match fs::read_to_string(world.join("levelname.txt")) {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => level_dat.get_str("LevelName").unwrap_or("world").to_string(),
    }
}

// ─── Java ───────────────────────────────────────────────────────────────────

/// The `Data` compound of a Java `level.dat`.
pub fn read_java_level_dat(path: &Path) -> Result<NbtCompound> {
    let file = fs::File::open(path).wrap_with(|| here!("opening {}", path.display()))?;
    let mut raw = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut raw)
        .wrap_with(|| here!("decompressing {}", path.display()))?;
    let root = read_nbt_be(&mut raw.as_slice()).wrap_with(|| here!("parsing {}", path.display()))?;
    root.compound
        .get_compound("Data")
        .cloned()
        .ok_or_else(|| ConvertError::invalid("level.dat has no Data", here!("{}", path.display())))
}

pub fn write_java_level_dat(path: &Path, data: NbtCompound) -> Result<()> {
    let mut root = NbtCompound::new();
    root.insert("Data".into(), NbtTag::Compound(data));
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&to_be_bytes(&root)).wrap(here!())?;
    let bytes = gz.finish().wrap(here!())?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).wrap_with(|| here!("creating {}", dir.display()))?;
    }
    fs::write(path, bytes).wrap_with(|| here!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mc_conv_level_{}", rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn bedrock_header_format() {
        let dir = temp_dir();
        let path = dir.join("level.dat");
        let mut data = NbtCompound::new();
        data.put("LevelName", "Test");
        data.put("SpawnY", 70);
        write_bedrock_level_dat(&path, &data).unwrap();

        let raw = fs::read(&path).unwrap();
        assert_eq!(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]), BEDROCK_STORAGE_VERSION);
        let len = i32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
        assert_eq!(raw.len(), 8 + len);
        assert_eq!(raw[8], 0x0A);
        assert_eq!(read_bedrock_level_dat(&path).unwrap(), data);
        assert_eq!(read_level_name(&dir, &data), "Test");

        fs::write(dir.join("levelname.txt"), "Renamed\n").unwrap();
        assert_eq!(read_level_name(&dir, &data), "Renamed");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn truncated_bedrock_file_is_rejected() {
        let dir = temp_dir();
        let path = dir.join("level.dat");
        fs::write(&path, [10, 0, 0, 0, 99, 0, 0, 0, 0x0A]).unwrap();
        assert!(read_bedrock_level_dat(&path).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn java_file_is_gzip_with_data_root() {
        let dir = temp_dir();
        let path = dir.join("level.dat");
        let mut data = NbtCompound::new();
        data.put("LevelName", "Java");
        write_java_level_dat(&path, data.clone()).unwrap();
        let raw = fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1F, 0x8B]);
        assert_eq!(read_java_level_dat(&path).unwrap(), data);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rule_names_are_unique() {
        let mut bedrock: Vec<_> = GAME_RULES.iter().map(|r| r.0).collect();
        bedrock.sort_unstable();
        bedrock.dedup();
        assert_eq!(bedrock.len(), GAME_RULES.len());
    }
}
