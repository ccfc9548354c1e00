//! Physical location of objects: pack file and offset
//!
//! Pack indexes under `objects/pack/` are read once with `gix-pack`; objects
//! not found in any pack are looked up as loose files.

use git2::{Oid, Repository};
use gitrows_core::{hash_hex, is_hash, HASH_LEN, ZERO_HASH};
use gix_hash::Kind as HashKind;
use gix_pack::index;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where an object is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Pack checksum as hex, or the zero hash for loose objects
    pub packfile: String,
    pub offset: u64,
}

impl Location {
    pub fn loose() -> Self {
        Self {
            packfile: ZERO_HASH.to_string(),
            offset: 0,
        }
    }

    pub fn is_loose(&self) -> bool {
        self.packfile == ZERO_HASH
    }
}

/// Object id -> location lookup for one repository
pub struct ObjectLocator {
    packed: HashMap<[u8; HASH_LEN], Location>,
    objects_dir: PathBuf,
}

impl ObjectLocator {
    pub fn load(repo: &Repository) -> Self {
        Self::from_objects_dir(repo.path().join("objects"))
    }

    pub fn from_objects_dir(objects_dir: PathBuf) -> Self {
        let packed = load_all_packs(&objects_dir);
        log::debug!(
            "Loaded {} packed object locations from {:?}",
            packed.len(),
            objects_dir
        );
        Self {
            packed,
            objects_dir,
        }
    }

    /// Location of `oid`, or `None` if the object is neither packed nor loose
    pub fn locate(&self, oid: Oid) -> Option<Location> {
        let raw: [u8; HASH_LEN] = oid.as_bytes().try_into().ok()?;
        if let Some(location) = self.packed.get(&raw) {
            return Some(location.clone());
        }

        let hex = hash_hex(&raw);
        let loose = self.objects_dir.join(&hex[..2]).join(&hex[2..]);
        loose.is_file().then(Location::loose)
    }

    /// Number of objects found in pack indexes
    pub fn packed_len(&self) -> usize {
        self.packed.len()
    }
}

/// Pack checksum from an index file name (`pack-<hex>.idx`)
fn pack_name(idx_path: &Path) -> Option<String> {
    let stem = idx_path.file_stem()?.to_str()?;
    let hex = stem.strip_prefix("pack-")?;
    is_hash(hex).then(|| hex.to_string())
}

type PackResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn load_pack(idx_path: &Path, packfile: &str) -> PackResult<Vec<([u8; HASH_LEN], Location)>> {
    let idx = index::File::at(idx_path, HashKind::Sha1)?;
    Ok(idx
        .iter()
        .filter_map(|entry| {
            let raw: [u8; HASH_LEN] = entry.oid.as_slice().try_into().ok()?;
            Some((
                raw,
                Location {
                    packfile: packfile.to_string(),
                    offset: entry.pack_offset,
                },
            ))
        })
        .collect())
}

fn load_all_packs(objects_dir: &Path) -> HashMap<[u8; HASH_LEN], Location> {
    let mut packed = HashMap::new();
    let Ok(entries) = std::fs::read_dir(objects_dir.join("pack")) else {
        return packed;
    };

    let mut idx_paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "idx"))
        .collect();
    // Deterministic choice when an object is in several packs
    idx_paths.sort();

    for path in idx_paths {
        let Some(packfile) = pack_name(&path) else {
            log::warn!("Ignoring pack index with unexpected name {:?}", path);
            continue;
        };
        match load_pack(&path, &packfile) {
            Ok(locations) => {
                for (oid, location) in locations {
                    packed.entry(oid).or_insert(location);
                }
            }
            Err(e) => log::warn!("Failed to load pack index {:?}: {}", path, e),
        }
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_name() {
        let hex = "d5c0f4ab811897cadf03aec358ae60d21f91c50d";
        let path = PathBuf::from(format!("objects/pack/pack-{}.idx", hex));
        assert_eq!(pack_name(&path).as_deref(), Some(hex));
        assert_eq!(pack_name(Path::new("objects/pack/other.idx")), None);
        assert_eq!(pack_name(Path::new("objects/pack/pack-abc.idx")), None);
    }

    #[test]
    fn test_missing_object_dir() {
        let locator = ObjectLocator::from_objects_dir(PathBuf::from("/nonexistent/objects"));
        assert_eq!(locator.packed_len(), 0);
        assert_eq!(locator.locate(Oid::zero()), None);
    }
}
