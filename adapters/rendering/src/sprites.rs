use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use tilestrike_core::{SpriteCatalog, SpriteHandle};

/// Manifest format version understood by [`SpriteManifest`].
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Named sprite resources resolved from a TOML manifest.
///
/// Handles are assigned in name order, so the same manifest always yields
/// the same handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteManifest {
    entries: Vec<(String, PathBuf)>,
}

impl SpriteManifest {
    /// Loads the manifest at the provided path. Sprite paths resolve relative
    /// to the manifest's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_toml_str(&contents, &base)
    }

    /// Parses manifest TOML, resolving sprite paths against `base_path`.
    pub fn from_toml_str(contents: &str, base_path: &Path) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "unsupported sprite manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_MANIFEST_VERSION
            );
        }

        let mut entries = Vec::with_capacity(manifest.sprites.len());
        for (name, relative_path) in manifest.sprites {
            if name.trim().is_empty() {
                bail!("sprite manifest contains an empty sprite name");
            }
            entries.push((name, base_path.join(relative_path)));
        }
        Ok(Self { entries })
    }

    /// Builds a manifest for the provided names with conventional
    /// `sprites/<name>.png` paths.
    #[must_use]
    pub fn builtin<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let entries: BTreeMap<String, PathBuf> = names
            .into_iter()
            .map(|name| (name.to_owned(), PathBuf::from(format!("sprites/{name}.png"))))
            .collect();
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Fails when any of the provided names is missing from the manifest.
    pub fn require<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let missing: Vec<&str> = names
            .into_iter()
            .filter(|name| self.acquire(name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("sprite manifest missing entries for {}", missing.join(", "));
        }
        Ok(())
    }

    /// Name registered for a handle.
    #[must_use]
    pub fn name(&self, handle: SpriteHandle) -> Option<&str> {
        self.entry(handle).map(|(name, _)| name.as_str())
    }

    /// Asset path registered for a handle.
    #[must_use]
    pub fn path(&self, handle: SpriteHandle) -> Option<&Path> {
        self.entry(handle).map(|(_, path)| path.as_path())
    }

    /// Number of sprites in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the manifest lists no sprite.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, handle: SpriteHandle) -> Option<&(String, PathBuf)> {
        usize::try_from(handle.get())
            .ok()
            .and_then(|index| self.entries.get(index))
    }
}

impl SpriteCatalog for SpriteManifest {
    fn acquire(&self, name: &str) -> Option<SpriteHandle> {
        let index = self
            .entries
            .binary_search_by(|(entry, _)| entry.as_str().cmp(name))
            .ok()?;
        u32::try_from(index).ok().map(SpriteHandle::new)
    }
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    sprites: BTreeMap<String, String>,
}
