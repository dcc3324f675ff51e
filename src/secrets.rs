use anyhow::{anyhow, Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Source of provider credentials.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Process environment (including anything `.env` loaded at startup).
pub struct EnvStore;

impl SecretStore for EnvStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Credentials read once from a private dotenv-style file.
pub struct EnvFileStore {
    map: HashMap<String, String>,
}

impl EnvFileStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_private(&path)?;

        let iter = dotenvy::from_path_iter(&path)
            .with_context(|| format!("failed reading secrets file: {}", path.display()))?;

        let mut map = HashMap::new();
        for item in iter {
            let (k, v) =
                item.with_context(|| format!("malformed secrets file: {}", path.display()))?;
            if !v.trim().is_empty() {
                map.insert(k, v);
            }
        }

        Ok(Self { map })
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self { map }
    }
}

impl SecretStore for EnvFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }
}

/// First store that has the key wins.
pub struct CompositeStore {
    stores: Vec<Box<dyn SecretStore>>,
}

impl CompositeStore {
    pub fn new(stores: Vec<Box<dyn SecretStore>>) -> Self {
        Self { stores }
    }
}

impl SecretStore for CompositeStore {
    fn get(&self, key: &str) -> Option<String> {
        self.stores.iter().find_map(|s| s.get(key))
    }
}

/// Refuse secrets files that group/others can reach.
///
/// Both the file and its parent directory must have `mode & 0o077 == 0`, and must be
/// owned by the same user. No-op on non-unix targets.
pub fn ensure_private(path: &Path) -> Result<()> {
    let meta = fs::metadata(path)
        .with_context(|| format!("secrets file not found: {}", path.display()))?;

    #[cfg(unix)]
    {
        let mode = meta.mode() & 0o777;
        if mode & 0o077 != 0 {
            return Err(anyhow!(
                "secrets file permissions too open: {} has mode {:o} (want 600)",
                path.display(),
                mode
            ));
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let pmeta = fs::metadata(parent)?;
        let pmode = pmeta.mode() & 0o777;
        if pmode & 0o077 != 0 {
            return Err(anyhow!(
                "secrets directory permissions too open: {} has mode {:o} (want 700)",
                parent.display(),
                pmode
            ));
        }
        if meta.uid() != pmeta.uid() {
            return Err(anyhow!(
                "secrets ownership mismatch: file uid {} vs directory uid {}",
                meta.uid(),
                pmeta.uid()
            ));
        }
    }

    #[cfg(not(unix))]
    let _ = meta;

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn private_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700)).unwrap();
        dir
    }

    fn write(dir: &Path, body: &str, mode: u32) -> PathBuf {
        let p = dir.join("secrets.env");
        fs::write(&p, body).unwrap();
        fs::set_permissions(&p, fs::Permissions::from_mode(mode)).unwrap();
        p
    }

    #[test]
    fn loads_private_file_with_dotenv_syntax() {
        let dir = private_dir();
        let p = write(
            dir.path(),
            "# providers\nGEMINI_API_KEY=\"g-key\"\nDEEPSEEK_API_KEY=d-key\nEMPTY=\n",
            0o600,
        );
        let store = EnvFileStore::load(&p).unwrap();
        assert_eq!(store.get("GEMINI_API_KEY").as_deref(), Some("g-key"));
        assert_eq!(store.get("DEEPSEEK_API_KEY").as_deref(), Some("d-key"));
        assert!(!store.contains("EMPTY"));
    }

    #[test]
    fn rejects_world_readable_file() {
        let dir = private_dir();
        let p = write(dir.path(), "GEMINI_API_KEY=x\n", 0o644);
        let err = EnvFileStore::load(&p).err().unwrap().to_string();
        assert!(err.contains("too open"), "{err}");
    }

    #[test]
    fn composite_prefers_earlier_store() {
        let first = EnvFileStore::from_map(HashMap::from([("K".to_string(), "one".to_string())]));
        let second = EnvFileStore::from_map(HashMap::from([
            ("K".to_string(), "two".to_string()),
            ("J".to_string(), "only-second".to_string()),
        ]));
        let store = CompositeStore::new(vec![Box::new(first), Box::new(second)]);
        assert_eq!(store.get("K").as_deref(), Some("one"));
        assert_eq!(store.get("J").as_deref(), Some("only-second"));
        assert_eq!(store.get("missing"), None);
    }
}
