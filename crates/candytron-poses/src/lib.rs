//! `candytron-poses` – named pose persistence.
//!
//! Two pose namespaces back symbolic position names: **base** poses ship
//! with the system and are read-only at runtime, **local** poses are saved
//! by the operator and survive restarts.  Lookup is local-first so an
//! operator can shadow a shipped pose without editing the base file.
//!
//! On disk both namespaces are toml documents mapping a name to its six
//! components:
//!
//! ```toml
//! A1 = [0.25, 0.0, 0.13, 0.0, 1.57, 0.0]
//! ```
//!
//! Every mutation rewrites the whole local file immediately; there is no
//! buffering and no append path, so a crash never leaves a partial
//! namespace behind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use candytron_types::{CandyError, Pose};
use tracing::{debug, warn};

/// Named pose storage with a read-only base namespace and a durable,
/// mutable local namespace.
pub struct PoseStore {
    base: BTreeMap<String, Pose>,
    local: BTreeMap<String, Pose>,
    local_path: PathBuf,
}

impl PoseStore {
    /// Load both namespaces.  A missing file is an empty namespace; a file
    /// that exists but does not parse is a [`CandyError::PoseStore`] error.
    pub fn open(
        base_path: impl AsRef<Path>,
        local_path: impl AsRef<Path>,
    ) -> Result<Self, CandyError> {
        let base = load_namespace(base_path.as_ref())?;
        let local = load_namespace(local_path.as_ref())?;
        debug!(
            base = base.len(),
            local = local.len(),
            "pose store opened"
        );
        Ok(Self {
            base,
            local,
            local_path: local_path.as_ref().to_path_buf(),
        })
    }

    /// Resolve `name` to a pose: local namespace first, then base.
    ///
    /// A name that is itself a bracketed list of six floats, e.g.
    /// `"[0.25, 0, 0.13, 0, 1.57, 0]"`, parses into a transient pose
    /// without touching either namespace.
    pub fn lookup(&self, name: &str) -> Option<Pose> {
        if let Some(pose) = self.local.get(name) {
            return Some(*pose);
        }
        if let Some(pose) = self.base.get(name) {
            return Some(*pose);
        }
        if name.contains('[') {
            return parse_pose_literal(name);
        }
        None
    }

    /// Save `pose` under `name` in the local namespace and persist it.
    pub fn save(&mut self, name: impl Into<String>, pose: Pose) -> Result<(), CandyError> {
        self.local.insert(name.into(), pose);
        self.persist_local()
    }

    /// Remove the local pose `name`.  Returns whether anything was removed;
    /// base poses are untouched.
    pub fn remove(&mut self, name: &str) -> Result<bool, CandyError> {
        if self.local.remove(name).is_none() {
            return Ok(false);
        }
        self.persist_local()?;
        Ok(true)
    }

    /// Clear the whole local namespace.  Returns whether it held anything.
    pub fn remove_all(&mut self) -> Result<bool, CandyError> {
        if self.local.is_empty() {
            return Ok(false);
        }
        self.local.clear();
        self.persist_local()?;
        Ok(true)
    }

    /// Names in the read-only base namespace, sorted.
    pub fn base_names(&self) -> Vec<String> {
        self.base.keys().cloned().collect()
    }

    /// Names in the local namespace, sorted.
    pub fn local_names(&self) -> Vec<String> {
        self.local.keys().cloned().collect()
    }

    fn persist_local(&self) -> Result<(), CandyError> {
        let as_lists: BTreeMap<&str, [f64; 6]> = self
            .local
            .iter()
            .map(|(name, pose)| (name.as_str(), pose.components()))
            .collect();
        let raw = toml::to_string_pretty(&as_lists).map_err(|e| CandyError::PoseStore {
            details: format!("failed to serialize poses: {e}"),
        })?;
        if let Some(parent) = self.local_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CandyError::PoseStore {
                details: format!("failed to create {}: {e}", parent.display()),
            })?;
        }
        fs::write(&self.local_path, raw).map_err(|e| CandyError::PoseStore {
            details: format!("failed to write {}: {e}", self.local_path.display()),
        })
    }
}

fn load_namespace(path: &Path) -> Result<BTreeMap<String, Pose>, CandyError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path).map_err(|e| CandyError::PoseStore {
        details: format!("failed to read {}: {e}", path.display()),
    })?;
    let as_lists: BTreeMap<String, [f64; 6]> =
        toml::from_str(&raw).map_err(|e| CandyError::PoseStore {
            details: format!("failed to parse {}: {e}", path.display()),
        })?;
    Ok(as_lists
        .into_iter()
        .map(|(name, components)| (name, Pose::from_components(components)))
        .collect())
}

/// Parse `"[x, y, z, roll, pitch, yaw]"` into a transient pose.
fn parse_pose_literal(raw: &str) -> Option<Pose> {
    let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?;
    let parsed: Result<Vec<f64>, _> = inner.split(',').map(|p| p.trim().parse()).collect();
    match parsed {
        Ok(components) if components.len() == 6 => Some(Pose::from_components([
            components[0],
            components[1],
            components[2],
            components[3],
            components[4],
            components[5],
        ])),
        Ok(components) => {
            warn!(raw, count = components.len(), "pose literal needs exactly six components");
            None
        }
        Err(e) => {
            warn!(raw, error = %e, "failed to parse pose literal");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pose(x: f64) -> Pose {
        Pose::from_components([x, -0.0001, 0.1649, 0.002, 1.006, -0.001])
    }

    fn store_in(dir: &TempDir) -> PoseStore {
        PoseStore::open(dir.path().join("base.toml"), dir.path().join("local.toml")).unwrap()
    }

    #[test]
    fn missing_files_open_as_empty_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.base_names().is_empty());
        assert!(store.local_names().is_empty());
        assert_eq!(store.lookup("A1"), None);
    }

    #[test]
    fn save_reload_lookup_roundtrips_all_six_components() {
        let dir = tempfile::tempdir().unwrap();
        let saved = Pose::from_components([0.2471, -0.0853, 0.1312, 0.013, 1.5708, -0.042]);
        {
            let mut store = store_in(&dir);
            store.save("B2", saved).unwrap();
        }
        let reloaded = store_in(&dir);
        let got = reloaded.lookup("B2").expect("saved pose must survive reload");
        let (a, b) = (got.components(), saved.components());
        for k in 0..6 {
            assert!((a[k] - b[k]).abs() < 1e-12, "component {k}: {} != {}", a[k], b[k]);
        }
    }

    #[test]
    fn local_pose_shadows_base_pose() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "A1 = [0.25, 0.0, 0.13, 0.0, 1.57, 0.0]\n",
        )
        .unwrap();
        let mut store = store_in(&dir);
        assert_eq!(store.lookup("A1").unwrap().x, 0.25);

        store.save("A1", pose(0.9)).unwrap();
        assert_eq!(store.lookup("A1").unwrap().x, 0.9);

        // Removing the local override reveals the base pose again.
        assert!(store.remove("A1").unwrap());
        assert_eq!(store.lookup("A1").unwrap().x, 0.25);
    }

    #[test]
    fn remove_reports_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(!store.remove("ghost").unwrap());
    }

    #[test]
    fn remove_all_clears_only_the_local_namespace() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "O0 = [0.0, -0.25, 0.2, 0.0, 1.57, -1.57]\n",
        )
        .unwrap();
        let mut store = store_in(&dir);
        store.save("X1", pose(0.1)).unwrap();
        store.save("X2", pose(0.2)).unwrap();

        assert!(store.remove_all().unwrap());
        assert!(store.local_names().is_empty());
        assert_eq!(store.base_names(), vec!["O0".to_string()]);
        assert!(store.lookup("O0").is_some());

        // Nothing left to remove.
        assert!(!store.remove_all().unwrap());
    }

    #[test]
    fn mutations_are_written_through_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let local_path = dir.path().join("local.toml");
        let mut store = store_in(&dir);
        store.save("A1", pose(0.3)).unwrap();

        let on_disk = fs::read_to_string(&local_path).unwrap();
        assert!(on_disk.contains("A1"), "save must persist before returning");

        store.remove("A1").unwrap();
        let on_disk = fs::read_to_string(&local_path).unwrap();
        assert!(!on_disk.contains("A1"), "remove must persist before returning");
    }

    #[test]
    fn base_file_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let base_path = dir.path().join("base.toml");
        fs::write(&base_path, "A1 = [0.25, 0.0, 0.13, 0.0, 1.57, 0.0]\n").unwrap();
        let before = fs::read_to_string(&base_path).unwrap();

        let mut store = store_in(&dir);
        store.save("A1", pose(0.9)).unwrap();
        store.remove_all().unwrap();

        assert_eq!(fs::read_to_string(&base_path).unwrap(), before);
    }

    #[test]
    fn malformed_namespace_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.toml"), "A1 = \"not a pose\"\n").unwrap();
        let result = PoseStore::open(dir.path().join("base.toml"), dir.path().join("local.toml"));
        assert!(matches!(result, Err(CandyError::PoseStore { .. })));
    }

    #[test]
    fn bracketed_six_float_names_parse_as_transient_poses() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let pose = store
            .lookup("[0.25, 0, 0.13, 0, 1.57, 0]")
            .expect("literal must parse");
        assert_eq!(pose.components(), [0.25, 0.0, 0.13, 0.0, 1.57, 0.0]);
    }

    #[test]
    fn malformed_pose_literals_resolve_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.lookup("[0.25, 0, 0.13]"), None);
        assert_eq!(store.lookup("[a, b, c, d, e, f]"), None);
        assert_eq!(store.lookup("[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]"), None);
    }
}
