//! Copies `pg_worker` somewhere the `nobody` user can execute it.

use super::BoxError;
use super::fs_utils::open_parent_dir;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::{Permissions, PermissionsExt};
use std::io::Write;
use std::sync::{Mutex, OnceLock, PoisonError};

static PREPARED_WORKER: OnceLock<Mutex<Option<Utf8PathBuf>>> = OnceLock::new();

/// Returns a world-executable wrapper around a copy of `worker` in the
/// temporary directory. The copy is made once per test process.
pub(super) fn prepare_pg_worker(worker: &Utf8Path) -> Result<Utf8PathBuf, BoxError> {
    let mut prepared = PREPARED_WORKER
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(path) = prepared.as_ref() {
        return Ok(path.clone());
    }

    let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir())?;
    let wrapper_path = temp_dir.join(format!("forgeboard_pg_worker_{}", std::process::id()));
    let binary_path = wrapper_path.with_extension("bin");

    let (source_dir, source_name) = open_parent_dir(worker)?;
    let (target_dir, binary_name) = open_parent_dir(&binary_path)?;
    let (_, wrapper_name) = open_parent_dir(&wrapper_path)?;
    for stale in [binary_name, wrapper_name] {
        match target_dir.remove_file(stale) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => return Err(err.into()),
            _ => {}
        }
    }

    source_dir.copy(source_name, &target_dir, binary_name)?;
    let mut wrapper = target_dir.create(wrapper_name)?;
    write!(
        wrapper,
        concat!(
            "#!/bin/sh\n",
            "if [ \"$(id -u)\" -eq 0 ]; then\n",
            "  exec /usr/sbin/runuser -u nobody -- {worker} \"$@\"\n",
            "fi\n",
            "exec {worker} \"$@\"\n",
        ),
        worker = binary_path,
    )?;
    for name in [binary_name, wrapper_name] {
        target_dir.set_permissions(name, Permissions::from_mode(0o755))?;
    }

    *prepared = Some(wrapper_path.clone());
    Ok(wrapper_path)
}
