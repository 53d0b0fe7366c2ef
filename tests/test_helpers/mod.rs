//! Process-environment helpers shared by the `PostgreSQL` integration tests.

use camino::Utf8PathBuf;
use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

const WORKER_NAME: &str = "pg_worker";

/// Restores the previous values of the variables it changed when dropped.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Applies `changes`; `None` removes the variable.
    pub fn set_many(changes: &[(OsString, Option<OsString>)]) -> Self {
        let lock = env_lock();
        let previous = changes
            .iter()
            .map(|(key, value)| {
                let old = env::var_os(key);
                // SAFETY: ENV_MUTEX serialises every mutation made by the tests.
                unsafe { write_var(key, value.as_ref()) };
                (key.clone(), old)
            })
            .collect();
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            // SAFETY: the guard still holds ENV_MUTEX.
            unsafe { write_var(&key, value.as_ref()) };
        }
    }
}

unsafe fn write_var(key: &OsString, value: Option<&OsString>) {
    // SAFETY: callers hold ENV_MUTEX.
    unsafe {
        match value {
            Some(new_value) => env::set_var(key, new_value),
            None => env::remove_var(key),
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Finds the `pg_worker` binary built alongside the tests.
///
/// Looks at `CARGO_BIN_EXE_pg_worker` (runtime, then compile time), the
/// target directory holding the test executable, and finally `PATH`.
pub fn locate_pg_worker_path() -> Option<Utf8PathBuf> {
    from_cargo_env()
        .or_else(near_test_executable)
        .or_else(on_path)
}

fn from_cargo_env() -> Option<Utf8PathBuf> {
    env::var("CARGO_BIN_EXE_pg_worker")
        .ok()
        .or_else(|| option_env!("CARGO_BIN_EXE_pg_worker").map(str::to_owned))
        .map(Utf8PathBuf::from)
        .filter(|path| path.is_file())
}

fn near_test_executable() -> Option<Utf8PathBuf> {
    let exe = Utf8PathBuf::try_from(env::current_exe().ok()?).ok()?;
    // Test binaries live in `target/<profile>/deps`; bins one level up.
    exe.parent()?
        .ancestors()
        .take(2)
        .map(|dir| dir.join(WORKER_NAME))
        .find(|candidate| candidate.is_file())
}

fn on_path() -> Option<Utf8PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .filter_map(|dir| Utf8PathBuf::try_from(dir).ok())
        .map(|dir| dir.join(WORKER_NAME))
        .find(|candidate| candidate.is_file())
}
