//! Environment overrides applied while the cluster bootstraps.

use super::BoxError;
use super::worker_helpers::prepare_pg_worker;
use crate::test_helpers::locate_pg_worker_path;
use pg_embedded_setup_unpriv::{ExecutionPrivileges, detect_execution_privileges};
use std::ffi::OsString;
use std::net::TcpListener;

pub(super) fn env_vars_to_os(
    env_vars: &[(String, Option<String>)],
) -> Vec<(OsString, Option<OsString>)> {
    env_vars
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

/// Picks a free port unless `PG_PORT` is set, and points root runs at a
/// prepared copy of `pg_worker`.
pub(super) fn worker_env_changes() -> Result<Vec<(OsString, Option<OsString>)>, BoxError> {
    let mut changes = Vec::new();
    if std::env::var_os("PG_PORT").is_none() {
        changes.push((OsString::from("PG_PORT"), Some(free_port()?)));
    }

    let needs_worker = matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        && std::env::var_os("PG_EMBEDDED_WORKER").is_none();
    if needs_worker {
        let worker = locate_pg_worker_path().ok_or_else(|| -> BoxError {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "running as root needs the pg_worker binary; build it or set PG_EMBEDDED_WORKER",
            ))
        })?;
        let prepared = prepare_pg_worker(&worker)?;
        changes.push((
            OsString::from("PG_EMBEDDED_WORKER"),
            Some(OsString::from(prepared.as_str())),
        ));
    }
    Ok(changes)
}

fn free_port() -> Result<OsString, BoxError> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(OsString::from(port.to_string()))
}
