//! Runs one embedded `PostgreSQL` lifecycle step as an unprivileged user.
//!
//! Usage:
//!
//! ```text
//! pg_worker <setup|start|stop> <payload-path>
//! ```
//!
//! The payload is the JSON form of a [`WorkerPayload`]: the
//! `postgresql_embedded` settings plus environment overrides. The Postgres
//! test harness invokes this binary when the test process runs as root,
//! because `initdb` and `postgres` refuse to run with root credentials.

#[cfg(unix)]
use camino::{Utf8Path, Utf8PathBuf};
#[cfg(unix)]
use nix::unistd::{Uid, User, initgroups, setgid, setuid};
#[cfg(unix)]
use pg_embedded_setup_unpriv::ambient_dir_and_path;
#[cfg(unix)]
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
#[cfg(unix)]
use postgresql_embedded::{PostgreSQL, Status};
#[cfg(unix)]
use std::env;
#[cfg(unix)]
use std::ffi::CString;
#[cfg(unix)]
use std::io::{self, Read};
#[cfg(unix)]
use std::process::Command;
#[cfg(unix)]
use thiserror::Error;

#[cfg(unix)]
const REEXEC_MARKER: &str = "FORGEBOARD_PG_WORKER_REEXEC";
#[cfg(unix)]
const TRUSTED_PATH: &str = "/usr/sbin:/usr/bin:/sbin:/bin";
#[cfg(unix)]
const WORKER_USER: &str = "nobody";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
#[derive(Debug, Error)]
enum WorkerError {
    #[error("usage: pg_worker <setup|start|stop> <payload-path>: {0}")]
    Usage(String),
    #[error("failed to read payload: {0}")]
    PayloadRead(#[source] BoxError),
    #[error("failed to parse payload: {0}")]
    PayloadParse(#[source] serde_json::Error),
    #[error("invalid postgres settings: {0}")]
    Settings(String),
    #[error("failed to build runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to drop privileges: {0}")]
    PrivilegeDrop(String),
    #[error("postgres {operation:?} failed: {message}")]
    Postgres {
        operation: Operation,
        message: String,
    },
}

#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
enum Operation {
    Setup,
    Start,
    Stop,
}

#[cfg(unix)]
impl Operation {
    fn parse(arg: &str) -> Result<Self, WorkerError> {
        match arg {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(WorkerError::Usage(format!("unknown operation `{other}`"))),
        }
    }

    fn failure(self, err: impl std::fmt::Display) -> WorkerError {
        WorkerError::Postgres {
            operation: self,
            message: err.to_string(),
        }
    }

    async fn run(self, mut postgres: PostgreSQL) -> Result<(), WorkerError> {
        match self {
            Self::Setup => {
                postgres.setup().await.map_err(|err| self.failure(err))?;
                ensure_started(self, &mut postgres).await
            }
            Self::Start => {
                ensure_started(self, &mut postgres).await?;
                // Keep the server running after the worker exits.
                let _running = std::mem::ManuallyDrop::new(postgres);
                Ok(())
            }
            Self::Stop => postgres.stop().await.map_err(|err| self.failure(err)),
        }
    }
}

#[cfg(unix)]
async fn ensure_started(
    operation: Operation,
    postgres: &mut PostgreSQL,
) -> Result<(), WorkerError> {
    if matches!(postgres.status(), Status::Started) {
        return Ok(());
    }
    postgres.start().await.map_err(|err| operation.failure(err))
}

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    let args = utf8_args()?;
    reexec_unprivileged(&args)?;
    let (operation, payload_path) = parse_args(&args)?;
    run(operation, &payload_path).map_err(Into::into)
}

#[cfg(unix)]
fn utf8_args() -> Result<Vec<String>, WorkerError> {
    env::args_os()
        .skip(1)
        .map(|arg| {
            arg.into_string()
                .map_err(|_| WorkerError::Usage("arguments must be UTF-8".to_owned()))
        })
        .collect()
}

#[cfg(unix)]
fn parse_args(args: &[String]) -> Result<(Operation, Utf8PathBuf), WorkerError> {
    match args {
        [operation, path] => Ok((Operation::parse(operation)?, Utf8PathBuf::from(path))),
        _ => Err(WorkerError::Usage(format!(
            "expected two arguments, got {}",
            args.len()
        ))),
    }
}

#[cfg(unix)]
fn run(operation: Operation, payload_path: &Utf8Path) -> Result<(), WorkerError> {
    let payload = load_payload(payload_path)?;
    drop_privileges(WORKER_USER)?;
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| WorkerError::Settings(err.to_string()))?;
    apply_environment(&payload.environment);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::Runtime)?;
    runtime.block_on(operation.run(PostgreSQL::new(settings)))
}

/// Re-executes through `runuser` so the child starts with a clean
/// credential set. Falls through to the in-process drop when `runuser` is
/// unavailable.
#[cfg(unix)]
fn reexec_unprivileged(args: &[String]) -> Result<(), WorkerError> {
    if !Uid::effective().is_root() || env::var_os(REEXEC_MARKER).is_some() {
        return Ok(());
    }
    let exe = env::current_exe().map_err(WorkerError::Runtime)?;
    let status = Command::new("runuser")
        .args(["-u", WORKER_USER, "--"])
        .arg(exe)
        .args(args)
        .env(REEXEC_MARKER, "1")
        .env("PATH", TRUSTED_PATH)
        .status();
    match status {
        Ok(exit) => std::process::exit(exit.code().unwrap_or(1)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(WorkerError::PrivilegeDrop(err.to_string())),
    }
}

#[cfg(unix)]
fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
    let read = || -> Result<Vec<u8>, BoxError> {
        let (dir, relative) = ambient_dir_and_path(path)?;
        let mut file = dir.open(relative.as_std_path())?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    };
    let bytes = read().map_err(WorkerError::PayloadRead)?;
    serde_json::from_slice(&bytes).map_err(WorkerError::PayloadParse)
}

#[cfg(unix)]
fn drop_privileges(username: &str) -> Result<(), WorkerError> {
    if !Uid::effective().is_root() {
        return Ok(());
    }
    let denied = |err: nix::Error| WorkerError::PrivilegeDrop(err.to_string());
    let user = User::from_name(username)
        .map_err(denied)?
        .ok_or_else(|| WorkerError::PrivilegeDrop(format!("no user named `{username}`")))?;
    let name = CString::new(user.name.as_str())
        .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    initgroups(&name, user.gid).map_err(denied)?;
    setgid(user.gid).map_err(denied)?;
    setuid(user.uid).map_err(denied)?;

    // SAFETY: the worker is single-threaded until the runtime is built.
    unsafe {
        env::set_var("HOME", &user.dir);
        env::set_var("USER", &user.name);
        env::set_var("LOGNAME", &user.name);
    }
    Ok(())
}

#[cfg(unix)]
fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
    for (key, value) in environment {
        // SAFETY: the worker is single-threaded until the runtime is built.
        unsafe {
            match value {
                Some(secret) => env::set_var(key, secret.expose()),
                None => env::remove_var(key),
            }
        }
    }
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker is only supported on Unix platforms".into())
}
