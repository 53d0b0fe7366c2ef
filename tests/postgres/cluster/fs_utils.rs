//! Reads files the embedded cluster writes into its own directories.

use super::BoxError;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use postgresql_embedded::Settings;
use std::io::ErrorKind;

pub(super) fn open_parent_dir(path: &Utf8Path) -> Result<(Dir, &str), BoxError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| -> BoxError { format!("`{path}` has no file name").into() })?;
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Reads `file` under `dir`, treating a missing file as `None`.
fn read_optional(dir: &Utf8Path, file: &str) -> Result<Option<String>, BoxError> {
    let handle = Dir::open_ambient_dir(dir, ambient_authority())?;
    match handle.read_to_string(file) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Adopts the password the bootstrap wrote to its password file.
pub(super) fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let path_text = settings.password_file.to_string_lossy().into_owned();
    let path = Utf8Path::new(&path_text);
    let (dir, file_name) = open_parent_dir(path)?;
    let contents = match dir.read_to_string(file_name) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    let password = contents.trim_end();
    if !password.is_empty() {
        password.clone_into(&mut settings.password);
    }
    Ok(())
}

/// Adopts the port recorded on the fourth line of `postmaster.pid`.
pub(super) fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir = settings.data_dir.to_string_lossy().into_owned();
    let Some(contents) = read_optional(Utf8Path::new(&data_dir), "postmaster.pid")? else {
        return Ok(());
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}
