use crate::config::{BacklitConfig, WriterKind};
use crate::consts::*;
use crate::errors::*;

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use tokio::fs::{OpenOptions, metadata};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use zbus::Connection;

make_log_macro!(debug, "writer");

#[zbus::dbus_proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1/session/auto"
)]
trait Session {
    fn set_brightness(&self, subsystem: &str, name: &str, brightness: u32) -> zbus::Result<()>;
}

/// Write `value` for `device` (whose brightness file is `path`) using the
/// writer selected in `config`.
pub(crate) async fn write_brightness(
    config: &BacklitConfig,
    device: &str,
    path: &Path,
    value: u32,
) -> Result<()> {
    debug!("{:?} <- {} via {:?}", path, value, config.writer);
    match config.writer {
        WriterKind::Elevated => {
            write_elevated(&config.elevation_command, &config.write_command, path, value).await
        }
        WriterKind::Logind => write_logind(device, value).await,
        WriterKind::Direct => write_direct(path, value).await,
    }
}

/// Spawn `<elevation_command> <write_command> <path>` and feed `value` on stdin.
/// Blocks for as long as the elevation program waits on the user.
async fn write_elevated(
    elevation_command: &[String],
    write_command: &[String],
    path: &Path,
    value: u32,
) -> Result<()> {
    let mut argv = elevation_command.iter().chain(write_command);
    let program = argv
        .next()
        .ok_or_else(|| BacklitError::Other("Empty write command".into()))?;

    // Elevation wrappers exit 127 both when authorization fails and when the
    // wrapped program is missing, so look the write command up first.
    if !elevation_command.is_empty() {
        if let Some(write_program) = write_command.first() {
            if !is_executable_on_path(write_program).await {
                return Err(BacklitError::CommandNotFound {
                    program: write_program.clone(),
                });
            }
        }
    }

    let mut child = Command::new(program)
        .args(argv)
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => BacklitError::CommandNotFound {
                program: program.clone(),
            },
            _ => e.into(),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(value.to_string().as_bytes()).await {
            Ok(()) => {}
            // The child exited without reading, its status says why.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("{e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let output = child.wait_with_output().await?;
    if output.status.success() {
        return Ok(());
    }

    let denied = output
        .status
        .code()
        .is_some_and(|code| ELEVATION_DENIED_CODES.contains(&code));
    if denied && !elevation_command.is_empty() {
        Err(BacklitError::ElevationDenied {
            program: program.clone(),
        })
    } else {
        Err(BacklitError::WriteRejected {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Whether `program` names an existing file, either directly (when it
/// contains a `/`) or through a `PATH` entry.
async fn is_executable_on_path(program: &str) -> bool {
    if program.contains('/') {
        return metadata(program).await.is_ok_and(|m| m.is_file());
    }
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    for dir in std::env::split_paths(&path) {
        if metadata(dir.join(program)).await.is_ok_and(|m| m.is_file()) {
            return true;
        }
    }
    false
}

async fn write_logind(device: &str, value: u32) -> Result<()> {
    let dbus_conn = Connection::system()
        .await
        .error("Failed to open DBus system connection")?;
    let proxy = SessionProxy::new(&dbus_conn)
        .await
        .error("Failed to create SessionProxy")?;
    Ok(proxy.set_brightness("backlight", device, value).await?)
}

async fn write_direct(path: &Path, value: u32) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .error("Could not open brightness file to write")?;
    file.write_all(value.to_string().as_bytes())
        .await
        .error("Could not write sysfs brightness")
}
