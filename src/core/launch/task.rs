// ─── Launch Task ───
// Spawns the game with the assembled argument vector, relays its output
// line by line and reports the exit code.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSender, LaunchEvent};

/// Run `java args..` in `root` until it exits. Every stdout/stderr line is
/// emitted as `Data`, the exit code as `Close` and returned.
pub async fn run_game(
    java: &Path,
    args: &[String],
    root: &Path,
    events: &EventSender,
) -> LauncherResult<i32> {
    let mut cmd = Command::new(java);
    cmd.args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    configure_platform_spawn(&mut cmd);

    info!("Launching game with Java: {:?}", java);
    debug!("Command (copy/paste): {}", format_command_for_logs(cmd.as_std()));

    let mut child = cmd.spawn().map_err(|e| LauncherError::Exec {
        program: java.display().to_string(),
        reason: e.to_string(),
    })?;

    let stdout = child.stdout.take().map(|out| relay(out, events.clone()));
    let stderr = child.stderr.take().map(|err| relay(err, events.clone()));

    let status = child.wait().await.map_err(|e| LauncherError::Exec {
        program: java.display().to_string(),
        reason: e.to_string(),
    })?;
    for task in [stdout, stderr].into_iter().flatten() {
        let _ = task.await;
    }

    let code = status.code().unwrap_or(-1);
    info!("Game exited with code {}", code);
    events.emit(LaunchEvent::Close { code });
    Ok(code)
}

fn relay<R>(stream: R, events: EventSender) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    // Game output is not guaranteed to be UTF-8.
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    events.emit(LaunchEvent::Data { line });
                }
                Err(e) => {
                    warn!("Game output stream closed: {}", e);
                    break;
                }
            }
        }
    })
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        // Terminal session variables make LWJGL treat the game as a console app.
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

/// Arguments whose following value never reaches the log.
const SECRET_FLAGS: &[&str] = &["--accessToken", "--session"];

fn format_command_for_logs(cmd: &std::process::Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let mut masked = false;
    let args = cmd
        .get_args()
        .map(|arg| {
            let arg = arg.to_string_lossy();
            let out = if masked {
                "********".to_string()
            } else {
                shell_escape(&arg)
            };
            masked = SECRET_FLAGS.contains(&arg.as_ref());
            out
        })
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
