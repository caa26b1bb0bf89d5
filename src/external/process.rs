use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::GenerationError;

/// 外部コマンドを実行する（出力はキャプチャ、タイムアウト・キャンセル付き）
///
/// タイムアウトは `Process` として扱い、キャンセル時は子プロセスを kill する。
pub async fn run_command(
    cmd: &mut Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Output, GenerationError> {
    let program = program_name(cmd);

    if cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| GenerationError::Process(format!("{} を起動できません: {}", program, e)))?;
    debug!(program = %program, timeout_secs = timeout.as_secs(), "外部プロセス起動");

    tokio::select! {
        _ = cancel.cancelled() => Err(GenerationError::Cancelled),
        result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
            Err(_) => Err(GenerationError::Process(format!(
                "{} がタイムアウトしました（{}秒）",
                program,
                timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(GenerationError::Process(format!("{} の実行に失敗: {}", program, e))),
            Ok(Ok(output)) => Ok(output),
        },
    }
}

/// 終了コード 0 以外をエラーに変換
pub fn ensure_success(program: &str, output: &Output) -> Result<(), GenerationError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(GenerationError::Process(format!(
        "{} が異常終了しました（{}）: {}",
        program,
        output.status,
        stderr.trim()
    )))
}

pub(crate) fn program_name(cmd: &Command) -> String {
    cmd.as_std().get_program().to_string_lossy().to_string()
}
