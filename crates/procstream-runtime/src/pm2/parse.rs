//! PM2 `jlist` output mapping.
//!
//! PM2 emits one JSON object per process with most interesting fields nested
//! under `pm2_env` and `monit`. Missing or mistyped fields fall back to
//! defaults rather than failing the whole listing.

use procstream_core::{LogPaths, ProcessControlError, ProcessInfo, ProcessStatus};
use serde_json::Value;

/// Parse the stdout of `pm2 jlist`.
///
/// PM2 sometimes prints banner or warning lines before the JSON array; they
/// are skipped.
pub fn parse_process_list(output: &str) -> Result<Vec<ProcessInfo>, ProcessControlError> {
    let mut last_error = None;

    // Try each line that could open the array; banners like "[PM2] ..." fail
    // to parse and are skipped.
    let mut offset = 0;
    for line in output.split_inclusive('\n') {
        if line.trim_start().starts_with('[') {
            match serde_json::from_str::<Vec<Value>>(output[offset..].trim()) {
                Ok(entries) => return Ok(entries.iter().map(process_from_json).collect()),
                Err(err) => last_error = Some(err),
            }
        }
        offset += line.len();
    }

    Err(match last_error {
        Some(err) => unavailable(&format!("invalid pm2 jlist output: {err}")),
        None => unavailable("pm2 jlist produced no JSON array"),
    })
}

fn process_from_json(proc: &Value) -> ProcessInfo {
    let env = &proc["pm2_env"];
    let monit = &proc["monit"];

    ProcessInfo {
        name: str_field(&proc["name"]).unwrap_or("unknown").to_string(),
        pm_id: u64_field(&proc["pm_id"]).and_then(|v| u32::try_from(v).ok()),
        status: str_field(&env["status"]).map_or(ProcessStatus::Unknown, ProcessStatus::parse_lossy),
        cpu: monit["cpu"].as_f64().unwrap_or(0.0),
        memory: u64_field(&monit["memory"]).unwrap_or(0),
        uptime: u64_field(&env["pm_uptime"]).unwrap_or(0),
        restarts: u64_field(&env["restart_time"])
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0),
        log_paths: LogPaths::from_raw(
            str_field(&env["pm_out_log_path"]).unwrap_or_default(),
            str_field(&env["pm_err_log_path"]).unwrap_or_default(),
        ),
        pid: u64_field(&proc["pid"])
            .and_then(|v| u32::try_from(v).ok())
            .filter(|pid| *pid > 0),
        port: port_from_env(env),
        exec_mode: str_field(&env["exec_mode"]).map(str::to_string),
        instances: Some(
            u64_field(&env["instances"])
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(1),
        ),
        version: str_field(&env["version"]).map(str::to_string),
    }
}

/// Port from `env.PORT`, else from a `--port <n>` argument pair.
fn port_from_env(env: &Value) -> Option<u16> {
    if let Some(port) = port_value(&env["env"]["PORT"]) {
        return Some(port);
    }

    let args = env["args"].as_array()?;
    let index = args.iter().position(|a| a.as_str() == Some("--port"))?;
    args.get(index + 1).and_then(port_value)
}

fn port_value(value: &Value) -> Option<u16> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
        _ => None,
    }
}

fn str_field(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn u64_field(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

fn unavailable(message: &str) -> ProcessControlError {
    ProcessControlError::SupervisorUnavailable(message.to_string())
}
