use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    diagnostics::Result,
    session::{ExecutionStatus, Session},
};

pub const PROTOCOL_VERSION: &str = "2.0";

#[derive(Debug, Deserialize)]
struct Request {
    action: String,
    #[serde(default)]
    cell_id: String,
    #[serde(default)]
    code: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ExecuteResponse<'a> {
    cell_id: &'a str,
    status: &'static str,
    stdout: String,
    stderr: String,
    result: String,
    execution_count: u64,
}

#[derive(Debug, Serialize)]
struct CompleteResponse {
    status: &'static str,
    completions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    stderr: String,
}

/// Serves newline-delimited JSON requests from `input` until `shutdown` or
/// end of input. Each request line carries an `action` of `execute`,
/// `reset`, `complete` or `shutdown` and gets exactly one flushed response
/// line.
pub fn serve<R: BufRead, W: Write>(input: R, mut output: W) -> Result<()> {
    let mut session = Session::new();
    respond(
        &mut output,
        &StatusResponse {
            status: "kernel_ready",
            version: Some(PROTOCOL_VERSION),
        },
    )?;
    info!(version = PROTOCOL_VERSION, "kernel ready");

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "malformed request");
                respond(
                    &mut output,
                    &ErrorResponse {
                        status: "error",
                        stderr: format!("Malformed request: {err}"),
                    },
                )?;
                continue;
            }
        };

        match request.action.as_str() {
            "execute" => {
                let reply = session.execute(&request.code);
                respond(
                    &mut output,
                    &ExecuteResponse {
                        cell_id: &request.cell_id,
                        status: match reply.status {
                            ExecutionStatus::Ok => "ok",
                            ExecutionStatus::Error => "error",
                        },
                        stdout: reply.stdout,
                        stderr: reply.stderr,
                        result: reply.result,
                        execution_count: reply.execution_count,
                    },
                )?;
            }
            "reset" => {
                session.reset();
                info!("session reset");
                respond(
                    &mut output,
                    &StatusResponse {
                        status: "reset_ok",
                        version: None,
                    },
                )?;
            }
            "complete" => {
                respond(
                    &mut output,
                    &CompleteResponse {
                        status: "ok",
                        completions: session.complete(&request.code),
                    },
                )?;
            }
            "shutdown" => {
                respond(
                    &mut output,
                    &StatusResponse {
                        status: "shutdown_ok",
                        version: None,
                    },
                )?;
                info!("kernel shutting down");
                return Ok(());
            }
            other => {
                warn!(action = other, "unknown action");
                respond(
                    &mut output,
                    &ErrorResponse {
                        status: "error",
                        stderr: format!("Unknown action: {other}"),
                    },
                )?;
            }
        }
    }
    info!("input closed");
    Ok(())
}

fn respond<W: Write, T: Serialize>(output: &mut W, response: &T) -> Result<()> {
    serde_json::to_writer(&mut *output, response).map_err(io::Error::from)?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}
