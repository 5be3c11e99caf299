//! External compiler glue.
//!
//! The component compiler is a separate executable. Each invocation spawns
//! the configured command, writes one JSON request to its stdin, and reads
//! one JSON reply from its stdout:
//!
//! ```json
//! {"entry": "/tmp/arbor-entry-x.js", "mode": "dom", "options": {...}}
//! ```
//!
//! A non-zero exit reports the process stderr as the compile diagnostic.

use anyhow::{anyhow, Context};
use arbor_core::{CompileMode, CompileOptions, CompileOutput, Compiler};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// One compile request on the wire.
#[derive(Debug, Serialize)]
struct CompileRequest<'a> {
    entry: &'a Path,
    mode: CompileMode,
    options: &'a CompileOptions,
}

/// Compiler implementation backed by a child process per invocation.
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
}

impl ProcessCompiler {
    /// Build from a command string; everything after the first word is
    /// passed as fixed arguments.
    pub fn new(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self {
            program,
            args: words.collect(),
        }
    }
}

#[async_trait]
impl Compiler for ProcessCompiler {
    async fn compile(
        &self,
        entry: &Path,
        mode: CompileMode,
        options: &CompileOptions,
    ) -> anyhow::Result<CompileOutput> {
        let request = serde_json::to_vec(&CompileRequest {
            entry,
            mode,
            options,
        })
        .context("failed to encode compile request")?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn compiler '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&request)
                .await
                .context("failed to write compile request")?;
            // closing stdin signals end of request
        }

        let output = child
            .wait_with_output()
            .await
            .context("compiler did not run to completion")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{}", stderr.trim()));
        }

        serde_json::from_slice(&output.stdout).context("compiler reply was not valid JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn command_strings_split_into_program_and_args() {
        let compiler = ProcessCompiler::new("node compile.mjs --strict");
        assert_eq!(compiler.program, "node");
        assert_eq!(compiler.args, vec!["compile.mjs", "--strict"]);
    }

    #[test]
    fn requests_serialize_with_lowercase_modes() {
        let options = CompileOptions::new(false, BTreeMap::new());
        let request = CompileRequest {
            entry: Path::new("/tmp/entry.js"),
            mode: CompileMode::Iife,
            options: &options,
        };
        let json = serde_json::to_value(&request).expect("request json");
        assert_eq!(json["mode"], "iife");
        assert_eq!(json["entry"], "/tmp/entry.js");
        assert_eq!(json["options"]["dev"], true);
    }

    #[tokio::test]
    async fn a_failing_process_reports_its_stderr() {
        // `false` exits non-zero with no output; the diagnostic is empty but
        // the call must fail rather than parse nothing.
        let compiler = ProcessCompiler::new("false");
        let options = CompileOptions::new(false, BTreeMap::new());
        let result = compiler
            .compile(Path::new("/tmp/entry.js"), CompileMode::Dom, &options)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn a_valid_reply_round_trips() {
        let echo = ProcessCompiler {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"cat >/dev/null; printf '{"code":"export default 1;","watchFiles":[]}'"#
                    .to_string(),
            ],
        };
        let options = CompileOptions::new(false, BTreeMap::new());
        let output = echo
            .compile(Path::new("/tmp/entry.js"), CompileMode::Dom, &options)
            .await
            .expect("reply");
        assert_eq!(output.code, "export default 1;");
    }
}
