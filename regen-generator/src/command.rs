//! External-process generator backend.
//!
//! Runs a configured program with an argument template; `{input}`,
//! `{output}`, and `{template}` placeholders are substituted per
//! invocation. All process output is captured and attached to failures.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{io_err, GenerateError};
use crate::Generator;

/// How often the child is polled for exit while the timeout runs down.
const POLL_STEP: Duration = Duration::from_millis(25);

/// A code generator invoked as an external process.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGenerator {
    /// Default argument template, matching the common codegen CLI shape
    /// (`--input <spec> --output <dir> [--template-dir <dir>]`).
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: vec![
                "--input".to_string(),
                "{input}".to_string(),
                "--output".to_string(),
                "{output}".to_string(),
            ],
            timeout,
        }
    }

    /// Replace the argument template. Placeholders: `{input}` (staged
    /// spec file), `{output}` (staging output dir), `{template}`
    /// (template dir; arguments mentioning it are dropped when no
    /// template dir is passed).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn render_args(&self, spec_file: &Path, template_dir: Option<&Path>, out_dir: &Path) -> Vec<String> {
        let input = spec_file.to_string_lossy();
        let output = out_dir.to_string_lossy();

        let mut rendered = Vec::with_capacity(self.args.len() + 2);
        for arg in &self.args {
            if arg.contains("{template}") {
                match template_dir {
                    Some(dir) => {
                        rendered.push(arg.replace("{template}", &dir.to_string_lossy()))
                    }
                    None => {
                        // Drop the preceding flag if it introduced the
                        // now-omitted template argument.
                        if rendered
                            .last()
                            .map(|prev: &String| prev.starts_with('-'))
                            .unwrap_or(false)
                        {
                            rendered.pop();
                        }
                        continue;
                    }
                }
            } else {
                rendered.push(arg.replace("{input}", &input).replace("{output}", &output));
            }
        }

        // A template dir with no placeholder in the template still gets
        // passed through, opaquely, as --template-dir.
        if let Some(dir) = template_dir {
            if !self.args.iter().any(|a| a.contains("{template}")) {
                rendered.push("--template-dir".to_string());
                rendered.push(dir.to_string_lossy().into_owned());
            }
        }

        rendered
    }
}

impl Generator for CommandGenerator {
    fn generate(
        &self,
        spec_file: &Path,
        template_dir: Option<&Path>,
        out_dir: &Path,
    ) -> Result<(), GenerateError> {
        let args = self.render_args(spec_file, template_dir, out_dir);
        log::debug!("running generator: {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| io_err(&self.program, e))?;

        let stdout = drain_in_background(child.stdout.take());
        let stderr = drain_in_background(child.stderr.take());

        let status = wait_with_timeout(&mut child, self.timeout)?;

        let mut diagnostics = String::new();
        diagnostics.push_str(&join_output(stdout));
        diagnostics.push_str(&join_output(stderr));
        let diagnostics = diagnostics.trim().to_string();

        if !status.success() {
            return Err(GenerateError::Failed {
                status: status.to_string(),
                diagnostics,
            });
        }

        if !diagnostics.is_empty() {
            log::info!("generator output: {diagnostics}");
        }
        Ok(())
    }
}

/// Poll the child until exit or deadline; kill on expiry.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, GenerateError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GenerateError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(POLL_STEP);
            }
            Err(err) => return Err(io_err("generator process", err)),
        }
    }
}

/// Read a child pipe to the end on a background thread so a chatty
/// generator cannot deadlock on a full pipe buffer before exiting.
fn drain_in_background<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> Option<thread::JoinHandle<String>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_output(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sh_generator(script: &str, timeout: Duration) -> CommandGenerator {
        CommandGenerator::new("/bin/sh", timeout).with_args(vec![
            "-c".to_string(),
            script.to_string(),
            "sh".to_string(),
            "{input}".to_string(),
            "{output}".to_string(),
        ])
    }

    fn staging() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let spec = dir.path().join("spec.yaml");
        fs::write(&spec, "openapi: 3.0.0\n").unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        (dir, spec, out)
    }

    #[test]
    fn successful_run_produces_output_tree() {
        let (_dir, spec, out) = staging();
        let generator = sh_generator(
            r#"cp "$1" "$2/echoed.yaml" && printf 'pass\n' > "$2/a.py""#,
            Duration::from_secs(10),
        );
        generator.generate(&spec, None, &out).unwrap();

        assert!(out.join("echoed.yaml").exists());
        assert_eq!(fs::read_to_string(out.join("a.py")).unwrap(), "pass\n");
    }

    #[test]
    fn nonzero_exit_carries_diagnostics() {
        let (_dir, spec, out) = staging();
        let generator = sh_generator(
            r#"echo 'unresolvable $ref' >&2; exit 3"#,
            Duration::from_secs(10),
        );
        let err = generator.generate(&spec, None, &out).unwrap_err();
        match err {
            GenerateError::Failed { diagnostics, .. } => {
                assert!(diagnostics.contains("unresolvable $ref"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn timeout_kills_the_child() {
        let (_dir, spec, out) = staging();
        let generator = sh_generator("sleep 30", Duration::from_millis(150));
        let started = Instant::now();
        let err = generator.generate(&spec, None, &out).unwrap_err();
        assert!(matches!(err, GenerateError::Timeout { .. }));
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "timeout must not wait for the full sleep"
        );
    }

    #[test]
    fn missing_program_is_io_error() {
        let (_dir, spec, out) = staging();
        let generator =
            CommandGenerator::new("/nonexistent/generator-bin", Duration::from_secs(1));
        let err = generator.generate(&spec, None, &out).unwrap_err();
        assert!(matches!(err, GenerateError::Io { .. }));
    }

    #[test]
    fn template_dir_is_appended_when_not_templated() {
        let generator = CommandGenerator::new("gen", Duration::from_secs(1));
        let tmpl = std::path::Path::new("/tmpl");
        let args = generator.render_args(
            std::path::Path::new("/s/spec.yaml"),
            Some(tmpl),
            std::path::Path::new("/s/out"),
        );
        assert_eq!(
            args,
            vec![
                "--input",
                "/s/spec.yaml",
                "--output",
                "/s/out",
                "--template-dir",
                "/tmpl"
            ]
        );
    }

    #[test]
    fn template_placeholder_and_flag_dropped_without_template_dir() {
        let generator = CommandGenerator::new("gen", Duration::from_secs(1)).with_args(vec![
            "--input".into(),
            "{input}".into(),
            "--template-dir".into(),
            "{template}".into(),
            "--output".into(),
            "{output}".into(),
        ]);
        let args = generator.render_args(
            std::path::Path::new("/s/spec.yaml"),
            None,
            std::path::Path::new("/s/out"),
        );
        assert_eq!(args, vec!["--input", "/s/spec.yaml", "--output", "/s/out"]);
    }
}
