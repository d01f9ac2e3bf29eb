//! The Power Platform CLI invocation surface as a typed command set.
//!
//! Each variant renders the exact argument vector handed to the subprocess.
//! `command_line` renders a quoted, sanitized display form for logs.

use crate::pac::sanitize::sanitize;

/// One invocation of the external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacCommand {
    Version,
    AuthCreate { url: String, name: Option<String> },
    AuthList,
    AuthSelect { name: String },
    AdminList,
    SolutionList,
    SolutionExport { name: String, path: String, managed: bool },
    SolutionImport { path: String, activate_plugins: bool },
    SolutionClone { name: String, output_directory: String },
}

impl PacCommand {
    /// Short label used in logs and error messages (e.g. `"solution export"`).
    pub fn label(&self) -> &'static str {
        match self {
            PacCommand::Version => "--version",
            PacCommand::AuthCreate { .. } => "auth create",
            PacCommand::AuthList => "auth list",
            PacCommand::AuthSelect { .. } => "auth select",
            PacCommand::AdminList => "admin list",
            PacCommand::SolutionList => "solution list",
            PacCommand::SolutionExport { .. } => "solution export",
            PacCommand::SolutionImport { .. } => "solution import",
            PacCommand::SolutionClone { .. } => "solution clone",
        }
    }

    /// Whether this command can produce enough output to need the large capture limit.
    pub fn is_large_output(&self) -> bool {
        matches!(
            self,
            PacCommand::SolutionExport { .. }
                | PacCommand::SolutionImport { .. }
                | PacCommand::SolutionClone { .. }
        )
    }

    /// Argument vector passed to the subprocess (program name excluded).
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |items: &[&str]| args.extend(items.iter().map(|s| s.to_string()));

        match self {
            PacCommand::Version => push(&["--version"]),
            PacCommand::AuthCreate { url, name } => {
                push(&["auth", "create", "--url", url.as_str()]);
                if let Some(name) = name {
                    push(&["--name", name.as_str()]);
                }
            }
            PacCommand::AuthList => push(&["auth", "list"]),
            PacCommand::AuthSelect { name } => push(&["auth", "select", "--name", name.as_str()]),
            PacCommand::AdminList => push(&["admin", "list"]),
            PacCommand::SolutionList => push(&["solution", "list"]),
            PacCommand::SolutionExport {
                name,
                path,
                managed,
            } => {
                push(&[
                    "solution",
                    "export",
                    "--name",
                    name.as_str(),
                    "--path",
                    path.as_str(),
                ]);
                if *managed {
                    push(&["--managed", "true"]);
                }
            }
            PacCommand::SolutionImport {
                path,
                activate_plugins,
            } => {
                push(&["solution", "import", "--path", path.as_str()]);
                if *activate_plugins {
                    push(&["--activate-plugins"]);
                }
            }
            PacCommand::SolutionClone {
                name,
                output_directory,
            } => push(&[
                "solution",
                "clone",
                "--name",
                name.as_str(),
                "--outputDirectory",
                output_directory.as_str(),
            ]),
        }

        args
    }

    /// Single-string display form, e.g. `pac auth create --url "https://x"`.
    ///
    /// Flag values are sanitized and double-quoted; flags and subcommand words are
    /// emitted bare.
    pub fn command_line(&self, program: &str) -> String {
        let mut line = sanitize(program);
        let mut after_flag = false;
        for arg in self.args() {
            line.push(' ');
            if after_flag && !arg.starts_with("--") {
                line.push('"');
                line.push_str(&sanitize(&arg));
                line.push('"');
            } else {
                line.push_str(&arg);
            }
            after_flag = arg.starts_with("--");
        }
        line
    }
}
