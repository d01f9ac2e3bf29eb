//! Recording fake `CommandRunner` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::StudioError;
use crate::pac::runner::{CommandResult, CommandRunner, OutputMode};

/// One scripted subprocess outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    Completed(CommandResult),
    NotFound,
}

impl Scripted {
    pub fn ok(stdout: &str) -> Self {
        Scripted::Completed(CommandResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        })
    }

    pub fn exit(code: i32, stderr: &str) -> Self {
        Scripted::Completed(CommandResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: code,
        })
    }

    pub fn not_found() -> Self {
        Scripted::NotFound
    }
}

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub mode: OutputMode,
}

/// Replays scripted outcomes in order; an exhausted script yields empty success.
#[derive(Debug, Default)]
pub struct FakeRunner {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        mode: OutputMode,
    ) -> crate::Result<CommandResult> {
        self.calls.lock().unwrap().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            mode,
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Completed(result)) => Ok(result),
            Some(Scripted::NotFound) => Err(StudioError::ToolNotFound(program.to_string())),
            None => Ok(CommandResult::default()),
        }
    }
}
