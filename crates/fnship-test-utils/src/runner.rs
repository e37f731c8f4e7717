//! Scripted command runner with invocation recording.

use async_trait::async_trait;
use fnship_cloud::command::{classify_failure, command_line};
use fnship_cloud::{Capture, CloudError, CommandRunner, NOT_FOUND_EXIT_CODE, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Canned outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Exit 0 with this stdout.
    Stdout(Vec<u8>),
    /// Non-zero exit with this code and stderr.
    Exit {
        /// Exit code.
        code: i32,
        /// Captured stderr.
        stderr: String,
    },
    /// The program could not be spawned.
    SpawnError,
}

impl Reply {
    /// Exit 0, no output.
    pub fn ok() -> Self {
        Reply::Stdout(Vec::new())
    }

    /// Exit 0 with text output.
    pub fn text(text: &str) -> Self {
        Reply::Stdout(text.as_bytes().to_vec())
    }

    /// Exit 0 with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        Reply::Stdout(value.to_string().into_bytes())
    }

    /// The not-found exit sentinel.
    pub fn not_found() -> Self {
        Reply::Exit {
            code: NOT_FOUND_EXIT_CODE,
            stderr: "An error occurred (ResourceNotFoundException)".to_string(),
        }
    }

    /// Any other failing exit.
    pub fn exit(code: i32, stderr: &str) -> Self {
        Reply::Exit {
            code,
            stderr: stderr.to_string(),
        }
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Requested capture mode.
    pub capture: Capture,
}

impl Invocation {
    /// Command line as it would be logged.
    pub fn line(&self) -> String {
        command_line(&self.program, &self.args)
    }

    /// Whether this call is `program prefix...`.
    pub fn matches(&self, program: &str, prefix: &[&str]) -> bool {
        self.program == program
            && self.args.len() >= prefix.len()
            && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }

    /// Value following `flag`, if present.
    pub fn flag(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

#[derive(Debug)]
struct Rule {
    program: String,
    prefix: Vec<String>,
    replies: VecDeque<Reply>,
}

/// Command runner that replays scripted replies.
///
/// Replies are keyed by program and argument prefix; the longest matching
/// prefix wins. Several replies for one key are served in order and the last
/// one repeats. Unscripted commands fail with exit status 127.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedRunner {
    /// Creates a runner with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `reply` for `program prefix...`.
    pub fn on(&self, program: &str, prefix: &[&str], reply: Reply) -> &Self {
        let mut rules = self.rules.lock().unwrap();
        match rules
            .iter_mut()
            .find(|r| r.program == program && r.prefix == prefix)
        {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(Rule {
                program: program.to_string(),
                prefix: prefix.iter().map(|s| s.to_string()).collect(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// All recorded invocations, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls matching `program prefix...`.
    pub fn count(&self, program: &str, prefix: &[&str]) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.matches(program, prefix))
            .count()
    }

    /// First call matching `program prefix...`.
    pub fn find(&self, program: &str, prefix: &[&str]) -> Option<Invocation> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.matches(program, prefix))
            .cloned()
    }

    fn next_reply(&self, invocation: &Invocation) -> Option<Reply> {
        let mut rules = self.rules.lock().unwrap();
        let rule = rules
            .iter_mut()
            .filter(|r| {
                let prefix: Vec<&str> = r.prefix.iter().map(String::as_str).collect();
                invocation.matches(&r.program, &prefix)
            })
            .max_by_key(|r| r.prefix.len())?;
        if rule.replies.len() > 1 {
            rule.replies.pop_front()
        } else {
            rule.replies.front().cloned()
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        capture: Capture,
    ) -> Result<Option<Vec<u8>>> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            capture,
        };
        self.calls.lock().unwrap().push(invocation.clone());

        match self.next_reply(&invocation) {
            Some(Reply::Stdout(bytes)) => Ok(match capture {
                Capture::Stdout => Some(bytes),
                Capture::Discard => None,
            }),
            Some(Reply::Exit { code, stderr }) => Err(classify_failure(program, Some(code), stderr)),
            Some(Reply::SpawnError) => Err(CloudError::ExecutionFailed {
                program: program.to_string(),
                exit_code: None,
                stderr: "No such file or directory (os error 2)".to_string(),
            }),
            None => Err(CloudError::ExecutionFailed {
                program: program.to_string(),
                exit_code: Some(127),
                stderr: format!("unscripted command: {}", invocation.line()),
            }),
        }
    }
}
