use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use vcn_bom::prelude::*;

/// Mock CommandRunner replaying canned stdout keyed by the full command line
#[derive(Default)]
pub struct MockCommandRunner {
    outputs: HashMap<String, std::result::Result<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command: &str, stdout: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Ok(stdout.to_string()));
        self
    }

    pub fn with_failure(mut self, command: &str, stderr: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Err(stderr.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str], _dir: Option<&Path>) -> Result<Vec<u8>> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(command.clone());

        match self.outputs.get(&command) {
            Some(Ok(stdout)) => Ok(stdout.clone().into_bytes()),
            Some(Err(stderr)) => Err(BomError::ToolFailure {
                tool: command.clone(),
                details: stderr.clone(),
            }
            .into()),
            None => Err(BomError::ToolFailure {
                tool: command,
                details: "command not mocked".to_string(),
            }
            .into()),
        }
    }
}
