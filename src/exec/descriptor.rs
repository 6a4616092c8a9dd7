// src/exec/descriptor.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// What to run: program, arguments, working directory and env overrides.
///
/// Overrides are keyed by variable name, so inserting the same key twice
/// keeps the last value. An empty key is accepted here and dropped when the
/// child environment is derived (see [`crate::exec::merge_env`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CommandDescriptor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// A copy of this descriptor with `extra` appended to the arguments.
    ///
    /// Used for the verbose re-run on ambiguous failures.
    pub fn with_extra_args(&self, extra: &[String]) -> Self {
        let mut copy = self.clone();
        copy.args.extend(extra.iter().cloned());
        copy
    }
}

impl fmt::Display for CommandDescriptor {
    /// Space-joined command line, for logs only (no shell quoting).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
