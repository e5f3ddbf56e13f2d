// # Command IP Source
//
// This crate provides a shell-command IP source for the DDNS reconciler.
//
// ## Purpose
//
// Runs a user-supplied command line (for example
// `dig +short myip.opendns.com @resolver1.opendns.com`) and takes its
// standard output as the current address.
//
// ## Behaviour
//
// - The command runs through the platform shell (`sh -c`, `cmd /C` on Windows)
// - Exit status 0 with non-empty output → trimmed output is the address
// - Spawn failure, non-zero exit, non-UTF-8 or empty output → unavailable
// - The output is NOT validated as an address; the command is trusted

use ddns_core::SourceRegistry;
use ddns_core::config::IpSourceConfig;
use ddns_core::traits::{IpFamily, IpSource, IpSourceFactory};
use ddns_core::{Error, Result};

use std::process::Stdio;
use tokio::process::Command;

/// IP source backed by a shell command
#[derive(Debug, Clone)]
pub struct CommandIpSource {
    /// Address family this command reports
    family: IpFamily,

    /// Command line handed to the shell
    command: String,
}

impl CommandIpSource {
    /// Create a new command IP source
    pub fn new(family: IpFamily, command: impl Into<String>) -> Self {
        Self {
            family,
            command: command.into(),
        }
    }

    fn shell_command(&self) -> Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };

        cmd.arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    /// Run the command and return its trimmed output
    async fn run(&self) -> Result<String> {
        let output = self
            .shell_command()
            .output()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to run '{}': {}", self.command, e)))?;

        if !output.status.success() {
            return Err(Error::ip_source(format!(
                "'{}' exited with {}",
                self.command, output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            Error::ip_source(format!("'{}' printed non-UTF-8 output", self.command))
        })?;

        let ip = stdout.trim();
        if ip.is_empty() {
            return Err(Error::ip_source(format!(
                "'{}' printed nothing",
                self.command
            )));
        }

        Ok(ip.to_string())
    }
}

#[async_trait::async_trait]
impl IpSource for CommandIpSource {
    async fn current(&self) -> Option<String> {
        match self.run().await {
            Ok(ip) => Some(ip),
            Err(e) => {
                tracing::warn!("{} detection failed: {}", self.family, e);
                None
            }
        }
    }

    fn family(&self) -> IpFamily {
        self.family
    }

    fn source_name(&self) -> &'static str {
        "command"
    }
}

/// Factory for creating command IP sources
pub struct CommandFactory;

impl IpSourceFactory for CommandFactory {
    fn create(&self, config: &IpSourceConfig) -> Result<Box<dyn IpSource>> {
        match config {
            IpSourceConfig::Command { family, command } => {
                Ok(Box::new(CommandIpSource::new(*family, command.clone())))
            }
            _ => Err(Error::config("Invalid config for command IP source")),
        }
    }
}

/// Register the command IP source with a registry
pub fn register(registry: &SourceRegistry) {
    registry.register_ip_source("command", Box::new(CommandFactory));
}
