//! Resolution snapshots from `apt-get --simulate`

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use upnotify_errors::{CacheError, Error};
use upnotify_platform::{read_codename, PlatformCommand, ProcessOperations};

use crate::snapshot::{
    CachePackage, CandidateVersion, PackageOrigin, ResolutionSnapshot, SnapshotSource,
};

/// Snapshot source that asks apt to simulate the upgrade
pub struct AptSimulator {
    process: Arc<dyn ProcessOperations>,
    program: String,
    os_release: PathBuf,
}

impl AptSimulator {
    pub fn new(process: Arc<dyn ProcessOperations>, os_release: impl Into<PathBuf>) -> Self {
        Self {
            process,
            program: "apt-get".to_string(),
            os_release: os_release.into(),
        }
    }

    /// Use a different apt-get binary
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, safe: bool) -> PlatformCommand {
        let mut cmd = self.process.create_command(&self.program);
        cmd.args(["-s", "-q"])
            .arg(if safe { "upgrade" } else { "dist-upgrade" })
            .env("LC_ALL", "C");
        cmd
    }
}

#[async_trait]
impl SnapshotSource for AptSimulator {
    async fn snapshot(&self, safe: bool) -> Result<ResolutionSnapshot, Error> {
        let cmd = self.command(safe);
        let display = cmd.display();
        let output = self
            .process
            .execute_command(cmd)
            .await
            .map_err(|e| CacheError::OpenFailed {
                message: format!("{display}: {e}"),
            })?;

        if !output.status.success() {
            let stderr = output.stderr_lossy();
            if stderr.contains("Could not get lock") || stderr.contains("Unable to lock") {
                return Err(CacheError::Locked {
                    message: stderr.trim().to_string(),
                }
                .into());
            }
            return Err(CacheError::SimulationFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        let snapshot = parse_simulation(&output.stdout_lossy())?;
        tracing::debug!(
            marked = snapshot.marked_count(),
            safe,
            "apt simulation complete"
        );
        Ok(snapshot)
    }

    async fn codename(&self) -> Result<String, Error> {
        read_codename(&self.os_release)
            .await
            .map_err(|e| CacheError::CodenameUnavailable {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }
}

/// Parse the `Inst`/`Remv`/`Purg` lines of `apt-get -s` output
///
/// ```text
/// Inst libc6 [2.39-0ubuntu8] (2.39-0ubuntu8.3 Ubuntu:24.04/noble-updates, Ubuntu:24.04/noble-security [amd64])
/// Inst jq (1.7.1-3build1 Ubuntu:24.04/noble [amd64])
/// Remv oldlib [1.0-1]
/// ```
///
/// Every other line is ignored.
///
/// # Errors
///
/// Returns `CacheError::MalformedOutput` for an action line that cannot be
/// split into its parts.
pub fn parse_simulation(output: &str) -> Result<ResolutionSnapshot, CacheError> {
    let mut snapshot = ResolutionSnapshot::default();

    for (index, line) in output.lines().enumerate() {
        let malformed = || CacheError::MalformedOutput {
            line: index + 1,
            content: line.to_string(),
        };

        if let Some(rest) = line.strip_prefix("Inst ") {
            snapshot.push(parse_inst(rest).ok_or_else(malformed)?);
        } else if let Some(rest) = line
            .strip_prefix("Remv ")
            .or_else(|| line.strip_prefix("Purg "))
        {
            let (name, rest) = split_name(rest).ok_or_else(malformed)?;
            let current = bracketed(rest).map(|(value, _)| value.to_string());
            snapshot.push(CachePackage::marked_delete(name, current));
        }
    }

    Ok(snapshot)
}

fn parse_inst(rest: &str) -> Option<CachePackage> {
    let (name, rest) = split_name(rest)?;

    let (current, rest) = match bracketed(rest) {
        Some((value, tail)) => (Some(value.to_string()), tail.trim_start()),
        None => (None, rest),
    };

    let inner = rest.strip_prefix('(')?;
    let close = inner.rfind(')')?;
    let inner = &inner[..close];

    // Drop the trailing "[arch]"
    let inner = match inner.rfind(" [") {
        Some(pos) if inner.ends_with(']') => &inner[..pos],
        _ => inner,
    };

    let (version, origins) = match inner.split_once(' ') {
        Some((version, origins)) => (version, parse_origins(origins)),
        None => (inner, Vec::new()),
    };
    if version.is_empty() {
        return None;
    }

    let candidate = CandidateVersion::new(version, origins);
    Some(match current {
        Some(current) => CachePackage::marked_upgrade(name, current, candidate),
        None => CachePackage::marked_install(name, candidate),
    })
}

fn split_name(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim_start();
    let (name, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    (!name.is_empty()).then_some((name, tail.trim_start()))
}

fn bracketed(rest: &str) -> Option<(&str, &str)> {
    let inner = rest.strip_prefix('[')?;
    let (value, tail) = inner.split_once(']')?;
    Some((value, tail))
}

// "Ubuntu:24.04/noble-updates, Ubuntu:24.04/noble-security"
fn parse_origins(origins: &str) -> Vec<PackageOrigin> {
    origins
        .split(", ")
        .filter_map(|entry| {
            let (origin, rest) = entry.trim().split_once(':')?;
            let archive = rest.rsplit_once('/').map_or(rest, |(_, archive)| archive);
            (!origin.is_empty() && !archive.is_empty())
                .then(|| PackageOrigin::new(origin, archive))
        })
        .collect()
}
