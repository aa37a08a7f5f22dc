//! How privileged operations are invoked

use std::path::PathBuf;
use std::sync::Arc;

use upnotify_config::{fixed_paths, UpgradeConfig};
use upnotify_types::{OperationKind, OperationRequest};

use crate::apt::AptBackend;
use crate::backend::OperationBackend;
use crate::helper::HelperBackend;
use crate::terminal::TerminalBackend;

/// The three ways an operation can be carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `<wrapper> <helper> <subcommand>`, events as JSON lines
    Helper { wrapper: String, helper: PathBuf },
    /// `<terminal> -e sudo apt-get ...`, exit status only
    Terminal { terminal: String },
    /// The package manager itself; the caller already has administrative rights
    Direct,
}

impl Invocation {
    /// Choose the invocation for an upgrader token
    ///
    /// The token `terminal` selects the interactive terminal flow; any other
    /// value is the helper executable to run under the privilege wrapper.
    #[must_use]
    pub fn for_upgrader(upgrader: &str, config: &UpgradeConfig) -> Self {
        if upgrader == fixed_paths::TERMINAL_SENTINEL {
            Self::Terminal {
                terminal: config.terminal.clone(),
            }
        } else {
            Self::Helper {
                wrapper: config.privilege_wrapper.clone(),
                helper: PathBuf::from(upgrader),
            }
        }
    }

    /// Backend able to run the requests this invocation builds
    #[must_use]
    pub fn backend(&self) -> Arc<dyn OperationBackend> {
        match self {
            Self::Helper { .. } => Arc::new(HelperBackend::new()),
            Self::Terminal { .. } => Arc::new(TerminalBackend::new()),
            Self::Direct => Arc::new(AptBackend::new()),
        }
    }

    /// Build the request for `kind`
    #[must_use]
    pub fn request(&self, kind: OperationKind) -> OperationRequest {
        let argv = match self {
            Self::Helper { wrapper, helper } => {
                let mut argv = vec![wrapper.clone(), helper.display().to_string()];
                argv.extend(kind.helper_args());
                argv
            }
            Self::Terminal { terminal } => {
                let mut argv = vec![terminal.clone(), "-e".to_string(), "sudo".to_string()];
                argv.extend(package_manager_args(kind, false));
                argv
            }
            Self::Direct => package_manager_args(kind, true),
        };
        OperationRequest::new(kind, argv)
    }
}

fn package_manager_args(kind: OperationKind, status_fd: bool) -> Vec<String> {
    let mut argv: Vec<String> = Vec::new();
    match kind {
        OperationKind::ReleaseUpgrade => {
            argv.push("do-release-upgrade".to_string());
            if status_fd {
                argv.extend(["-f", "DistUpgradeViewNonInteractive"].map(String::from));
            }
            return argv;
        }
        OperationKind::UpdateCache | OperationKind::SystemUpgrade { .. } => {
            argv.push("apt-get".to_string());
        }
    }

    if status_fd {
        argv.extend(["-o", "APT::Status-Fd=1", "-q"].map(String::from));
    }
    match kind {
        OperationKind::UpdateCache => argv.push("update".to_string()),
        OperationKind::SystemUpgrade { safe } => {
            if status_fd {
                argv.extend(
                    [
                        "-y",
                        "-o",
                        "Dpkg::Options::=--force-confdef",
                        "-o",
                        "Dpkg::Options::=--force-confold",
                    ]
                    .map(String::from),
                );
            }
            argv.push(if safe { "upgrade" } else { "dist-upgrade" }.to_string());
        }
        OperationKind::ReleaseUpgrade => {}
    }
    argv
}
