//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use upnotify_config::UpgradeConfig;
    use upnotify_errors::{Error, OpsError};
    use upnotify_events::{
        channel, error_codes, EventEmitter, EventReceiver, EventSink, OperationEvent, RunnerId,
    };
    use upnotify_ops::*;
    use upnotify_types::{ExitState, OperationKind, OperationRequest, Status};

    /// Replays a fixed script of events, then returns `outcome`
    struct ScriptedBackend {
        events: Vec<OperationEvent>,
        outcome: Option<OpsError>,
    }

    #[async_trait]
    impl OperationBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn execute(
            &self,
            _request: &OperationRequest,
            sink: &EventSink,
            _cancel: CancelSignal,
        ) -> Result<(), Error> {
            for event in &self.events {
                sink.emit(event.clone());
            }
            match &self.outcome {
                Some(e) => Err(e.clone().into()),
                None => Ok(()),
            }
        }
    }

    /// Waits for a cancel request and reports it
    struct CancelAwareBackend;

    #[async_trait]
    impl OperationBackend for CancelAwareBackend {
        fn name(&self) -> &'static str {
            "cancel-aware"
        }

        async fn execute(
            &self,
            _request: &OperationRequest,
            sink: &EventSink,
            mut cancel: CancelSignal,
        ) -> Result<(), Error> {
            sink.emit_cancellable(true);
            cancel.requested().await;
            sink.emit_detail("stopping");
            sink.emit_finished(ExitState::Cancelled);
            Ok(())
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl OperationBackend for PanickingBackend {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn execute(
            &self,
            _request: &OperationRequest,
            sink: &EventSink,
            _cancel: CancelSignal,
        ) -> Result<(), Error> {
            sink.emit_progress(5);
            panic!("backend bug");
        }
    }

    fn upgrade_request(argv: &[&str]) -> OperationRequest {
        OperationRequest::new(
            OperationKind::SystemUpgrade { safe: false },
            argv.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    async fn collect_until_finished(rx: &mut EventReceiver) -> Vec<OperationEvent> {
        let mut events = Vec::new();
        loop {
            let next = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("runner went silent")
                .expect("channel closed before Finished");
            let terminal = next.event.is_terminal();
            events.push(next.event);
            if terminal {
                return events;
            }
        }
    }

    fn finished_count(events: &[OperationEvent]) -> usize {
        events.iter().filter(|e| e.is_terminal()).count()
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_runner_forwards_events_in_order() {
        let (tx, mut rx) = channel();
        let script = vec![
            OperationEvent::StatusChanged {
                status: Status::Downloading,
            },
            OperationEvent::ProgressChanged { percent: 40 },
            OperationEvent::ProgressChanged { percent: 30 },
            OperationEvent::Finished {
                exit: ExitState::Success,
            },
            // after the terminal event: must be dropped
            OperationEvent::ProgressChanged { percent: 99 },
            OperationEvent::Finished {
                exit: ExitState::Failed,
            },
        ];
        let runner = OperationRunner::new(
            Arc::new(ScriptedBackend {
                events: script.clone(),
                outcome: None,
            }),
            tx,
        );

        let handle = runner.spawn(RunnerId(7), upgrade_request(&["true"]));
        drop(runner);
        assert_eq!(handle.id(), RunnerId(7));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.runner, RunnerId(7));
        let mut events = vec![first.event];
        events.extend(collect_until_finished(&mut rx).await);
        assert_eq!(events, script[..4].to_vec());

        handle.join().await;
        assert!(rx.recv().await.is_none(), "channel closes with the runner");
    }

    #[tokio::test]
    async fn test_launch_failure_becomes_error_then_failed() {
        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(
            Arc::new(ScriptedBackend {
                events: Vec::new(),
                outcome: Some(OpsError::LaunchFailed {
                    command: "pkexec".into(),
                    message: "No such file or directory".into(),
                }),
            }),
            tx,
        );
        let _handle = runner.spawn(RunnerId(1), upgrade_request(&["pkexec"]));

        let events = collect_until_finished(&mut rx).await;
        assert!(matches!(
            events[0],
            OperationEvent::ErrorRaised {
                code: error_codes::LAUNCH_FAILED,
                ..
            }
        ));
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Failed
            })
        );
    }

    #[tokio::test]
    async fn test_silent_backend_end_is_synthesized() {
        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(
            Arc::new(ScriptedBackend {
                events: vec![OperationEvent::ProgressChanged { percent: 10 }],
                outcome: None,
            }),
            tx,
        );
        let _handle = runner.spawn(RunnerId(2), upgrade_request(&["x"]));

        let events = collect_until_finished(&mut rx).await;
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1],
            OperationEvent::ErrorRaised {
                code: error_codes::BACKEND_TERMINATED,
                ..
            }
        ));
        assert_eq!(finished_count(&events), 1);
    }

    #[tokio::test]
    async fn test_backend_panic_still_finishes() {
        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(PanickingBackend), tx);
        let handle = runner.spawn(RunnerId(13), upgrade_request(&["x"]));

        let events = collect_until_finished(&mut rx).await;
        assert_eq!(events[0], OperationEvent::ProgressChanged { percent: 5 });
        assert!(matches!(
            events[1],
            OperationEvent::ErrorRaised {
                code: error_codes::BACKEND_TERMINATED,
                ..
            }
        ));
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Failed
            })
        );
        handle.join().await;
    }

    #[tokio::test]
    async fn test_cancel_is_forwarded_not_fabricated() {
        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(CancelAwareBackend), tx);
        let handle = runner.spawn(RunnerId(3), upgrade_request(&["x"]));

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.event,
            OperationEvent::CancellableChanged { cancellable: true }
        );
        handle.cancel();

        let events = collect_until_finished(&mut rx).await;
        // the backend's own detail precedes its own terminal event
        assert_eq!(
            events,
            vec![
                OperationEvent::StatusDetailChanged {
                    detail: "stopping".into()
                },
                OperationEvent::Finished {
                    exit: ExitState::Cancelled
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_helper_backend_decodes_json_lines() {
        let dir = TempDir::new().unwrap();
        let helper = write_script(
            dir.path(),
            "helper",
            r#"echo '{"type":"status_changed","status":"downloading"}'
echo 'not json'
echo '{"type":"error_raised","code":2,"detail":"mirror down"}'
echo '{"type":"finished","exit":"failed"}'
exit 1
"#,
        );

        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(HelperBackend::new()), tx);
        let _handle = runner.spawn(
            RunnerId(4),
            upgrade_request(&["sh", helper.to_str().unwrap()]),
        );

        let events = collect_until_finished(&mut rx).await;
        assert_eq!(
            events,
            vec![
                OperationEvent::StatusChanged {
                    status: Status::Downloading
                },
                OperationEvent::ErrorRaised {
                    code: 2,
                    detail: "mirror down".into()
                },
                OperationEvent::Finished {
                    exit: ExitState::Failed
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_helper_authorization_refusal() {
        let dir = TempDir::new().unwrap();
        let wrapper = write_script(dir.path(), "fake-pkexec", "exit 126\n");

        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(HelperBackend::new()), tx);
        let _handle = runner.spawn(
            RunnerId(5),
            upgrade_request(&[wrapper.to_str().unwrap(), "/usr/lib/upnotify/helper", "upgrade"]),
        );

        let events = collect_until_finished(&mut rx).await;
        assert!(matches!(
            events[0],
            OperationEvent::ErrorRaised {
                code: error_codes::NOT_AUTHORIZED,
                ..
            }
        ));
        assert_eq!(finished_count(&events), 1);
    }

    #[tokio::test]
    async fn test_helper_missing_wrapper_fails_fast() {
        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(HelperBackend::new()), tx);
        let _handle = runner.spawn(
            RunnerId(6),
            upgrade_request(&["/nonexistent/upnotify-wrapper", "helper"]),
        );

        let events = collect_until_finished(&mut rx).await;
        assert!(matches!(
            events[0],
            OperationEvent::ErrorRaised {
                code: error_codes::LAUNCH_FAILED,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_helper_receives_cancel_on_stdin() {
        let dir = TempDir::new().unwrap();
        let helper = write_script(
            dir.path(),
            "helper",
            r#"echo '{"type":"cancellable_changed","cancellable":true}'
read line
if [ "$line" = "cancel" ]; then
  echo '{"type":"finished","exit":"cancelled"}'
else
  echo '{"type":"finished","exit":"failed"}'
fi
"#,
        );

        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(HelperBackend::new()), tx);
        let handle = runner.spawn(
            RunnerId(8),
            upgrade_request(&["sh", helper.to_str().unwrap()]),
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.event,
            OperationEvent::CancellableChanged { cancellable: true }
        );
        handle.cancel();

        let events = collect_until_finished(&mut rx).await;
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Cancelled
            })
        );
    }

    #[tokio::test]
    async fn test_terminal_backend_reports_exit_status() {
        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(TerminalBackend::new()), tx);

        let _ok = runner.spawn(RunnerId(9), upgrade_request(&["true"]));
        let events = collect_until_finished(&mut rx).await;
        assert_eq!(events[0], OperationEvent::CancellableChanged { cancellable: false });
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Success
            })
        );

        let _failed = runner.spawn(RunnerId(10), upgrade_request(&["false"]));
        let events = collect_until_finished(&mut rx).await;
        assert!(events.iter().any(|e| matches!(
            e,
            OperationEvent::ErrorRaised {
                code: error_codes::OPERATION_FAILED,
                ..
            }
        )));
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Failed
            })
        );
    }

    #[tokio::test]
    async fn test_apt_backend_parses_status_fd_output() {
        let dir = TempDir::new().unwrap();
        let apt = write_script(
            dir.path(),
            "apt-get",
            r#"echo 'Reading package lists...'
echo 'Get:1 http://archive.ubuntu.com/ubuntu noble-updates/main amd64 jq amd64 1.7.1 [65.7 kB]'
echo 'dlstatus:1:50.0000:Retrieving file 1 of 2'
echo 'pmstatus:jq:75.0000:Installing jq (amd64)'
echo 'E: Sub-process /usr/bin/dpkg returned an error code (1)' >&2
exit 100
"#,
        );

        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(AptBackend::new()), tx);
        let _handle = runner.spawn(
            RunnerId(11),
            upgrade_request(&["sh", apt.to_str().unwrap()]),
        );

        let events = collect_until_finished(&mut rx).await;
        assert!(events.contains(&OperationEvent::StatusChanged {
            status: Status::Downloading
        }));
        assert!(events.contains(&OperationEvent::ItemProgress {
            current_items: 1,
            total_items: 2
        }));
        assert!(events.contains(&OperationEvent::StatusDetailChanged {
            detail: "Installing jq (amd64)".into()
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            OperationEvent::DownloadProgress { total_size: 65_700, .. }
        )));
        let errors: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, OperationEvent::ErrorRaised { .. }))
            .collect();
        assert_eq!(errors.len(), 1, "no synthetic error when apt reported one");
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Failed
            })
        );
    }

    #[tokio::test]
    async fn test_apt_backend_survives_non_utf8_output() {
        let dir = TempDir::new().unwrap();
        let done = dir.path().join("done");
        let apt = write_script(
            dir.path(),
            "apt-get",
            r#"printf 'pmstatus:foo:50.0000:Setting up foo: caf\351\n'
printf 'Setting up foo: caf\351\n' >&2
sleep 1
touch "$1"
exit 0
"#,
        );

        let (tx, mut rx) = channel();
        let runner = OperationRunner::new(Arc::new(AptBackend::new()), tx);
        let handle = runner.spawn(
            RunnerId(12),
            upgrade_request(&["sh", apt.to_str().unwrap(), done.to_str().unwrap()]),
        );

        let events = collect_until_finished(&mut rx).await;
        handle.join().await;
        assert!(done.exists(), "apt ran to completion");
        assert!(events.contains(&OperationEvent::StatusDetailChanged {
            detail: "Setting up foo: caf\u{fffd}".into()
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, OperationEvent::ErrorRaised { .. })));
        assert_eq!(
            events.last(),
            Some(&OperationEvent::Finished {
                exit: ExitState::Success
            })
        );
    }

    #[test]
    fn test_status_fd_parser_phases() {
        let mut parser = StatusFdParser::new(OperationKind::SystemUpgrade { safe: false });

        let events = parser.parse_stdout("dlstatus:3:12.5:Retrieving file 3 of 12");
        assert_eq!(
            events,
            vec![
                OperationEvent::StatusChanged {
                    status: Status::Downloading
                },
                OperationEvent::CancellableChanged { cancellable: true },
                OperationEvent::ProgressChanged { percent: 13 },
                OperationEvent::ItemProgress {
                    current_items: 3,
                    total_items: 12
                },
                OperationEvent::StatusDetailChanged {
                    detail: "Retrieving file 3 of 12".into()
                },
            ]
        );
        assert!(parser.is_cancellable());

        let events = parser.parse_stdout("pmstatus:libc6:20.0000:Preparing libc6");
        assert_eq!(
            &events[..2],
            &[
                OperationEvent::StatusChanged {
                    status: Status::Committing
                },
                OperationEvent::CancellableChanged { cancellable: false },
            ]
        );
        assert!(!parser.is_cancellable());

        let events = parser.parse_stdout("pmerror:/var/cache/apt/archives/foo.deb:40:trying to overwrite");
        assert_eq!(
            events,
            vec![OperationEvent::ErrorRaised {
                code: error_codes::PACKAGE_FAILED,
                detail: "/var/cache/apt/archives/foo.deb: trying to overwrite".into()
            }]
        );
        assert_eq!(parser.error_count(), 1);
    }

    #[test]
    fn test_status_fd_parser_stderr_codes() {
        let mut update = StatusFdParser::new(OperationKind::UpdateCache);
        assert_eq!(
            update.parse_stderr("E: Failed to fetch http://x/InRelease  404"),
            vec![OperationEvent::ErrorRaised {
                code: error_codes::CACHE_UPDATE_FAILED,
                detail: "Failed to fetch http://x/InRelease  404".into()
            }]
        );
        assert!(matches!(
            update.parse_stderr("E: Could not get lock /var/lib/apt/lists/lock")[0],
            OperationEvent::ErrorRaised {
                code: error_codes::PACKAGE_MANAGER_LOCKED,
                ..
            }
        ));
        assert!(update.parse_stderr("W: Some warning").is_empty());
    }

    #[test]
    fn test_hit_lines_are_complete_downloads() {
        let mut parser = StatusFdParser::new(OperationKind::UpdateCache);
        let events = parser.parse_stdout("Hit:1 http://archive.ubuntu.com/ubuntu noble InRelease");
        assert_eq!(
            events.last(),
            Some(&OperationEvent::DownloadProgress {
                uri: "http://archive.ubuntu.com/ubuntu".into(),
                short_desc: "noble InRelease".into(),
                total_size: 0,
                current_size: 0,
                message: "Hit".into(),
            })
        );
    }

    #[test]
    fn test_invocation_requests() {
        let config = UpgradeConfig::default();

        let helper = Invocation::for_upgrader("/usr/lib/upnotify/upnotify-upgrader", &config);
        assert_eq!(
            helper.request(OperationKind::SystemUpgrade { safe: true }).argv,
            vec![
                "pkexec",
                "/usr/lib/upnotify/upnotify-upgrader",
                "upgrade",
                "--safe"
            ]
        );
        assert_eq!(helper.backend().name(), "helper");

        let terminal = Invocation::for_upgrader("terminal", &config);
        assert_eq!(
            terminal,
            Invocation::Terminal {
                terminal: "x-terminal-emulator".into()
            }
        );
        assert_eq!(terminal.backend().name(), "terminal");

        let direct = Invocation::Direct;
        assert_eq!(
            direct.request(OperationKind::UpdateCache).command_line(),
            "apt-get -o APT::Status-Fd=1 -q update"
        );
        assert_eq!(
            direct.request(OperationKind::ReleaseUpgrade).argv[0],
            "do-release-upgrade"
        );
        assert_eq!(direct.backend().name(), "apt");
    }

    #[test]
    fn test_error_codes_for_errors() {
        let refused: Error = OpsError::NotAuthorized {
            command: "pkexec".into(),
        }
        .into();
        assert_eq!(error_code_for(&refused), error_codes::NOT_AUTHORIZED);
        assert_eq!(
            error_code_for(&Error::internal("boom")),
            error_codes::BACKEND_TERMINATED
        );
    }
}
