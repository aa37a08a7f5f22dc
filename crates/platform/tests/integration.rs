//! Integration tests for platform

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;
    use upnotify_platform::process::find_in_path;
    use upnotify_platform::*;

    #[test]
    fn test_codename_prefers_version_codename() {
        let contents = r#"
NAME="Ubuntu"
VERSION_ID="24.04"
VERSION_CODENAME=noble
UBUNTU_CODENAME=jammy
"#;
        assert_eq!(parse_codename(contents).as_deref(), Some("noble"));
    }

    #[test]
    fn test_codename_falls_back_to_ubuntu_codename() {
        let contents = "NAME=\"Linux Mint\"\nVERSION_CODENAME=\"\"\nUBUNTU_CODENAME=\"jammy\"\n";
        assert_eq!(parse_codename(contents).as_deref(), Some("jammy"));
    }

    #[test]
    fn test_codename_absent() {
        assert_eq!(parse_codename("NAME=Debian\n# comment\n"), None);
    }

    #[tokio::test]
    async fn test_read_codename_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, "VERSION_CODENAME='bookworm'\n").unwrap();
        assert_eq!(read_codename(&path).await.unwrap(), "bookworm");

        let missing = read_codename(&dir.path().join("missing")).await;
        assert!(matches!(
            missing,
            Err(upnotify_errors::Error::Platform(
                upnotify_errors::PlatformError::OsReleaseUnavailable { .. }
            ))
        ));
    }

    #[test]
    fn test_marker_probe_tracks_file_existence() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("reboot-required");
        let probe = MarkerFileProbe::new(&marker);

        assert!(!probe.is_reboot_required());
        std::fs::write(&marker, b"").unwrap();
        assert!(probe.is_reboot_required());
        std::fs::remove_file(&marker).unwrap();
        assert!(!probe.is_reboot_required());
    }

    #[tokio::test]
    async fn test_find_in_path_requires_executable_bit() {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("tool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        let dirs = vec![dir.path().to_path_buf()];
        assert_eq!(find_in_path("tool", dirs.clone()).await, None);

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_in_path("tool", dirs).await, Some(tool.clone()));
        assert_eq!(
            find_in_path(tool.to_str().unwrap(), Vec::new()).await,
            Some(tool)
        );
    }

    #[tokio::test]
    async fn test_execute_command_captures_output() {
        let ops = LinuxProcessOperations::new();
        let mut cmd = ops.create_command("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = ops.execute_command(cmd).await.unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout_lossy().trim(), "out");
        assert_eq!(output.stderr_lossy().trim(), "err");
    }

    #[tokio::test]
    async fn test_execute_missing_command() {
        let ops = LinuxProcessOperations::new();
        let err = ops
            .execute_command(PlatformCommand::new("/nonexistent/upnotify-test"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            upnotify_errors::Error::Platform(upnotify_errors::PlatformError::CommandNotFound { .. })
        ));
    }
}
