use log::{debug, warn};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Recorded as the commit hash when the installation is not a git working
/// copy, e.g. a packaged release.
pub const GIT_SENTINEL: &str = "github_release";

const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing the installation directory for its revision. All
/// non-commit outcomes map to the same sentinel but are logged apart.
#[derive(Debug)]
enum Revision {
    Commit(String),
    NotARepository,
    GitUnavailable,
    Failed(String),
}

fn probe_revision(repo_path: &Path) -> Revision {
    if !repo_path.join(".git").exists() {
        return Revision::NotARepository;
    }

    let mut child = match Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Revision::GitUnavailable;
        }
        Err(err) => return Revision::Failed(err.to_string()),
    };

    // Bound the subprocess so a wedged git cannot stall the run.
    let deadline = Instant::now() + GIT_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Revision::Failed(format!(
                    "git rev-parse timed out after {}s",
                    GIT_TIMEOUT.as_secs()
                ));
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(20)),
            Err(err) => {
                let _ = child.kill();
                return Revision::Failed(err.to_string());
            }
        }
    }

    let output = match child.wait_with_output() {
        Ok(output) => output,
        Err(err) => return Revision::Failed(err.to_string()),
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("not a git repository") {
            return Revision::NotARepository;
        }
        return Revision::Failed(stderr.trim().to_string());
    }
    match String::from_utf8(output.stdout) {
        Ok(hash) => Revision::Commit(hash.trim().to_string()),
        Err(err) => Revision::Failed(err.to_string()),
    }
}

/// Current commit hash of the pipeline installation, or the release
/// sentinel. Never fails: degraded outcomes are logged and downgraded.
pub fn repo_commit_hash(repo_path: &Path) -> String {
    match probe_revision(repo_path) {
        Revision::Commit(hash) => hash,
        Revision::NotARepository => {
            debug!(
                "{} is not a git working copy, recording '{GIT_SENTINEL}'",
                repo_path.display()
            );
            GIT_SENTINEL.to_string()
        }
        Revision::GitUnavailable => {
            warn!("git binary not found on PATH, recording '{GIT_SENTINEL}'");
            GIT_SENTINEL.to_string()
        }
        Revision::Failed(reason) => {
            warn!(
                "git rev-parse failed in {}: {reason}; recording '{GIT_SENTINEL}'",
                repo_path.display()
            );
            GIT_SENTINEL.to_string()
        }
    }
}
