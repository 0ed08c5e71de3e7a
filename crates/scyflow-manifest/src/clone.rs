//! Shallow-clone a remote repository via libgit2.
//!
//! Mirrors the permissive clone posture the control plane always used for
//! block/template repositories: single-branch, depth 1, and SSH host-key
//! verification relaxed (these repos are developer-supplied, not
//! security-sensitive secrets, and the clone target is a throwaway scratch
//! directory).

use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};

use crate::ManifestError;

pub(crate) fn shallow_clone(url: &str) -> Result<tempfile::TempDir, ManifestError> {
    let dir = tempfile::tempdir()?;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, _allowed_types| {
        Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
    });
    callbacks.certificate_check(|_cert, _host| Ok(git2::CertificateCheckStatus::CertificateOk));

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    fetch_options.depth(1);

    RepoBuilder::new()
        .fetch_options(fetch_options)
        .clone(url, dir.path())
        .map_err(|source| ManifestError::RepoUnreachable {
            url: url.to_string(),
            source,
        })?;

    Ok(dir)
}
