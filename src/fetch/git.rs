//! Credential selection and the git2 remote-callback wiring.
//!
//! Mirrors the shape of a typical `with_fetch_options`/`with_authentication`
//! pair: credentials are classified once from the URL at `Fetcher`
//! construction time, then turned into a `git2::Cred` lazily whenever
//! libgit2 actually asks for one.

use super::FetchError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub(super) enum Credentials {
    Ssh { key_path: PathBuf },
    Basic { user: String, password: String },
    None,
}

enum UrlShape {
    Ssh,
    Http {
        user: Option<String>,
        password: Option<String>,
    },
    Other,
}

fn looks_like_scp_shorthand(raw: &str) -> bool {
    // e.g. git@github.com:wandera/git2kube.git -- no scheme, user@host:path
    !raw.contains("://") && raw.contains('@') && raw.contains(':')
}

fn classify(raw: &str) -> UrlShape {
    if raw.starts_with("ssh://") || looks_like_scp_shorthand(raw) {
        return UrlShape::Ssh;
    }

    match url::Url::parse(raw) {
        Ok(u) if u.scheme().starts_with("http") => {
            let user = if u.username().is_empty() {
                None
            } else {
                Some(u.username().to_owned())
            };
            let password = u.password().map(str::to_owned);
            UrlShape::Http { user, password }
        }
        Ok(u) if u.scheme().starts_with("ssh") => UrlShape::Ssh,
        _ => UrlShape::Other,
    }
}

/// Selects the authenticator for `git_url` once, at construction time.
///
/// ssh URLs only get a key-based authenticator when `ssh_key` was provided;
/// http(s) URLs only get basic auth when both a user and a password were
/// embedded in the URL itself. Everything else falls back to no
/// authentication at all.
pub(super) fn select(git_url: &str, ssh_key: Option<&Path>) -> Result<Credentials, FetchError> {
    match (classify(git_url), ssh_key) {
        (UrlShape::Ssh, Some(key_path)) => {
            std::fs::read(key_path).map_err(|e| {
                FetchError::Auth(format!(
                    "failed to read ssh key '{}': {e}",
                    key_path.display()
                ))
            })?;
            Ok(Credentials::Ssh {
                key_path: key_path.to_path_buf(),
            })
        }
        (
            UrlShape::Http {
                user: Some(user),
                password: Some(password),
            },
            _,
        ) => Ok(Credentials::Basic { user, password }),
        _ => Ok(Credentials::None),
    }
}

/// Builds the `RemoteCallbacks` used for both clone and fetch.
pub(super) fn remote_callbacks(creds: Credentials) -> git2::RemoteCallbacks<'static> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| match &creds {
        Credentials::Ssh { key_path } => {
            git2::Cred::ssh_key("git", None, key_path, None)
        }
        Credentials::Basic { user, password } => git2::Cred::userpass_plaintext(user, password),
        Credentials::None => {
            if allowed.contains(git2::CredentialType::DEFAULT) {
                git2::Cred::default()
            } else {
                git2::Cred::username(username_from_url.unwrap_or("git"))
            }
        }
    });
    callbacks
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_auth_from_url() {
        let creds = select("https://u:p@host/r.git", None).unwrap();
        assert!(matches!(creds, Credentials::Basic { user, password } if user == "u" && password == "p"));
    }

    #[test]
    fn ssh_with_key_present() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("id_rsa");
        std::fs::write(&key_path, b"not a real key, just needs to exist").unwrap();

        let creds = select("git@host:r.git", Some(&key_path)).unwrap();
        assert!(matches!(creds, Credentials::Ssh { key_path: p } if p == key_path));
    }

    #[test]
    fn ssh_without_key_is_anonymous() {
        let creds = select("git@host:r.git", None).unwrap();
        assert!(matches!(creds, Credentials::None));
    }

    #[test]
    fn http_without_credentials_is_anonymous() {
        let creds = select("https://host/r.git", None).unwrap();
        assert!(matches!(creds, Credentials::None));
    }

    #[test]
    fn missing_ssh_key_file_is_an_auth_error() {
        let err = select("git@host:r.git", Some(Path::new("/nonexistent/key"))).unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
    }
}
