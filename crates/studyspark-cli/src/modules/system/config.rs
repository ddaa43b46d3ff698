use std::fs;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Url;
use studyspark_core::DEFAULT_API_URL;
use tracing::debug;
use uuid::Uuid;

use super::secrets::{delete_session_secret, load_session_secret, store_session_secret};
use super::types::{CliConfig, SessionStore, StoredSession};
use crate::cli_args::{ConfigArgs, ConfigCommand};
use crate::FALLBACK_API_URL_ENV;

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::SetApiUrl(args) => {
            let url = normalize_api_url(&args.url);
            Url::parse(&url).map_err(|err| anyhow::anyhow!("invalid api url {url}: {err}"))?;
            config.api_url = Some(url);
        }
        ConfigCommand::SetTimeout(args) => {
            if args.secs == 0 {
                anyhow::bail!("timeout must be at least 1 second");
            }
            config.timeout_secs = Some(args.secs);
        }
        ConfigCommand::SetRetry(args) => {
            if let Some(max_attempts) = args.max_attempts {
                if max_attempts == 0 {
                    anyhow::bail!("max attempts must be at least 1");
                }
                config.retry.max_attempts = Some(max_attempts);
            }
            if let Some(base_delay_ms) = args.base_delay_ms {
                config.retry.base_delay_ms = Some(base_delay_ms);
            }
        }
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommand::Reset => {
            *config = CliConfig::default();
        }
    }
    Ok(())
}

pub(crate) fn config_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(Path::new(&home).join(".studyspark"))
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

fn session_path(dir: &Path) -> PathBuf {
    dir.join("session.json")
}

pub(crate) fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(&path)?;
    let config = serde_json::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("invalid config {}: {err}", path.display()))?;
    Ok(config)
}

pub(crate) fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    write_json(&config_path()?, config)
}

fn read_stored_session(dir: &Path) -> anyhow::Result<Option<StoredSession>> {
    let path = session_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)?;
    let stored = serde_json::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("invalid session file {}: {err}", path.display()))?;
    Ok(Some(stored))
}

/// `Set-Cookie` lines saved for `api_url`; a session saved for another
/// backend is ignored.
pub(crate) fn load_session_cookies(dir: &Path, api_url: &str) -> anyhow::Result<Vec<String>> {
    let Some(stored) = read_stored_session(dir)? else {
        return Ok(Vec::new());
    };
    if normalize_api_url(&stored.api_url) != normalize_api_url(api_url) {
        debug!(stored = %stored.api_url, current = %api_url, "ignoring session for another backend");
        return Ok(Vec::new());
    }
    match stored.store {
        SessionStore::File => Ok(stored.cookies),
        SessionStore::Keyring => load_session_secret(&stored.api_url),
    }
}

/// Persists the live cookies for `api_url`. An empty set forgets the session
/// only when the stored one belongs to the same backend.
pub(crate) fn save_session_cookies(
    dir: &Path,
    api_url: &str,
    store: SessionStore,
    cookies: Vec<String>,
) -> anyhow::Result<()> {
    let api_url = normalize_api_url(api_url);
    let previous = read_stored_session(dir)?;
    if cookies.is_empty() {
        return match previous {
            Some(previous) if normalize_api_url(&previous.api_url) == api_url => {
                forget_session(dir, &previous)
            }
            _ => Ok(()),
        };
    }
    if let Some(previous) = previous.filter(|previous| previous.store == SessionStore::Keyring) {
        if normalize_api_url(&previous.api_url) != api_url || store != SessionStore::Keyring {
            delete_session_secret(&previous.api_url)?;
        }
    }
    let cookies = match store {
        SessionStore::Keyring => {
            store_session_secret(&api_url, &cookies)?;
            Vec::new()
        }
        SessionStore::File => cookies,
    };
    let stored = StoredSession {
        api_url,
        store,
        cookies,
        saved_at: Some(Utc::now().to_rfc3339()),
    };
    write_private_json(&session_path(dir), &stored)
}

fn forget_session(dir: &Path, stored: &StoredSession) -> anyhow::Result<()> {
    if stored.store == SessionStore::Keyring {
        delete_session_secret(&stored.api_url)?;
    }
    let path = session_path(dir);
    if path.exists() {
        fs::remove_file(path)?;
    }
    debug!(api_url = %stored.api_url, "forgot stored session");
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Writes through a fresh owner-only temporary file, then renames it over
/// `path`, so the target never exists with wider permissions.
fn write_private_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("{} has no parent directory", path.display()))?;
    if !parent.exists() {
        fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o700));
        }
    }

    let tmp_path = parent.join(format!(".{}.tmp", Uuid::now_v7()));
    let mut options = fs::OpenOptions::new();
    options.create_new(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&tmp_path)
        .map_err(|err| anyhow::anyhow!("failed to create {}: {err}", tmp_path.display()))?;
    let contents = serde_json::to_string_pretty(value)?;
    if let Err(err) = file.write_all(contents.as_bytes()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(anyhow::anyhow!("failed to write {}: {err}", tmp_path.display()));
    }
    drop(file);

    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        anyhow::anyhow!("failed to replace {}: {err}", path.display())
    })
}

/// Flag or `STUDYSPARK_API_URL`, then `VITE_API_URL`, then config, then the
/// local development origin.
pub(crate) fn resolve_api_url(arg: Option<String>, config: &CliConfig) -> String {
    let url = arg
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            std::env::var(FALLBACK_API_URL_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    normalize_api_url(&url)
}

pub(crate) fn normalize_api_url(addr: &str) -> String {
    addr.trim().trim_end_matches('/').to_string()
}

pub(crate) fn ensure_secure_addr(addr: &str, allow_insecure: bool) -> anyhow::Result<()> {
    let url = Url::parse(addr).map_err(|err| anyhow::anyhow!("invalid api url {addr}: {err}"))?;
    match url.scheme() {
        "https" => Ok(()),
        "http" if allow_insecure || is_loopback_host(url.host_str()) => Ok(()),
        "http" => anyhow::bail!("refusing to use http:// without --insecure"),
        other => anyhow::bail!("unsupported api url scheme: {other}"),
    }
}

fn is_loopback_host(host: Option<&str>) -> bool {
    let Some(host) = host else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_args::{SetApiUrlArgs, SetRetryArgs, SetTimeoutArgs};
    use crate::modules::system::secrets::{clear_keyring_mock, lock_keyring_tests_sync};
    use tempfile::tempdir;

    const API: &str = "http://127.0.0.1:8081";

    fn scoped_cookie() -> Vec<String> {
        vec!["session=abc; Path=/auth; HttpOnly".to_string()]
    }

    #[test]
    fn file_store_keeps_attributes_and_owner_only_mode() -> anyhow::Result<()> {
        let dir = tempdir()?;
        save_session_cookies(dir.path(), API, SessionStore::File, scoped_cookie())?;

        assert_eq!(load_session_cookies(dir.path(), &format!("{API}/"))?, scoped_cookie());
        assert!(load_session_cookies(dir.path(), "https://other.example")?.is_empty());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(session_path(dir.path()))?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        Ok(())
    }

    #[test]
    fn keyring_store_writes_metadata_only() -> anyhow::Result<()> {
        let _guard = lock_keyring_tests_sync();
        clear_keyring_mock();
        let dir = tempdir()?;
        save_session_cookies(dir.path(), API, SessionStore::Keyring, scoped_cookie())?;

        let contents = fs::read_to_string(session_path(dir.path()))?;
        assert!(!contents.contains("session=abc"));
        let stored: StoredSession = serde_json::from_str(&contents)?;
        assert_eq!(stored.store, SessionStore::Keyring);
        assert_eq!(stored.api_url, API);
        assert_eq!(load_session_cookies(dir.path(), API)?, scoped_cookie());

        save_session_cookies(dir.path(), API, SessionStore::Keyring, Vec::new())?;
        assert!(!session_path(dir.path()).exists());
        assert!(load_session_secret(API)?.is_empty());
        Ok(())
    }

    #[test]
    fn empty_save_for_another_backend_keeps_session() -> anyhow::Result<()> {
        let dir = tempdir()?;
        save_session_cookies(dir.path(), API, SessionStore::File, scoped_cookie())?;
        save_session_cookies(dir.path(), "https://other.example", SessionStore::File, Vec::new())?;
        assert_eq!(load_session_cookies(dir.path(), API)?, scoped_cookie());
        Ok(())
    }

    #[test]
    fn switching_backend_drops_previous_keyring_entry() -> anyhow::Result<()> {
        let _guard = lock_keyring_tests_sync();
        clear_keyring_mock();
        let dir = tempdir()?;
        save_session_cookies(dir.path(), API, SessionStore::Keyring, scoped_cookie())?;
        save_session_cookies(
            dir.path(),
            "https://other.example",
            SessionStore::File,
            vec!["sid=1".to_string()],
        )?;
        assert!(load_session_secret(API)?.is_empty());
        assert!(load_session_cookies(dir.path(), API)?.is_empty());
        assert_eq!(
            load_session_cookies(dir.path(), "https://other.example")?,
            vec!["sid=1".to_string()]
        );
        Ok(())
    }

    #[test]
    fn secure_addr_rules() {
        assert!(ensure_secure_addr("https://api.example.com", false).is_ok());
        assert!(ensure_secure_addr("http://localhost:8081", false).is_ok());
        assert!(ensure_secure_addr("http://127.0.0.1:4000", false).is_ok());
        assert!(ensure_secure_addr("http://[::1]:4000", false).is_ok());
        assert!(ensure_secure_addr("http://api.example.com", false).is_err());
        assert!(ensure_secure_addr("http://api.example.com", true).is_ok());
        assert!(ensure_secure_addr("ftp://api.example.com", true).is_err());
    }

    #[test]
    fn resolve_prefers_argument_then_config() {
        let config = CliConfig {
            api_url: Some("https://config.example/".to_string()),
            ..CliConfig::default()
        };
        assert_eq!(
            resolve_api_url(Some("https://flag.example/".to_string()), &config),
            "https://flag.example"
        );
        if std::env::var(FALLBACK_API_URL_ENV).is_err() {
            assert_eq!(resolve_api_url(None, &config), "https://config.example");
            assert_eq!(
                resolve_api_url(None, &CliConfig::default()),
                DEFAULT_API_URL
            );
        }
    }

    #[test]
    fn config_commands_update_fields() -> anyhow::Result<()> {
        let mut config = CliConfig::default();
        handle_config_command(
            ConfigArgs {
                command: ConfigCommand::SetApiUrl(SetApiUrlArgs {
                    url: "https://api.example.com/".to_string(),
                }),
            },
            &mut config,
        )?;
        handle_config_command(
            ConfigArgs {
                command: ConfigCommand::SetTimeout(SetTimeoutArgs { secs: 4 }),
            },
            &mut config,
        )?;
        handle_config_command(
            ConfigArgs {
                command: ConfigCommand::SetRetry(SetRetryArgs {
                    max_attempts: Some(2),
                    base_delay_ms: Some(50),
                }),
            },
            &mut config,
        )?;
        assert_eq!(config.api_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.timeout_secs, Some(4));
        let policy = config.retry.policy(None);
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.base_delay_ms, 50);
        assert_eq!(config.retry.policy(Some(1)).base_delay_ms, 1);

        handle_config_command(
            ConfigArgs {
                command: ConfigCommand::Reset,
            },
            &mut config,
        )?;
        assert_eq!(config, CliConfig::default());
        Ok(())
    }

    #[test]
    fn config_commands_reject_bad_values() {
        let mut config = CliConfig::default();
        assert!(handle_config_command(
            ConfigArgs {
                command: ConfigCommand::SetRetry(SetRetryArgs {
                    max_attempts: Some(0),
                    base_delay_ms: None,
                }),
            },
            &mut config,
        )
        .is_err());
        assert!(handle_config_command(
            ConfigArgs {
                command: ConfigCommand::SetApiUrl(SetApiUrlArgs {
                    url: "not a url".to_string(),
                }),
            },
            &mut config,
        )
        .is_err());
    }
}
