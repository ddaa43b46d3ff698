#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};
#[cfg(test)]
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;
#[cfg(not(test))]
use tracing::warn;

use super::config::normalize_api_url;

fn keyring_key(api_url: &str) -> String {
    format!("session::{}", normalize_api_url(api_url))
}

#[cfg(test)]
fn keyring_store() -> &'static Mutex<HashMap<String, String>> {
    static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

#[cfg(test)]
static KEYRING_TEST_LOCK: OnceLock<TokioMutex<()>> = OnceLock::new();

#[cfg(test)]
pub(crate) fn lock_keyring_tests_sync() -> tokio::sync::MutexGuard<'static, ()> {
    KEYRING_TEST_LOCK
        .get_or_init(|| TokioMutex::new(()))
        .blocking_lock()
}

#[cfg(test)]
pub(crate) fn clear_keyring_mock() {
    if let Ok(mut map) = keyring_store().lock() {
        map.clear();
    }
}

#[cfg(not(test))]
fn keyring_entry(api_url: &str) -> anyhow::Result<keyring::Entry> {
    let service = "studyspark-cli";
    keyring::Entry::new(service, &keyring_key(api_url))
        .map_err(|err| anyhow::anyhow!("failed to access keyring: {err}"))
}

#[cfg(not(test))]
fn keyring_set(api_url: &str, value: &str) -> anyhow::Result<()> {
    let entry = keyring_entry(api_url)?;
    entry.set_password(value).map_err(|err| {
        anyhow::anyhow!(
            "failed to store session in keyring: {err}; use --session-store file to keep it in ~/.studyspark/session.json"
        )
    })
}

#[cfg(not(test))]
fn keyring_get(api_url: &str) -> anyhow::Result<Option<String>> {
    let entry = keyring_entry(api_url)?;
    match entry.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(anyhow::anyhow!(
            "failed to load session for '{api_url}' from keyring: {err}"
        )),
    }
}

#[cfg(not(test))]
fn keyring_delete(api_url: &str) -> anyhow::Result<()> {
    let entry = keyring_entry(api_url)?;
    match entry.delete_password() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => {
            warn!(api_url = %api_url, "failed to delete session from keyring: {err}");
            Ok(())
        }
    }
}

#[cfg(test)]
fn keyring_set(api_url: &str, value: &str) -> anyhow::Result<()> {
    let mut store = keyring_store()
        .lock()
        .map_err(|_| anyhow::anyhow!("failed to lock keyring store"))?;
    store.insert(keyring_key(api_url), value.to_string());
    Ok(())
}

#[cfg(test)]
fn keyring_get(api_url: &str) -> anyhow::Result<Option<String>> {
    let store = keyring_store()
        .lock()
        .map_err(|_| anyhow::anyhow!("failed to lock keyring store"))?;
    Ok(store.get(&keyring_key(api_url)).cloned())
}

#[cfg(test)]
fn keyring_delete(api_url: &str) -> anyhow::Result<()> {
    let mut store = keyring_store()
        .lock()
        .map_err(|_| anyhow::anyhow!("failed to lock keyring store"))?;
    store.remove(&keyring_key(api_url));
    Ok(())
}

pub(crate) fn store_session_secret(api_url: &str, set_cookies: &[String]) -> anyhow::Result<()> {
    keyring_set(api_url, &serde_json::to_string(set_cookies)?)?;
    debug!(api_url = %api_url, count = set_cookies.len(), "stored session cookies in keyring");
    Ok(())
}

pub(crate) fn load_session_secret(api_url: &str) -> anyhow::Result<Vec<String>> {
    let Some(value) = keyring_get(api_url)? else {
        debug!(api_url = %api_url, "no session cookies in keyring");
        return Ok(Vec::new());
    };
    serde_json::from_str(&value)
        .map_err(|err| anyhow::anyhow!("corrupt session entry in keyring for '{api_url}': {err}"))
}

pub(crate) fn delete_session_secret(api_url: &str) -> anyhow::Result<()> {
    keyring_delete(api_url)
}
