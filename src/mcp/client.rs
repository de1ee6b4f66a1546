use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::config::McpConfig;
use super::session::McpSession;
use super::McpError;

/// Owns one session per configured tool server
pub struct McpClient {
    config: Option<McpConfig>,
    sessions: Mutex<BTreeMap<String, Arc<McpSession>>>,
}

impl McpClient {
    pub fn new(config: McpConfig) -> Self {
        Self {
            config: Some(config),
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, McpError> {
        Ok(Self::new(McpConfig::from_file(path)?))
    }

    /// Client over sessions that were connected elsewhere
    pub fn from_sessions(sessions: Vec<McpSession>) -> Self {
        let sessions = sessions
            .into_iter()
            .map(|session| (session.name().to_string(), Arc::new(session)))
            .collect();

        Self {
            config: None,
            sessions: Mutex::new(sessions),
        }
    }

    /// Start every configured server and complete its handshake.
    ///
    /// If any server fails, the sessions already opened are closed again and the
    /// first error is returned.
    pub async fn create_all_sessions(&self) -> Result<(), McpError> {
        let Some(ref config) = self.config else {
            return Ok(());
        };

        for (name, server) in &config.servers {
            if self.sessions.lock().await.contains_key(name) {
                continue;
            }

            match McpSession::connect_stdio(name, server).await {
                Ok(session) => {
                    self.sessions
                        .lock()
                        .await
                        .insert(name.clone(), Arc::new(session));
                }
                Err(e) => {
                    log::error!("Failed to start MCP server '{}': {}", name, e);
                    if let Err(close_err) = self.close_all_sessions().await {
                        log::debug!("Cleanup after failed start also failed: {}", close_err);
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    pub async fn sessions(&self) -> Vec<Arc<McpSession>> {
        self.sessions.lock().await.values().cloned().collect()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Close every open session.
    ///
    /// All sessions are attempted. The first non-benign failure is returned; if
    /// only benign teardown errors happened, the first of those is returned.
    pub async fn close_all_sessions(&self) -> Result<(), McpError> {
        let sessions: Vec<_> = std::mem::take(&mut *self.sessions.lock().await)
            .into_values()
            .collect();

        let mut benign: Option<McpError> = None;
        let mut fatal: Option<McpError> = None;

        for session in sessions {
            match session.close().await {
                Ok(()) => {}
                Err(e) if e.is_benign_teardown() => {
                    log::debug!("Session '{}' was already gone: {}", session.name(), e);
                    benign.get_or_insert(e);
                }
                Err(e) => {
                    log::debug!("Closing session '{}' failed: {}", session.name(), e);
                    fatal.get_or_insert(e);
                }
            }
        }

        match fatal.or(benign) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
