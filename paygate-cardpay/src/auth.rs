//! Token acquisition against the CardPay token endpoint

use crate::error::{GatewayError, GatewayResult};
use crate::token::{Token, TokenResponse, TokenStore};
use crate::transport::{ProviderAction, Transport};
use paygate_config::CardPaySettings;
use paygate_core::{Clock, OrderPaymentMethod};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

/// Terminal a token is issued for
pub struct TerminalCredentials {
    /// Payment system base URL
    pub base_url: String,
    pub terminal_code: String,
    pub password: SecretString,
}

impl TerminalCredentials {
    pub fn new(
        base_url: impl Into<String>,
        terminal_code: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            terminal_code: terminal_code.into(),
            password: SecretString::new(password.into().into()),
        }
    }

    /// Credentials of the terminal configured for the method's external code
    pub fn for_method(
        method: &OrderPaymentMethod,
        settings: &CardPaySettings,
    ) -> GatewayResult<Self> {
        let code = method.params.external_id.as_str();
        let terminal = settings
            .terminal(code)
            .filter(|terminal| !terminal.terminal_id.is_empty())
            .ok_or_else(|| {
                GatewayError::Configuration(format!("no terminal configured for {}", code))
            })?;

        Ok(Self::new(
            method.payment_system.api_url.as_str(),
            terminal.terminal_id.as_str(),
            terminal.secret_word.expose_secret(),
        ))
    }
}

impl fmt::Debug for TerminalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalCredentials")
            .field("base_url", &self.base_url)
            .field("terminal_code", &self.terminal_code)
            .finish_non_exhaustive()
    }
}

/// Obtains and caches provider tokens
pub struct GatewayAuthClient {
    transport: Arc<Transport>,
    store: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
}

impl GatewayAuthClient {
    pub fn new(transport: Arc<Transport>, store: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            store,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Return a token whose access window is open, refreshing or
    /// re-authenticating when needed.
    pub async fn get_valid_token(
        &self,
        key: &str,
        credentials: &TerminalCredentials,
    ) -> GatewayResult<Token> {
        if let Some(token) = self.store.get(key).await
            && token.is_access_valid(self.clock.now())
        {
            return Ok(token);
        }

        let lock = self.store.exchange_lock(key);
        let _guard = lock.lock().await;

        // Another caller may have finished an exchange while we waited
        let now = self.clock.now();
        let cached = self.store.get(key).await;
        if let Some(token) = &cached
            && token.is_access_valid(now)
        {
            return Ok(token.clone());
        }

        if let Some(stale) = cached
            && stale.is_refresh_valid(now)
        {
            match self.refresh(&stale, credentials).await {
                Ok(token) => {
                    self.store.insert(key, token.clone()).await;
                    return Ok(token);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Token refresh failed, re-authenticating");
                    self.store.remove(key).await;
                }
            }
        }

        let token = self.authenticate(credentials).await?;
        self.store.insert(key, token.clone()).await;
        Ok(token)
    }

    async fn authenticate(&self, credentials: &TerminalCredentials) -> GatewayResult<Token> {
        self.exchange(
            ProviderAction::Authenticate,
            credentials,
            &[
                ("grant_type", "password"),
                ("terminal_code", credentials.terminal_code.as_str()),
                ("password", credentials.password.expose_secret()),
            ],
        )
        .await
    }

    async fn refresh(&self, stale: &Token, credentials: &TerminalCredentials) -> GatewayResult<Token> {
        self.exchange(
            ProviderAction::Refresh,
            credentials,
            &[
                ("grant_type", "refresh_token"),
                ("terminal_code", credentials.terminal_code.as_str()),
                ("refresh_token", stale.refresh_token.as_str()),
            ],
        )
        .await
    }

    async fn exchange(
        &self,
        action: ProviderAction,
        credentials: &TerminalCredentials,
        form: &[(&str, &str)],
    ) -> GatewayResult<Token> {
        let response = self
            .transport
            .post_form(action, &credentials.base_url, form)
            .await
            .map_err(|e| {
                tracing::warn!(action = %action, error = %e, "Token request failed");
                GatewayError::AuthenticationFailed
            })?;

        if !response.is_ok() {
            tracing::warn!(action = %action, status = response.status, "Token request rejected");
            return Err(GatewayError::AuthenticationFailed);
        }

        let body: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            tracing::warn!(action = %action, error = %e, "Malformed token response");
            GatewayError::AuthenticationFailed
        })?;

        Ok(Token::from_response(body, self.clock.now()))
    }
}
