// src/services/mail_service.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Mensagem simples em texto puro.
#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Colaborador de entrega de e-mails. Um erro aqui vira 500 no handler,
/// mas nunca desfaz o que já foi gravado.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// Ambiente local: só registra a mensagem no log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "📧 E-mail (stub de log)");
        tracing::debug!(body = %message.body, "Corpo do e-mail");
        Ok(())
    }
}

/// Entrega via relay HTTP: faz POST do JSON da mensagem na URL configurada.
#[derive(Debug, Clone)]
pub struct HttpRelayMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelayMailer {
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl Mailer for HttpRelayMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let response = self.client.post(&self.endpoint).json(message).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Relay de e-mail respondeu {}", status);
        }
        tracing::info!(to = %message.to, "📧 E-mail entregue ao relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let message = MailMessage {
            to: "a@b.com".into(),
            from: "no-reply@b.com".into(),
            subject: "Olá".into(),
            body: "corpo".into(),
        };
        assert!(LogMailer.send(&message).await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_relay_is_an_error() {
        let mailer = HttpRelayMailer::new("http://127.0.0.1:9/relay").unwrap();
        let message = MailMessage {
            to: "a@b.com".into(),
            from: "no-reply@b.com".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(mailer.send(&message).await.is_err());
    }
}
