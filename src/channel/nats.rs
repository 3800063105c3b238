//! NATS-backed messaging channel.

use std::time::Duration;

use async_nats::RequestErrorKind;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::channel::{ChannelError, InboundMessage, MessagingChannel, Subscription};
use crate::config::BrokerConfig;

/// Channel over a NATS connection. Clones share the connection.
#[derive(Clone)]
pub struct NatsChannel {
    client: async_nats::Client,
}

impl NatsChannel {
    /// Connect to the broker named in `config`.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, ChannelError> {
        let client = async_nats::ConnectOptions::new()
            .name(&config.name)
            .connect(config.url.as_str())
            .await
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;

        tracing::info!(url = %config.url, name = %config.name, "Connected to NATS");
        Ok(Self { client })
    }
}

#[async_trait]
impl MessagingChannel for NatsChannel {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), ChannelError> {
        self.client
            .publish(subject.to_owned(), payload)
            .await
            .map_err(|e| ChannelError::Unavailable(e.to_string()))
    }

    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<Subscription, ChannelError> {
        let subscriber = match queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(subject.to_owned(), group.to_owned())
                    .await
            }
            None => self.client.subscribe(subject.to_owned()).await,
        }
        .map_err(|e| ChannelError::Unavailable(e.to_string()))?;

        let messages = subscriber.map(|message| InboundMessage {
            subject: message.subject.to_string(),
            reply: message.reply.map(|reply| reply.to_string()),
            payload: message.payload,
        });
        Ok(messages.boxed())
    }

    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, ChannelError> {
        let request = async_nats::Request::new()
            .payload(payload)
            .timeout(Some(timeout));

        match self.client.send_request(subject.to_owned(), request).await {
            Ok(message) => Ok(message.payload),
            Err(e) => Err(match e.kind() {
                RequestErrorKind::TimedOut => ChannelError::TimedOut(timeout),
                RequestErrorKind::NoResponders => ChannelError::NoResponders(subject.to_owned()),
                _ => ChannelError::Unavailable(e.to_string()),
            }),
        }
    }
}
