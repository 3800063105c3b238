//! Executor side of the bridge: subscribe and dispatch.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::channel::{ChannelError, MessagingChannel, Subscription};
use crate::lifecycle::Shutdown;
use crate::server::dispatcher::Dispatcher;
use crate::server::upstream::Upstream;

/// Listens on a request subject and executes each envelope it receives.
pub struct BridgeServer {
    channel: Arc<dyn MessagingChannel>,
    upstream: Upstream,
    queue_group: Option<String>,
}

impl BridgeServer {
    pub fn new(channel: Arc<dyn MessagingChannel>, upstream: Upstream) -> Self {
        Self {
            channel,
            upstream,
            queue_group: None,
        }
    }

    /// Share the subject with other executors; each request runs once.
    pub fn with_queue_group(mut self, queue_group: Option<String>) -> Self {
        self.queue_group = queue_group;
        self
    }

    /// Subscribe to `subject` and start handling messages in the background.
    pub async fn start(self, subject: &str) -> Result<ServerHandle, ChannelError> {
        let subscription = self
            .channel
            .subscribe(subject, self.queue_group.as_deref())
            .await?;

        tracing::info!(
            subject,
            queue_group = self.queue_group.as_deref().unwrap_or("-"),
            "Server bridge listening"
        );

        let shutdown = Shutdown::new();
        let dispatcher = Dispatcher::new(self.channel, self.upstream);
        let task = tokio::spawn(serve(dispatcher, subscription, shutdown.subscribe()));

        Ok(ServerHandle {
            subject: subject.to_owned(),
            shutdown,
            task,
        })
    }
}

/// Handle to a running server bridge. Dropping it stops the bridge.
pub struct ServerHandle {
    subject: String,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Stop taking new messages. Dispatches already started run to completion.
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Server bridge task failed");
        }
    }

    /// Wait until the subscription ends on its own.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Server bridge task failed");
        }
    }
}

async fn serve(
    dispatcher: Dispatcher,
    mut subscription: Subscription,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Server bridge stopping");
                break;
            }
            message = subscription.next() => match message {
                Some(message) => {
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move { dispatcher.handle(message).await });
                }
                None => {
                    tracing::info!("Subscription closed");
                    break;
                }
            },
        }
    }
}
