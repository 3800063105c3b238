//! In-process broker.
//!
//! Subjects match exactly (no wildcards). Plain subscribers each receive
//! every message; a queue group receives it once, on a random member.
//! Request/reply uses a throwaway `_INBOX.<uuid>` subject per request.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::channel::{ChannelError, InboundMessage, MessagingChannel, Subscription};

struct Subscriber {
    queue_group: Option<String>,
    tx: mpsc::UnboundedSender<InboundMessage>,
}

#[derive(Default)]
struct Inner {
    subjects: DashMap<String, Vec<Subscriber>>,
    closed: AtomicBool,
}

impl Inner {
    /// Deliver a message, returning how many subscribers received it.
    fn deliver(&self, message: InboundMessage) -> usize {
        let Some(mut subscribers) = self.subjects.get_mut(&message.subject) else {
            return 0;
        };
        subscribers.retain(|s| !s.tx.is_closed());

        let mut delivered = 0;
        let mut groups: BTreeMap<&str, Vec<&Subscriber>> = BTreeMap::new();
        for subscriber in subscribers.iter() {
            match subscriber.queue_group.as_deref() {
                Some(group) => groups.entry(group).or_default().push(subscriber),
                None => {
                    if subscriber.tx.send(message.clone()).is_ok() {
                        delivered += 1;
                    }
                }
            }
        }
        for members in groups.values() {
            let chosen = members[fastrand::usize(..members.len())];
            if chosen.tx.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn register(&self, subject: &str, queue_group: Option<&str>) -> mpsc::UnboundedReceiver<InboundMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subjects
            .entry(subject.to_owned())
            .or_default()
            .push(Subscriber {
                queue_group: queue_group.map(str::to_owned),
                tx,
            });
        rx
    }

    fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        Ok(())
    }
}

/// Removes a request inbox when the request finishes or is dropped.
struct InboxGuard {
    inner: Arc<Inner>,
    inbox: String,
}

impl Drop for InboxGuard {
    fn drop(&mut self) {
        self.inner.subjects.remove(&self.inbox);
    }
}

/// Cloneable handle to an in-process broker.
#[derive(Clone, Default)]
pub struct MemoryChannel {
    inner: Arc<Inner>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// End every subscription and reject further operations.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.subjects.clear();
        tracing::debug!("memory channel closed");
    }

    /// Number of live subscribers on `subject`.
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.inner
            .subjects
            .get(subject)
            .map(|subs| subs.iter().filter(|s| !s.tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessagingChannel for MemoryChannel {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), ChannelError> {
        self.inner.ensure_open()?;
        let delivered = self.inner.deliver(InboundMessage {
            subject: subject.to_owned(),
            reply: None,
            payload,
        });
        tracing::trace!(subject, delivered, "published");
        Ok(())
    }

    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<Subscription, ChannelError> {
        self.inner.ensure_open()?;
        let rx = self.inner.register(subject, queue_group);
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        });
        Ok(stream.boxed())
    }

    async fn request(
        &self,
        subject: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, ChannelError> {
        self.inner.ensure_open()?;

        let inbox = format!("_INBOX.{}", Uuid::new_v4().simple());
        let mut rx = self.inner.register(&inbox, None);
        let _guard = InboxGuard {
            inner: self.inner.clone(),
            inbox: inbox.clone(),
        };

        let delivered = self.inner.deliver(InboundMessage {
            subject: subject.to_owned(),
            reply: Some(inbox),
            payload,
        });
        if delivered == 0 {
            return Err(ChannelError::NoResponders(subject.to_owned()));
        }

        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(reply)) => Ok(reply.payload),
            Ok(None) => Err(ChannelError::Closed),
            Err(_) => Err(ChannelError::TimedOut(timeout)),
        }
    }
}
