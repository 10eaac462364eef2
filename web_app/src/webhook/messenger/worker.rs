//! Default message handlers and the task answering them.
//!
//! Handlers run on the request thread, so the ones that need the Graph API only
//! push the message onto a channel. [`ReplyWorker`] drains it and replies.

use super::{
    client::MessengerClient,
    dispatch::DispatchTable,
    schemas::{Attachment, Message, MessageKind, MessagePayload, Postback, ReceivedMessage},
};
use crate::metric;
use anyhow::Result;
use tokio::sync::mpsc::{Receiver, Sender, error::TrySendError};
use tracing::{debug, info};

/// Builds the handler table used by the server.
///
/// Received messages and postbacks are queued for the [`ReplyWorker`],
/// receipts are only logged and echoes have no handler. When the queue is full
/// the message is dropped so the webhook never waits on the worker.
pub fn default_dispatch_table(queue: Sender<Message>) -> DispatchTable {
    let postback_queue = queue.clone();

    DispatchTable::builder()
        .on(MessageKind::Received, move |message| enqueue(&queue, message))
        .on(MessageKind::Postback, move |message| {
            enqueue(&postback_queue, message)
        })
        .on(MessageKind::Delivered, |message| {
            if let MessagePayload::Delivered(delivery) = &message.payload {
                debug!(
                    "Messages delivered up to {}: {:?}",
                    delivery.watermark, delivery.mids
                );
            }
        })
        .on(MessageKind::Read, |message| {
            if let MessagePayload::Read(read) = &message.payload {
                debug!(
                    "User {} read messages up to {}",
                    message.sender.id.as_deref().unwrap_or("<unknown>"),
                    read.watermark
                );
            }
        })
        .build()
}

fn enqueue(queue: &Sender<Message>, message: Message) {
    match queue.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(message)) => {
            metric::incr_reply_dropped_statds("queue_full");
            logfire::warn!(
                "Reply queue is full, dropping {kind} message",
                kind = message.kind().as_str().to_string()
            );
        }
        Err(TrySendError::Closed(_)) => {
            metric::incr_reply_dropped_statds("queue_closed");
            logfire::error!("Reply queue is closed, dropping message");
        }
    }
}

/// Answers queued messages through the Send API
pub struct ReplyWorker {
    pub client: MessengerClient,
    /// Sent when the get-started postback arrives
    pub greeting_text: Option<String>,
    pub get_started_payload: Option<String>,
}

impl ReplyWorker {
    /// Replies to messages until every sender is dropped
    pub async fn run(self, mut queue: Receiver<Message>) {
        info!("Reply worker started");

        while let Some(message) = queue.recv().await {
            if let Err(e) = self.reply(&message).await {
                logfire::error!(
                    "Failed to reply to {kind} message: {error}",
                    kind = message.kind().as_str().to_string(),
                    error = e.to_string()
                );
            }
        }

        info!("Reply worker stopped");
    }

    /// Sends the answer to a single message, if it deserves one
    pub async fn reply(&self, message: &Message) -> Result<()> {
        let Some(user_id) = message.sender.id.as_deref() else {
            debug!("Message without sender, nothing to reply to");
            return Ok(());
        };

        match &message.payload {
            MessagePayload::Received(received) => self.reply_received(user_id, received).await,
            MessagePayload::Postback(postback) => self.reply_postback(user_id, postback).await,
            _ => Ok(()),
        }
    }

    async fn reply_received(&self, user_id: &str, received: &ReceivedMessage) -> Result<()> {
        if let Some(text) = received.text.as_deref().filter(|text| !text.is_empty()) {
            self.client.send_text(user_id, text).await?;
            return Ok(());
        }

        if received.attachments.is_empty() {
            return Ok(());
        }

        let kinds: Vec<_> = received
            .attachments
            .iter()
            .map(Attachment::kind_name)
            .collect();
        let mut acknowledgement = format!("Thanks for the {}", kinds.join(", "));

        if let Some(Attachment::Location(coordinates)) = received
            .attachments
            .iter()
            .find(|attachment| matches!(attachment, Attachment::Location(_)))
        {
            acknowledgement.push_str(&format!(
                " ({:.4}, {:.4})",
                coordinates.lat, coordinates.long
            ));
        }

        self.client.send_text(user_id, &acknowledgement).await?;
        Ok(())
    }

    async fn reply_postback(&self, user_id: &str, postback: &Postback) -> Result<()> {
        let is_get_started = self.get_started_payload.as_deref() == Some(postback.payload.as_str());

        if let (true, Some(greeting)) = (is_get_started, self.greeting_text.as_deref()) {
            self.client.send_text(user_id, greeting).await?;
            return Ok(());
        }

        let label = postback.title.as_deref().unwrap_or(&postback.payload);
        self.client
            .send_text(user_id, &format!("You picked {label}"))
            .await?;
        Ok(())
    }
}
