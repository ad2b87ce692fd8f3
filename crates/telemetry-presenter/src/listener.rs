//! MQTT listener feeding received messages to the runtime.

use crate::config::PresenterConfig;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use std::borrow::Cow;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const CHANNEL_CAPACITY: usize = 100;

/// One inbound publish.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Topic the message arrived on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl ReceivedMessage {
    /// Payload as text. Payloads are opaque to the presenter; invalid UTF-8
    /// is replaced rather than rejected.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// MQTT subscriber for the configured topic filters.
pub struct MqttListener {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Vec<String>,
}

impl MqttListener {
    /// Create a new listener from the presenter configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the broker address cannot be parsed.
    pub fn new(config: &PresenterConfig) -> Result<Self, ListenerError> {
        let (host, port) = parse_broker(&config.broker, config.port)?;

        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("presenter-{}", Uuid::new_v4()));

        let mut mqtt_options = MqttOptions::new(client_id, host, port);
        mqtt_options.set_keep_alive(KEEP_ALIVE);
        mqtt_options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(mqtt_options, CHANNEL_CAPACITY);

        Ok(Self {
            client,
            eventloop,
            topics: config.topics.clone(),
        })
    }

    /// Clone of the client handle, for disconnecting on shutdown.
    #[must_use]
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    /// Start polling the event loop.
    ///
    /// Returns a channel receiver for inbound messages. Topics are
    /// subscribed on every successful ConnAck, so the subscriptions survive
    /// reconnects (the session is clean). The task stops when the receiver
    /// is dropped or the client disconnects.
    pub fn start(mut self) -> mpsc::Receiver<ReceivedMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tx.closed() => {
                        tracing::debug!("Receiver dropped, stopping listener");
                        break;
                    }

                    event = self.eventloop.poll() => match event {
                        Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                            if ack.code == ConnectReturnCode::Success {
                                tracing::info!("Connected to broker, subscribing to topics");
                                spawn_resubscribe(&self.client, &self.topics);
                            } else {
                                tracing::error!(code = ?ack.code, "Connection refused by broker");
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let message = ReceivedMessage {
                                topic: publish.topic,
                                payload: publish.payload.to_vec(),
                            };
                            if tx.send(message).await.is_err() {
                                tracing::debug!("Receiver dropped, stopping listener");
                                break;
                            }
                        }
                        Ok(Event::Incoming(Packet::SubAck(_))) => {
                            tracing::debug!("Subscription acknowledged");
                        }
                        Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                            tracing::info!("Disconnected from broker");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            // rumqttc reconnects on the next poll
                            tracing::error!(error = %e, "MQTT error");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
            }
        });

        rx
    }
}

/// Subscribe to all topics from a separate task.
///
/// Subscribe requests go over the client's bounded request channel, which is
/// drained only by `eventloop.poll()`. Awaiting them inline on the poll task
/// would wedge both sides once the topic list outgrows the channel, so the
/// requests are issued from their own task while polling continues.
fn spawn_resubscribe(client: &AsyncClient, topics: &[String]) {
    let client = client.clone();
    let topics = topics.to_vec();
    tokio::spawn(async move {
        if let Err(err) = subscribe_all(&client, &topics).await {
            tracing::error!(error = %err, "Subscription failed");
        }
    });
}

async fn subscribe_all(client: &AsyncClient, topics: &[String]) -> Result<(), ListenerError> {
    for topic in topics {
        client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|e| ListenerError::Subscribe(e.to_string()))?;
        tracing::info!(topic, "Subscribed");
    }
    Ok(())
}

/// Parse a broker address into host and port.
///
/// Accepts a bare host, `host:port`, or a `tcp://`/`mqtt://` URL. The
/// configured port is used when the address carries none of its own.
fn parse_broker(input: &str, default_port: u16) -> Result<(String, u16), ListenerError> {
    if input.contains("://") {
        let url =
            Url::parse(input).map_err(|e| ListenerError::InvalidBroker(format!("{input}: {e}")))?;

        match url.scheme() {
            "tcp" | "mqtt" => {}
            scheme => {
                return Err(ListenerError::InvalidBroker(format!(
                    "{input}: unsupported scheme '{scheme}'"
                )));
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| ListenerError::InvalidBroker(format!("{input}: missing host")))?;
        let port = url.port().unwrap_or(default_port);

        return Ok((host.to_string(), port));
    }

    let mut parts = input.split(':');
    let host = parts
        .next()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ListenerError::InvalidBroker(format!("{input}: missing host")))?;
    let port = match parts.next() {
        None => default_port,
        Some(port) => port
            .parse()
            .map_err(|_| ListenerError::InvalidBroker(format!("{input}: invalid port '{port}'")))?,
    };
    if parts.next().is_some() {
        return Err(ListenerError::InvalidBroker(format!(
            "{input}: too many ':' separators"
        )));
    }

    Ok((host.to_string(), port))
}

/// Errors that can occur with the listener.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ListenerError {
    /// Invalid broker address
    #[error("invalid broker address: {0}")]
    InvalidBroker(String),
    /// Subscription failed
    #[error("subscription error: {0}")]
    Subscribe(String),
}
