//! # Telemetry Presenter
//!
//! Display end of the CAN-to-MQTT telemetry pipeline. Producers put sensor
//! readings on a CAN bus, a bridge republishes them as JSON payloads over
//! MQTT, and the presenter subscribes to those topics and logs every message
//! to the console and optionally to a file.
//!
//! The MQTT protocol itself (framing, keep-alive, reconnection) is owned by
//! `rumqttc`; this crate only loads configuration, wires up logging, and
//! forwards inbound publishes to the log.

pub mod config;
pub mod listener;
pub mod logging;

pub use config::PresenterConfig;
pub use listener::{MqttListener, ReceivedMessage};
