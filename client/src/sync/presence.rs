//! # Presence Channel
//!
//! Holding one open broker connection is what marks the user online. No
//! traffic flows on it; the connection task reconnects on its own and
//! failures only show up in the logs.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::events::EventSender;
use crate::core::Config;
use crate::services::realtime::{ConnectionConfig, MessageTransport, RealtimeHandle};

pub const PRESENCE_CHANNEL: &str = "presence";

pub struct PresenceChannel {
    connection: RealtimeHandle,
}

impl PresenceChannel {
    /// Open the presence connection. `cookie` is the session's `Cookie`
    /// header; `cancel` ends the connection along with its owner.
    pub fn start(
        config: &Config,
        cookie: Option<String>,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        let connection = RealtimeHandle::start(
            PRESENCE_CHANNEL,
            ConnectionConfig::from_config(config, cookie),
            events,
            cancel,
        );
        Self { connection }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Close the connection and wait until it is gone.
    pub async fn stop(&self) {
        self.connection.shutdown().await;
        info!("Presence channel stopped");
    }
}
