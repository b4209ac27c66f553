//! # TierTreff Sync Client
//!
//! Headless entry point: logs in, goes online, polls notifications and
//! prints sync events until Ctrl+C.

use client::core::{event_bus, init_config, SyncEvent};
use client::sync::CategorySet;
use client::{debug, AppError, Session};

#[tokio::main]
async fn main() -> client::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let _log_guard = debug::init();

    let config = init_config()?.clone();
    let username = std::env::var("TIERTREFF_USERNAME")
        .map_err(|_| AppError::Config("TIERTREFF_USERNAME is not set".to_string()))?;
    let password = std::env::var("TIERTREFF_PASSWORD")
        .map_err(|_| AppError::Config("TIERTREFF_PASSWORD is not set".to_string()))?;

    let (events, inbox) = event_bus();
    let session = Session::login(config, &username, &password, Some(events)).await?;
    println!("Logged in as {}", session.user().username);

    let notifications = session.notifications(CategorySet::all());
    let poller = notifications.start();
    let chat = session.message_channel();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = inbox.recv() => match event {
                Ok(SyncEvent::ConnectionChanged { channel, connected }) => {
                    println!("[{}] {}", channel, if connected { "online" } else { "offline" });
                }
                Ok(SyncEvent::ChatMessageReceived(message)) => {
                    println!("{} -> {}: {}", message.sender_username, message.recipient_username, message.content);
                }
                Ok(SyncEvent::HistoryLoaded { user_a, user_b, count }) => {
                    println!("{} messages between {} and {}", count, user_a, user_b);
                }
                Ok(SyncEvent::NotificationsUpdated(counts)) => {
                    println!(
                        "notifications: {} friend requests, {} friend updates, {} match interests, {} messages",
                        counts.friend_requests, counts.friend_outcomes, counts.match_interests, counts.chat_messages
                    );
                }
                Ok(SyncEvent::FriendshipChanged { user_id, status }) => {
                    println!("friendship with {:?} is now {}", user_id, status);
                }
                Err(_) => break,
            },
        }
    }

    chat.close().await;
    notifications.close();
    session.end().await;
    if let Err(e) = poller.await {
        tracing::warn!(error = %e, "Notification poller ended abnormally");
    }
    Ok(())
}
