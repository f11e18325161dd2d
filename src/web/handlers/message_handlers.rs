// src/web/handlers/message_handlers.rs
use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::core::Database;
use crate::models::Message;
use crate::repositories::messages::ConversationSummary;
use crate::repositories::{MessageRepository, UserRepository};
use crate::utils::MAX_MESSAGE_CHARS;
use crate::web::relay::MessageRelay;
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::response::stream::{Event, EventStream};
use rocket::serde::json::Json;
use rocket::tokio::select;
use rocket::tokio::sync::broadcast::error::RecvError;
use rocket::{Shutdown, State};

pub async fn send_message_handler(
    request: Json<SendMessageRequest>,
    auth: AuthenticatedUser,
    db: &State<Database>,
    relay: &State<MessageRelay>,
) -> Result<Custom<Json<DataResponse<Message>>>, ApiError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::bad_request(format!(
            "Message is longer than {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    if request.receiver_id == auth.id() {
        return Err(ApiError::bad_request("You cannot message yourself"));
    }

    if UserRepository::new(db.pool())
        .find_by_id(request.receiver_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!("User {} not found", request.receiver_id)));
    }

    let message = MessageRepository::new(db.pool())
        .create(auth.id(), request.receiver_id, content)
        .await?;
    relay.publish(&message);

    app_log!(debug, "User {} messaged user {}", auth.id(), request.receiver_id);
    Ok(Custom(
        Status::Created,
        Json(DataResponse::success("Message sent", message)),
    ))
}

pub async fn conversations_handler(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<ConversationSummary>>> {
    let conversations = MessageRepository::new(db.pool())
        .conversations(auth.id())
        .await?;
    Ok(Json(DataResponse::success(
        format!("{} conversation(s)", conversations.len()),
        conversations,
    )))
}

pub async fn conversation_with_handler(
    user_id: i64,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Message>>> {
    let repo = MessageRepository::new(db.pool());
    let marked = repo.mark_read_from(user_id, auth.id()).await?;
    if marked > 0 {
        app_log!(debug, "User {} read {} message(s) from {}", auth.id(), marked, user_id);
    }
    let messages = repo.conversation(auth.id(), user_id).await?;

    Ok(Json(DataResponse::success(
        format!("{} message(s)", messages.len()),
        messages,
    )))
}

/// Live feed of messages addressed to the caller until the client or server goes away
pub fn message_stream_handler(
    auth: AuthenticatedUser,
    relay: &State<MessageRelay>,
    mut shutdown: Shutdown,
) -> EventStream![] {
    let mut rx = relay.subscribe();
    let user_id = auth.id();
    app_log!(info, "User {} opened the message stream", user_id);

    EventStream! {
        loop {
            let message = select! {
                received = rx.recv() => match received {
                    Ok(message) => message,
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        app_log!(warn, "Message stream for {} skipped {} message(s)", user_id, skipped);
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };

            if message.receiver_id == user_id {
                yield Event::json(&message).event("message");
            }
        }
    }
}
