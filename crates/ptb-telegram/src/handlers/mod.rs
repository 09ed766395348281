//! Telegram update handlers.
//!
//! Each handler only translates a teloxide update into an [`IncomingUpdate`] and hands
//! it to the core controller. Failures are logged; the dispatcher never sees them.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::error;

use ptb_core::messaging::types::IncomingUpdate;

use crate::router::AppState;

mod callback;
mod commands;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let update = callback::to_update(&q);
    dispatch(&state, update).await;
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = commands::to_update(&msg) else {
        return Ok(());
    };
    dispatch(&state, update).await;
    Ok(())
}

async fn dispatch(state: &AppState, update: IncomingUpdate) {
    if let Err(e) = state.controller.handle(update).await {
        error!("failed to handle update: {e}");
    }
}
