//! Mapping of the persisted transcript into display messages.

use crate::core::transport::HttpTransport;
use crate::core::{ChatClientConfig, ChatError};
use crate::transcript::normalize::parse_tagged;
use crate::types::{DisplayMessage, HistoryRecord, HistoryResponse, NormalizedItem, Role};
use tracing::{debug, warn};

/// Map stored records to display messages.
///
/// Records whose content equals `placeholder` (a turn saved while still
/// streaming) are skipped. User records are plain text. Assistant records go
/// through the same tagged parser as the live stream; content that is not a
/// tagged payload is shown verbatim.
pub fn reconcile_history(records: &[HistoryRecord], placeholder: &str) -> Vec<DisplayMessage> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if record.content == placeholder {
            continue;
        }
        match record.role {
            Role::User => out.push(DisplayMessage::user(record.content.clone())),
            Role::Assistant => match parse_tagged(&record.content) {
                Some(items) => out.extend(items.into_iter().map(DisplayMessage::assistant)),
                None => out.push(DisplayMessage::assistant(NormalizedItem::text(
                    record.content.clone(),
                ))),
            },
        }
    }
    out
}

/// Fetch the stored records of `session_id`.
///
/// A 404 means the session has no history yet and yields an empty list.
pub async fn fetch_history<T: HttpTransport>(
    http: &T,
    cfg: &ChatClientConfig,
    session_id: &str,
) -> Result<Vec<HistoryRecord>, ChatError> {
    let url = cfg.history_url(session_id)?;
    let headers = cfg.history_headers();
    match http.get_json(&url, &headers, &cfg.transport).await {
        Ok((body, _headers)) => {
            let resp: HistoryResponse = serde_json::from_value(body)?;
            debug!(
                target: "chat_stream::history",
                records = resp.chat_logs.len(),
                "history fetched"
            );
            Ok(resp.chat_logs)
        }
        Err(err) if err.is_not_found() => {
            debug!(target: "chat_stream::history", %session_id, "no stored history");
            Ok(Vec::new())
        }
        Err(err) => {
            warn!(
                target: "chat_stream::history",
                error = %err.sanitized_message(),
                "history fetch failed"
            );
            Err(err.into())
        }
    }
}

/// Fetch and map in one step.
pub async fn load_history<T: HttpTransport>(
    http: &T,
    cfg: &ChatClientConfig,
    session_id: &str,
) -> Result<Vec<DisplayMessage>, ChatError> {
    let records = fetch_history(http, cfg, session_id).await?;
    Ok(reconcile_history(&records, &cfg.history_placeholder))
}
