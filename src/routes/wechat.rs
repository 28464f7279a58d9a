use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::error::AppError;
use crate::AppState;

/// Passive replies must stay short; WeChat rejects oversized text messages.
const REPLY_MAX_CHARS: usize = 1800;

static ADD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^add(\d{6})$").expect("add pattern"));
static DEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^del(\d{6})$").expect("del pattern"));
static REFRESH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^refresh(\d{6})$").expect("refresh pattern"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{6})$").expect("code pattern"));

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
    pub echostr: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageParams {
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
}

/// Signature per the WeChat rule: SHA-1 over the dictionary-sorted
/// concatenation of token, timestamp and nonce.
pub fn sign(token: &str, timestamp: &str, nonce: &str) -> String {
    let mut parts = [token, timestamp, nonce];
    parts.sort_unstable();
    let mut hasher = Sha1::new();
    hasher.update(parts.concat().as_bytes());
    hex::encode(hasher.finalize())
}

fn verify(token: &str, signature: &str, timestamp: &str, nonce: &str) -> bool {
    sign(token, timestamp, nonce) == signature
}

/// Fields of an incoming plaintext-mode text message envelope.
#[derive(Debug, Default)]
pub struct IncomingMessage {
    pub to_user: String,
    pub from_user: String,
    pub msg_type: String,
    pub content: String,
    pub msg_id: String,
}

pub fn parse_message(xml: &str) -> Result<IncomingMessage, AppError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| AppError::XmlParseError(e.to_string()))?;

    let text_of = |tag: &str| -> String {
        doc.descendants()
            .find(|n| n.has_tag_name(tag))
            .and_then(|n| n.text())
            .unwrap_or("")
            .to_string()
    };

    Ok(IncomingMessage {
        to_user: text_of("ToUserName"),
        from_user: text_of("FromUserName"),
        msg_type: text_of("MsgType"),
        content: text_of("Content").trim().to_string(),
        msg_id: text_of("MsgId"),
    })
}

/// Passive text-reply XML envelope.
pub fn build_text_reply(to_user: &str, from_user: &str, content: &str) -> String {
    let now = Utc::now().timestamp();
    format!(
        "<xml>
  <ToUserName><![CDATA[{}]]></ToUserName>
  <FromUserName><![CDATA[{}]]></FromUserName>
  <CreateTime>{}</CreateTime>
  <MsgType><![CDATA[text]]></MsgType>
  <Content><![CDATA[{}]]></Content>
</xml>",
        to_user, from_user, now, content
    )
}

fn beijing() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

/// UTC ISO-8601 timestamp to Beijing time at minute resolution;
/// "尚未刷新" for anything missing or unparseable.
pub fn fmt_utc_iso_to_cst_min(ts: &str) -> String {
    if ts.is_empty() {
        return "尚未刷新".to_string();
    }

    let parsed = DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        });

    match parsed {
        Ok(dt) => dt
            .with_timezone(&beijing())
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => "尚未刷新".to_string(),
    }
}

fn xml_response(xml: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        xml,
    )
        .into_response()
}

fn bounded(reply: String) -> String {
    reply.chars().take(REPLY_MAX_CHARS).collect()
}

/// Server-access verification (GET). Echoes `echostr` on a valid signature.
pub async fn wechat_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<impl IntoResponse, AppError> {
    if !verify(
        &state.settings.wechat_token,
        &params.signature,
        &params.timestamp,
        &params.nonce,
    ) {
        return Err(AppError::SignatureRejected);
    }

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        params.echostr,
    ))
}

/// Incoming text messages (POST), plaintext mode only.
#[tracing::instrument(skip(state, body))]
pub async fn wechat_message(
    State(state): State<AppState>,
    Query(params): Query<MessageParams>,
    body: String,
) -> Result<Response, AppError> {
    if !verify(
        &state.settings.wechat_token,
        &params.signature,
        &params.timestamp,
        &params.nonce,
    ) {
        return Err(AppError::SignatureRejected);
    }

    let msg = parse_message(&body)?;
    let reply_to = &msg.from_user;
    let reply_from = &msg.to_user;

    if !msg.msg_type.eq_ignore_ascii_case("text") {
        let xml = build_text_reply(reply_to, reply_from, "暂仅支持文本消息，请发送6位A股代码，如 000001");
        return Ok(xml_response(xml));
    }

    let reply = dispatch_command(&state, &msg).await;
    let xml = build_text_reply(reply_to, reply_from, &bounded(reply));
    tracing::debug!(msg_id = %msg.msg_id, "reply sent");
    Ok(xml_response(xml))
}

async fn dispatch_command(state: &AppState, msg: &IncomingMessage) -> String {
    let content = msg.content.as_str();
    let from_user = msg.from_user.as_str();

    if content == "admin" {
        return format!(
            "From User: {}\nTo User: {}\nMsg ID: {}\nVersion: {}",
            msg.from_user, msg.to_user, msg.msg_id, state.settings.version
        );
    }

    if content == "帮助" || content == "help" {
        return "使用说明:\n\
                1) 发送 6 位股票代码获取近期公告总结\n\
                2) addXXXXXX 加入订阅 (例 add600000)\n\
                3) delXXXXXX 取消订阅 (例 del600000)\n\
                4) subscribe 查看订阅列表\n\
                5) refreshXXXXXX 立即刷新公告总结 (例 refresh600000)"
            .to_string();
    }

    let lowered = content.to_lowercase();
    if lowered == "subscribe" || lowered == "list" || lowered == "my" {
        return handle_subscribe(state, from_user);
    }

    if ADD_RE.is_match(content) {
        return state
            .subscriptions
            .add_code(from_user, &content["add".len()..])
            .unwrap_or_else(|e| format!("订阅失败: {}", e));
    }

    if DEL_RE.is_match(content) {
        return state
            .subscriptions
            .del_code(from_user, &content["del".len()..])
            .unwrap_or_else(|e| format!("取消订阅失败: {}", e));
    }

    if let Some(caps) = REFRESH_RE.captures(content) {
        return handle_refresh(state, &caps[1]).await;
    }

    if let Some(caps) = CODE_RE.captures(content) {
        return handle_query(state, &caps[1]);
    }

    "请输入6位A股代码，如 000001".to_string()
}

/// Subscription listing with per-code last-refresh times, capped at 100
/// lines so the reply stays under the passive-reply limit.
fn handle_subscribe(state: &AppState, from_user: &str) -> String {
    let codes = match state.subscriptions.list_codes(from_user) {
        Ok(codes) => codes,
        Err(e) => return format!("查询订阅失败: {}", e),
    };

    if codes.is_empty() {
        return "当前未订阅任何股票，发送 add600000 开始订阅".to_string();
    }

    let ts_map = state.cache.get_timestamps(&codes);
    let lines: Vec<String> = codes
        .iter()
        .take(100)
        .map(|code| {
            let ts = ts_map.get(code).map(String::as_str).unwrap_or("");
            format!("{} {}", code, fmt_utc_iso_to_cst_min(ts))
        })
        .collect();

    let mut reply = format!("订阅列表({}):\n{}", codes.len(), lines.join("\n"));
    if codes.len() > 100 {
        reply.push_str(&format!("\n其余 {} 个已省略", codes.len() - 100));
    }
    reply
}

/// Cooldown-guarded immediate refresh. Replies with the refresh time, not
/// the summary body; the summary is saved for later queries.
async fn handle_refresh(state: &AppState, code: &str) -> String {
    if let Err(remaining) = state.throttle.check_ready(code) {
        return AppError::TooFrequent {
            code: code.to_string(),
            retry_in_secs: remaining,
        }
        .to_string();
    }

    match state.summarizer.summarize(code).await {
        Ok(result) => {
            if let Err(e) = state.cache.save(code, &result) {
                tracing::error!(%code, error = %e, "refresh result not persisted");
                return format!("刷新失败: {}", e);
            }
            state.throttle.mark(code);
            let refreshed_at = Utc::now()
                .with_timezone(&beijing())
                .format("%Y-%m-%d %H:%M");
            format!("{} 已刷新，{}", code, refreshed_at)
        }
        Err(e) => format!("刷新失败: {}", e),
    }
}

/// Bare 6-digit query: cached summary text plus its refresh time.
fn handle_query(state: &AppState, code: &str) -> String {
    let cached = state.cache.load_text(code);
    if cached.is_empty() {
        return format!("{} 无公告摘要，稍后再试", code);
    }

    let ts_map = state.cache.get_timestamps(&[code.to_string()]);
    let ts = ts_map.get(code).map(String::as_str).unwrap_or("");
    format!("{} {}\n\n{}", code, fmt_utc_iso_to_cst_min(ts), cached)
}
