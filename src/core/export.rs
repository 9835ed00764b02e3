use crate::core::message::{conversation_turns, ChatMessage, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Text,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "txt" | "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "Unknown export format '{other}'. Use md, txt, or json."
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub session_id: String,
    pub exported_at: String,
    pub message_count: usize,
    pub messages: Vec<ExportedMessage>,
}

pub fn export_filename(session_id: Uuid, format: ExportFormat, at: DateTime<Utc>) -> String {
    let id = session_id.simple().to_string();
    format!(
        "english-tutor-{}-{}.{}",
        &id[..8],
        at.format("%Y-%m-%d"),
        format.extension()
    )
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Tutor",
        Role::System => "System",
    }
}

pub fn render(
    history: &[ChatMessage],
    session_id: Uuid,
    format: ExportFormat,
    at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let turns: Vec<&ChatMessage> = conversation_turns(history).collect();
    match format {
        ExportFormat::Markdown => Ok(render_markdown(&turns, session_id, at)),
        ExportFormat::Text => Ok(render_text(&turns, session_id, at)),
        ExportFormat::Json => render_json(&turns, session_id, at),
    }
}

fn render_markdown(turns: &[&ChatMessage], session_id: Uuid, at: DateTime<Utc>) -> String {
    let mut out = format!(
        "# English Tutor Session\n\n- Session: `{}`\n- Exported: {}\n\n---\n\n",
        session_id,
        at.to_rfc3339()
    );
    for (i, msg) in turns.iter().enumerate() {
        if i > 0 {
            out.push_str("\n---\n\n");
        }
        out.push_str(&format!("**{}:**\n\n{}\n", role_label(msg.role), msg.content));
    }
    out
}

fn render_text(turns: &[&ChatMessage], session_id: Uuid, at: DateTime<Utc>) -> String {
    let mut out = format!(
        "English Tutor Session {}\nExported {}\n\n",
        session_id,
        at.to_rfc3339()
    );
    for (i, msg) in turns.iter().enumerate() {
        if i > 0 {
            out.push_str("----------------------------------------\n");
        }
        out.push_str(&format!("{}: {}\n", role_label(msg.role), msg.content));
    }
    out
}

fn render_json(
    turns: &[&ChatMessage],
    session_id: Uuid,
    at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let payload = ExportPayload {
        session_id: session_id.to_string(),
        exported_at: at.to_rfc3339(),
        message_count: turns.len(),
        messages: turns
            .iter()
            .map(|m| ExportedMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("I goed to school"),
            ChatMessage::assistant("I went to school. 'Go' is irregular."),
            ChatMessage::user("I went to school"),
            ChatMessage::assistant("Perfect!"),
        ]
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn json_export_preserves_count_and_order() {
        let history = sample();
        let id = Uuid::new_v4();
        let json = render(&history, id, ExportFormat::Json, at()).unwrap();
        let parsed: ExportPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.message_count, history.len());
        assert_eq!(parsed.session_id, id.to_string());
        let roles_contents: Vec<(String, String)> = parsed
            .messages
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();
        let expected: Vec<(String, String)> = history
            .iter()
            .map(|m| (m.role.as_str().to_string(), m.content.clone()))
            .collect();
        assert_eq!(roles_contents, expected);
    }

    #[test]
    fn json_export_uses_camel_case_keys() {
        let json = render(&sample(), Uuid::new_v4(), ExportFormat::Json, at()).unwrap();
        assert!(json.contains("\"sessionId\""));
        assert!(json.contains("\"exportedAt\""));
        assert!(json.contains("\"messageCount\": 4"));
    }

    #[test]
    fn markdown_separates_turns_with_rules() {
        let md = render(&sample(), Uuid::new_v4(), ExportFormat::Markdown, at()).unwrap();
        assert!(md.contains("**You:**"));
        assert!(md.contains("**Tutor:**"));
        // header rule plus one between each of the four turns
        assert_eq!(md.matches("\n---\n").count(), 4);
    }

    #[test]
    fn notices_are_not_exported() {
        let mut history = sample();
        history.push(ChatMessage::notice("Saved 2 words"));
        let text = render(&history, Uuid::new_v4(), ExportFormat::Text, at()).unwrap();
        assert!(!text.contains("Saved 2 words"));
    }

    #[test]
    fn filename_uses_id_prefix_and_date() {
        let id = Uuid::parse_str("1234abcd-0000-4000-8000-000000000000").unwrap();
        assert_eq!(
            export_filename(id, ExportFormat::Text, at()),
            "english-tutor-1234abcd-2026-03-14.txt"
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(err.contains("pdf"));
        assert_eq!("MD".parse(), Ok(ExportFormat::Markdown));
    }
}
