// Query synthesis
//
// Converts structured tool parameters into the natural-language instruction the
// agent flow understands.
//
// Design Decision: Parameters arrive as an open JSON map. They are parsed leniently
// into a typed record per tool (`ToolParams`) so every template is checked by the
// compiler; missing or oddly-typed fields fall back to defaults instead of failing.

use serde_json::{Map, Value};

use crate::registry::ToolId;

/// Free-text fields longer than this are cut and suffixed with `...`
pub const BODY_PREVIEW_CHARS: usize = 100;

const ELLIPSIS: &str = "...";

/// Build the natural-language query for a tool call.
///
/// Never fails: unknown tools and tools without a dedicated template produce
/// `Execute {tool_id} with parameters: {json}`.
pub fn synthesize_query(tool_id: &str, params: &Map<String, Value>) -> String {
    match ToolId::parse(tool_id) {
        Some(tool) => ToolParams::from_map(tool, params).to_query(),
        None => fallback_query(tool_id, params),
    }
}

fn fallback_query(tool_id: &str, params: &Map<String, Value>) -> String {
    // Map<String, Value> always serializes; nested values are written as JSON text
    let json = Value::Object(params.clone()).to_string();
    format!("Execute {} with parameters: {}", tool_id, json)
}

/// Truncate free text to `BODY_PREVIEW_CHARS` characters, marking the cut
pub fn preview(text: &str) -> String {
    if text.chars().count() > BODY_PREVIEW_CHARS {
        let head: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{}{}", head, ELLIPSIS)
    } else {
        text.to_string()
    }
}

// ============================================================================
// Typed parameter records
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCreate {
    pub summary: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    pub attendees: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarList {
    pub time_min: String,
    pub time_max: String,
    pub max_results: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarUpdate {
    pub event_id: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GmailSend {
    pub to: String,
    pub subject: String,
    pub body: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GmailRead {
    pub hours: String,
    pub unread_only: bool,
    pub max_results: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GmailReply {
    pub original_from: String,
    pub original_subject: String,
    pub reply_body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveUpload {
    pub file_name: String,
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveList {
    pub folder_id: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveShare {
    pub file_id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveCreateFolder {
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRange {
    pub spreadsheet_id: String,
    pub range: String,
}

/// Parameters of a tool call, one variant per query template
#[derive(Debug, Clone, PartialEq)]
pub enum ToolParams {
    CalendarCreate(CalendarCreate),
    CalendarList(CalendarList),
    CalendarGet { event_id: String },
    CalendarUpdate(CalendarUpdate),
    CalendarDelete { event_id: String },
    GmailSend(GmailSend),
    GmailRead(GmailRead),
    GmailSearch { query: String },
    GmailReply(GmailReply),
    DriveUpload(DriveUpload),
    DriveList(DriveList),
    DriveDownload { file_id: String },
    DriveShare(DriveShare),
    DriveCreateFolder(DriveCreateFolder),
    SheetsRead(SheetRange),
    SheetsWrite(SheetRange),
    DocsRead { document_id: String },
    DocsCreate { title: String },
    /// Registered tool without a dedicated template
    Generic {
        tool: ToolId,
        params: Map<String, Value>,
    },
}

impl ToolParams {
    /// Parse the open parameter map for `tool`. Never fails.
    pub fn from_map(tool: ToolId, params: &Map<String, Value>) -> Self {
        let f = Fields(params);
        match tool {
            ToolId::GoogleCalendarCreate => ToolParams::CalendarCreate(CalendarCreate {
                summary: f.text_or("summary", "event"),
                start: non_empty(f.time("start")),
                end: non_empty(f.time("end")),
                description: f.present("description"),
                attendees: f.attendees("attendees"),
            }),
            ToolId::GoogleCalendarList => ToolParams::CalendarList(CalendarList {
                time_min: f.text_or("timeMin", "now"),
                time_max: f.text_or("timeMax", "future"),
                max_results: f.text_or("maxResults", "10"),
            }),
            ToolId::GoogleCalendarGet => ToolParams::CalendarGet {
                event_id: f.text_or("eventId", ""),
            },
            ToolId::GoogleCalendarUpdate => ToolParams::CalendarUpdate(CalendarUpdate {
                event_id: f.text_or("eventId", ""),
                summary: f.text_or("summary", ""),
            }),
            ToolId::GoogleCalendarDelete => ToolParams::CalendarDelete {
                event_id: f.text_or("eventId", ""),
            },
            ToolId::GmailSend => ToolParams::GmailSend(GmailSend {
                to: f.text_or("to", ""),
                subject: f.text_or("subject", ""),
                body: f.present("body"),
                cc: f.present("cc"),
                bcc: f.present("bcc"),
            }),
            ToolId::GmailRead => ToolParams::GmailRead(GmailRead {
                hours: f.text_or("hours", "24"),
                unread_only: f.flag("unread_only", true),
                max_results: f.text_or("maxResults", "10"),
            }),
            ToolId::GmailSearch => ToolParams::GmailSearch {
                query: f.text_or("query", ""),
            },
            ToolId::GmailReply => ToolParams::GmailReply(GmailReply {
                original_from: f.text_or("original_from_email", ""),
                original_subject: f.text_or("original_subject", ""),
                reply_body: f.text_or("reply_body", ""),
            }),
            ToolId::GoogleDriveUpload => ToolParams::DriveUpload(DriveUpload {
                file_name: f
                    .present("fileName")
                    .unwrap_or_else(|| f.text_or("name", "file")),
                folder_id: f.present("folderId"),
            }),
            ToolId::GoogleDriveList => ToolParams::DriveList(DriveList {
                folder_id: f.present("folderId"),
                query: f.present("query"),
            }),
            ToolId::GoogleDriveDownload => ToolParams::DriveDownload {
                file_id: f.text_or("fileId", ""),
            },
            ToolId::GoogleDriveShare => ToolParams::DriveShare(DriveShare {
                file_id: f.text_or("fileId", ""),
                email: f.text_or("email", ""),
            }),
            ToolId::GoogleDriveCreateFolder => ToolParams::DriveCreateFolder(DriveCreateFolder {
                name: f.text_or("name", "New Folder"),
                parent_id: f.present("parentId"),
            }),
            ToolId::GoogleSheetsRead => ToolParams::SheetsRead(f.sheet_range()),
            ToolId::GoogleSheetsWrite => ToolParams::SheetsWrite(f.sheet_range()),
            ToolId::GoogleDocsRead => ToolParams::DocsRead {
                document_id: f.text_or("documentId", ""),
            },
            ToolId::GoogleDocsCreate => ToolParams::DocsCreate {
                title: f.text_or("title", "New Document"),
            },
            ToolId::GoogleCalendarQuickAdd
            | ToolId::GoogleCalendarFreebusy
            | ToolId::GmailDraft
            | ToolId::GmailLabels
            | ToolId::GoogleDriveMove
            | ToolId::GoogleDriveDelete
            | ToolId::GoogleSheetsUpdate
            | ToolId::GoogleSheetsAppend
            | ToolId::GoogleDocsWrite => ToolParams::Generic {
                tool,
                params: params.clone(),
            },
        }
    }

    /// Render the natural-language query
    pub fn to_query(&self) -> String {
        match self {
            ToolParams::CalendarCreate(p) => {
                let mut query = format!("Create calendar event: {}", p.summary);
                if let Some(start) = &p.start {
                    query.push_str(&format!(" from {}", start));
                }
                if let Some(end) = &p.end {
                    query.push_str(&format!(" to {}", end));
                }
                if let Some(description) = &p.description {
                    query.push_str(&format!(" with description: {}", description));
                }
                if let Some(attendees) = &p.attendees {
                    query.push_str(&format!(" with attendees: {}", attendees));
                }
                query
            }
            ToolParams::CalendarList(p) => format!(
                "List calendar events from {} to {}, maximum {} results",
                p.time_min, p.time_max, p.max_results
            ),
            ToolParams::CalendarGet { event_id } => {
                format!("Get calendar event with ID: {}", event_id)
            }
            ToolParams::CalendarUpdate(p) => format!(
                "Update calendar event {} with title: {}",
                p.event_id, p.summary
            ),
            ToolParams::CalendarDelete { event_id } => {
                format!("Delete calendar event with ID: {}", event_id)
            }
            ToolParams::GmailSend(p) => {
                let mut query = format!("Send email to {} with subject '{}'", p.to, p.subject);
                if let Some(body) = &p.body {
                    query.push_str(&format!(" and body: {}", preview(body)));
                }
                if let Some(cc) = &p.cc {
                    query.push_str(&format!(", CC: {}", cc));
                }
                if let Some(bcc) = &p.bcc {
                    query.push_str(&format!(", BCC: {}", bcc));
                }
                query
            }
            ToolParams::GmailRead(p) => format!(
                "Read {} emails from the last {} hours, maximum {} results",
                if p.unread_only { "unread" } else { "recent" },
                p.hours,
                p.max_results
            ),
            ToolParams::GmailSearch { query } => format!("Search emails with query: {}", query),
            ToolParams::GmailReply(p) => format!(
                "Reply to email from {} with subject '{}' and reply: {}",
                p.original_from,
                p.original_subject,
                preview(&p.reply_body)
            ),
            ToolParams::DriveUpload(p) => match &p.folder_id {
                Some(folder) => format!(
                    "Upload file {} to Google Drive folder {}",
                    p.file_name, folder
                ),
                None => format!("Upload file {} to Google Drive", p.file_name),
            },
            ToolParams::DriveList(p) => match (&p.query, &p.folder_id) {
                (Some(query), _) => format!("List files in Google Drive matching: {}", query),
                (None, Some(folder)) => format!("List files in Google Drive folder {}", folder),
                (None, None) => "List files in Google Drive".to_string(),
            },
            ToolParams::DriveDownload { file_id } => {
                format!("Download file from Google Drive with ID: {}", file_id)
            }
            ToolParams::DriveShare(p) => {
                format!("Share Google Drive file {} with {}", p.file_id, p.email)
            }
            ToolParams::DriveCreateFolder(p) => match &p.parent_id {
                Some(parent) => format!(
                    "Create folder '{}' in Google Drive folder {}",
                    p.name, parent
                ),
                None => format!("Create folder '{}' in Google Drive", p.name),
            },
            ToolParams::SheetsRead(p) => format!(
                "Read data from Google Sheets {} range {}",
                p.spreadsheet_id, p.range
            ),
            ToolParams::SheetsWrite(p) => format!(
                "Write data to Google Sheets {} range {}",
                p.spreadsheet_id, p.range
            ),
            ToolParams::DocsRead { document_id } => {
                format!("Read Google Docs document {}", document_id)
            }
            ToolParams::DocsCreate { title } => {
                format!("Create Google Docs document with title: {}", title)
            }
            ToolParams::Generic { tool, params } => fallback_query(tool.as_str(), params),
        }
    }
}

// ============================================================================
// Lenient field access
// ============================================================================

/// Read-only view over the raw parameter map
struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    /// Field as text; `null` and missing both read as None
    fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(render(value)),
        }
    }

    fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// Field as text, only when non-empty
    fn present(&self, key: &str) -> Option<String> {
        non_empty(self.text(key))
    }

    /// Calendar time: either `{"dateTime": ...}` or a plain value
    fn time(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Object(obj)) => match obj.get("dateTime") {
                None | Some(Value::Null) => None,
                Some(value) => Some(render(value)),
            },
            Some(value) => Some(render(value)),
        }
    }

    /// Attendee list joined with ", "; entries may be addresses or `{"email": ...}`
    fn attendees(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(obj) => {
                            obj.get("email").map(render).unwrap_or_else(|| render(item))
                        }
                        other => render(other),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Some(Value::Array(_)) => None,
            _ => self.present(key),
        }
    }

    /// Truthiness: false, 0, "", [], {} and null are false
    fn flag(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            None => default,
            Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }

    fn sheet_range(&self) -> SheetRange {
        SheetRange {
            spreadsheet_id: self.text_or("spreadsheetId", ""),
            range: self.text_or("range", ""),
        }
    }
}

/// Strings verbatim, everything else as JSON text
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
