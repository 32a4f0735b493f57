// Tool registry
//
// Design Decision: The set of tools is closed and known at compile time, so tool
// identifiers are an enum rather than strings. Unknown identifiers are a caller
// error surfaced by `ToolId::parse` returning None.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Downstream flow (crew) that handles a family of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowName {
    EventManagementFlow,
    EmailManagementFlow,
    DriveManagementFlow,
    SheetsManagementFlow,
    DocsManagementFlow,
}

impl FlowName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowName::EventManagementFlow => "EVENT_MANAGEMENT_FLOW",
            FlowName::EmailManagementFlow => "EMAIL_MANAGEMENT_FLOW",
            FlowName::DriveManagementFlow => "DRIVE_MANAGEMENT_FLOW",
            FlowName::SheetsManagementFlow => "SHEETS_MANAGEMENT_FLOW",
            FlowName::DocsManagementFlow => "DOCS_MANAGEMENT_FLOW",
        }
    }
}

impl fmt::Display for FlowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! tool_ids {
    ($($variant:ident => $id:literal, $flow:ident;)+) => {
        /// Identifier of a supported Google Workspace tool
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ToolId {
            $($variant,)+
        }

        impl ToolId {
            /// All registered tools, in registry order
            pub const ALL: &'static [ToolId] = &[$(ToolId::$variant,)+];

            /// Wire identifier (e.g. "gmail_send")
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ToolId::$variant => $id,)+
                }
            }

            /// Flow that executes this tool
            pub fn flow(&self) -> FlowName {
                match self {
                    $(ToolId::$variant => FlowName::$flow,)+
                }
            }

            /// Look up a wire identifier. Returns None for unknown tools.
            pub fn parse(id: &str) -> Option<ToolId> {
                match id {
                    $($id => Some(ToolId::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

tool_ids! {
    // Google Calendar
    GoogleCalendarCreate => "google_calendar_create", EventManagementFlow;
    GoogleCalendarList => "google_calendar_list", EventManagementFlow;
    GoogleCalendarGet => "google_calendar_get", EventManagementFlow;
    GoogleCalendarUpdate => "google_calendar_update", EventManagementFlow;
    GoogleCalendarDelete => "google_calendar_delete", EventManagementFlow;
    GoogleCalendarQuickAdd => "google_calendar_quick_add", EventManagementFlow;
    GoogleCalendarFreebusy => "google_calendar_freebusy", EventManagementFlow;

    // Gmail
    GmailSend => "gmail_send", EmailManagementFlow;
    GmailRead => "gmail_read", EmailManagementFlow;
    GmailSearch => "gmail_search", EmailManagementFlow;
    GmailDraft => "gmail_draft", EmailManagementFlow;
    GmailLabels => "gmail_labels", EmailManagementFlow;
    GmailReply => "gmail_reply", EmailManagementFlow;

    // Google Drive
    GoogleDriveUpload => "google_drive_upload", DriveManagementFlow;
    GoogleDriveDownload => "google_drive_download", DriveManagementFlow;
    GoogleDriveList => "google_drive_list", DriveManagementFlow;
    GoogleDriveShare => "google_drive_share", DriveManagementFlow;
    GoogleDriveCreateFolder => "google_drive_create_folder", DriveManagementFlow;
    GoogleDriveMove => "google_drive_move", DriveManagementFlow;
    GoogleDriveDelete => "google_drive_delete", DriveManagementFlow;

    // Google Sheets
    GoogleSheetsRead => "google_sheets_read", SheetsManagementFlow;
    GoogleSheetsWrite => "google_sheets_write", SheetsManagementFlow;
    GoogleSheetsUpdate => "google_sheets_update", SheetsManagementFlow;
    GoogleSheetsAppend => "google_sheets_append", SheetsManagementFlow;

    // Google Docs
    GoogleDocsRead => "google_docs_read", DocsManagementFlow;
    GoogleDocsWrite => "google_docs_write", DocsManagementFlow;
    GoogleDocsCreate => "google_docs_create", DocsManagementFlow;
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool identifiers in registry order
pub fn tool_names() -> Vec<&'static str> {
    ToolId::ALL.iter().map(ToolId::as_str).collect()
}

/// Tool identifier to flow name mapping
pub fn mappings() -> BTreeMap<&'static str, &'static str> {
    ToolId::ALL
        .iter()
        .map(|tool| (tool.as_str(), tool.flow().as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_size() {
        assert_eq!(ToolId::ALL.len(), 27);
        assert_eq!(tool_names().len(), 27);
        assert_eq!(mappings().len(), 27);
    }

    #[test]
    fn test_tool_names_are_unique() {
        let names = tool_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_parse_roundtrips_every_tool() {
        for tool in ToolId::ALL {
            assert_eq!(ToolId::parse(tool.as_str()), Some(*tool));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(ToolId::parse("not_a_real_tool"), None);
        assert_eq!(ToolId::parse(""), None);
        assert_eq!(ToolId::parse("GMAIL_SEND"), None);
    }

    #[test]
    fn test_flow_families() {
        assert_eq!(
            ToolId::GoogleCalendarFreebusy.flow(),
            FlowName::EventManagementFlow
        );
        assert_eq!(ToolId::GmailReply.flow(), FlowName::EmailManagementFlow);
        assert_eq!(ToolId::GoogleDriveMove.flow(), FlowName::DriveManagementFlow);
        assert_eq!(
            ToolId::GoogleSheetsAppend.flow(),
            FlowName::SheetsManagementFlow
        );
        assert_eq!(ToolId::GoogleDocsWrite.flow(), FlowName::DocsManagementFlow);
    }

    #[test]
    fn test_mappings_match_flow() {
        let map = mappings();
        assert_eq!(map["gmail_send"], "EMAIL_MANAGEMENT_FLOW");
        assert_eq!(map["google_docs_create"], "DOCS_MANAGEMENT_FLOW");
    }

    #[test]
    fn test_flow_name_serializes_screaming_snake() {
        let json = serde_json::to_string(&FlowName::SheetsManagementFlow).unwrap();
        assert_eq!(json, "\"SHEETS_MANAGEMENT_FLOW\"");
    }
}
