use serde::{Deserialize, Serialize};

/// A single song request as the backend returns it.
///
/// `key` is the request's day bucket: an ISO-8601 timestamp pinned to local
/// midnight. `created_at`/`updated_at` are full ISO-8601 timestamps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct SongRequest {
    pub id: String,
    pub title: String,
    pub requester: String,
    pub done: bool,
    pub key: String,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// One page of the cursor-paginated listing.
///
/// An absent `cursor` means the server has no more data after this page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct RequestPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub data: Vec<SongRequest>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AcceptMode {
    pub accept: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateRequestBody {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateRequestBody {
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_contract_deserialize() {
        // Contract based on server routes/request-router.ts (prisma camelCase).
        let json = r#"{
            "id": "clb1",
            "title": "Song A",
            "requester": "unknown",
            "done": false,
            "key": "2024-01-02T00:00:00.000Z",
            "createdAt": "2024-01-02T10:00:00.000Z",
            "updatedAt": "2024-01-02T10:00:00.000Z"
        }"#;
        let parsed: SongRequest = serde_json::from_str(json).expect("request should parse");
        assert_eq!(parsed.id, "clb1");
        assert_eq!(parsed.created_at, "2024-01-02T10:00:00.000Z");
        assert!(!parsed.done);
    }

    #[test]
    fn test_listing_contract_deserialize_with_cursor() {
        let json = r#"{
            "cursor": "clb2",
            "data": [{
                "id": "clb2",
                "title": "Song B",
                "requester": "unknown",
                "done": true,
                "key": "2024-01-01T00:00:00.000Z",
                "createdAt": "2024-01-01T09:00:00.000Z",
                "updatedAt": "2024-01-01T09:30:00.000Z"
            }]
        }"#;
        let parsed: RequestPage = serde_json::from_str(json).expect("listing should parse");
        assert_eq!(parsed.cursor.as_deref(), Some("clb2"));
        assert_eq!(parsed.data.len(), 1);
    }

    #[test]
    fn test_listing_contract_absent_cursor_is_last_page() {
        let json = r#"{ "data": [] }"#;
        let parsed: RequestPage = serde_json::from_str(json).expect("listing should parse");
        assert!(parsed.cursor.is_none());
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn test_accept_mode_contract_deserialize() {
        let parsed: AcceptMode =
            serde_json::from_str(r#"{"accept": true}"#).expect("config should parse");
        assert!(parsed.accept);
    }

    #[test]
    fn test_create_body_omits_absent_requester() {
        let body = CreateRequestBody {
            title: "Song A".to_string(),
            requester: None,
        };
        let v = serde_json::to_value(body).expect("should serialize");
        assert_eq!(v["title"], "Song A");
        assert!(v.get("requester").is_none());
    }
}
