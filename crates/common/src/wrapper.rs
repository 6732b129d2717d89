//! Uniform success/failure envelopes.
//!
//! Every handler returns an [`Envelope`]; failures that reach the transport
//! boundary are rendered as an [`ErrorEnvelope`].

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Success/failure wrapper returned by every request handler.
///
/// `succeeded == true` implies `data` is present and `messages` are
/// informational. `succeeded == false` implies `data` is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    succeeded: bool,
    data: Option<T>,
    messages: Vec<String>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data` and no messages.
    pub fn success(data: T) -> Self {
        Self {
            succeeded: true,
            data: Some(data),
            messages: Vec::new(),
        }
    }

    /// Successful envelope carrying `data` and one informational message.
    pub fn success_with(data: T, message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            data: Some(data),
            messages: vec![message.into()],
        }
    }

    /// Failed envelope. Never carries data.
    pub fn fail(messages: Vec<String>) -> Self {
        Self {
            succeeded: false,
            data: None,
            messages,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// First message, rendered as the `message` field of a success body.
    pub fn message(&self) -> Option<&str> {
        self.messages.first().map(String::as_str)
    }

    /// Transforms the payload, keeping success flag and messages.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            succeeded: self.succeeded,
            data: self.data.map(f),
            messages: self.messages,
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 4)?;
        state.serialize_field("succeeded", &self.succeeded)?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("messages", &self.messages)?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

/// Page selection for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default = "PageRequest::default_page")]
    pub page_number: usize,
    #[serde(default = "PageRequest::default_size")]
    pub page_size: usize,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number,
            page_size,
        }
        .normalized()
    }

    /// Clamps the page number to at least 1 and replaces a zero page size
    /// with the default.
    pub fn normalized(self) -> Self {
        Self {
            page_number: self.page_number.max(1),
            page_size: if self.page_size == 0 {
                Self::DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }

    /// Number of items to skip for this page. Saturates for page numbers
    /// past any addressable collection.
    pub fn offset(&self) -> usize {
        let page = self.normalized();
        (page.page_number - 1).saturating_mul(page.page_size)
    }

    fn default_page() -> usize {
        1
    }

    fn default_size() -> usize {
        Self::DEFAULT_PAGE_SIZE
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of a collection query. An empty page is still a success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedEnvelope<T> {
    pub succeeded: bool,
    pub data: Vec<T>,
    pub messages: Vec<String>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PaginatedEnvelope<T> {
    /// Slices `items` (the full filtered collection) down to the requested page.
    pub fn from_items(items: Vec<T>, page: PageRequest) -> Self {
        let page = page.normalized();
        let total_count = items.len();
        let total_pages = total_count.div_ceil(page.page_size);
        let data: Vec<T> = items
            .into_iter()
            .skip(page.offset())
            .take(page.page_size)
            .collect();

        Self {
            succeeded: true,
            data,
            messages: Vec::new(),
            current_page: page.page_number,
            page_size: page.page_size,
            total_count,
            total_pages,
            has_previous_page: page.page_number > 1,
            has_next_page: page.page_number < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedEnvelope<U> {
        PaginatedEnvelope {
            succeeded: self.succeeded,
            data: self.data.into_iter().map(f).collect(),
            messages: self.messages,
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}

/// Failure envelope written by the error-translation boundary.
///
/// Field names are the canonical property names (`StatusCode`, `RemoteIP`,
/// ...). Wire encoders derive the camelCase body from this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    pub succeeded: bool,
    pub status_code: u16,
    pub exception: String,
    pub error_id: String,
    pub support_message: String,
    pub source: Option<String>,
    #[serde(rename = "RemoteIP")]
    pub remote_ip: String,
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_data_and_message() {
        let envelope = Envelope::success_with(7, "Property Saved");
        assert!(envelope.succeeded());
        assert_eq!(envelope.data(), Some(&7));
        assert_eq!(envelope.message(), Some("Property Saved"));
    }

    #[test]
    fn failure_never_carries_data() {
        let envelope: Envelope<u32> = Envelope::fail(vec!["nope".to_string()]);
        assert!(!envelope.succeeded());
        assert!(envelope.data().is_none());
        assert_eq!(envelope.messages(), ["nope".to_string()]);
    }

    #[test]
    fn success_body_has_message_and_data() {
        let json = serde_json::to_value(Envelope::success_with("abc", "ok")).unwrap();
        assert_eq!(json["succeeded"], true);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"], "abc");

        let json = serde_json::to_value(Envelope::success(1)).unwrap();
        assert!(json["message"].is_null());
    }

    #[test]
    fn page_request_clamps_invalid_values() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, PageRequest::DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn paginated_envelope_slices_requested_page() {
        let items: Vec<u32> = (1..=25).collect();
        let page = PaginatedEnvelope::from_items(items, PageRequest::new(3, 10));

        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[test]
    fn page_past_the_end_is_empty_for_huge_page_numbers() {
        let page =
            PaginatedEnvelope::from_items(vec![1u32, 2, 3], PageRequest::new(usize::MAX, 10));

        assert!(page.succeeded);
        assert!(page.data.is_empty());
        assert_eq!(page.current_page, usize::MAX);
        assert_eq!(page.total_count, 3);
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);

        let widest = PageRequest::new(usize::MAX, usize::MAX);
        assert_eq!(widest.offset(), usize::MAX);
    }

    #[test]
    fn empty_collection_is_a_successful_page() {
        let page = PaginatedEnvelope::<u32>::from_items(vec![], PageRequest::default());
        assert!(page.succeeded);
        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
    }

    #[test]
    fn error_envelope_uses_canonical_property_names() {
        let envelope = ErrorEnvelope {
            succeeded: false,
            status_code: 404,
            exception: "Property Not Found!".to_string(),
            error_id: "id".to_string(),
            support_message: "support".to_string(),
            source: None,
            remote_ip: "127.0.0.1".to_string(),
            messages: vec![],
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["StatusCode"], 404);
        assert_eq!(json["RemoteIP"], "127.0.0.1");
    }
}
