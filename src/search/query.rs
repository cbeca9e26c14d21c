//! Search criteria and their rendering into Gmail search syntax.
//!
//! [`SearchCriteria`] collects filters through chained setters and renders
//! them into the `q` parameter of `users.messages.list`.
//!
//! # Rendered tokens
//!
//! | filter            | token               |
//! |-------------------|---------------------|
//! | from / to         | `from:x` / `to:x`   |
//! | absolute dates    | `older:x` `newer:x` |
//! | relative dates    | `older_than:x` `newer_than:x` |
//! | subject           | `subject:"x"`       |
//! | folder            | `in:inbox` ...      |
//! | size              | `larger:x` `smaller:x` |
//! | filename          | `filename:"x"`      |
//! | free / exact text | `x` (no key)        |
//! | attachments       | `has:attachment`    |
//!
//! Values are inserted verbatim. Nothing is escaped or validated; the
//! caller owns the correctness of the provider syntax.

use std::fmt;
use std::str::FromStr;

use crate::api::ListRequest;

/// Default page size for a listing.
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Mailbox location for the `in:` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Inbox,
    Sent,
    Trash,
    Spam,
    Anywhere,
}

impl Folder {
    pub fn as_str(self) -> &'static str {
        match self {
            Folder::Inbox => "inbox",
            Folder::Sent => "sent",
            Folder::Trash => "trash",
            Folder::Spam => "spam",
            Folder::Anywhere => "anywhere",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Folder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inbox" => Ok(Folder::Inbox),
            "sent" => Ok(Folder::Sent),
            "trash" => Ok(Folder::Trash),
            "spam" => Ok(Folder::Spam),
            "anywhere" => Ok(Folder::Anywhere),
            other => Err(format!(
                "unknown folder '{other}' (expected inbox, sent, trash, spam or anywhere)"
            )),
        }
    }
}

/// Accumulated search filters.
///
/// Empty strings count as unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    from: String,
    to: String,
    older: String,
    newer: String,
    older_than: String,
    newer_than: String,
    subject: String,
    folder: Option<Folder>,
    larger: String,
    smaller: String,
    filename: String,
    free_text: String,
    exact_text: String,
    has_attachment: bool,
    max_results: u32,
    label_id: String,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: String::new(),
            older: String::new(),
            newer: String::new(),
            older_than: String::new(),
            newer_than: String::new(),
            subject: String::new(),
            folder: None,
            larger: String::new(),
            smaller: String::new(),
            filename: String::new(),
            free_text: String::new(),
            exact_text: String::new(),
            has_attachment: false,
            max_results: DEFAULT_MAX_RESULTS,
            label_id: String::new(),
        }
    }
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender filter (`from:`).
    pub fn from(&mut self, from: impl Into<String>) -> &mut Self {
        self.from = from.into();
        self
    }

    /// Recipient filter (`to:`).
    pub fn to(&mut self, to: impl Into<String>) -> &mut Self {
        self.to = to.into();
        self
    }

    /// Absolute upper date bound (`older:`), e.g. `2024/01/31`.
    pub fn older_than_date(&mut self, date: impl Into<String>) -> &mut Self {
        self.older = date.into();
        self
    }

    /// Absolute lower date bound (`newer:`).
    pub fn newer_than_date(&mut self, date: impl Into<String>) -> &mut Self {
        self.newer = date.into();
        self
    }

    /// Relative upper bound (`older_than:`), e.g. `2d`, `1y`.
    pub fn older_than(&mut self, period: impl Into<String>) -> &mut Self {
        self.older_than = period.into();
        self
    }

    /// Relative lower bound (`newer_than:`).
    pub fn newer_than(&mut self, period: impl Into<String>) -> &mut Self {
        self.newer_than = period.into();
        self
    }

    /// Subject filter, rendered quoted.
    pub fn subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Restrict to a folder. Replaces any folder set earlier.
    pub fn in_folder(&mut self, folder: Folder) -> &mut Self {
        self.folder = Some(folder);
        self
    }

    pub fn in_inbox(&mut self) -> &mut Self {
        self.in_folder(Folder::Inbox)
    }

    pub fn in_sent(&mut self) -> &mut Self {
        self.in_folder(Folder::Sent)
    }

    pub fn in_trash(&mut self) -> &mut Self {
        self.in_folder(Folder::Trash)
    }

    pub fn in_spam(&mut self) -> &mut Self {
        self.in_folder(Folder::Spam)
    }

    pub fn in_anywhere(&mut self) -> &mut Self {
        self.in_folder(Folder::Anywhere)
    }

    /// Minimum size (`larger:`), e.g. `10M`.
    pub fn larger_than(&mut self, size: impl Into<String>) -> &mut Self {
        self.larger = size.into();
        self
    }

    /// Maximum size (`smaller:`).
    pub fn smaller_than(&mut self, size: impl Into<String>) -> &mut Self {
        self.smaller = size.into();
        self
    }

    /// Attachment filename filter, rendered quoted.
    pub fn filename(&mut self, filename: impl Into<String>) -> &mut Self {
        self.filename = filename.into();
        self
    }

    /// Free text matched anywhere in the message.
    pub fn matching(&mut self, text: impl Into<String>) -> &mut Self {
        self.free_text = text.into();
        self
    }

    /// Text inserted as-is; pass it already quoted for an exact phrase.
    pub fn matching_exact(&mut self, text: impl Into<String>) -> &mut Self {
        self.exact_text = text.into();
        self
    }

    pub fn has_attachment(&mut self, has_attachment: bool) -> &mut Self {
        self.has_attachment = has_attachment;
        self
    }

    /// Page size of the listing (not part of the query string).
    pub fn max_results(&mut self, max_results: u32) -> &mut Self {
        self.max_results = max_results;
        self
    }

    /// Label id sent as `labelIds` (not part of the query string).
    pub fn label(&mut self, label_id: impl Into<String>) -> &mut Self {
        self.label_id = label_id.into();
        self
    }

    pub fn folder(&self) -> Option<Folder> {
        self.folder
    }

    /// Current page size.
    pub fn page_size(&self) -> u32 {
        self.max_results
    }

    pub fn label_id(&self) -> Option<&str> {
        non_empty(&self.label_id)
    }

    /// Render the filters into one query string.
    ///
    /// Tokens come in a fixed order and each one keeps its trailing space,
    /// so the output is stable for a given set of filters. With no filter
    /// set the result is empty.
    pub fn render(&self) -> String {
        let mut q = String::new();

        push_token(&mut q, "from:", &self.from);
        push_token(&mut q, "to:", &self.to);
        push_token(&mut q, "older:", &self.older);
        push_token(&mut q, "newer:", &self.newer);
        push_token(&mut q, "older_than:", &self.older_than);
        push_token(&mut q, "newer_than:", &self.newer_than);
        push_quoted(&mut q, "subject:", &self.subject);
        if let Some(folder) = self.folder {
            push_token(&mut q, "in:", folder.as_str());
        }
        push_token(&mut q, "larger:", &self.larger);
        push_token(&mut q, "smaller:", &self.smaller);
        push_quoted(&mut q, "filename:", &self.filename);
        push_token(&mut q, " ", &self.free_text);
        push_token(&mut q, " ", &self.exact_text);
        if self.has_attachment {
            q.push_str("has:attachment ");
        }

        q
    }

    /// Parameters for one list call.
    pub fn to_list_request(&self) -> ListRequest {
        let rendered = self.render();
        ListRequest {
            query: (!rendered.is_empty()).then_some(rendered),
            label_id: self.label_id().map(String::from),
            max_results: self.max_results,
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn push_token(q: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    q.push_str(key);
    q.push_str(value);
    q.push(' ');
}

fn push_quoted(q: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    q.push_str(key);
    q.push('"');
    q.push_str(value);
    q.push_str("\" ");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_criteria_renders_nothing() {
        let c = SearchCriteria::new();
        assert_eq!(c.render(), "");
        let req = c.to_list_request();
        assert_eq!(req.query, None);
        assert_eq!(req.label_id, None);
        assert_eq!(req.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_single_filters() {
        assert_eq!(SearchCriteria::new().from("a@b.com").render(), "from:a@b.com ");
        assert_eq!(SearchCriteria::new().to("c@d.com").render(), "to:c@d.com ");
        assert_eq!(
            SearchCriteria::new().older_than_date("2024/01/01").render(),
            "older:2024/01/01 "
        );
        assert_eq!(
            SearchCriteria::new().newer_than_date("2023/06/01").render(),
            "newer:2023/06/01 "
        );
        assert_eq!(SearchCriteria::new().older_than("2d").render(), "older_than:2d ");
        assert_eq!(SearchCriteria::new().newer_than("1y").render(), "newer_than:1y ");
        assert_eq!(SearchCriteria::new().larger_than("5M").render(), "larger:5M ");
        assert_eq!(SearchCriteria::new().smaller_than("1M").render(), "smaller:1M ");
    }

    #[test]
    fn test_subject_and_filename_are_quoted() {
        assert_eq!(
            SearchCriteria::new().subject("weekly report").render(),
            "subject:\"weekly report\" "
        );
        assert_eq!(
            SearchCriteria::new().filename("report.pdf").render(),
            "filename:\"report.pdf\" "
        );
    }

    #[test]
    fn test_free_text_has_no_key() {
        assert_eq!(SearchCriteria::new().matching("invoice").render(), " invoice ");
        assert_eq!(
            SearchCriteria::new().matching_exact("\"due today\"").render(),
            " \"due today\" "
        );
    }

    #[test]
    fn test_has_attachment_independent_of_other_filters() {
        assert_eq!(
            SearchCriteria::new().has_attachment(true).render(),
            "has:attachment "
        );
        let q = SearchCriteria::new()
            .from("x@y.z")
            .in_spam()
            .has_attachment(true)
            .render();
        assert!(q.contains("has:attachment"));
        assert!(!SearchCriteria::new()
            .has_attachment(false)
            .render()
            .contains("has:attachment"));
    }

    #[test]
    fn test_folder_last_write_wins() {
        let mut c = SearchCriteria::new();
        c.in_inbox().in_sent();
        assert_eq!(c.render(), "in:sent ");
        assert_eq!(c.folder(), Some(Folder::Sent));
    }

    #[test]
    fn test_full_render_order() {
        let q = SearchCriteria::new()
            .has_attachment(true)
            .matching_exact("\"exact phrase\"")
            .matching("loose")
            .filename("a.pdf")
            .smaller_than("10M")
            .larger_than("1M")
            .in_anywhere()
            .subject("hi there")
            .newer_than("3d")
            .older_than("1d")
            .newer_than_date("2024/01/01")
            .older_than_date("2024/12/31")
            .to("bob@example.com")
            .from("alice@example.com")
            .render();
        assert_eq!(
            q,
            "from:alice@example.com to:bob@example.com older:2024/12/31 newer:2024/01/01 \
             older_than:1d newer_than:3d subject:\"hi there\" in:anywhere larger:1M \
             smaller:10M filename:\"a.pdf\"  loose  \"exact phrase\" has:attachment "
        );
    }

    #[test]
    fn test_one_token_per_filter() {
        let q = SearchCriteria::new()
            .from("a")
            .to("b")
            .subject("c")
            .in_trash()
            .render();
        assert_eq!(q.matches("from:").count(), 1);
        assert_eq!(q.matches("to:").count(), 1);
        assert_eq!(q.matches("subject:").count(), 1);
        assert_eq!(q.matches("in:").count(), 1);
        assert!(!q.contains("larger:"));
        assert!(!q.contains("filename:"));
        assert!(!q.contains("has:attachment"));
    }

    #[test]
    fn test_label_and_max_results_stay_out_of_query() {
        let mut c = SearchCriteria::new();
        c.label("Label_42").max_results(10);
        assert_eq!(c.render(), "");
        let req = c.to_list_request();
        assert_eq!(req.label_id.as_deref(), Some("Label_42"));
        assert_eq!(req.max_results, 10);
        assert_eq!(req.query, None);
    }

    #[test]
    fn test_setting_empty_value_clears_filter() {
        let mut c = SearchCriteria::new();
        c.from("someone").from("");
        assert_eq!(c.render(), "");
    }

    #[test]
    fn test_values_are_not_escaped() {
        assert_eq!(
            SearchCriteria::new().subject("say \"hi\"").render(),
            "subject:\"say \"hi\"\" "
        );
    }

    #[test]
    fn test_folder_from_str() {
        assert_eq!("inbox".parse::<Folder>(), Ok(Folder::Inbox));
        assert_eq!("SPAM".parse::<Folder>(), Ok(Folder::Spam));
        assert!("drafts".parse::<Folder>().is_err());
        assert_eq!(Folder::Anywhere.to_string(), "anywhere");
    }
}
