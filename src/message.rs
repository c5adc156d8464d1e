//! HTTP message model.
//!
//! [`HttpMessage`] is the object the codec fills during header parsing and
//! reads during header generation: mutable request-line or status-line
//! fields plus an ordered, case-insensitive header multimap.

/// Ordered multimap of header fields.
///
/// Names compare case-insensitively but are stored as given; insertion order
/// is preserved because it is visible on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping any existing fields of the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for a name, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for a name, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Replace every field of a name with a single value.
    ///
    /// The replacement takes the position of the first removed field, or
    /// appends if the name was absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let first = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name));
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        match first {
            Some(idx) => self.entries.insert(idx, (name, value.into())),
            None => self.entries.push((name, value.into())),
        }
    }

    /// Remove every field of a name; returns whether any was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before != self.entries.len()
    }

    /// Join every value of a name with a separator. Empty if absent.
    pub fn combine(&self, name: &str, separator: &str) -> String {
        self.get_all(name).join(separator)
    }

    /// Iterate over all fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One HTTP request or response, independent of protocol version.
///
/// A message with a method is a request; a message with a status code is a
/// response. The codec asserts the distinction where it matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpMessage {
    method: Option<String>,
    url: Option<String>,
    secure: bool,
    status: Option<u16>,
    headers: Headers,
}

impl HttpMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request skeleton.
    pub fn request(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Build a response skeleton.
    pub fn response(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_request(&self) -> bool {
        self.method.is_some()
    }

    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = Some(method.into());
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}
