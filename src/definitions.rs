use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{ArgumentKind, Result, StorageError};

pub type SuccessCallback = Box<dyn FnOnce(&Value) + Send + 'static>;
pub type FailureCallback = Box<dyn FnOnce(&StorageError) + Send + 'static>;

/// Which page (or revision) to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageSelector {
    PageName(String),
    PageId(String),
    RevisionId(String),
}

impl PageSelector {
    /// Query parameter the wiki api filters on for this selector.
    pub fn filter_param(&self) -> &'static str {
        match self {
            PageSelector::PageName(_) => "titles",
            PageSelector::PageId(_) => "pageids",
            PageSelector::RevisionId(_) => "revids",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            PageSelector::PageName(v) | PageSelector::PageId(v) | PageSelector::RevisionId(v) => v,
        }
    }
}

impl fmt::Display for PageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.filter_param(), self.value())
    }
}

/// A single page retrieval: where to look, what to read and who to tell.
///
/// Several selector fields may be set at once, `page_name` beats `page_id` which
/// beats `revision_id`. Empty strings count as not set.
#[derive(Default)]
pub struct PageRequest {
    pub host: Option<String>,
    pub page_name: Option<String>,
    pub page_id: Option<String>,
    pub revision_id: Option<String>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

/// String value of `key`, or `None` when absent or not a string.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl PageRequest {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: Some(host.into()),
            ..Default::default()
        }
    }

    /// Build a request for exactly one selector.
    pub fn for_selector<S: Into<String>>(host: S, selector: PageSelector) -> Self {
        let request = Self::new(host);
        match selector {
            PageSelector::PageName(v) => request.page_name(v),
            PageSelector::PageId(v) => request.page_id(v),
            PageSelector::RevisionId(v) => request.revision_id(v),
        }
    }

    /// Read a descriptor such as `{"host": "...", "pageName": "..."}`.
    ///
    /// `revId` is read when `revisionId` is missing or empty. Fields that aren't strings
    /// are ignored, anything other than an object is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or(StorageError::invalid_arg(ArgumentKind::NotAnObject))?;
        let revision_id = string_field(object, "revisionId")
            .filter(|v| !v.is_empty())
            .or_else(|| string_field(object, "revId"));
        Ok(Self {
            host: string_field(object, "host"),
            page_name: string_field(object, "pageName"),
            page_id: string_field(object, "pageId"),
            revision_id,
            ..Default::default()
        })
    }

    pub fn page_name<S: Into<String>>(mut self, name: S) -> Self {
        self.page_name = Some(name.into());
        self
    }

    pub fn page_id<S: Into<String>>(mut self, id: S) -> Self {
        self.page_id = Some(id.into());
        self
    }

    pub fn revision_id<S: Into<String>>(mut self, id: S) -> Self {
        self.revision_id = Some(id.into());
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&StorageError) + Send + 'static,
    {
        self.on_failure = Some(Box::new(callback));
        self
    }

    pub fn host_str(&self) -> Result<&str> {
        non_empty(&self.host).ok_or(StorageError::invalid_arg(ArgumentKind::Host))
    }

    /// The selector that wins, by priority name > id > revision.
    pub fn selector(&self) -> Result<PageSelector> {
        if let Some(name) = non_empty(&self.page_name) {
            Ok(PageSelector::PageName(name.to_owned()))
        } else if let Some(id) = non_empty(&self.page_id) {
            Ok(PageSelector::PageId(id.to_owned()))
        } else if let Some(rev) = non_empty(&self.revision_id) {
            Ok(PageSelector::RevisionId(rev.to_owned()))
        } else {
            Err(StorageError::invalid_arg(ArgumentKind::SelectorMissing))
        }
    }

    pub(crate) fn take_callbacks(&mut self) -> Callbacks {
        Callbacks {
            on_success: self.on_success.take(),
            on_failure: self.on_failure.take(),
        }
    }
}

impl fmt::Debug for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRequest")
            .field("host", &self.host)
            .field("page_name", &self.page_name)
            .field("page_id", &self.page_id)
            .field("revision_id", &self.revision_id)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// The optional listeners of one request, fired once with its outcome.
#[derive(Default)]
pub(crate) struct Callbacks {
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl Callbacks {
    pub(crate) fn notify(self, outcome: &Result<Value>) {
        match outcome {
            Ok(value) => {
                if let Some(callback) = self.on_success {
                    callback(value);
                }
            }
            Err(error) => {
                if let Some(callback) = self.on_failure {
                    callback(error);
                }
            }
        }
    }
}
