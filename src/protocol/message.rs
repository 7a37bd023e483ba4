// Service message encoder - renders one ##teamcity[...] line

use std::fmt;

use super::escape::escape;

/// Service message names understood by the CI server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageName {
    Message,
    TestRetrySupport,
    TestSuiteStarted,
    TestSuiteFinished,
    TestStarted,
    TestMetadata,
    TestFinished,
    TestIgnored,
    TestFailed,
    TestStdOut,
    TestStdErr,
}

impl MessageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::TestRetrySupport => "testRetrySupport",
            Self::TestSuiteStarted => "testSuiteStarted",
            Self::TestSuiteFinished => "testSuiteFinished",
            Self::TestStarted => "testStarted",
            Self::TestMetadata => "testMetadata",
            Self::TestFinished => "testFinished",
            Self::TestIgnored => "testIgnored",
            Self::TestFailed => "testFailed",
            Self::TestStdOut => "testStdOut",
            Self::TestStdErr => "testStdErr",
        }
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One service message: a name plus ordered, unescaped attributes.
///
/// Values are escaped when the message is rendered. Attributes whose value is
/// empty are dropped from the rendered line instead of being written as `key=''`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMessage {
    name: MessageName,
    parts: Vec<(&'static str, String)>,
}

impl ServiceMessage {
    pub fn new(name: MessageName) -> Self {
        Self {
            name,
            parts: Vec::new(),
        }
    }

    /// Append an attribute, keeping insertion order
    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.parts.push((key, value.into()));
        self
    }

    pub fn name(&self) -> MessageName {
        self.name
    }

    /// Raw (unescaped) value of the first attribute named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn parts(&self) -> &[(&'static str, String)] {
        &self.parts
    }
}

impl fmt::Display for ServiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "##teamcity[{}", self.name)?;
        for (key, value) in self.parts.iter().filter(|(_, v)| !v.is_empty()) {
            write!(f, " {}='{}'", key, escape(value))?;
        }
        f.write_str("]")
    }
}
