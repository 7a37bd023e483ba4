// Suite tree - arena-backed test hierarchy
// Parents own children by index; the child-to-parent link is a plain id lookup.

use std::fmt;

use crate::error::{ReporterError, Result};
use crate::model::TestResult;

/// Handle of a suite inside a [`SuiteTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteId(usize);

/// Handle of a test case inside a [`SuiteTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId(usize);

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named grouping node (root, project, file, describe block)
#[derive(Debug, Clone)]
pub struct Suite {
    pub title: String,
    pub parent: Option<SuiteId>,
    pub suites: Vec<SuiteId>,
    pub tests: Vec<TestId>,
}

/// One declared test. Retries append further results.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub title: String,
    pub parent: SuiteId,
    pub timeout_ms: u64,
    pub results: Vec<TestResult>,
}

/// Test hierarchy with exactly one root.
///
/// The root suite has an empty title, its children are projects, then files,
/// then any nested describe blocks.
#[derive(Debug, Clone)]
pub struct SuiteTree {
    suites: Vec<Suite>,
    tests: Vec<TestCase>,
}

impl Default for SuiteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteTree {
    pub fn new() -> Self {
        Self {
            suites: vec![Suite {
                title: String::new(),
                parent: None,
                suites: Vec::new(),
                tests: Vec::new(),
            }],
            tests: Vec::new(),
        }
    }

    pub fn root(&self) -> SuiteId {
        SuiteId(0)
    }

    /// Add a child suite, appended after its existing siblings
    pub fn add_suite(&mut self, parent: SuiteId, title: impl Into<String>) -> Result<SuiteId> {
        let id = SuiteId(self.suites.len());
        self.suite_mut(parent)?.suites.push(id);
        self.suites.push(Suite {
            title: title.into(),
            parent: Some(parent),
            suites: Vec::new(),
            tests: Vec::new(),
        });
        Ok(id)
    }

    /// Add a test case, appended after the suite's existing tests
    pub fn add_test(
        &mut self,
        parent: SuiteId,
        title: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<TestId> {
        let id = TestId(self.tests.len());
        self.suite_mut(parent)?.tests.push(id);
        self.tests.push(TestCase {
            title: title.into(),
            parent,
            timeout_ms,
            results: Vec::new(),
        });
        Ok(id)
    }

    pub fn suite(&self, id: SuiteId) -> Result<&Suite> {
        self.suites.get(id.0).ok_or(ReporterError::UnknownSuite(id))
    }

    fn suite_mut(&mut self, id: SuiteId) -> Result<&mut Suite> {
        self.suites.get_mut(id.0).ok_or(ReporterError::UnknownSuite(id))
    }

    pub fn test(&self, id: TestId) -> Result<&TestCase> {
        self.tests.get(id.0).ok_or(ReporterError::UnknownTest(id))
    }

    pub fn test_mut(&mut self, id: TestId) -> Result<&mut TestCase> {
        self.tests.get_mut(id.0).ok_or(ReporterError::UnknownTest(id))
    }

    /// Number of edges between the root and `id` (root is 0)
    pub fn depth(&self, id: SuiteId) -> Result<usize> {
        let mut depth = 0;
        let mut current = self.suite(id)?;
        while let Some(parent) = current.parent {
            depth += 1;
            current = self.suite(parent)?;
        }
        Ok(depth)
    }

    /// Ancestor of `id` (or `id` itself) sitting at `depth`.
    ///
    /// When `id` is shallower than `depth` it is returned unchanged.
    pub fn ancestor_at_depth(&self, id: SuiteId, depth: usize) -> Result<SuiteId> {
        let mut current = id;
        let mut current_depth = self.depth(id)?;
        while current_depth > depth {
            current = self.suite(current)?.parent.ok_or(ReporterError::UnknownSuite(current))?;
            current_depth -= 1;
        }
        Ok(current)
    }

    /// Titles from the root down to the test itself, root included
    pub fn title_path(&self, id: TestId) -> Result<Vec<&str>> {
        let test = self.test(id)?;
        let mut path = vec![test.title.as_str()];
        let mut next = Some(test.parent);
        while let Some(suite_id) = next {
            let suite = self.suite(suite_id)?;
            path.push(suite.title.as_str());
            next = suite.parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Display name used by the CI server to infer the hierarchy:
    /// non-empty titles joined with `": "`.
    // https://www.jetbrains.com/help/teamcity/service-messages.html#Interpreting+Test+Names
    pub fn full_title(&self, id: TestId) -> Result<String> {
        let path = self.title_path(id)?;
        Ok(path
            .into_iter()
            .filter(|title| !title.is_empty())
            .collect::<Vec<_>>()
            .join(": "))
    }

    /// Suites in pre-order (parent before children, siblings in declaration order)
    pub fn suites_preorder(&self) -> Vec<SuiteId> {
        let mut order = Vec::with_capacity(self.suites.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(suite) = self.suites.get(id.0) {
                stack.extend(suite.suites.iter().rev().copied());
            }
        }
        order
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}
