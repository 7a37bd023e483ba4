// Run driver - feeds recorded run events to a reporter
// Plays the execution engine's part: builds the suite tree, records
// results on test cases, and calls the reporter in event order.

use std::collections::HashMap;
use std::io::BufRead;

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use crate::model::{SuiteId, SuiteTree, TestId};
use crate::report::Reporter;

use super::events::{RunEvent, SuiteSpec};

/// Drives a reporter from [`RunEvent`]s
pub struct RunDriver<R: Reporter> {
    reporter: R,
    tree: SuiteTree,
    ids: HashMap<String, TestId>,
}

impl<R: Reporter> RunDriver<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            tree: SuiteTree::new(),
            ids: HashMap::new(),
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub fn tree(&self) -> &SuiteTree {
        &self.tree
    }

    /// Look up a test declared in the `begin` event
    pub fn test_id(&self, id: &str) -> Result<TestId> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| anyhow!("unknown test id '{}'", id))
    }

    fn optional_test_id(&self, id: Option<&str>) -> Result<Option<TestId>> {
        id.map(|id| self.test_id(id)).transpose()
    }

    /// Deliver one event to the reporter
    pub fn dispatch(&mut self, event: RunEvent) -> Result<()> {
        match event {
            RunEvent::Begin { config, suite } => {
                let (tree, ids) = build_tree(&suite)?;
                self.tree = tree;
                self.ids = ids;
                self.reporter.on_begin(&config, &self.tree)?;
            }
            RunEvent::TestBegin { test } => {
                let test = self.test_id(&test)?;
                self.reporter.on_test_begin(&self.tree, test)?;
            }
            RunEvent::StdOut { chunk, test } => {
                let test = self.optional_test_id(test.as_deref())?;
                self.reporter.on_std_out(&self.tree, &chunk, test)?;
            }
            RunEvent::StdErr { chunk, test } => {
                let test = self.optional_test_id(test.as_deref())?;
                self.reporter.on_std_err(&self.tree, &chunk, test)?;
            }
            RunEvent::TestEnd { test, result } => {
                let test = self.test_id(&test)?;
                let result = result.into_result()?;
                self.tree.test_mut(test)?.results.push(result.clone());
                self.reporter.on_test_end(&self.tree, test, &result)?;
            }
            RunEvent::Error { error } => self.reporter.on_error(&error),
            RunEvent::End { result } => {
                self.reporter.on_end(&self.tree, &result)?;
            }
        }
        Ok(())
    }

    /// Read JSON-line events until the input ends; returns the number delivered
    pub fn replay<B: BufRead>(&mut self, input: B) -> Result<usize> {
        let mut delivered = 0;
        for (index, line) in input.lines().enumerate() {
            let line_number = index + 1;
            let line = line.with_context(|| format!("Failed to read event line {}", line_number))?;
            if line.trim().is_empty() {
                continue;
            }

            let event: RunEvent = serde_json::from_str(&line)
                .with_context(|| format!("Invalid event on line {}", line_number))?;
            self.dispatch(event)
                .with_context(|| format!("Failed to report event on line {}", line_number))?;
            delivered += 1;
        }
        debug!("replayed {} events", delivered);
        Ok(delivered)
    }
}

/// Build the arena tree from a declared hierarchy
pub fn build_tree(root: &SuiteSpec) -> Result<(SuiteTree, HashMap<String, TestId>)> {
    let mut tree = SuiteTree::new();
    let mut ids = HashMap::new();
    let root_id = tree.root();
    add_children(&mut tree, &mut ids, root_id, root)?;
    Ok((tree, ids))
}

fn add_children(
    tree: &mut SuiteTree,
    ids: &mut HashMap<String, TestId>,
    parent: SuiteId,
    spec: &SuiteSpec,
) -> Result<()> {
    for test in &spec.tests {
        let id = tree.add_test(parent, test.title.as_str(), test.timeout)?;
        if ids.insert(test.id.clone(), id).is_some() {
            bail!("duplicate test id '{}'", test.id);
        }
    }
    for child in &spec.suites {
        let child_id = tree.add_suite(parent, child.title.as_str())?;
        add_children(tree, ids, child_id, child)?;
    }
    Ok(())
}
