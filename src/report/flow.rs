// Flow tracker - one correlation token per test case

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::model::TestId;

/// Assigns and memoizes flow ids.
///
/// Tokens are keyed by test identity, not title: two tests with the same
/// title in different suites get different flows.
#[derive(Debug, Default)]
pub struct FlowTracker {
    flows: HashMap<TestId, String>,
}

impl FlowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flow_for(&mut self, test: TestId) -> &str {
        self.flows
            .entry(test)
            .or_insert_with(|| {
                let token = Uuid::new_v4().to_string();
                debug!("assigned flow {} to test {}", token, test);
                token
            })
            .as_str()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn reset(&mut self) {
        self.flows.clear();
    }
}
