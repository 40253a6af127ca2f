// OperationManager - bounded undo/redo history of graph mutations

use crate::blocks::graph::BlockGraph;
use crate::command::trait_def::{CommandError, CommandResult, Operation};
use std::collections::VecDeque;

/// Default maximum number of operations to keep in history
pub const DEFAULT_MAX_OPERATIONS: usize = 100;

/// Manages undo/redo of recorded operations
///
/// The manager maintains two stacks:
/// - Done stack: operations that have been applied and can be undone
/// - Undone stack: operations that have been undone and can be redone
///
/// Recording a new operation clears the undone stack (new timeline) and, when
/// the done stack is full, evicts its oldest entry.
pub struct OperationManager {
    /// Most recent at the back
    done: VecDeque<Box<dyn Operation>>,

    /// Most recent at the back
    undone: VecDeque<Box<dyn Operation>>,

    max_operations: usize,
}

impl OperationManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_OPERATIONS)
    }

    /// Create a manager with a custom history limit (at least 1)
    pub fn with_capacity(max_operations: usize) -> Self {
        let max_operations = max_operations.max(1);
        Self {
            done: VecDeque::with_capacity(max_operations),
            undone: VecDeque::with_capacity(max_operations),
            max_operations,
        }
    }

    /// Push an applied operation onto the history
    pub fn record(&mut self, operation: Box<dyn Operation>) {
        self.done.push_back(operation);
        self.undone.clear();

        while self.done.len() > self.max_operations {
            if let Some(evicted) = self.done.pop_front() {
                log::info!(
                    "History full ({}), dropping oldest: {}",
                    self.max_operations,
                    evicted.description()
                );
            }
        }
    }

    /// Undo the last operation and move it to the undone stack
    ///
    /// An operation whose undo fails stays on the done stack.
    pub fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<String> {
        let mut operation = self.done.pop_back().ok_or(CommandError::NothingToUndo)?;
        let description = operation.description();

        if let Err(e) = operation.undo(graph) {
            self.done.push_back(operation);
            return Err(e);
        }

        self.undone.push_back(operation);
        log::debug!("Undo: {}", description);
        Ok(description)
    }

    /// Re-apply the last undone operation and move it back to the done stack
    pub fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<String> {
        let mut operation = self.undone.pop_back().ok_or(CommandError::NothingToRedo)?;
        let description = operation.description();

        if let Err(e) = operation.redo(graph) {
            self.undone.push_back(operation);
            return Err(e);
        }

        self.done.push_back(operation);
        log::debug!("Redo: {}", description);
        Ok(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.done.back().map(|op| op.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.undone.back().map(|op| op.description())
    }

    /// Descriptions of the done stack, oldest first
    pub fn history(&self) -> Vec<String> {
        self.done.iter().map(|op| op.description()).collect()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.done.len()
    }

    pub fn redo_count(&self) -> usize {
        self.undone.len()
    }

    pub fn max_operations(&self) -> usize {
        self.max_operations
    }

    /// Change the limit, evicting the oldest entries if over it
    pub fn set_max_operations(&mut self, max_operations: usize) {
        self.max_operations = max_operations.max(1);
        while self.done.len() > self.max_operations {
            self.done.pop_front();
        }
    }
}

impl Default for OperationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OperationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationManager")
            .field("done", &self.history())
            .field("undone", &self.undone.len())
            .field("max_operations", &self.max_operations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // Mock operation logging what it did to a shared trace
    struct MockOperation {
        value: i32,
        trace: Arc<Mutex<Vec<String>>>,
        fail_undo: bool,
    }

    impl MockOperation {
        fn boxed(value: i32, trace: &Arc<Mutex<Vec<String>>>) -> Box<dyn Operation> {
            Box::new(Self {
                value,
                trace: Arc::clone(trace),
                fail_undo: false,
            })
        }
    }

    impl Operation for MockOperation {
        fn undo(&mut self, _graph: &mut BlockGraph) -> CommandResult<()> {
            if self.fail_undo {
                return Err(CommandError::InvalidArguments("broken".into()));
            }
            self.trace.lock().unwrap().push(format!("undo {}", self.value));
            Ok(())
        }

        fn redo(&mut self, _graph: &mut BlockGraph) -> CommandResult<()> {
            self.trace.lock().unwrap().push(format!("redo {}", self.value));
            Ok(())
        }

        fn description(&self) -> String {
            format!("Set value to {}", self.value)
        }
    }

    fn trace() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_record() {
        let trace = trace();
        let mut manager = OperationManager::new();

        manager.record(MockOperation::boxed(42, &trace));

        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
        assert!(manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_undo_redo() {
        let trace = trace();
        let mut manager = OperationManager::new();
        let mut graph = BlockGraph::new();

        manager.record(MockOperation::boxed(42, &trace));

        assert_eq!(manager.undo(&mut graph).unwrap(), "Set value to 42");
        assert_eq!(manager.redo_description().as_deref(), Some("Set value to 42"));
        assert_eq!(manager.redo(&mut graph).unwrap(), "Set value to 42");
        assert_eq!(*trace.lock().unwrap(), vec!["undo 42", "redo 42"]);
        assert_eq!(manager.undo_count(), 1);
    }

    #[test]
    fn test_redo_stack_cleared_on_record() {
        let trace = trace();
        let mut manager = OperationManager::new();
        let mut graph = BlockGraph::new();

        manager.record(MockOperation::boxed(1, &trace));
        manager.undo(&mut graph).unwrap();
        manager.record(MockOperation::boxed(2, &trace));

        assert!(!manager.can_redo());
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let trace = trace();
        let mut manager = OperationManager::with_capacity(3);

        for i in 0..5 {
            manager.record(MockOperation::boxed(i, &trace));
        }

        assert_eq!(
            manager.history(),
            vec!["Set value to 2", "Set value to 3", "Set value to 4"]
        );
    }

    #[test]
    fn test_empty_stacks() {
        let mut manager = OperationManager::new();
        let mut graph = BlockGraph::new();

        assert!(matches!(
            manager.undo(&mut graph),
            Err(CommandError::NothingToUndo)
        ));
        assert!(matches!(
            manager.redo(&mut graph),
            Err(CommandError::NothingToRedo)
        ));
    }

    #[test]
    fn test_failed_undo_keeps_operation() {
        let trace = trace();
        let mut manager = OperationManager::new();
        let mut graph = BlockGraph::new();

        manager.record(Box::new(MockOperation {
            value: 1,
            trace: Arc::clone(&trace),
            fail_undo: true,
        }));

        assert!(manager.undo(&mut graph).is_err());
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_shrinking_limit() {
        let trace = trace();
        let mut manager = OperationManager::with_capacity(5);
        for i in 0..5 {
            manager.record(MockOperation::boxed(i, &trace));
        }

        manager.set_max_operations(2);
        assert_eq!(manager.undo_count(), 2);
        assert_eq!(manager.undo_description().as_deref(), Some("Set value to 4"));
    }
}
