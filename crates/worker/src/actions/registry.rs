use std::collections::HashMap;
use std::sync::Arc;

use super::{
    ActionHandler, ActionKind, OpenAppHandler, OpenProjectHandler, PromptAiHandler,
    RunCommandHandler, ScreenshotHandler, WaitForCompletionHandler, WaitForFileHandler,
    WaitForMarkerHandler,
};

/// Maps each [`ActionKind`] to the handler that runs it.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handler for every action kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ActionKind::OpenApp, Arc::new(OpenAppHandler::new()));
        registry.register(ActionKind::RunCommand, Arc::new(RunCommandHandler));
        registry.register(ActionKind::Screenshot, Arc::new(ScreenshotHandler::new()));
        registry.register(ActionKind::OpenProject, Arc::new(OpenProjectHandler::new()));
        registry.register(ActionKind::PromptAi, Arc::new(PromptAiHandler::new()));
        registry.register(ActionKind::WaitForMarker, Arc::new(WaitForMarkerHandler));
        registry.register(ActionKind::WaitForFile, Arc::new(WaitForFileHandler));
        registry.register(
            ActionKind::WaitForCompletion,
            Arc::new(WaitForCompletionHandler),
        );
        registry
    }

    /// Registers `handler` for `kind`, returning the handler it replaces.
    pub fn register(
        &mut self,
        kind: ActionKind,
        handler: Arc<dyn ActionHandler>,
    ) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.insert(kind, handler)
    }

    pub fn get(&self, kind: ActionKind) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
