//! §4.10: a `StateGraph`-style engine over [`TurnState`]. Nodes are pure
//! async functions of state; edges are static or conditional; compilation
//! is a one-time validation pass producing an immutable, shareable runner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use hr_rag_core::{PartialTurnState, Result, TurnState};

use crate::error::WorkflowError;

pub const END: &str = "__end__";

#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, state: &TurnState) -> Result<PartialTurnState>;
}

#[async_trait]
impl<F, Fut> Node for F
where
    F: Fn(&TurnState) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<PartialTurnState>> + Send,
{
    async fn run(&self, state: &TurnState) -> Result<PartialTurnState> {
        self(state).await
    }
}

pub type Router = Arc<dyn Fn(&TurnState) -> String + Send + Sync>;

enum Edge {
    Static(String),
    Conditional { router: Router, branches: HashMap<String, String> },
    End,
}

/// Builds a graph by registering nodes and edges, then `compile()`s it into
/// an immutable [`Workflow`] shared across turns.
pub struct WorkflowBuilder {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self { nodes: HashMap::new(), edges: HashMap::new(), entry: None }
    }

    pub fn add_node(mut self, name: impl Into<String>, node: impl Node + 'static) -> Self {
        self.nodes.insert(name.into(), Arc::new(node));
        self
    }

    pub fn set_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), Edge::Static(to.into()));
        self
    }

    pub fn add_end_edge(mut self, from: impl Into<String>) -> Self {
        self.edges.insert(from.into(), Edge::End);
        self
    }

    /// `router` inspects the current state and returns a branch label, which
    /// is resolved against `branches`.
    pub fn add_conditional_edges(
        mut self,
        from: impl Into<String>,
        router: impl Fn(&TurnState) -> String + Send + Sync + 'static,
        branches: HashMap<String, String>,
    ) -> Self {
        self.edges.insert(from.into(), Edge::Conditional { router: Arc::new(router), branches });
        self
    }

    pub fn compile(self) -> std::result::Result<Workflow, WorkflowError> {
        let entry = self.entry.clone().ok_or(WorkflowError::MissingEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(WorkflowError::UnknownNode(entry));
        }
        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(WorkflowError::UnknownNode(from.clone()));
            }
            if let Edge::Static(to) = edge {
                if to != END && !self.nodes.contains_key(to) {
                    return Err(WorkflowError::UnknownNode(to.clone()));
                }
            }
        }
        Ok(Workflow { nodes: self.nodes, edges: self.edges, entry })
    }
}

/// Immutable after build; shared (via `Arc`) across concurrent turns.
pub struct Workflow {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: String,
}

/// One completed node's name and the partial state it returned, in
/// execution order — the streaming-mode event per §4.10.
pub struct StepEvent {
    pub node: String,
    pub partial: PartialTurnState,
}

impl Workflow {
    /// Runs nodes sequentially from the entry point until an edge resolves
    /// to [`END`], merging each node's partial state before resolving the
    /// next edge.
    pub async fn run(&self, mut state: TurnState) -> Result<TurnState> {
        let mut current = self.entry.clone();
        loop {
            let node = self.nodes.get(&current).ok_or_else(|| WorkflowError::UnknownNode(current.clone()))?;
            let partial = node.run(&state).await?;
            state.merge(partial);

            current = match self.next(&current, &state)? {
                Some(next) => next,
                None => return Ok(state),
            };
        }
    }

    /// Same traversal as [`Workflow::run`], but returns every intermediate
    /// step so a caller can stream `(node_name, partial_state)` to a UI.
    pub async fn run_streaming(&self, mut state: TurnState) -> Result<(TurnState, Vec<StepEvent>)> {
        let mut events = Vec::new();
        let mut current = self.entry.clone();
        loop {
            let node = self.nodes.get(&current).ok_or_else(|| WorkflowError::UnknownNode(current.clone()))?;
            let partial = node.run(&state).await?;
            events.push(StepEvent { node: current.clone(), partial: partial.clone() });
            state.merge(partial);

            current = match self.next(&current, &state)? {
                Some(next) => next,
                None => return Ok((state, events)),
            };
        }
    }

    fn next(&self, from: &str, state: &TurnState) -> Result<Option<String>> {
        match self.edges.get(from) {
            None | Some(Edge::End) => Ok(None),
            Some(Edge::Static(to)) => {
                if to == END {
                    Ok(None)
                } else {
                    Ok(Some(to.clone()))
                }
            }
            Some(Edge::Conditional { router, branches }) => {
                let label = router(state);
                match branches.get(&label) {
                    Some(to) if to == END => Ok(None),
                    Some(to) => Ok(Some(to.clone())),
                    None => Err(WorkflowError::UnregisteredBranch(from.to_string(), label).into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn set_generation(text: &'static str) -> impl Fn(&TurnState) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PartialTurnState>> + Send>> {
        move |_state: &TurnState| {
            let text = text.to_string();
            Box::pin(async move { Ok(PartialTurnState { generation: Some(text), ..Default::default() }) })
        }
    }

    #[tokio::test]
    async fn runs_a_linear_two_node_graph() {
        let workflow = WorkflowBuilder::new()
            .add_node("a", set_generation("from-a"))
            .add_node("b", set_generation("from-b"))
            .set_entry_point("a")
            .add_edge("a", "b")
            .add_end_edge("b")
            .compile()
            .unwrap();

        let result = workflow.run(TurnState::new("hello")).await.unwrap();
        assert_eq!(result.generation.as_deref(), Some("from-b"));
    }

    #[tokio::test]
    async fn conditional_edge_routes_by_state() {
        let mut branches = HashMap::new();
        branches.insert("go_b".to_string(), "b".to_string());
        branches.insert("go_c".to_string(), "c".to_string());

        let workflow = WorkflowBuilder::new()
            .add_node("a", set_generation("from-a"))
            .add_node("b", set_generation("from-b"))
            .add_node("c", set_generation("from-c"))
            .set_entry_point("a")
            .add_conditional_edges("a", |_s| "go_c".to_string(), branches)
            .add_end_edge("b")
            .add_end_edge("c")
            .compile()
            .unwrap();

        let result = workflow.run(TurnState::new("hello")).await.unwrap();
        assert_eq!(result.generation.as_deref(), Some("from-c"));
    }

    #[tokio::test]
    async fn compile_rejects_missing_entry_point() {
        let result = WorkflowBuilder::new().add_node("a", set_generation("x")).compile();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn streaming_run_emits_one_event_per_node() {
        let workflow = WorkflowBuilder::new()
            .add_node("a", set_generation("from-a"))
            .add_node("b", set_generation("from-b"))
            .set_entry_point("a")
            .add_edge("a", "b")
            .add_end_edge("b")
            .compile()
            .unwrap();

        let (_, events) = workflow.run_streaming(TurnState::new("hello")).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].node, "a");
        assert_eq!(events[1].node, "b");
    }
}
