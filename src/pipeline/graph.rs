//! Dependency-ordered step graph and its executor.
//!
//! A [`StepGraph`] is a set of named async steps, each declaring the steps whose
//! output it consumes. [`StepGraph::run`] dispatches a step as soon as every
//! dependency has produced output, drives independent steps concurrently on the
//! calling task, and resolves with the terminal step's output. The first step
//! failure ends the run; nothing already computed is returned.

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics;
use crate::pipeline::error::{PipelineError, PipelineResult};

/// Type-erased output of a completed step.
pub type StepValue = Arc<dyn Any + Send + Sync>;

type StepFn<C> =
    Arc<dyn Fn(StepInput<C>) -> BoxFuture<'static, PipelineResult<StepValue>> + Send + Sync>;

struct Step<C> {
    name: &'static str,
    deps: Vec<&'static str>,
    run: StepFn<C>,
}

/// What a step gets to see: the shared context plus the outputs of the steps it named.
pub struct StepInput<C> {
    ctx: Arc<C>,
    step: &'static str,
    outputs: HashMap<&'static str, StepValue>,
}

impl<C> StepInput<C> {
    /// Shared, immutable pipeline context.
    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// Name of the step being run.
    pub fn step(&self) -> &'static str {
        self.step
    }

    /// Output of a declared dependency.
    pub fn get<T: Any + Send + Sync>(&self, dependency: &'static str) -> PipelineResult<Arc<T>> {
        self.outputs
            .get(dependency)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
            .ok_or(PipelineError::MissingOutput {
                step: self.step,
                dependency,
            })
    }
}

/// A named, statically declared graph of async steps over a context `C`.
pub struct StepGraph<C> {
    name: &'static str,
    steps: Vec<Step<C>>,
    terminal: Option<&'static str>,
}

impl<C: Send + Sync + 'static> StepGraph<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            terminal: None,
        }
    }

    /// Declare a step. It runs once every step in `deps` has completed.
    pub fn step<F, Fut, T>(mut self, name: &'static str, deps: &[&'static str], f: F) -> Self
    where
        F: Fn(StepInput<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PipelineResult<T>> + Send + 'static,
        T: Any + Send + Sync,
    {
        let run: StepFn<C> = Arc::new(move |input: StepInput<C>| -> BoxFuture<'static, PipelineResult<StepValue>> {
            let fut = f(input);
            Box::pin(async move { fut.await.map(|value| Arc::new(value) as StepValue) })
        });
        self.steps.push(Step {
            name,
            deps: deps.to_vec(),
            run,
        });
        self
    }

    /// Mark the step whose output resolves the pipeline.
    pub fn terminal(mut self, name: &'static str) -> Self {
        self.terminal = Some(name);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check names are unique, dependencies exist, the graph is acyclic and the
    /// terminal step is declared.
    pub fn validate(&self) -> PipelineResult<()> {
        let invalid = |reason: String| PipelineError::InvalidGraph {
            pipeline: self.name,
            reason,
        };

        let mut names = HashSet::new();
        for step in &self.steps {
            if !names.insert(step.name) {
                return Err(invalid(format!("duplicate step `{}`", step.name)));
            }
        }

        for step in &self.steps {
            for dep in &step.deps {
                if !names.contains(dep) {
                    return Err(invalid(format!(
                        "step `{}` depends on unknown step `{}`",
                        step.name, dep
                    )));
                }
            }
        }

        match self.terminal {
            Some(terminal) if names.contains(terminal) => {}
            Some(terminal) => return Err(invalid(format!("unknown terminal step `{}`", terminal))),
            None => return Err(invalid("no terminal step".to_string())),
        }

        // Kahn: every step must eventually reach in-degree zero.
        let mut in_degree: HashMap<&'static str, usize> =
            self.steps.iter().map(|s| (s.name, s.deps.len())).collect();
        let mut ready: VecDeque<&'static str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut visited = 0;

        while let Some(done) = ready.pop_front() {
            visited += 1;
            for step in &self.steps {
                if step.deps.contains(&done) {
                    if let Some(degree) = in_degree.get_mut(step.name) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.push_back(step.name);
                        }
                    }
                }
            }
        }

        if visited != self.steps.len() {
            return Err(invalid("dependency cycle".to_string()));
        }

        Ok(())
    }

    /// Run the graph to completion over `ctx` and return the terminal output.
    pub async fn run<T: Any + Send + Sync>(&self, ctx: C) -> PipelineResult<Arc<T>> {
        let start = Instant::now();
        let result = self.execute::<T>(ctx).await;

        match &result {
            Ok(_) => tracing::debug!(
                pipeline = self.name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Pipeline completed"
            ),
            Err(e) => tracing::warn!(
                pipeline = self.name,
                step = e.step().unwrap_or("-"),
                code = e.code(),
                error = %e,
                "Pipeline failed"
            ),
        }
        metrics::record_pipeline(self.name, result.is_ok());

        result
    }

    async fn execute<T: Any + Send + Sync>(&self, ctx: C) -> PipelineResult<Arc<T>> {
        self.validate()?;
        let terminal = self.terminal.unwrap_or_default();

        let ctx = Arc::new(ctx);
        let mut outputs: HashMap<&'static str, StepValue> = HashMap::new();
        let mut started: HashSet<&'static str> = HashSet::new();
        let mut in_flight = FuturesUnordered::new();

        loop {
            for step in &self.steps {
                if started.contains(step.name)
                    || !step.deps.iter().all(|dep| outputs.contains_key(dep))
                {
                    continue;
                }

                started.insert(step.name);
                let input = StepInput {
                    ctx: Arc::clone(&ctx),
                    step: step.name,
                    outputs: step
                        .deps
                        .iter()
                        .filter_map(|dep| outputs.get(dep).map(|value| (*dep, Arc::clone(value))))
                        .collect(),
                };

                tracing::trace!(pipeline = self.name, step = step.name, "Dispatching step");
                let name = step.name;
                let fut = (step.run)(input);
                in_flight.push(async move { (name, fut.await) });
            }

            match in_flight.next().await {
                Some((name, Ok(value))) if name == terminal => {
                    return value.downcast::<T>().map_err(|_| PipelineError::MissingOutput {
                        step: terminal,
                        dependency: terminal,
                    });
                }
                Some((name, Ok(value))) => {
                    outputs.insert(name, value);
                }
                Some((_, Err(e))) => return Err(e),
                None => {
                    return Err(PipelineError::InvalidGraph {
                        pipeline: self.name,
                        reason: format!("terminal step `{}` was never reached", terminal),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RpcError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Trace {
        events: Mutex<Vec<String>>,
        format_calls: AtomicUsize,
    }

    impl Trace {
        fn log(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    type Ctx = Arc<Trace>;

    async fn validate(input: StepInput<Ctx>) -> PipelineResult<()> {
        input.context().log("validate");
        Ok(())
    }

    async fn slow_left(input: StepInput<Ctx>) -> PipelineResult<u64> {
        input.context().log("left:start");
        tokio::time::sleep(Duration::from_millis(30)).await;
        input.context().log("left:end");
        Ok(40)
    }

    async fn slow_right(input: StepInput<Ctx>) -> PipelineResult<u64> {
        input.context().log("right:start");
        tokio::time::sleep(Duration::from_millis(30)).await;
        input.context().log("right:end");
        Ok(2)
    }

    async fn sum(input: StepInput<Ctx>) -> PipelineResult<u64> {
        input.context().format_calls.fetch_add(1, Ordering::SeqCst);
        let left = input.get::<u64>("left")?;
        let right = input.get::<u64>("right")?;
        Ok(*left + *right)
    }

    async fn failing(input: StepInput<Ctx>) -> PipelineResult<u64> {
        input.context().log("failing");
        Err(PipelineError::remote("left", "FailedToFetch")(
            RpcError::UnexpectedResponse("boom".into()),
        ))
    }

    fn diamond() -> StepGraph<Ctx> {
        StepGraph::new("diamond")
            .step("validate", &[], validate)
            .step("left", &["validate"], slow_left)
            .step("right", &["validate"], slow_right)
            .step("format", &["left", "right"], sum)
            .terminal("format")
    }

    #[tokio::test]
    async fn test_runs_to_terminal() {
        let trace = Arc::new(Trace::default());
        let total = diamond().run::<u64>(Arc::clone(&trace)).await.unwrap();
        assert_eq!(*total, 42);
        assert_eq!(trace.events()[0], "validate");
        assert_eq!(trace.format_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_independent_steps_overlap() {
        let trace = Arc::new(Trace::default());
        diamond().run::<u64>(Arc::clone(&trace)).await.unwrap();

        let events = trace.events();
        let position = |e: &str| events.iter().position(|x| x == e).unwrap();
        // Both branches start before either finishes.
        assert!(position("left:start") < position("right:end"));
        assert!(position("right:start") < position("left:end"));
    }

    #[tokio::test]
    async fn test_failure_aborts_before_terminal() {
        let trace = Arc::new(Trace::default());
        let graph = StepGraph::new("abort")
            .step("validate", &[], validate)
            .step("left", &["validate"], failing)
            .step("right", &["validate"], slow_right)
            .step("format", &["left", "right"], sum)
            .terminal("format");

        let err = graph.run::<u64>(Arc::clone(&trace)).await.unwrap_err();
        assert!(matches!(err, PipelineError::RemoteCallFailed { step: "left", .. }));
        assert_eq!(trace.format_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_short_circuits() {
        async fn reject(_: StepInput<Ctx>) -> PipelineResult<()> {
            Err(PipelineError::invalid_input("ExpectedThing"))
        }

        let trace = Arc::new(Trace::default());
        let graph = StepGraph::new("short")
            .step("validate", &[], reject)
            .step("left", &["validate"], slow_left)
            .step("format", &["left"], sum)
            .terminal("format");

        let err = graph.run::<u64>(Arc::clone(&trace)).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { code: "ExpectedThing" }));
        assert!(trace.events().is_empty());
    }

    #[tokio::test]
    async fn test_step_sees_only_declared_outputs() {
        async fn peek(input: StepInput<Ctx>) -> PipelineResult<u64> {
            // `left` ran, but this step did not declare it.
            input.get::<u64>("left").map(|v| *v)
        }

        let graph = StepGraph::new("peek")
            .step("validate", &[], validate)
            .step("left", &["validate"], slow_left)
            .step("format", &["validate"], peek)
            .step("after", &["left", "format"], sum)
            .terminal("format");

        let err = graph
            .run::<u64>(Arc::new(Trace::default()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingOutput {
                step: "format",
                dependency: "left"
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_graphs() {
        let unknown = StepGraph::<Ctx>::new("unknown")
            .step("validate", &[], validate)
            .step("format", &["missing"], sum)
            .terminal("format");
        assert!(matches!(unknown.validate(), Err(PipelineError::InvalidGraph { .. })));

        let cycle = StepGraph::<Ctx>::new("cycle")
            .step("validate", &[], validate)
            .step("left", &["right"], slow_left)
            .step("right", &["left"], slow_right)
            .step("format", &["left"], sum)
            .terminal("format");
        let err = cycle.validate().unwrap_err();
        assert!(err.to_string().contains("cycle"));

        let duplicate = StepGraph::<Ctx>::new("duplicate")
            .step("validate", &[], validate)
            .step("validate", &[], validate)
            .terminal("validate");
        assert!(duplicate.validate().is_err());

        let no_terminal = StepGraph::<Ctx>::new("open").step("validate", &[], validate);
        assert!(no_terminal.validate().is_err());

        let wrong_terminal = StepGraph::<Ctx>::new("wrong")
            .step("validate", &[], validate)
            .terminal("format");
        assert!(wrong_terminal.validate().is_err());

        assert!(diamond().validate().is_ok());
    }

    #[tokio::test]
    async fn test_malformed_graph_runs_nothing() {
        let trace = Arc::new(Trace::default());
        let graph = StepGraph::new("cycle")
            .step("validate", &[], validate)
            .step("left", &["format"], slow_left)
            .step("format", &["left"], sum)
            .terminal("format");

        assert!(graph.run::<u64>(Arc::clone(&trace)).await.is_err());
        assert!(trace.events().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_type_mismatch() {
        let graph = diamond();
        let err = graph
            .run::<String>(Arc::new(Trace::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingOutput { step: "format", .. }));
    }
}
