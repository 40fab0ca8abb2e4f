//! Query model edits and the policy deciding when an edit re-runs the query.
//!
//! Every operation is a pure function from the current [`Query`] to the next
//! one. [`QueryEditor`] wraps them for hosts that hold the query and want
//! change/run notifications.

use surql_protocol::{Query, QueryMode, RateFunction};
use tracing::debug;

/// A single edit to a query field other than the mode or the requery flag.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Text(String),
    TimestampField(Option<String>),
    LogMessageField(Option<String>),
    MetricValueField(Option<String>),
    GroupEnabled(bool),
    GroupByField(Option<String>),
    RateEnabled(bool),
    RateZeroFill(bool),
    RateInterval(Option<String>),
    /// Replaces the whole selection. Empty means "no function".
    RateFunctions(Vec<RateFunction>),
}

/// Result of an edit: the next query and whether it should run now.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub query: Query,
    pub requery: bool,
}

/// Whether selecting a mode runs the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeChangePolicy {
    /// Always run after a mode is selected (default)
    #[default]
    Always,
    /// Run only when the query's auto-requery flag is set
    FollowAutoRequery,
    /// Leave running to the caller
    Never,
}

impl ModeChangePolicy {
    pub fn requery_on_mode_change(&self, query: &Query) -> bool {
        match self {
            ModeChangePolicy::Always => true,
            ModeChangePolicy::FollowAutoRequery => query.auto_requery,
            ModeChangePolicy::Never => false,
        }
    }
}

/// Switch the display mode. Fields outside the new mode are kept.
pub fn set_mode(query: &Query, mode: QueryMode) -> Query {
    Query {
        mode,
        ..query.clone()
    }
}

/// Toggle auto-requery. Turning it on runs the query to catch up.
pub fn set_auto_requery(query: &Query, enabled: bool) -> EditOutcome {
    let requery = enabled && !query.auto_requery;
    EditOutcome {
        query: Query {
            auto_requery: enabled,
            ..query.clone()
        },
        requery,
    }
}

/// Apply a field edit. Requery iff auto-requery is set.
pub fn set_field(query: &Query, edit: FieldEdit) -> EditOutcome {
    let mut next = query.clone();
    match edit {
        FieldEdit::Text(text) => next.text = text,
        FieldEdit::TimestampField(field) => next.timestamp_field = field,
        FieldEdit::LogMessageField(field) => next.log_message_field = field,
        FieldEdit::MetricValueField(field) => next.metric_value_field = field,
        FieldEdit::GroupEnabled(enabled) => next.group_enabled = Some(enabled),
        FieldEdit::GroupByField(field) => next.group_by_field = field,
        FieldEdit::RateEnabled(enabled) => next.rate_enabled = Some(enabled),
        FieldEdit::RateZeroFill(enabled) => next.rate_zero_fill = Some(enabled),
        FieldEdit::RateInterval(interval) => next.rate_interval = interval,
        FieldEdit::RateFunctions(functions) => next.rate_functions = Some(dedup_ordered(functions)),
    }
    EditOutcome {
        requery: query.auto_requery,
        query: next,
    }
}

/// Whether a query may be dispatched: non-empty text and not hidden.
pub fn is_runnable(query: &Query) -> bool {
    !(query.is_hidden() || query.text.is_empty())
}

/// The request target for a query: every field, verbatim.
pub fn build_request_target(query: &Query) -> Query {
    query.clone()
}

fn dedup_ordered(functions: Vec<RateFunction>) -> Vec<RateFunction> {
    let mut seen = Vec::with_capacity(functions.len());
    for function in functions {
        if !seen.contains(&function) {
            seen.push(function);
        }
    }
    seen
}

/// Receives editor notifications.
pub trait EditorHost {
    /// The query changed; persist it.
    fn on_change(&mut self, query: &Query);
    /// Execute the current query.
    fn on_run_query(&mut self);
}

/// Stateful editor driving an [`EditorHost`].
pub struct QueryEditor<H: EditorHost> {
    query: Query,
    policy: ModeChangePolicy,
    host: H,
}

impl<H: EditorHost> QueryEditor<H> {
    pub fn new(query: Query, host: H) -> Self {
        Self {
            query,
            policy: ModeChangePolicy::default(),
            host,
        }
    }

    pub fn with_policy(mut self, policy: ModeChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_parts(self) -> (Query, H) {
        (self.query, self.host)
    }

    pub fn select_mode(&mut self, mode: QueryMode) {
        let next = set_mode(&self.query, mode);
        let requery = self.policy.requery_on_mode_change(&next);
        debug!(ref_id = next.ref_id(), %mode, requery, "query mode selected");
        self.commit(next, requery);
    }

    pub fn toggle_auto_requery(&mut self, enabled: bool) {
        let outcome = set_auto_requery(&self.query, enabled);
        self.commit(outcome.query, outcome.requery);
    }

    pub fn edit(&mut self, edit: FieldEdit) {
        let outcome = set_field(&self.query, edit);
        self.commit(outcome.query, outcome.requery);
    }

    /// Explicit run, independent of any policy.
    pub fn run(&mut self) {
        self.host.on_run_query();
    }

    fn commit(&mut self, query: Query, requery: bool) {
        self.query = query;
        self.host.on_change(&self.query);
        if requery {
            self.host.on_run_query();
        }
    }
}
