//! Pass-through interception with invocation logging.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Local};
use log::Level;

use crate::{
    metadata::members::MethodRc,
    proxy::{InterceptionArguments, Interceptor, ProxyInstance},
    runtime::{ObjectRef, Value},
    Error, Result,
};

/// Log target of invocation records
pub const INTERCEPT_TARGET: &str = "dynproxy::intercept";

/// Diagnostic record of one forwarded invocation.
#[derive(Clone, Debug)]
pub struct InvocationRecord {
    /// Member name
    pub member: String,
    /// Full name of the declaring capability
    pub declaring: String,
    /// Arguments, in declared order
    pub arguments: Vec<(String, Value)>,
    /// When the call returned
    pub timestamp: DateTime<Local>,
    /// The value the source returned
    pub result: Value,
}

impl fmt::Display for InvocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}::{}(",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.declaring,
            self.member
        )?;
        for (index, (name, value)) in self.arguments.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ") -> {}", self.result)
    }
}

/// Receiver of [`InvocationRecord`]s
pub type RecordSink = Arc<dyn Fn(&InvocationRecord) + Send + Sync>;

/// The default interception strategy.
///
/// Forwards every invocation to the same member on the source instance and returns its result
/// unchanged. Each successful invocation emits one [`InvocationRecord`] on the
/// [`INTERCEPT_TARGET`] log target and, if configured, to a record sink. Failures of the
/// source are returned as [`Error::TargetInvocation`] with the original error as cause.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use dynproxy::proxy::{DefaultInterceptor, InterceptorFactory, InvocationRecord};
///
/// let records = Arc::new(Mutex::new(Vec::new()));
/// let sink = records.clone();
/// let factory = InterceptorFactory::from_fn("recording", move || {
///     let sink = sink.clone();
///     Box::new(DefaultInterceptor::new().with_sink(Arc::new(move |record: &InvocationRecord| {
///         sink.lock().unwrap().push(record.to_string());
///     })))
/// });
/// # let _ = factory;
/// ```
#[derive(Clone)]
pub struct DefaultInterceptor {
    level: Level,
    sink: Option<RecordSink>,
}

impl Default for DefaultInterceptor {
    fn default() -> Self {
        DefaultInterceptor {
            level: Level::Info,
            sink: None,
        }
    }
}

impl DefaultInterceptor {
    /// Creates the strategy, logging at `Info`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level invocation records are logged at
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sends every invocation record to `sink` as well
    #[must_use]
    pub fn with_sink(mut self, sink: RecordSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The configured log level
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Interceptor for DefaultInterceptor {
    fn intercept(
        &self,
        _proxy: &ProxyInstance,
        source: &ObjectRef,
        member: &MethodRc,
        arguments: InterceptionArguments,
    ) -> Result<Value> {
        let result = source
            .invoke(member, &arguments.to_values())
            .map_err(|cause| Error::TargetInvocation {
                member: member.qualified_name(),
                source: Box::new(cause),
            })?;

        let record = InvocationRecord {
            member: member.name.clone(),
            declaring: member.declaring_name.clone(),
            arguments: arguments
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            timestamp: Local::now(),
            result: result.clone(),
        };
        log::log!(target: INTERCEPT_TARGET, self.level, "{record}");
        if let Some(sink) = &self.sink {
            sink(&record);
        }

        Ok(result)
    }
}

impl fmt::Debug for DefaultInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultInterceptor")
            .field("level", &self.level)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
