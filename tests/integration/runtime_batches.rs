//! Runtime application after a context's initial batch

use preamble::capability::{ActionCapability, RecordingCapability};
use preamble::context::Context;
use preamble::directive::ActionKind;
use preamble::error::{ActionError, VersionError};
use preamble::request::Request;
use preamble::types::{ExtraArgs, Version};
use preamble::{Bundle, Directive, DirectiveProvider, RuntimeApplier, StaticProvider};
use std::sync::{Arc, Mutex};

fn provider() -> Arc<dyn DirectiveProvider> {
    Arc::new(
        StaticProvider::new("late")
            .with_always(vec![Directive::enable("strict")])
            .with_bundle(
                Bundle::new(
                    "tail",
                    vec![
                        Directive::enable("tail-back").back(),
                        Directive::generator("count-strict", |input| {
                            let seen = input
                                .context
                                .journal()
                                .iter()
                                .filter(|e| e.target == "strict")
                                .count();
                            Ok(vec![Directive::enable("strict-count").with_args([seen.to_string()])])
                        }),
                    ],
                )
                .unwrap(),
            ),
    )
}

/// Capability that records every call, in order, outside the context.
#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl ActionCapability for CallLog {
    fn apply(
        &self,
        target: &str,
        kind: ActionKind,
        _args: &[String],
        _context: &mut Context,
    ) -> Result<(), ActionError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", kind, target));
        Ok(())
    }

    fn check_version(&self, target: &str, _min_version: &Version) -> Result<(), VersionError> {
        self.calls.lock().unwrap().push(format!("verify {}", target));
        Ok(())
    }
}

#[test]
fn test_second_batch_observes_first() {
    let applier = RuntimeApplier::new(provider());
    let capability = RecordingCapability::new();
    let mut context = Context::new("main");

    applier
        .apply_request(&Request::default(), &capability, &mut context)
        .unwrap();
    let report = applier
        .apply_bundles(&["tail".to_string()], &ExtraArgs::new(), &capability, &mut context)
        .unwrap();

    assert_eq!(report.batch, 2);
    assert_eq!(context.batches(), 2);
    let last_generated = context
        .journal()
        .iter()
        .find(|e| e.target == "strict-count")
        .unwrap();
    assert_eq!(last_generated.args, vec!["2"]);
    assert_eq!(context.journal().last().unwrap().target, "tail-back");
}

#[test]
fn test_repeated_application_resolves_identically() {
    let applier = RuntimeApplier::new(provider());
    let first_log = CallLog::default();
    let second_log = CallLog::default();
    let mut context = Context::new("main");

    applier
        .apply_bundles(&["tail".to_string()], &ExtraArgs::new(), &first_log, &mut context)
        .unwrap();
    applier
        .apply_bundles(&["tail".to_string()], &ExtraArgs::new(), &second_log, &mut context)
        .unwrap();

    let first = first_log.calls.into_inner().unwrap();
    let second = second_log.calls.into_inner().unwrap();
    assert_eq!(
        first,
        vec!["enable strict", "enable strict-count", "enable tail-back"]
    );
    assert_eq!(first, second);
}

#[test]
fn test_independent_contexts_in_parallel() {
    let applier = Arc::new(RuntimeApplier::new(provider()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let applier = Arc::clone(&applier);
            std::thread::spawn(move || {
                let mut context = Context::new(format!("ctx-{}", i));
                applier
                    .apply_bundles(
                        &["tail".to_string()],
                        &ExtraArgs::new(),
                        &RecordingCapability::new(),
                        &mut context,
                    )
                    .unwrap();
                context.journal().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}
