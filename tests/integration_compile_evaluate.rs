// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end compile and evaluate behaviour with instrumented functions

use paramexpr::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

#[derive(Clone)]
struct Upper {
    calls: Arc<AtomicUsize>,
}

impl Function for Upper {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new("upper", vec![ParameterInfo::required("text", "Text")])
        });
        &SIG
    }

    fn execute(&mut self, args: &[String], _: &dyn RuntimeContext) -> InvocationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(args[0].to_uppercase())
    }
}

#[derive(Clone)]
struct Failing {
    calls: Arc<AtomicUsize>,
}

impl Function for Failing {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::nullary("fails"));
        &SIG
    }

    fn execute(&mut self, _: &[String], _: &dyn RuntimeContext) -> InvocationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InvocationError::evaluation("fails", "always fails"))
    }
}

/// Appends `name(args)` to a shared journal and returns `name`
#[derive(Clone)]
struct Recorder {
    signature: FunctionSignature,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Function for Recorder {
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    fn execute(&mut self, args: &[String], _: &dyn RuntimeContext) -> InvocationResult<String> {
        let name = self.signature.name.clone();
        self.journal
            .lock()
            .push(format!("{name}({})", args.join(",")));
        Ok(name)
    }
}

struct Fixture {
    engine: ExpressionEngine,
    upper_calls: Arc<AtomicUsize>,
    failing_calls: Arc<AtomicUsize>,
    journal: Arc<Mutex<Vec<String>>>,
}

fn fixture() -> Fixture {
    let upper_calls = Arc::new(AtomicUsize::new(0));
    let failing_calls = Arc::new(AtomicUsize::new(0));
    let journal = Arc::new(Mutex::new(Vec::new()));

    let mut registry = create_standard_registry();
    let calls = upper_calls.clone();
    registry.register_factory("upper", move || {
        Box::new(Upper {
            calls: calls.clone(),
        }) as Box<dyn Function>
    });
    let calls = failing_calls.clone();
    registry.register_factory("fails", move || {
        Box::new(Failing {
            calls: calls.clone(),
        }) as Box<dyn Function>
    });
    for (name, params) in [("inner", 0), ("outer", 1)] {
        let journal = journal.clone();
        let parameters = (0..params)
            .map(|i| ParameterInfo::required(format!("arg{i}"), "Recorded argument"))
            .collect();
        let signature = FunctionSignature::new(name, parameters);
        registry.register_factory(name, move || {
            Box::new(Recorder {
                signature: signature.clone(),
                journal: journal.clone(),
            }) as Box<dyn Function>
        });
    }

    Fixture {
        engine: ExpressionEngine::with_registry(Arc::new(registry)),
        upper_calls,
        failing_calls,
        journal,
    }
}

#[test]
fn literal_input_caches_after_first_evaluation() {
    let f = fixture();
    let mut expr = f.engine.compile("just text, (with) punctuation}").unwrap();
    assert!(expr.is_pure_literal());
    assert!(!expr.is_cached());

    let ctx = EvaluationContext::new();
    assert_eq!(expr.evaluate(&ctx), "just text, (with) punctuation}");
    assert!(expr.is_cached());
    assert_eq!(evaluate(&mut expr, &ctx), "just text, (with) punctuation}");
}

#[test]
fn empty_and_absent_input_evaluate_to_empty() {
    let f = fixture();
    let ctx = EvaluationContext::new();
    assert_eq!(f.engine.compile("").unwrap().evaluate(&ctx), "");
    assert_eq!(f.engine.compile(None).unwrap().evaluate(&ctx), "");
}

#[test]
fn nested_upper_reinvoked_each_evaluation() {
    let f = fixture();
    let mut expr = f.engine.compile("Hello, ${upper(${name})}!").unwrap();
    let ctx = EvaluationContext::new().with_variable("name", "jane");

    for round in 1..=3 {
        assert_eq!(expr.evaluate(&ctx), "Hello, JANE!");
        assert_eq!(f.upper_calls.load(Ordering::SeqCst), round);
    }
    assert!(!expr.is_cached());
}

#[test]
fn variable_changes_are_observed() {
    let f = fixture();
    let mut expr = f.engine.compile("${upper(${name})}").unwrap();
    let mut ctx = EvaluationContext::new().with_variable("name", "a");
    assert_eq!(expr.evaluate(&ctx), "A");
    ctx.set_variable("name", "b");
    assert_eq!(expr.evaluate(&ctx), "B");
    ctx.remove_variable("name");
    assert_eq!(expr.evaluate(&ctx), "");
}

#[test]
fn failing_function_is_never_cached() {
    let f = fixture();
    let mut expr = f.engine.compile("before-${fails()}-after").unwrap();
    let ctx = EvaluationContext::new();

    for round in 1..=3 {
        assert_eq!(expr.evaluate(&ctx), "before--after");
        assert_eq!(f.failing_calls.load(Ordering::SeqCst), round);
        assert!(!expr.is_cached());
    }
}

#[test]
fn inner_call_runs_before_outer() {
    let f = fixture();
    let mut expr = f.engine.compile("${outer(${inner()})}").unwrap();

    let Component::FunctionCall(call) = &expr.components()[0] else {
        panic!("expected a function call");
    };
    assert_eq!(call.key, "outer");
    assert_eq!(call.arguments.len(), 1);
    assert!(matches!(
        &call.arguments[0].components()[0],
        Component::FunctionCall(inner) if inner.key == "inner"
    ));

    assert_eq!(expr.evaluate(&EvaluationContext::new()), "outer");
    assert_eq!(*f.journal.lock(), vec!["inner()", "outer(inner)"]);
}

#[test]
fn unknown_call_form_fails_but_bare_name_is_variable() {
    let f = fixture();
    let err = f.engine.compile("x${notregistered(1)}").unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownFunction {
            name: "notregistered".to_string(),
            position: 1,
        }
    );

    let expr = f.engine.compile("${myVar}").unwrap();
    assert!(matches!(
        &expr.components()[0],
        Component::VariableReference { name, position: 0 } if name == "myVar"
    ));
}

#[test]
fn arity_checked_at_compile_time() {
    let f = fixture();
    assert!(matches!(
        f.engine.compile("${upper()}"),
        Err(CompileError::InvalidArity { min: 1, actual: 0, .. })
    ));
    assert!(matches!(
        f.engine.compile("${__Random(1)}"),
        Err(CompileError::InvalidArity { min: 2, .. })
    ));
}

#[test]
fn deep_duplicate_isolates_counter() {
    let f = fixture();
    let ctx = EvaluationContext::new();
    let mut original = f.engine.compile("${__counter}").unwrap();
    assert_eq!(original.evaluate(&ctx), "1");

    let mut copy = original.duplicate(true);
    assert!(!copy.is_cached());
    assert_eq!(copy.evaluate(&ctx), "2");
    assert_eq!(copy.evaluate(&ctx), "3");
    assert_eq!(original.evaluate(&ctx), "2");
}

#[test]
fn shallow_duplicate_shares_counter() {
    let f = fixture();
    let ctx = EvaluationContext::new();
    let mut original = f.engine.compile("${__counter}").unwrap();
    let mut copy = original.duplicate(false);

    assert_eq!(original.evaluate(&ctx), "1");
    assert_eq!(copy.evaluate(&ctx), "2");
    assert_eq!(original.evaluate(&ctx), "3");

    let (Component::FunctionCall(a), Component::FunctionCall(b)) =
        (&original.components()[0], &copy.components()[0])
    else {
        panic!("expected function calls");
    };
    assert!(a.instance.shares_state_with(&b.instance));
}

#[test]
fn each_occurrence_gets_its_own_instance() {
    let f = fixture();
    let mut expr = f.engine.compile("${__counter}-${__counter}").unwrap();
    let ctx = EvaluationContext::new();
    assert_eq!(expr.evaluate(&ctx), "1-1");
    assert_eq!(expr.evaluate(&ctx), "2-2");
}

#[test]
fn escapes_and_alias() {
    let f = fixture();
    let ctx = EvaluationContext::new().with_variable("v", "x");
    let mut expr = f.engine.compile(r"\${v} costs \$5 \\ ${v}").unwrap();
    assert_eq!(expr.evaluate(&ctx), r"${v} costs \$5 \\ x");

    let expr = f.engine.compile("${_StringFromFile(/tmp/none)}").unwrap();
    let Component::FunctionCall(call) = &expr.components()[0] else {
        panic!("expected a function call");
    };
    assert_eq!(call.key, "_StringFromFile");
    assert_eq!(call.instance.reference_key(), "__StringFromFile");
}
