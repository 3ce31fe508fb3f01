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

//! Integration tests for evaluating copies of one expression on many threads

use paramexpr::*;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const THREADS: usize = 8;
const ITERATIONS: usize = 250;

fn assert_send<T: Send>() {}
fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_types_are_thread_safe() {
    assert_send::<CompiledExpression>();
    assert_send_sync::<FunctionRegistry>();
    assert_send_sync::<ExpressionEngine>();
    assert_send_sync::<FunctionInstance>();
}

#[test]
fn test_deep_copies_evaluate_independently() {
    let engine = ExpressionEngine::new();
    let template = engine
        .compile("worker=${__threadNum()} seq=${__counter} user=${user}")
        .unwrap();

    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let mut expr = template.duplicate(true);
            thread::spawn(move || {
                let ctx = EvaluationContext::new()
                    .with_thread_num(n)
                    .with_variable("user", format!("u{n}"));
                (1..=ITERATIONS)
                    .map(|i| {
                        let value = expr.evaluate(&ctx);
                        assert_eq!(value, format!("worker={n} seq={i} user=u{n}"));
                        value
                    })
                    .count()
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, THREADS * ITERATIONS);
    println!(
        "{} evaluations on {THREADS} threads in {:?}",
        total,
        start.elapsed()
    );
}

#[test]
fn test_shared_counter_across_copies() {
    let engine = ExpressionEngine::new();
    let template = engine.compile("${__counter(FALSE)}").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let mut expr = template.duplicate(true);
            thread::spawn(move || {
                let ctx = EvaluationContext::new();
                (0..ITERATIONS)
                    .map(|_| expr.evaluate(&ctx).parse::<usize>().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let seen: FxHashSet<usize> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(seen.len(), THREADS * ITERATIONS);
    assert!(seen.iter().all(|&v| (1..=THREADS * ITERATIONS).contains(&v)));
}

#[test]
fn test_shallow_copies_share_one_instance() {
    let engine = ExpressionEngine::new();
    let template = engine.compile("${__counter}").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let mut expr = template.duplicate(false);
            thread::spawn(move || {
                let ctx = EvaluationContext::new();
                for _ in 0..ITERATIONS {
                    expr.evaluate(&ctx);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut probe = template.duplicate(false);
    let next: usize = probe.evaluate(&EvaluationContext::new()).parse().unwrap();
    assert_eq!(next, THREADS * ITERATIONS + 1);
}

#[test]
fn test_registry_shared_between_compiling_threads() {
    let engine = Arc::new(ExpressionEngine::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut expr = engine
                    .compile(format!("${{__intSum({n},1)}}").as_str())
                    .unwrap();
                expr.evaluate(&EvaluationContext::new())
            })
        })
        .collect();

    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let expected: Vec<String> = (0..THREADS).map(|n| (n + 1).to_string()).collect();
    assert_eq!(results, expected);
}
