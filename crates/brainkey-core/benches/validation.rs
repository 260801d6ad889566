use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use brainkey_core::model::{Lesson, Question};
use brainkey_core::parser::parse_lesson_str;
use brainkey_core::session::Session;
use brainkey_core::typing::words_per_minute;

const PASSAGE: &str = "The quick brown fox jumps over the lazy dog while the cat \
                       watches from the window and the bird sings in the tree.";

fn typing_lesson() -> Lesson {
    Lesson::new(
        "Bench",
        "",
        vec![Question::typing("t1", "Type the passage", PASSAGE)],
    )
    .unwrap()
}

fn bench_wpm(c: &mut Criterion) {
    c.bench_function("words_per_minute", |b| {
        b.iter(|| words_per_minute(black_box(PASSAGE), black_box(Duration::from_secs(42))))
    });
}

fn bench_keystrokes(c: &mut Criterion) {
    let prefixes: Vec<&str> = PASSAGE
        .char_indices()
        .map(|(i, _)| &PASSAGE[..i])
        .collect();

    c.bench_function("keystroke_and_submit_full_passage", |b| {
        b.iter(|| {
            let mut session = Session::new(typing_lesson());
            let start = Instant::now();
            for (n, prefix) in prefixes.iter().enumerate() {
                let now = start + Duration::from_millis(n as u64 * 150);
                session.record_keystroke_at(prefix, now).unwrap();
                session.submit_input(prefix).unwrap();
            }
            black_box(session.submit_input(PASSAGE).unwrap())
        })
    });
}

fn bench_quiz_submit(c: &mut Criterion) {
    let lesson = Lesson::new(
        "Bench",
        "",
        vec![Question::quiz("q1", "Pick", ["alpha", "beta", "gamma", "delta"], "gamma")],
    )
    .unwrap();

    c.bench_function("quiz_wrong_then_right", |b| {
        b.iter(|| {
            let mut session = Session::new(lesson.clone());
            session.submit_input(black_box("beta")).unwrap();
            black_box(session.submit_input(black_box("gamma")).unwrap())
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let lesson = serde_json::to_string(&typing_lesson()).unwrap();
    let fenced = format!("Here you go:\n```json\n{lesson}\n```\n");

    c.bench_function("parse_fenced_lesson", |b| {
        b.iter(|| parse_lesson_str(black_box(&fenced), "bench.json".as_ref()).unwrap())
    });
}

criterion_group!(
    benches,
    bench_wpm,
    bench_keystrokes,
    bench_quiz_submit,
    bench_parse
);
criterion_main!(benches);
