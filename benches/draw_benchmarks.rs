use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use studydraw::engine::draw::{build_pool, draw};
use studydraw::engine::{AppState, Chapter, DrawSource, Priority, PriorityFilter, Syllabus, compute_totals};
use studydraw::store::schema::{decode_state, encode_state};

/// The bundled syllabus grown to `per_subject` chapters each, a third complete.
fn make_state(per_subject: usize) -> (Syllabus, AppState) {
    let syllabus = Syllabus::default();
    let mut state = syllabus.initial_state();
    let subjects: Vec<String> = state.subjects().map(|s| s.to_string()).collect();
    for subject in &subjects {
        let existing = state.list_chapters(subject).len();
        for i in existing..per_subject {
            let priority = Priority::ALL[i % Priority::ALL.len()];
            state = state
                .add_chapter(subject, Chapter::new(&format!("{subject} extra {i}"), priority))
                .unwrap();
        }
        let names: Vec<String> = state
            .list_chapters(subject)
            .iter()
            .step_by(3)
            .map(|c| c.name.clone())
            .collect();
        for name in names {
            state = state.mark_completed(subject, &name).unwrap();
        }
    }
    (syllabus, state)
}

fn bench_pool(c: &mut Criterion) {
    let (_, state) = make_state(200);
    let all = DrawSource::combined(PriorityFilter::All);
    let high = DrawSource::combined(PriorityFilter::Only(Priority::High));

    c.bench_function("build_pool combined (600 chapters)", |b| {
        b.iter(|| build_pool(black_box(&state), black_box(&all)))
    });
    c.bench_function("build_pool combined High (600 chapters)", |b| {
        b.iter(|| build_pool(black_box(&state), black_box(&high)))
    });
}

fn bench_draw(c: &mut Criterion) {
    let (_, state) = make_state(200);
    let source = DrawSource::combined(PriorityFilter::All);
    let mut rng = SmallRng::seed_from_u64(1);

    c.bench_function("draw combined (600 chapters)", |b| {
        b.iter(|| draw(black_box(&state), black_box(&source), &mut rng))
    });
    c.bench_function("compute_totals (600 chapters)", |b| {
        b.iter(|| compute_totals(black_box(&state)))
    });
}

fn bench_persistence(c: &mut Criterion) {
    let (syllabus, state) = make_state(200);
    let json = encode_state(&state).unwrap();

    c.bench_function("encode_state (600 chapters)", |b| {
        b.iter(|| encode_state(black_box(&state)))
    });
    c.bench_function("decode_state (600 chapters)", |b| {
        b.iter(|| decode_state(black_box(&json), &syllabus))
    });
}

criterion_group!(benches, bench_pool, bench_draw, bench_persistence);
criterion_main!(benches);
