use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wfd_core::{FormatGraph, Ladder, Profile, SupportedFormat, VideoFormat};

/// Typical sink capability list: CEA/VESA resolutions at common frame rates
fn capability_list() -> Vec<SupportedFormat> {
    let resolutions = [
        (640, 480),
        (720, 480),
        (854, 480),
        (960, 540),
        (1280, 720),
        (1280, 800),
        (1366, 768),
        (1600, 900),
        (1920, 1080),
        (2560, 1440),
    ];
    let rates = [24, 25, 30, 50, 60];

    let mut list = Vec::new();
    for (w, h) in resolutions {
        for fps in rates {
            let kbps = w * h * fps / 10_000;
            list.push(SupportedFormat::new(VideoFormat::with_fps(w, h, fps), kbps));
        }
    }
    list
}

fn bench_graph_build(c: &mut Criterion) {
    let list = capability_list();

    c.bench_function("graph_build", |b| {
        b.iter(|| {
            let graph = FormatGraph::build(black_box(&list));
            black_box(graph);
        });
    });
}

fn bench_shortest_path(c: &mut Criterion) {
    let graph = FormatGraph::build(&capability_list());
    let from = VideoFormat::with_fps(640, 480, 24);
    let to = VideoFormat::with_fps(2560, 1440, 60);

    c.bench_function("shortest_path_diagonal", |b| {
        b.iter(|| {
            let path = graph.shortest_path(black_box(&from), black_box(&to));
            black_box(path);
        });
    });
}

fn bench_ladder_moves(c: &mut Criterion) {
    let list = capability_list();
    let mut group = c.benchmark_group("ladder");

    group.bench_function("with_capabilities", |b| {
        b.iter(|| {
            let ladder = Ladder::with_capabilities(Profile::Default, black_box(&list));
            black_box(ladder);
        });
    });

    let ladder = Ladder::with_capabilities(Profile::Default, &list);
    group.bench_function("next_higher", |b| {
        b.iter(|| black_box(black_box(&ladder).next_higher()));
    });

    group.bench_function("index_for_percent", |b| {
        b.iter(|| black_box(ladder.index_for_percent(black_box(73))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_graph_build,
    bench_shortest_path,
    bench_ladder_moves
);
criterion_main!(benches);
