//! Criterion benchmarks for the ICM binary codec and stream demultiplexer.
//!
//! Pointer events and small draw commands dominate real traffic, so those are
//! the hot paths measured here, alongside the largest reply records.
//!
//! Run with:
//! ```bash
//! cargo bench --package icm-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use icm_core::protocol::codec::{decode_frame, encode_frame};
use icm_core::protocol::messages::{
    button, DrawRect, DrawText, IcmMessage, MeshTransform, MeshVertex, MonitorInfo, PointerEvent,
    ToplevelWindow, WindowStateFlags,
};
use icm_core::protocol::stream::FrameDecoder;

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_pointer_event() -> IcmMessage {
    IcmMessage::PointerEvent(PointerEvent {
        window_id: 7,
        time: 123_456,
        button: button::LEFT,
        state: 1,
        x: 640,
        y: 360,
    })
}

fn make_draw_rect() -> IcmMessage {
    IcmMessage::DrawRect(DrawRect {
        window_id: 7,
        x: 10,
        y: 10,
        width: 200,
        height: 100,
        color_rgba: 0x3366_99FF,
    })
}

fn make_draw_text() -> IcmMessage {
    IcmMessage::DrawText(DrawText {
        window_id: 7,
        x: 12,
        y: 24,
        color_rgba: 0xFFFF_FFFF,
        font_size: 12,
        text: "The quick brown fox jumps over the lazy dog".to_string(),
    })
}

fn make_mesh_16x16() -> IcmMessage {
    let vertices = (0..16 * 16)
        .map(|i| {
            let (col, row) = ((i % 16) as f32, (i / 16) as f32);
            MeshVertex {
                x: col * 10.0,
                y: row * 10.0,
                u: col / 15.0,
                v: row / 15.0,
            }
        })
        .collect();
    IcmMessage::SetWindowMeshTransform(MeshTransform {
        window_id: 7,
        mesh_width: 16,
        mesh_height: 16,
        vertices,
    })
}

fn make_monitors_4() -> IcmMessage {
    IcmMessage::MonitorsData(
        (0..4)
            .map(|i| MonitorInfo {
                x: i * 1920,
                y: 0,
                width: 1920,
                height: 1080,
                physical_width: 530,
                physical_height: 300,
                refresh_rate: 60000,
                scale: 1.0,
                enabled: true,
                primary: i == 0,
                name: format!("DP-{i}"),
            })
            .collect(),
    )
}

fn make_toplevels_32() -> IcmMessage {
    IcmMessage::ToplevelWindowsData(
        (0..32)
            .map(|i| ToplevelWindow {
                window_id: i + 1,
                x: 0,
                y: 0,
                width: 800,
                height: 600,
                visible: true,
                focused: i == 0,
                state: WindowStateFlags(0),
                title: format!("window {i}"),
                app_id: "org.example.app".to_string(),
            })
            .collect(),
    )
}

fn fixtures() -> Vec<(&'static str, IcmMessage)> {
    vec![
        ("PointerEvent", make_pointer_event()),
        ("DrawRect", make_draw_rect()),
        ("DrawText", make_draw_text()),
        ("MeshTransform(16x16)", make_mesh_16x16()),
        ("MonitorsData(4)", make_monitors_4()),
        ("ToplevelWindowsData(32)", make_toplevels_32()),
    ]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// Benchmarks `encode_frame` for a representative message set.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for (name, msg) in &fixtures() {
        group.bench_with_input(BenchmarkId::new("msg", name), msg, |b, msg| {
            b.iter(|| encode_frame(black_box(msg), black_box(1)))
        });
    }
    group.finish();
}

/// Benchmarks demultiplexing plus `decode_frame` from pre-encoded bytes.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for (name, msg) in &fixtures() {
        let bytes = encode_frame(msg, 1);
        group.bench_with_input(BenchmarkId::new("msg", name), &bytes, |b, bytes| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                decoder.feed(black_box(bytes));
                let frame = decoder.next_frame().unwrap().unwrap();
                decode_frame(&frame).unwrap()
            })
        });
    }
    group.finish();
}

/// Benchmarks the demultiplexer on a burst of pointer events arriving in
/// socket-sized chunks.
fn bench_stream_burst(c: &mut Criterion) {
    let one = encode_frame(&make_pointer_event(), 0);
    let burst: Vec<u8> = one.iter().copied().cycle().take(one.len() * 1000).collect();

    let mut group = c.benchmark_group("frame_decoder");
    group.bench_function("pointer_burst_1000_in_4k_reads", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            let mut frames = 0usize;
            for chunk in burst.chunks(4096) {
                decoder.feed(black_box(chunk));
                frames += decoder.take_frames().count();
            }
            frames
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_stream_burst);
criterion_main!(benches);
