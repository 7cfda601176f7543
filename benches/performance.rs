// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use laminate_planner::config::PlannerConfig;
use laminate_planner::geometry::{Layer, Segment};
use laminate_planner::input::{Component, DeviceInput, Footprint, JointSpec, LayerTable};
use laminate_planner::io::parse_csv;
use laminate_planner::joints::{JointStyle, StyleTag};
use laminate_planner::Kernel;
use nalgebra::{Point2, Point3, Vector3};

fn outline(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
    vec![
        Point2::new(x0, y0),
        Point2::new(x1, y0),
        Point2::new(x1, y1),
        Point2::new(x0, y1),
    ]
}

/// A strip of `links` plates on five layers, hinged end to end
fn chain(links: usize) -> DeviceInput {
    let names: Vec<String> = (0..links).map(|i| format!("link{}", i)).collect();
    let rows = (0..5).flat_map(|l| names.iter().map(move |n| (l, n.clone(), l as f64)));
    let components = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let x = i as f64 * 20.0;
            let c = (0..5).fold(Component::new(name.clone()), |c, l| {
                c.with_layer(
                    l,
                    Footprint {
                        outlines: vec![outline(x, 0.0, x + 20.0, 15.0)],
                        holes: vec![],
                    },
                )
            });
            (name.clone(), c)
        })
        .collect();
    let joints = (1..links)
        .map(|i| JointSpec {
            name: format!("j{}", i),
            style: None,
            component_a: names[i - 1].clone(),
            component_b: names[i].clone(),
            anchor: Point3::new(i as f64 * 20.0, 7.5, 2.5),
            axis: Vector3::new(0.0, 1.0, 0.0),
        })
        .collect();
    DeviceInput {
        table: LayerTable::from_rows(rows).unwrap(),
        components,
        joints,
    }
}

fn bench_tables(c: &mut Criterion) {
    let mut source = String::from("layer,component,z\n");
    for l in 0..5 {
        for k in 0..200 {
            source.push_str(&format!("{},\"part {}\",{}\n", l, k, l));
        }
    }
    c.bench_function("parse_layer_table", |b| {
        b.iter(|| parse_csv(black_box(&source)).unwrap())
    });
}

fn bench_joints(c: &mut Criterion) {
    let mut group = c.benchmark_group("joints");
    let config = PlannerConfig::default();
    let segment = Segment::new(Point2::new(0.0, 0.0), Point2::new(25.0, 0.0));

    for tag in [StyleTag::Plain5, StyleTag::Stamp, StyleTag::Bend, StyleTag::Dashed] {
        let style = JointStyle::from_tag(tag, &config.joints);
        group.bench_with_input(BenchmarkId::new("generate", tag), &style, |b, style| {
            b.iter(|| style.generate(black_box(&segment)).unwrap())
        });
    }

    group.finish();
}

fn bench_boolean_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("boolean_ops");
    let a = Layer::circle(Point2::new(0.0, 0.0), 10.0, 256).to_laminate(5);
    let b = Layer::circle(Point2::new(5.0, 0.0), 10.0, 256).to_laminate(5);

    group.bench_function("laminate_union", |bench| {
        bench.iter(|| black_box(&a).union(black_box(&b)).unwrap())
    });
    group.bench_function("laminate_difference", |bench| {
        bench.iter(|| black_box(&a).difference(black_box(&b)).unwrap())
    });
    group.bench_function("cleanup", |bench| {
        bench.iter(|| black_box(&a).cleanup(0.001, 1e-4))
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for links in [2, 8] {
        group.bench_with_input(BenchmarkId::new("run", links), &links, |b, &links| {
            b.iter(|| {
                let outcome = Kernel::default().run(chain(links)).unwrap();
                black_box(outcome.plan.layers_cut)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tables, bench_joints, bench_boolean_ops, bench_pipeline);
criterion_main!(benches);
