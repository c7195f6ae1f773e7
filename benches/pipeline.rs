use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use survey_segments::{
    aggregate::{TargetVariable, build_comparison_rows},
    data::Dataset,
    filter::{build_active_filters, filter_rows},
    segment::{SeededAssigner, assign_segments},
    settings::{ConversionSetting, SettingLayers},
    variable::VariableKind,
};

fn generate_panel(rows: usize) -> Dataset {
    let headers = vec![
        "age".to_string(),
        "gender".to_string(),
        "region".to_string(),
        "satisfaction".to_string(),
    ];
    let regions = ["east", "west", "north", "south"];
    let data = (0..rows)
        .map(|i| {
            let age = if i % 37 == 0 {
                "NA".to_string()
            } else {
                (16 + i % 60).to_string()
            };
            let gender = if i % 2 == 0 { "female" } else { "male" };
            vec![
                age,
                gender.to_string(),
                regions[i % regions.len()].to_string(),
                (1 + i % 10).to_string(),
            ]
        })
        .collect();
    Dataset::new(headers, data).expect("panel dataset")
}

fn bench_filter_assign_aggregate(c: &mut Criterion) {
    let dataset = generate_panel(5_000);
    let layers = SettingLayers::new()
        .with_configured("age", ConversionSetting::numerical(20, 60))
        .with_configured(
            "region",
            ConversionSetting::categorical(["east", "west", "north"]),
        );
    let active = vec!["age".to_string(), "region".to_string()];
    let targets = vec![
        TargetVariable {
            id: "age".to_string(),
            name: "age".to_string(),
            kind: VariableKind::Numeric,
        },
        TargetVariable {
            id: "gender".to_string(),
            name: "gender".to_string(),
            kind: VariableKind::Categorical,
        },
        TargetVariable {
            id: "satisfaction".to_string(),
            name: "satisfaction".to_string(),
            kind: VariableKind::Numeric,
        },
    ];

    c.bench_function("filter_assign_aggregate_5k", |b| {
        b.iter_batched(
            || SeededAssigner::new(42),
            |mut assigner| {
                let filters = build_active_filters(&dataset, &layers, &active);
                let rows = filter_rows(&dataset, &filters);
                let assignment =
                    assign_segments(rows.len(), 8, &mut assigner).expect("assign");
                build_comparison_rows(&dataset, &rows, &assignment, &targets).expect("table")
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_filter_assign_aggregate);
criterion_main!(benches);
