use criterion::{criterion_group, criterion_main, Criterion};
use mtgdata::io::{frame, segment, Codec};
use mtgdata::{Card, CardStats, CardWithStats, Dataset, StatLine};

fn make_joined(rows: usize) -> Vec<CardWithStats> {
    (0..rows)
        .map(|i| {
            let card = Card {
                name: format!("Card {i} // Back {i}"),
                mana_cost: "{1}{U}".into(),
                mana_value: Some((i % 8) as i32),
                types: vec!["Instant".into()],
                printing: "VOW".into(),
                rarity: "common".into(),
                text: "Draw a card.".into(),
                ..Card::default()
            };
            let stats = CardStats {
                name: format!("Card {i} /// Back {i}"),
                stats_format: "PremierDraft".into(),
                stats_colors: "U".into(),
                line: StatLine {
                    game_count: Some(i as i32),
                    win_rate: Some(0.5 + (i % 10) as f32 / 100.0),
                    ..StatLine::default()
                },
            };
            CardWithStats::new(card, &stats)
        })
        .collect()
}

fn bench_dataset(c: &mut Criterion) {
    let joined = make_joined(2048);
    let dataset = Dataset::from_records(&joined).unwrap();
    let encoded = segment::encode(&dataset, Codec::None).unwrap();

    c.bench_function("from_records", |b| {
        b.iter(|| Dataset::from_records(&joined).unwrap())
    });
    c.bench_function("segment_encode", |b| {
        b.iter(|| segment::encode(&dataset, Codec::None).unwrap())
    });
    c.bench_function("segment_decode", |b| {
        b.iter(|| segment::decode(&encoded).unwrap())
    });
    c.bench_function("to_record_batch", |b| {
        b.iter(|| frame::to_record_batch(&dataset).unwrap())
    });
}

criterion_group!(datasets, bench_dataset);
criterion_main!(datasets);
