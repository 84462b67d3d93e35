use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use society::core::config::SocietyConfig;
use society::core::types::AgentId;
use society::intent::{ActionKind, Intent};
use society::simulation::Simulation;

fn seeded(agent_count: usize) -> Simulation {
    let mut config = SocietyConfig::default();
    config.world.seed = Some(0xBEEF);
    config.world.agent_count = agent_count;
    config.world.resource_count = agent_count / 3;
    Simulation::from_config(&config)
}

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    for agents in [15_usize, 150, 1500] {
        group.bench_function(format!("agents{agents}_60_ticks"), |b| {
            b.iter_batched(
                || seeded(agents),
                |mut sim| {
                    for _ in 0..60 {
                        sim.tick();
                    }
                    sim
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_intents(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let intents: Vec<(AgentId, Intent)> = (0..150)
        .map(|i| {
            let target = AgentId::new(format!("agent_{}", (i + 1) % 150));
            let action = match rand::Rng::gen_range(&mut rng, 0..3) {
                0 => ActionKind::Trade,
                1 => ActionKind::Attack,
                _ => ActionKind::Ally,
            };
            (
                AgentId::new(format!("agent_{i}")),
                Intent::toward(action, target, 0.5).with_thought("bench"),
            )
        })
        .collect();

    c.bench_function("apply_150_intents", |b| {
        b.iter_batched(
            || seeded(150),
            |mut sim| {
                for (agent, intent) in &intents {
                    sim.apply_intent(agent, intent);
                }
                sim
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let sim = seeded(150);
    c.bench_function("snapshot_json_150_agents", |b| {
        b.iter(|| sim.snapshot_json().map(|s| s.len()).unwrap_or(0))
    });
}

criterion_group!(benches, bench_ticks, bench_intents, bench_snapshot);
criterion_main!(benches);
