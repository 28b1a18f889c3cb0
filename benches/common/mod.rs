#![allow(dead_code)]

use clmm_incentive_accounting::{
    Address, U256,
    incentive::{
        HookData, Incentive, IncentiveConfig, PositionChange,
        accrual::{AccrualWindow, DynamicParams, points_per_share_increment},
        accumulator::{Corners, calculate_evanescent_points_per_share},
        ledger::collect_evanescent_points,
    },
    math::geometric_mean::{geometric_mean, product_root},
    state::{IncentiveData, PoolData},
    storage::{MemoryStorage, slots::get_evanescent_points_per_share_mapping_slot},
};
use alloy_primitives::address;
use criterion::{BatchSize, Criterion};
use std::hint::black_box;

const INCENTIVE: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");
const AMM: Address = address!("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512");
const FACTORY: Address = address!("0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0");

fn pool() -> PoolData {
    PoolData {
        block_number: 1_000,
        q_lower: 400,
        q_upper: 420,
        active_evanescent_points_per_share: U256::from(1_000_000u64),
    }
}

fn corners() -> Corners {
    Corners::new(
        U256::from(5_000u64),
        U256::from(7_000u64),
        U256::from(20_000u64),
        U256::from(30_000u64),
    )
}

fn params() -> DynamicParams {
    DynamicParams {
        growth: U256::from(3u8) << 60,
        integral0: U256::ONE << 110,
        integral1: U256::from(9u8) << 110,
        outgoing_max: U256::from(1_000_000u64) << 20,
        shares_total: U256::from(1_000_000_000u64),
        log_price_current: 410,
    }
}

pub fn bench_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");
    let pool = pool();
    let corners = corners();

    group.bench_function("overlapping", |b| {
        b.iter(|| {
            calculate_evanescent_points_per_share(
                black_box(&pool),
                black_box(380),
                black_box(440),
                black_box(&corners),
            )
        })
    });
    group.bench_function("above", |b| {
        b.iter(|| {
            calculate_evanescent_points_per_share(
                black_box(&pool),
                black_box(420),
                black_box(440),
                black_box(&Corners::new(
                    U256::from(9u8),
                    U256::from(4u8),
                    U256::ZERO,
                    U256::ZERO,
                )),
            )
        })
    });
    group.finish();
}

pub fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");
    let pool = pool();
    let corners = corners();
    let words = IncentiveData {
        pool_id: U256::ONE << 200,
        q_min: 380,
        q_max: 440,
        shares: 1_000_000,
        evanescent_points_per_share_subtrahend: U256::from(10u8),
        evanescent_points_owed: U256::from(77u8),
    }
    .encode()
    .unwrap();

    group.bench_function("collect_evanescent_points", |b| {
        b.iter(|| collect_evanescent_points(black_box(&words), black_box(&pool), black_box(&corners)))
    });
    group.finish();
}

pub fn bench_accrual(c: &mut Criterion) {
    let mut group = c.benchmark_group("accrual");
    let params = params();

    group.bench_function("points_per_share_increment", |b| {
        b.iter(|| points_per_share_increment(black_box(250), black_box(&params)))
    });
    group.finish();
}

fn deployed() -> (Incentive<MemoryStorage>, U256) {
    let config = IncentiveConfig {
        address: INCENTIVE,
        amm: AMM,
        factory: FACTORY,
        pay_master: FACTORY,
        reward_token: Address::repeat_byte(0x42),
        tag0: U256::from(1u8),
        tag1: U256::from(2u8),
        window: AccrualWindow::new(100, 1_000_000),
    };
    let mut incentive = Incentive::new(config.clone(), MemoryStorage::new(), 50).unwrap();
    let pool_id = (U256::from(7u8) << 160) | U256::from_be_slice(INCENTIVE.as_slice());
    incentive
        .initialize_pool(AMM, FACTORY, pool_id, config.tag0, config.tag1, 0, 10, 51)
        .unwrap();
    incentive
        .mid_mint(
            AMM,
            &PositionChange {
                pool_id,
                q_min: 0,
                q_max: 10,
                shares: 1_000,
            },
            HookData {
                token_id: U256::ZERO,
                owner: Address::repeat_byte(0x03),
            },
            52,
            &DynamicParams {
                log_price_current: 5,
                ..params()
            },
        )
        .unwrap();
    (incentive, pool_id)
}

pub fn bench_hooks(c: &mut Criterion) {
    let mut group = c.benchmark_group("hooks");
    let params = DynamicParams {
        log_price_current: 5,
        ..params()
    };

    group.bench_function("mid_donate", |b| {
        b.iter_batched(
            deployed,
            |(mut incentive, pool_id)| incentive.mid_donate(AMM, pool_id, black_box(500), &params),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("mid_swap_crossing_three_intervals", |b| {
        b.iter_batched(
            deployed,
            |(mut incentive, pool_id)| {
                incentive.mid_swap(AMM, pool_id, black_box(500), &params, black_box(35))
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_slots(c: &mut Criterion) {
    c.bench_function("tick_points_slot", |b| {
        b.iter(|| get_evanescent_points_per_share_mapping_slot(black_box(U256::ONE << 180), black_box(410)))
    });
}

pub fn bench_geometric_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometric_mean");
    let cases = [
        ("small", U256::from(4u8), U256::from(9u8)),
        ("shifted", U256::ONE << 100, U256::from(9u8) << 100),
        ("max", U256::MAX, U256::MAX),
    ];

    for (name, a, b_) in cases {
        group.bench_function(format!("product_root_{name}"), |b| {
            b.iter(|| product_root(black_box(a), black_box(b_)))
        });
        group.bench_function(format!("geometric_mean_{name}"), |b| {
            b.iter(|| geometric_mean(black_box(a), black_box(b_)))
        });
    }
    group.finish();
}
