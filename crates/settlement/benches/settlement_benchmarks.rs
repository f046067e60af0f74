use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use racha_core::{Aggregate, EventId, ExpenseId, Money, ParticipantId, UserId};
use racha_settlement::{
    compute_balances, plan_settlement, split_evenly, AddParticipant, CloseLedger, EventKind,
    EventLedger, EventRecord, ExpenseDraft, LedgerCommand, RecordExpense,
};

/// Ledger with `people` participants and `expenses` expenses, each paid by a rotating
/// payer and split across everyone.
fn seeded_ledger(people: usize, expenses: usize) -> (EventLedger, UserId, Vec<ParticipantId>) {
    let organizer = UserId::new();
    let mut ledger = EventLedger::new(EventRecord {
        id: EventId::new(),
        organizer_id: organizer,
        kind: EventKind::PostPaid,
        name: "Bench".to_string(),
    });

    let run = |ledger: &mut EventLedger, cmd: LedgerCommand| {
        for e in ledger.handle(&cmd).unwrap() {
            ledger.apply(&e);
        }
    };

    let ids: Vec<ParticipantId> = (0..people).map(|_| ParticipantId::new()).collect();
    for (i, id) in ids.iter().enumerate() {
        run(
            &mut ledger,
            LedgerCommand::AddParticipant(AddParticipant {
                actor: organizer,
                participant_id: *id,
                name: Some(format!("p{i}")),
                linked_user_id: None,
                linked_profile: None,
                payment_address: Some(format!("p{i}@pix")),
                occurred_at: Utc::now(),
            }),
        );
    }

    for i in 0..expenses {
        run(
            &mut ledger,
            LedgerCommand::RecordExpense(RecordExpense {
                actor: organizer,
                expense_id: ExpenseId::new(),
                draft: ExpenseDraft {
                    description: format!("expense {i}"),
                    total: Money::from_cents(1_000 + (i as i64 * 37) % 9_000),
                    payer: ids[i % (people / 2).max(1)],
                    participants: ids.clone(),
                },
                idempotency_key: None,
                occurred_at: Utc::now(),
            }),
        );
    }

    (ledger, organizer, ids)
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_evenly");

    for n in [3usize, 12, 50, 500].iter() {
        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::new("recipients", n), n, |b, &n| {
            b.iter(|| black_box(split_evenly(black_box(Money::from_cents(1_000_001)), n)));
        });
    }

    group.finish();
}

fn bench_balances(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_balances");

    for expenses in [10usize, 100, 1_000].iter() {
        let (ledger, _, _) = seeded_ledger(20, *expenses);
        group.throughput(Throughput::Elements(*expenses as u64));
        group.bench_with_input(BenchmarkId::new("expenses", expenses), expenses, |b, _| {
            b.iter(|| {
                black_box(compute_balances(
                    ledger.participants().all(),
                    ledger.expenses().all(),
                ))
            });
        });
    }

    group.finish();
}

fn bench_settlement_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("settlement_plan");

    for people in [4usize, 20, 100].iter() {
        let (mut ledger, organizer, ids) = seeded_ledger(*people, 200);
        let close = LedgerCommand::Close(CloseLedger {
            actor: organizer,
            occurred_at: Utc::now(),
        });
        for e in ledger.handle(&close).unwrap() {
            ledger.apply(&e);
        }

        let balances = compute_balances(ledger.participants().all(), ledger.expenses().all());
        let debtor = ids[ids.len() - 1];

        group.bench_with_input(BenchmarkId::new("participants", people), people, |b, _| {
            b.iter(|| {
                black_box(
                    plan_settlement(&balances, ledger.participants().all(), ledger.payments(), debtor)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split, bench_balances, bench_settlement_plan);
criterion_main!(benches);
