use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use chrono::Utc;
use racha_core::{EventId, ExpectedVersion, Money, ParticipantId, UserId};
use racha_infra::command_dispatcher::CommandDispatcher;
use racha_infra::event_store::{EventStore, InMemoryEventStore, UncommittedEvent};
use racha_infra::{
    InMemoryEventDirectory, InMemoryUserDirectory, NewParticipant, SettlementService, LEDGER_STREAM,
};
use racha_settlement::{
    EventKind, EventLedger, EventRecord, ExpenseDraft, ExpenseShare, LedgerEvent,
};
use std::sync::Arc;

type Service =
    SettlementService<Arc<InMemoryEventStore>, Arc<InMemoryEventDirectory>, Arc<InMemoryUserDirectory>>;

fn record_for(organizer: UserId) -> EventRecord {
    EventRecord {
        id: EventId::new(),
        organizer_id: organizer,
        kind: EventKind::PostPaid,
        name: "Bench".to_string(),
    }
}

/// Service over in-memory stores with one post-paid event of `people` participants.
fn setup_service(people: usize) -> (Service, UserId, EventId, Vec<ParticipantId>) {
    let store = Arc::new(InMemoryEventStore::new());
    let events = Arc::new(InMemoryEventDirectory::new());
    let users = Arc::new(InMemoryUserDirectory::new());

    let organizer = UserId::new();
    let record = record_for(organizer);
    let event_id = record.id;
    events.register(record).unwrap();

    let service = SettlementService::new(store, events, users);
    let ids = (0..people)
        .map(|i| {
            service
                .add_participant(
                    organizer,
                    event_id,
                    NewParticipant {
                        name: Some(format!("p{i}")),
                        ..NewParticipant::default()
                    },
                )
                .unwrap()
                .id
        })
        .collect();

    (service, organizer, event_id, ids)
}

fn draft(ids: &[ParticipantId], cents: i64) -> ExpenseDraft {
    ExpenseDraft {
        description: "Rodada".to_string(),
        total: Money::from_cents(cents),
        payer: ids[0],
        participants: ids.to_vec(),
    }
}

fn bench_command_execution_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_execution_latency");
    group.sample_size(200);

    group.bench_function("record_expense_fresh_ledger", |b| {
        b.iter_batched(
            || setup_service(6),
            |(service, organizer, event_id, ids)| {
                service
                    .record_expense(organizer, event_id, draft(&ids, black_box(10_000)), None)
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("balances_with_history", |b| {
        let (service, organizer, event_id, ids) = setup_service(12);
        for i in 0..100 {
            service
                .record_expense(organizer, event_id, draft(&ids, 1_000 + i), None)
                .unwrap();
        }

        b.iter(|| black_box(service.balances(organizer, event_id).unwrap()));
    });

    group.finish();
}

fn bench_event_append_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_append_throughput");

    for batch_size in [1, 10, 100].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("batch_append", batch_size),
            batch_size,
            |b, &size| {
                let store = InMemoryEventStore::new();
                let ledger_id = EventId::new();
                let participant = ParticipantId::new();

                b.iter(|| {
                    let events: Vec<UncommittedEvent> = (0..size)
                        .map(|i| {
                            let event = LedgerEvent::ExpenseRecorded(racha_settlement::ledger::ExpenseRecorded {
                                expense_id: racha_core::ExpenseId::new(),
                                description: format!("expense {i}"),
                                total: Money::from_cents(500),
                                payer: participant,
                                shares: vec![ExpenseShare {
                                    participant_id: participant,
                                    amount: Money::from_cents(500),
                                }],
                                recorded_by: UserId::new(),
                                idempotency_key: None,
                                occurred_at: Utc::now(),
                            });
                            UncommittedEvent::from_typed(ledger_id, LEDGER_STREAM, uuid::Uuid::now_v7(), &event)
                                .unwrap()
                        })
                        .collect();

                    black_box(store.append(events, ExpectedVersion::Any).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_rehydration_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("rehydration_speed");

    for expense_count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("load_ledger", expense_count),
            expense_count,
            |b, &count| {
                let organizer = UserId::new();
                let record = record_for(organizer);
                let store = Arc::new(InMemoryEventStore::new());
                let events = Arc::new(InMemoryEventDirectory::new());
                events.register(record.clone()).unwrap();
                let service = SettlementService::new(store.clone(), events, Arc::new(InMemoryUserDirectory::new()));

                let ids: Vec<ParticipantId> = (0..8)
                    .map(|i| {
                        service
                            .add_participant(
                                organizer,
                                record.id,
                                NewParticipant {
                                    name: Some(format!("p{i}")),
                                    ..NewParticipant::default()
                                },
                            )
                            .unwrap()
                            .id
                    })
                    .collect();
                for i in 0..count {
                    service
                        .record_expense(organizer, record.id, draft(&ids, 100 + i as i64), None)
                        .unwrap();
                }

                let dispatcher = CommandDispatcher::new(store);
                b.iter(|| {
                    let ledger: EventLedger = dispatcher
                        .load(record.id, |_| EventLedger::new(record.clone()))
                        .unwrap();
                    black_box(ledger);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_command_execution_latency,
    bench_event_append_throughput,
    bench_rehydration_speed
);
criterion_main!(benches);
