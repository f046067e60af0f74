//! Paid/owed/balance per active participant, derived from the ledger on every call.
//!
//! Departed participants drop out of the calculation:
//! - an expense whose payer is inactive is skipped entirely (nobody is credited or
//!   charged for it);
//! - otherwise only shares of active recipients count, and the payer is credited with
//!   exactly the sum of those shares, not the original total.
//!
//! Nothing is redistributed. When no expense is skipped the balances sum to zero; a
//! skipped expense skews the sum by the part of it that active recipients owed.

use std::collections::HashMap;

use racha_core::{Money, ParticipantId};

use crate::expense::Expense;
use crate::participant::Participant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantBalance {
    pub participant_id: ParticipantId,
    pub name: String,
    pub total_paid: Money,
    pub total_share: Money,
    /// `total_paid - total_share`: positive is owed money, negative owes money.
    pub balance: Money,
}

/// Balances for every active participant, in participant creation order.
pub fn compute_balances(participants: &[Participant], expenses: &[Expense]) -> Vec<ParticipantBalance> {
    let mut rows: Vec<ParticipantBalance> = participants
        .iter()
        .filter(|p| p.is_active)
        .map(|p| ParticipantBalance {
            participant_id: p.id,
            name: p.name.clone(),
            total_paid: Money::ZERO,
            total_share: Money::ZERO,
            balance: Money::ZERO,
        })
        .collect();

    let index: HashMap<ParticipantId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.participant_id, i))
        .collect();

    for expense in expenses {
        let Some(&payer_idx) = index.get(&expense.payer) else {
            continue;
        };

        let mut attributable = Money::ZERO;
        for share in &expense.shares {
            if let Some(&idx) = index.get(&share.participant_id) {
                rows[idx].total_share += share.amount;
                attributable += share.amount;
            }
        }
        rows[payer_idx].total_paid += attributable;
    }

    for row in &mut rows {
        row.balance = row.total_paid - row.total_share;
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use racha_core::{ExpenseId, UserId};

    use crate::expense::{split_evenly, ExpenseShare};

    fn people(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|name| Participant {
                id: ParticipantId::new(),
                name: name.to_string(),
                linked_user: None,
                payment_address: None,
                is_active: true,
                joined_at: Utc::now(),
            })
            .collect()
    }

    fn expense(total: i64, payer: ParticipantId, recipients: &[ParticipantId]) -> Expense {
        let shares = recipients
            .iter()
            .zip(split_evenly(Money::from_cents(total), recipients.len()))
            .map(|(id, amount)| ExpenseShare {
                participant_id: *id,
                amount,
            })
            .collect();

        Expense {
            id: ExpenseId::new(),
            description: "shared".to_string(),
            total: Money::from_cents(total),
            payer,
            shares,
            recorded_by: UserId::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn ids(participants: &[Participant]) -> Vec<ParticipantId> {
        participants.iter().map(|p| p.id).collect()
    }

    #[test]
    fn pizza_scenario_balances() {
        let participants = people(&["Ana", "Bruno", "Carla"]);
        let all = ids(&participants);
        let expenses = vec![expense(10_000, all[0], &all)];

        let balances = compute_balances(&participants, &expenses);

        let values: Vec<i64> = balances.iter().map(|b| b.balance.cents()).collect();
        assert_eq!(values, vec![6_666, -3_333, -3_333]);
        assert_eq!(balances[0].total_paid, Money::from_cents(10_000));
        assert_eq!(balances[0].total_share, Money::from_cents(3_334));
        assert_eq!(balances[0].name, "Ana");
    }

    #[test]
    fn deactivated_recipient_is_excluded_and_payer_credit_shrinks() {
        let mut participants = people(&["Ana", "Bruno", "Carla"]);
        let all = ids(&participants);
        let expenses = vec![expense(10_000, all[0], &all)];

        participants[1].is_active = false;
        let balances = compute_balances(&participants, &expenses);

        assert_eq!(balances.len(), 2);
        assert!(balances.iter().all(|b| b.participant_id != all[1]));

        let ana = &balances[0];
        assert_eq!(ana.total_paid, Money::from_cents(6_667));
        assert_eq!(ana.total_share, Money::from_cents(3_334));
        assert_eq!(ana.balance, Money::from_cents(3_333));
        assert_eq!(balances[1].balance, Money::from_cents(-3_333));

        let sum: Money = balances.iter().map(|b| b.balance).sum();
        assert_eq!(sum, Money::ZERO);
    }

    #[test]
    fn deactivated_payer_voids_the_whole_expense() {
        let mut participants = people(&["Ana", "Bruno", "Carla"]);
        let all = ids(&participants);
        let expenses = vec![
            expense(9_000, all[1], &all),
            expense(3_000, all[0], &all),
        ];

        participants[1].is_active = false;
        let balances = compute_balances(&participants, &expenses);

        // Only the second expense counts: Ana paid 20.00 for Carla and herself.
        assert_eq!(balances[0].total_paid, Money::from_cents(2_000));
        assert_eq!(balances[0].balance, Money::from_cents(1_000));
        assert_eq!(balances[1].total_share, Money::from_cents(1_000));
        assert_eq!(balances[1].balance, Money::from_cents(-1_000));
    }

    #[test]
    fn participants_without_expenses_have_zero_balance() {
        let participants = people(&["Ana", "Bruno"]);
        let balances = compute_balances(&participants, &[]);
        assert!(balances.iter().all(|b| b.balance == Money::ZERO));
        assert_eq!(balances.len(), 2);
    }

    #[test]
    fn largest_accepted_amounts_sum_without_overflow() {
        let participants = people(&["Ana", "Bruno"]);
        let all = ids(&participants);
        let max: Money = "100000000000.00".parse().unwrap();
        let expenses: Vec<Expense> = (0..2).map(|_| expense(max.cents(), all[0], &all)).collect();

        let balances = compute_balances(&participants, &expenses);

        assert_eq!(balances[0].total_paid, Money::from_cents(max.cents() * 2));
        assert_eq!(balances[0].balance, Money::from_cents(max.cents()));
        assert_eq!(balances[1].balance, Money::from_cents(-max.cents()));
        assert!("92233720368547758.07".parse::<Money>().is_err());
    }

    #[test]
    fn recomputing_without_changes_is_identical() {
        let participants = people(&["Ana", "Bruno", "Carla", "Dani"]);
        let all = ids(&participants);
        let expenses = vec![
            expense(4_321, all[2], &all),
            expense(999, all[3], &all[..2]),
        ];

        assert_eq!(
            compute_balances(&participants, &expenses),
            compute_balances(&participants, &expenses)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: with every payer active, money is conserved even after
        /// recipients leave.
        #[test]
        fn balances_sum_to_zero_when_every_payer_is_active(
            group in 2usize..12,
            spends in prop::collection::vec((1i64..500_000i64, 0usize..12, 1usize..12), 1..20),
            departed in prop::collection::vec(any::<bool>(), 12),
        ) {
            let names: Vec<String> = (0..group).map(|i| format!("p{i}")).collect();
            let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut participants = people(&name_refs);
            let all = ids(&participants);

            // Payers are chosen among participants that stay active.
            let staying: Vec<usize> = (0..group).filter(|i| *i == 0 || !departed[*i]).collect();
            let expenses: Vec<Expense> = spends
                .iter()
                .map(|(total, payer, width)| {
                    let payer = all[staying[payer % staying.len()]];
                    let width = (*width).min(group);
                    expense(*total, payer, &all[..width])
                })
                .collect();

            for (i, p) in participants.iter_mut().enumerate() {
                if i != 0 && departed[i] {
                    p.is_active = false;
                }
            }

            let sum: Money = compute_balances(&participants, &expenses)
                .iter()
                .map(|b| b.balance)
                .sum();
            prop_assert_eq!(sum, Money::ZERO);
        }
    }
}
