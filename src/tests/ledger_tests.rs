use super::*;
use crate::core::ledger::recompute_balances;
use std::collections::BTreeMap;
use std::sync::Arc;

#[tokio::test]
async fn test_equal_expense_creates_single_debt() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    service
        .add_expense(&group.id, ALICE, equal_expense("Dinner", 100.0, ALICE))
        .await
        .unwrap();

    let balances = service.get_balances(&group.id, ALICE).await.unwrap();
    assert_eq!(balances.get(BOB, ALICE), Some(money(50.0)));
    assert_eq!(balances.len(), 1);
}

#[tokio::test]
async fn test_opposite_expenses_net_out() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    service
        .add_expense(&group.id, ALICE, equal_expense("Lunch", 100.0, ALICE))
        .await
        .unwrap();
    service
        .add_expense(&group.id, BOB, equal_expense("Dinner", 100.0, BOB))
        .await
        .unwrap();

    let balances = service.get_balances(&group.id, BOB).await.unwrap();
    assert!(balances.is_empty());
}

#[tokio::test]
async fn test_remove_expense_recomputes_from_remaining() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    service
        .add_expense(&group.id, ALICE, equal_expense("Hotel", 100.0, ALICE))
        .await
        .unwrap();
    service
        .add_expense(&group.id, BOB, equal_expense("Taxi", 20.0, BOB))
        .await
        .unwrap();
    let snacks = service
        .add_expense(&group.id, ALICE, equal_expense("Snacks", 60.0, ALICE))
        .await
        .unwrap();
    assert_eq!(
        service.get_balances(&group.id, ALICE).await.unwrap().get(BOB, ALICE),
        Some(money(70.0))
    );

    let balances = service.remove_expense(&group.id, BOB, &snacks.id).await.unwrap();
    assert_eq!(balances.get(BOB, ALICE), Some(money(40.0)));
    assert_eq!(balances.len(), 1);

    let stored = service.get_group(&group.id, ALICE).await.unwrap();
    assert_eq!(stored.expenses.len(), 2);
}

#[tokio::test]
async fn test_remove_missing_expense_is_noop() {
    let service = create_test_service();
    let group = pair_group(&service).await;
    service
        .add_expense(&group.id, ALICE, equal_expense("Dinner", 100.0, ALICE))
        .await
        .unwrap();
    let before = service.get_group(&group.id, ALICE).await.unwrap();

    let balances = service.remove_expense(&group.id, ALICE, "no-such-expense").await.unwrap();
    assert_eq!(balances, before.balances);

    let after = service.get_group(&group.id, ALICE).await.unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.expenses.len(), 1);
}

#[tokio::test]
async fn test_stored_balances_match_full_recompute() {
    let service = create_test_service();
    let group = trio_group(&service).await;

    service
        .add_expense(&group.id, ALICE, equal_expense("Groceries", 90.0, ALICE))
        .await
        .unwrap();
    service
        .add_expense(&group.id, BOB, equal_expense("Fuel", 45.0, BOB))
        .await
        .unwrap();
    service
        .add_expense(&group.id, CAROL, equal_expense("Tickets", 100.0, CAROL))
        .await
        .unwrap();
    service.settle(&group.id, BOB, BOB, ALICE, money(5.0)).await.unwrap();

    let stored = service.get_group(&group.id, ALICE).await.unwrap();
    assert_eq!(recompute_balances(&stored), stored.balances);
    assert!(stored.balances.is_simplified());
}

#[tokio::test]
async fn test_no_pair_owes_both_ways() {
    let service = create_test_service();
    let group = trio_group(&service).await;

    for (payer, total) in [(ALICE, 30.0), (BOB, 60.0), (CAROL, 15.0), (ALICE, 12.0)] {
        service
            .add_expense(&group.id, payer, equal_expense("Round", total, payer))
            .await
            .unwrap();
    }

    let balances = service.get_balances(&group.id, CAROL).await.unwrap();
    for (debtor, creditor, amount) in balances.iter() {
        assert!(amount.is_positive());
        assert!(balances.get(creditor, debtor).is_none());
    }
}

#[tokio::test]
async fn test_equal_split_remainder_goes_to_first_participants() {
    let service = create_test_service();
    let group = trio_group(&service).await;

    let expense = service
        .add_expense(&group.id, BOB, equal_expense("Pizza", 100.0, BOB))
        .await
        .unwrap();

    assert_eq!(expense.splits.get(ALICE), Some(&Money::from_minor(3334)));
    assert_eq!(expense.splits.get(BOB), Some(&Money::from_minor(3333)));
    assert_eq!(expense.splits.get(CAROL), Some(&Money::from_minor(3333)));
    let total: Money = expense.splits.values().sum();
    assert_eq!(total, expense.total_amount);
}

#[tokio::test]
async fn test_custom_split_must_sum_to_total() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    let mut input = equal_expense("Concert", 100.0, ALICE);
    input.split_type = SplitType::Custom;
    input.custom_splits = Some(BTreeMap::from([
        (ALICE.to_string(), money(60.0)),
        (BOB.to_string(), money(30.0)),
    ]));
    let err = service.add_expense(&group.id, ALICE, input.clone()).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSplit(_)));

    input.custom_splits = Some(BTreeMap::from([
        (ALICE.to_string(), money(70.0)),
        (BOB.to_string(), money(30.0)),
    ]));
    service.add_expense(&group.id, ALICE, input).await.unwrap();
    let balances = service.get_balances(&group.id, ALICE).await.unwrap();
    assert_eq!(balances.get(BOB, ALICE), Some(money(30.0)));
}

#[tokio::test]
async fn test_custom_split_rejects_outsider() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    let mut input = equal_expense("Concert", 100.0, ALICE);
    input.split_type = SplitType::Custom;
    input.custom_splits = Some(BTreeMap::from([
        (ALICE.to_string(), money(50.0)),
        ("mallory".to_string(), money(50.0)),
    ]));
    let err = service.add_expense(&group.id, ALICE, input).await.unwrap_err();
    assert_eq!(err, LedgerError::UnknownParticipant("mallory".to_string()));
}

#[tokio::test]
async fn test_outsider_cannot_touch_ledger() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    let err = service
        .add_expense(&group.id, "mallory", equal_expense("Sneaky", 10.0, "mallory"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AccessDenied("mallory".to_string()));

    let err = service.get_balances(&group.id, "mallory").await.unwrap_err();
    assert!(matches!(err, LedgerError::AccessDenied(_)));

    let err = service.remove_expense(&group.id, "mallory", "anything").await.unwrap_err();
    assert!(matches!(err, LedgerError::AccessDenied(_)));
}

#[tokio::test]
async fn test_payer_must_be_participant() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    let err = service
        .add_expense(&group.id, ALICE, equal_expense("Dinner", 10.0, CAROL))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::UnknownParticipant(CAROL.to_string()));
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let service = create_test_service();
    let err = service
        .add_expense("missing", ALICE, equal_expense("Dinner", 10.0, ALICE))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::GroupNotFound("missing".to_string()));
}

#[tokio::test]
async fn test_invalid_amount_is_rejected() {
    let service = create_test_service();
    let group = pair_group(&service).await;

    let err = service
        .add_expense(&group.id, ALICE, equal_expense("Free lunch", 0.0, ALICE))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(field, _) if field == "total_amount"));
}

#[tokio::test]
async fn test_concurrent_adds_are_all_kept() {
    let service = Arc::new(create_test_service());
    let group = trio_group(service.as_ref()).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = service.clone();
        let group_id = group.id.clone();
        handles.push(tokio::spawn(async move {
            service
                .add_expense(&group_id, ALICE, equal_expense(&format!("Round {}", i), 30.0, ALICE))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = service.get_group(&group.id, ALICE).await.unwrap();
    assert_eq!(stored.expenses.len(), 10);
    assert_eq!(stored.balances.get(BOB, ALICE), Some(money(100.0)));
    assert_eq!(stored.balances.get(CAROL, ALICE), Some(money(100.0)));
    assert_eq!(stored.version, 10);
}

#[tokio::test]
async fn test_version_conflict_is_retried() {
    let service = LedgerService::new(FlakyStorage::new(2), FailingEnricher, "secret".to_string(), 3);
    let group = pair_group(&service).await;

    service
        .add_expense(&group.id, ALICE, equal_expense("Dinner", 100.0, ALICE))
        .await
        .unwrap();
    let balances = service.get_balances(&group.id, ALICE).await.unwrap();
    assert_eq!(balances.get(BOB, ALICE), Some(money(50.0)));
}

#[tokio::test]
async fn test_version_conflict_surfaces_after_retry_limit() {
    let service = LedgerService::new(FlakyStorage::new(5), FailingEnricher, "secret".to_string(), 3);
    let group = pair_group(&service).await;

    let err = service
        .add_expense(&group.id, ALICE, equal_expense("Dinner", 100.0, ALICE))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::VersionConflict(group.id.clone()));

    let stored = service.get_group(&group.id, ALICE).await.unwrap();
    assert!(stored.expenses.is_empty());
}

#[tokio::test]
async fn test_summary_totals() {
    let service = create_test_service();
    let group = trio_group(&service).await;

    service
        .add_expense(&group.id, ALICE, equal_expense("Hotel", 300.0, ALICE))
        .await
        .unwrap();
    service
        .add_expense(&group.id, BOB, equal_expense("Museum", 60.0, BOB))
        .await
        .unwrap();

    let summary = service.get_summary(&group.id, CAROL).await.unwrap();
    assert_eq!(summary.group_name, "Trip");
    assert_eq!(summary.total_expenses, 2);
    assert_eq!(summary.total_amount, money(360.0));
    assert_eq!(summary.per_member_totals.get(CAROL), Some(&money(120.0)));
    assert_eq!(summary.balances.get(CAROL, ALICE), Some(money(100.0)));
    assert_eq!(summary.balances.get(CAROL, BOB), Some(money(20.0)));
}

#[tokio::test]
async fn test_deleting_one_of_two_debts_leaves_the_other() {
    let service = create_test_service();
    let group = pair_group(&service).await;
    let mut input = equal_expense("Tickets", 30.0, ALICE);
    input.split_type = SplitType::Custom;
    input.custom_splits = Some(BTreeMap::from([(BOB.to_string(), money(30.0))]));
    let first = service.add_expense(&group.id, ALICE, input).await.unwrap();

    let mut input = equal_expense("Drinks", 40.0, ALICE);
    input.split_type = SplitType::Custom;
    input.custom_splits = Some(BTreeMap::from([(BOB.to_string(), money(40.0))]));
    service.add_expense(&group.id, ALICE, input).await.unwrap();
    assert_eq!(
        service.get_balances(&group.id, BOB).await.unwrap().get(BOB, ALICE),
        Some(money(70.0))
    );

    let balances = service.remove_expense(&group.id, ALICE, &first.id).await.unwrap();
    assert_eq!(balances.get(BOB, ALICE), Some(money(40.0)));
}

#[tokio::test]
async fn test_payer_share_creates_no_entry() {
    let service = create_test_service();
    let group = trio_group(&service).await;

    let expense = service
        .add_expense(&group.id, ALICE, equal_expense("Cabin", 300.0, ALICE))
        .await
        .unwrap();
    assert!(expense.splits.values().all(|share| *share == money(100.0)));

    let balances = service.get_balances(&group.id, ALICE).await.unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances.get(BOB, ALICE), Some(money(100.0)));
    assert_eq!(balances.get(CAROL, ALICE), Some(money(100.0)));
    assert!(balances.get(ALICE, ALICE).is_none());
}

#[tokio::test]
async fn test_equal_split_needs_a_member_besides_owner() {
    let service = create_test_service();
    let group = service.create_group(ALICE, "Solo".to_string(), vec![]).await.unwrap();

    let err = service
        .add_expense(&group.id, ALICE, equal_expense("Groceries", 10.0, ALICE))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSplit(_)));

    let stored = service.get_group(&group.id, ALICE).await.unwrap();
    assert!(stored.expenses.is_empty());
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn test_huge_custom_shares_are_rejected() {
    let service = create_test_service();
    let group = trio_group(&service).await;

    let mut input = equal_expense("Boat", 10.0, ALICE);
    input.split_type = SplitType::Custom;
    input.custom_splits = Some(BTreeMap::from([
        (ALICE.to_string(), money(1e17)),
        (BOB.to_string(), money(1e17)),
        (CAROL.to_string(), money(10.02)),
    ]));
    let err = service.add_expense(&group.id, ALICE, input).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSplit(_)));

    let stored = service.get_group(&group.id, ALICE).await.unwrap();
    assert!(stored.expenses.is_empty());
    assert!(stored.balances.is_empty());
}
