//! End-to-end flows against an in-memory chain: plan, pre-check, sign,
//! submit and confirm.

mod common;

use common::*;
use token_client::*;
use token_wire::{
    get_associated_token_address, pubkey_from_seed, MintKeypair, TokenInstruction,
    ASSOCIATED_TOKEN_PROGRAM_ID, MINT_ACCOUNT_LEN, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID,
};

const OWNER: [u8; 32] = [0x33; 32];
const PLENTY: u64 = 10_000_000_000;

fn fund_request(amount: u64) -> FundWalletRequest {
    FundWalletRequest {
        owner: OWNER,
        decimals: 9,
        amount,
        freeze_authority: None,
    }
}

fn mint_identity(byte: u8) -> MintKeypair {
    let mut seed = [byte; 32];
    MintKeypair::from_seed(&mut seed)
}

// ─── Fund wallet ───────────────────────────────────────────────────

#[tokio::test]
async fn fund_wallet_without_account_sends_four_ordered_instructions() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let ctx = wallet(&rpc);

    let outcome = create_mint_and_fund(&ctx, &fund_request(100_000_000_000))
        .await
        .unwrap();

    assert!(outcome.created_associated_account);
    assert_eq!(outcome.submitted.confirmation, ConfirmationOutcome::Confirmed);
    assert_eq!(
        outcome.associated_account,
        get_associated_token_address(&OWNER, &outcome.mint).unwrap()
    );

    let sent = rpc.sent();
    assert_eq!(sent.len(), 1);
    let tx = parse_sent(&sent[0]);
    let programs: Vec<_> = tx.instructions.iter().map(|ix| ix.program_id).collect();
    assert_eq!(
        programs,
        vec![
            SYSTEM_PROGRAM_ID,
            TOKEN_PROGRAM_ID,
            ASSOCIATED_TOKEN_PROGRAM_ID,
            TOKEN_PROGRAM_ID
        ]
    );
    assert_eq!(
        TokenInstruction::unpack(&tx.instructions[3].data).unwrap(),
        TokenInstruction::MintTo {
            amount: 100_000_000_000
        }
    );
    // Payer and the new mint both signed.
    assert_eq!(tx.num_signatures, 2);
    assert_eq!(tx.account_keys[0], payer());
    assert_eq!(tx.account_keys[1], outcome.mint);
}

#[tokio::test]
async fn fund_wallet_with_existing_account_sends_three_instructions() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let mint = mint_identity(0x44);
    let mint_address = mint.pubkey();
    let ata = get_associated_token_address(&OWNER, &mint_address).unwrap();
    rpc.put_token_account(ata, &holding(mint_address, OWNER, 0));
    let ctx = wallet(&rpc);

    let outcome = create_mint_and_fund_with(&ctx, &fund_request(5), mint)
        .await
        .unwrap();

    assert!(!outcome.created_associated_account);
    let tx = parse_sent(&rpc.sent()[0]);
    assert_eq!(tx.instructions.len(), 3);
    assert!(tx
        .instructions
        .iter()
        .all(|ix| ix.program_id != ASSOCIATED_TOKEN_PROGRAM_ID));
    assert_eq!(tx.instructions[2].accounts[1], ata);
}

#[tokio::test]
async fn mint_account_is_funded_with_fetched_rent() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let ctx = wallet(&rpc);

    create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap();

    let tx = parse_sent(&rpc.sent()[0]);
    let create = &tx.instructions[0].data;
    assert_eq!(u64::from_le_bytes(create[4..12].try_into().unwrap()), 1_461_600);
    assert_eq!(
        u64::from_le_bytes(create[12..20].try_into().unwrap()),
        MINT_ACCOUNT_LEN as u64
    );
}

#[tokio::test]
async fn blockhash_is_fetched_after_checks_and_before_send() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let ctx = wallet(&rpc);

    create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap();

    let calls = rpc.calls();
    let position = |name: &str| calls.iter().position(|c| *c == name).unwrap();
    assert!(position("getAccountInfo") < position("getLatestBlockhash"));
    assert!(position("getBalance") < position("getLatestBlockhash"));
    assert_eq!(position("getLatestBlockhash") + 1, position("sendTransaction"));
    assert_eq!(calls.iter().filter(|c| **c == "getLatestBlockhash").count(), 1);
}

#[tokio::test]
async fn every_attempt_uses_a_new_blockhash() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let ctx = wallet(&rpc);

    create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap();
    create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap();

    let sent = rpc.sent();
    assert_ne!(parse_sent(&sent[0]).blockhash, parse_sent(&sent[1]).blockhash);
}

// ─── Pre-checks and signer errors ──────────────────────────────────

#[tokio::test]
async fn insufficient_balance_stops_before_signing() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), 1_000);
    let ctx = wallet(&rpc);

    let err = create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::InsufficientBalance {
            required: 1_461_600 + 2_039_280 + 1_000_000,
            available: 1_000,
        }
    );
    assert!(rpc.sent().is_empty());
    assert!(!rpc.calls().contains(&"getLatestBlockhash"));
}

#[tokio::test]
async fn user_rejection_is_its_own_kind() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let ctx = wallet_with(&rpc, UnhappySigner::Rejecting(payer()));

    let err = create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap_err();

    assert!(err.is_user_rejected());
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn missing_wallet_fails_before_any_rpc_call() {
    let rpc = MockRpc::new();
    let ctx = wallet_with(&rpc, UnhappySigner::Disconnected);

    let err = ensure_associated_account(&ctx, &OWNER, &[0x44; 32])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::SignerUnavailable(_)));
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn rpc_failure_during_existence_check_aborts() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    rpc.fail("getAccountInfo");
    let ctx = wallet(&rpc);

    let err = create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap_err();

    assert!(matches!(err, ClientError::Rpc(_)));
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn send_failure_keeps_the_transport_message() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    rpc.fail("sendTransaction");
    let ctx = wallet(&rpc);

    let err = create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::SubmissionFailed("sendTransaction: connection refused".into())
    );
    assert!(!err.is_recoverable());
}

// ─── Confirmation outcomes ─────────────────────────────────────────

#[tokio::test]
async fn unconfirmed_submission_reports_pending() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    rpc.set_status_mode(StatusMode::Never);
    let ctx = wallet(&rpc);

    let outcome = create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap();

    assert_eq!(outcome.submitted.confirmation, ConfirmationOutcome::Pending);
    assert_eq!(rpc.sent().len(), 1);
}

#[tokio::test]
async fn failed_transaction_surfaces_the_program_error() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    rpc.set_status_mode(StatusMode::Fail("InstructionError(3, Custom(1))".into()));
    let ctx = wallet(&rpc);

    let err = create_mint_and_fund(&ctx, &fund_request(1)).await.unwrap_err();

    match err {
        ClientError::SubmissionFailed(msg) => assert!(msg.contains("Custom(1)")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!ClientError::SubmissionFailed(String::new()).is_recoverable());
}

// ─── Associated accounts ───────────────────────────────────────────

#[tokio::test]
async fn ensure_associated_account_creates_once() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let mint = [0x44; 32];
    let ctx = wallet(&rpc);

    let first = ensure_associated_account(&ctx, &OWNER, &mint).await.unwrap();
    assert!(first.created());
    let tx = parse_sent(&rpc.sent()[0]);
    assert_eq!(tx.instructions.len(), 1);
    assert_eq!(tx.instructions[0].data, vec![1]);
    assert_eq!(tx.instructions[0].accounts[1], first.address);

    // The chain now has it; a re-drive is a no-op.
    rpc.put_token_account(first.address, &holding(mint, OWNER, 0));
    let second = ensure_associated_account(&ctx, &OWNER, &mint).await.unwrap();
    assert!(!second.created());
    assert_eq!(second.address, first.address);
    assert_eq!(rpc.sent().len(), 1);
}

// ─── Mint to / transfer ────────────────────────────────────────────

#[tokio::test]
async fn mint_to_owner_creates_destination_in_same_transaction() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let mint = [0x44; 32];
    rpc.put_mint(mint, &initialized_mint(Some(payer()), 6, 0));
    let ctx = wallet(&rpc);

    let outcome = mint_to_owner(&ctx, &mint, &OWNER, 2_500_000).await.unwrap();

    assert!(outcome.created_destination);
    let tx = parse_sent(&rpc.sent()[0]);
    assert_eq!(tx.instructions.len(), 2);
    assert_eq!(tx.instructions[0].program_id, ASSOCIATED_TOKEN_PROGRAM_ID);
    assert_eq!(
        TokenInstruction::unpack(&tx.instructions[1].data).unwrap(),
        TokenInstruction::MintTo { amount: 2_500_000 }
    );
    assert_eq!(
        tx.instructions[1].accounts,
        vec![mint, outcome.destination, payer()]
    );
}

#[tokio::test]
async fn mint_to_owner_requires_mint_authority() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let mint = [0x44; 32];
    rpc.put_mint(mint, &initialized_mint(Some([0x99; 32]), 6, 0));
    let ctx = wallet(&rpc);

    let err = mint_to_owner(&ctx, &mint, &OWNER, 1).await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn transfer_to_existing_account() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let mint = [0x44; 32];
    let source = get_associated_token_address(&payer(), &mint).unwrap();
    let destination = get_associated_token_address(&OWNER, &mint).unwrap();
    rpc.put_token_account(source, &holding(mint, payer(), 500));
    rpc.put_token_account(destination, &holding(mint, OWNER, 0));
    let ctx = wallet(&rpc);

    let outcome = transfer_to_owner(&ctx, &mint, &OWNER, 200).await.unwrap();

    assert!(!outcome.created_destination);
    let tx = parse_sent(&rpc.sent()[0]);
    assert_eq!(tx.instructions.len(), 1);
    assert_eq!(tx.instructions[0].data[0], 3);
    assert_eq!(
        tx.instructions[0].accounts,
        vec![source, destination, payer()]
    );
}

#[tokio::test]
async fn transfer_more_than_held_is_refused() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let mint = [0x44; 32];
    let source = get_associated_token_address(&payer(), &mint).unwrap();
    rpc.put_token_account(source, &holding(mint, payer(), 500));
    let ctx = wallet(&rpc);

    let err = transfer_to_owner(&ctx, &mint, &OWNER, 1_000).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::InsufficientBalance {
            required: 1_000,
            available: 500
        }
    );
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn transfer_without_source_account_is_not_found() {
    let rpc = MockRpc::new();
    rpc.set_balance(payer(), PLENTY);
    let ctx = wallet(&rpc);

    let err = transfer_to_owner(&ctx, &[0x44; 32], &OWNER, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::AccountNotFound { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn local_signer_pubkey_matches_seed() {
    let rpc = MockRpc::new();
    let ctx = wallet(&rpc);
    assert_eq!(ctx.signer.pubkey().unwrap(), pubkey_from_seed(&PAYER_SEED));
}
