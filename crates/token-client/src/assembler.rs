//! Transaction assembly for the mint and fund flows.
//!
//! Each flow follows the same steps:
//!
//! 1. Read what the flow depends on (existence of the destination account,
//!    rent, the payer's balance) and decide which instructions to include.
//! 2. Refuse before any signing if the payer cannot cover rent plus the fee
//!    reserve.
//! 3. Fetch a fresh blockhash, compile the instructions in order, let local
//!    one-shot keys (a new mint) fill their slots, and hand the rest to the
//!    external signer.
//! 4. Wait a bounded time for confirmation.
//!
//! Nothing here retries a submission. A failure is returned as-is and the
//! caller decides whether to re-drive the flow, which starts again from
//! step 1 with a new blockhash.

use token_wire::{
    bytes_to_address, compile_transaction, create_associated_token_account,
    get_associated_token_address, system, token_instruction, MintKeypair, Pubkey,
    SolInstruction, WireError, MINT_ACCOUNT_LEN, TOKEN_ACCOUNT_LEN, TOKEN_PROGRAM_ID,
};
use tracing::{debug, info};

use crate::confirm::{confirm_signature, ConfirmationOutcome};
use crate::context::WalletContext;
use crate::error::{ClientError, Result};
use crate::reader::{account_exists, fetch_token_account, is_mint_authority};

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Inputs for creating a new mint and funding an owner with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundWalletRequest {
    pub owner: Pubkey,
    pub decimals: u8,
    /// Base units minted into the owner's associated account.
    pub amount: u64,
    pub freeze_authority: Option<Pubkey>,
}

/// The ordered instruction list for a fund-wallet transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundWalletPlan {
    pub mint: Pubkey,
    pub associated_account: Pubkey,
    pub creates_associated_account: bool,
    /// create-account, initialize-mint, [create-associated-account], mint-to.
    pub instructions: Vec<SolInstruction>,
}

/// Lay out the fund-wallet instructions in execution order.
///
/// The payer is the new mint's authority. `mint_rent` funds the mint
/// account; `associated_account_exists` drops the create step.
pub fn plan_fund_wallet(
    payer: &Pubkey,
    mint: &Pubkey,
    request: &FundWalletRequest,
    mint_rent: u64,
    associated_account_exists: bool,
) -> std::result::Result<FundWalletPlan, WireError> {
    let mut instructions = vec![
        system::create_account(
            payer,
            mint,
            mint_rent,
            MINT_ACCOUNT_LEN as u64,
            &TOKEN_PROGRAM_ID,
        ),
        token_instruction::initialize_mint(
            mint,
            request.decimals,
            payer,
            request.freeze_authority.as_ref(),
        ),
    ];

    let associated_account = if associated_account_exists {
        get_associated_token_address(&request.owner, mint)?
    } else {
        let (address, create) = create_associated_token_account(payer, &request.owner, mint)?;
        instructions.push(create);
        address
    };

    instructions.push(token_instruction::mint_to(
        mint,
        &associated_account,
        payer,
        request.amount,
    ));

    Ok(FundWalletPlan {
        mint: *mint,
        associated_account,
        creates_associated_account: !associated_account_exists,
        instructions,
    })
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A transaction the network accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub signature: String,
    /// `Confirmed` or `Pending`; a failed transaction is an error instead.
    pub confirmation: ConfirmationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundWalletOutcome {
    pub mint: Pubkey,
    pub associated_account: Pubkey,
    pub created_associated_account: bool,
    pub submitted: Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredAccount {
    pub address: Pubkey,
    /// `None` when the account already existed and nothing was sent.
    pub submitted: Option<Submitted>,
}

impl EnsuredAccount {
    pub fn created(&self) -> bool {
        self.submitted.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMoveOutcome {
    pub destination: Pubkey,
    pub created_destination: bool,
    pub submitted: Submitted,
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

/// Fail with `InsufficientBalance` unless `payer` holds `lamports_needed`
/// plus the configured fee reserve.
async fn check_payer_balance(ctx: &WalletContext, payer: &Pubkey, lamports_needed: u64) -> Result<()> {
    let required = lamports_needed.saturating_add(ctx.config.fee_reserve_lamports);
    let available = ctx.rpc.get_balance(payer).await?;
    if available < required {
        return Err(ClientError::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

async fn associated_account_rent(ctx: &WalletContext, create: bool) -> Result<u64> {
    if create {
        ctx.rpc
            .get_minimum_balance_for_rent_exemption(TOKEN_ACCOUNT_LEN)
            .await
    } else {
        Ok(0)
    }
}

fn validate_signature(signature: &str) -> Result<()> {
    let bytes = bs58::decode(signature)
        .into_vec()
        .map_err(|e| ClientError::SubmissionFailed(format!("signer returned bad signature: {e}")))?;
    if bytes.len() != 64 {
        return Err(ClientError::SubmissionFailed(format!(
            "signer returned a {}-byte signature",
            bytes.len()
        )));
    }
    Ok(())
}

/// Compile, sign and submit `instructions`, then wait for confirmation.
///
/// `local_signers` fill their slots before the external signer sees the
/// transaction.
async fn submit(
    ctx: &WalletContext,
    payer: &Pubkey,
    instructions: &[SolInstruction],
    local_signers: &[&MintKeypair],
) -> Result<Submitted> {
    let latest = ctx.rpc.get_latest_blockhash().await?;
    let tx = compile_transaction(instructions, payer, &latest.blockhash)?;
    let mut wire = tx.to_unsigned_wire()?;
    for key in local_signers {
        wire = key.sign_wire(&wire)?;
    }

    debug!(
        instructions = instructions.len(),
        signers = tx.num_required_signatures,
        "submitting transaction"
    );
    let submission = ctx.signer.sign_and_send(&wire).await?;
    validate_signature(&submission.signature)?;
    info!(signature = %submission.signature, "transaction submitted");

    match confirm_signature(ctx, &submission.signature).await? {
        ConfirmationOutcome::Failed(err) => Err(ClientError::SubmissionFailed(format!(
            "{}: {err}",
            submission.signature
        ))),
        confirmation => Ok(Submitted {
            signature: submission.signature,
            confirmation,
        }),
    }
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Create a fresh mint and fund `request.owner` with it in one transaction.
///
/// The new mint's identity is generated here, signs once and is dropped.
/// Only its address is returned.
pub async fn create_mint_and_fund(
    ctx: &WalletContext,
    request: &FundWalletRequest,
) -> Result<FundWalletOutcome> {
    create_mint_and_fund_with(ctx, request, MintKeypair::generate()).await
}

/// [`create_mint_and_fund`] with a caller-supplied mint identity.
pub async fn create_mint_and_fund_with(
    ctx: &WalletContext,
    request: &FundWalletRequest,
    mint: MintKeypair,
) -> Result<FundWalletOutcome> {
    let payer = ctx.signer.pubkey()?;
    let mint_address = mint.pubkey();

    let associated_account = get_associated_token_address(&request.owner, &mint_address)?;
    let exists = account_exists(ctx.rpc.as_ref(), &associated_account).await?;
    let mint_rent = ctx
        .rpc
        .get_minimum_balance_for_rent_exemption(MINT_ACCOUNT_LEN)
        .await?;
    let ata_rent = associated_account_rent(ctx, !exists).await?;
    check_payer_balance(ctx, &payer, mint_rent.saturating_add(ata_rent)).await?;

    let plan = plan_fund_wallet(&payer, &mint_address, request, mint_rent, exists)?;
    debug!(
        mint = %bytes_to_address(&mint_address),
        owner = %bytes_to_address(&request.owner),
        steps = plan.instructions.len(),
        "fund wallet plan"
    );

    let submitted = submit(ctx, &payer, &plan.instructions, &[&mint]).await?;
    Ok(FundWalletOutcome {
        mint: plan.mint,
        associated_account: plan.associated_account,
        created_associated_account: plan.creates_associated_account,
        submitted,
    })
}

/// Make sure `owner` has an associated account for `mint`, creating it if
/// absent. Safe to call again after a partial failure.
pub async fn ensure_associated_account(
    ctx: &WalletContext,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<EnsuredAccount> {
    let payer = ctx.signer.pubkey()?;
    let address = get_associated_token_address(owner, mint)?;
    if account_exists(ctx.rpc.as_ref(), &address).await? {
        debug!(address = %bytes_to_address(&address), "associated account exists");
        return Ok(EnsuredAccount {
            address,
            submitted: None,
        });
    }

    let rent = associated_account_rent(ctx, true).await?;
    check_payer_balance(ctx, &payer, rent).await?;

    let (_, create) = create_associated_token_account(&payer, owner, mint)?;
    let submitted = submit(ctx, &payer, &[create], &[]).await?;
    Ok(EnsuredAccount {
        address,
        submitted: Some(submitted),
    })
}

/// Mint `amount` base units of an existing mint to `owner`.
///
/// The connected wallet must be the mint authority. The owner's associated
/// account is created in the same transaction when absent.
pub async fn mint_to_owner(
    ctx: &WalletContext,
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Result<TokenMoveOutcome> {
    let payer = ctx.signer.pubkey()?;
    if !is_mint_authority(ctx.rpc.as_ref(), mint, &payer).await? {
        return Err(ClientError::Unauthorized(format!(
            "{} is not the mint authority of {}",
            bytes_to_address(&payer),
            bytes_to_address(mint)
        )));
    }

    let destination = get_associated_token_address(owner, mint)?;
    let create = !account_exists(ctx.rpc.as_ref(), &destination).await?;
    let rent = associated_account_rent(ctx, create).await?;
    check_payer_balance(ctx, &payer, rent).await?;

    let mut instructions = Vec::with_capacity(2);
    if create {
        instructions.push(create_associated_token_account(&payer, owner, mint)?.1);
    }
    instructions.push(token_instruction::mint_to(mint, &destination, &payer, amount));

    let submitted = submit(ctx, &payer, &instructions, &[]).await?;
    Ok(TokenMoveOutcome {
        destination,
        created_destination: create,
        submitted,
    })
}

/// Transfer `amount` base units from the connected wallet's associated
/// account to `recipient`'s.
pub async fn transfer_to_owner(
    ctx: &WalletContext,
    mint: &Pubkey,
    recipient: &Pubkey,
    amount: u64,
) -> Result<TokenMoveOutcome> {
    let payer = ctx.signer.pubkey()?;
    let source = get_associated_token_address(&payer, mint)?;
    let holding = fetch_token_account(ctx.rpc.as_ref(), &source).await?;
    if holding.is_frozen() {
        return Err(ClientError::Unauthorized(format!(
            "{} is frozen",
            bytes_to_address(&source)
        )));
    }
    if holding.amount < amount {
        return Err(ClientError::InsufficientBalance {
            required: amount,
            available: holding.amount,
        });
    }

    let destination = get_associated_token_address(recipient, mint)?;
    let create = !account_exists(ctx.rpc.as_ref(), &destination).await?;
    let rent = associated_account_rent(ctx, create).await?;
    check_payer_balance(ctx, &payer, rent).await?;

    let mut instructions = Vec::with_capacity(2);
    if create {
        instructions.push(create_associated_token_account(&payer, recipient, mint)?.1);
    }
    instructions.push(token_instruction::transfer(&source, &destination, &payer, amount));

    let submitted = submit(ctx, &payer, &instructions, &[]).await?;
    Ok(TokenMoveOutcome {
        destination,
        created_destination: create,
        submitted,
    })
}
