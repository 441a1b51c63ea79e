//! Per-row transaction submission
//!
//! One row goes through: signer derivation, balance checks, call resolution,
//! fee selection, nonce selection + signing + broadcast under the signer's
//! nonce lock, and optionally confirmation. Every error is caught here and
//! turned into a [`TransactionOutcome`]; nothing escapes to sibling rows.

use crate::client::{market_balance, token_decimals, ChainClient};
use crate::config::{FeeModel, NetworkConfig, SubmitConfig};
use crate::constants::{format_ether, scale_to_decimals, unscale_from_decimals, MARKET_TOKEN_DECIMALS};
use crate::contracts::{ICToken, IERC20};
use crate::nonce::NonceTracker;
use crate::retry::{retry, RetryPolicy};
use crate::signer::{FeeParams, LocalSigner, TransactionSigner, TxRequest};
use crate::types::{Action, InputRow, RejectedRow, SkipReason, TransactionOutcome};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use eyre::Result;
use tracing::{error, info, warn};

/// A data row after column mapping: ready to submit, or already excluded
pub type ParsedRow = std::result::Result<InputRow, RejectedRow>;

/// Amount redeemed from a market-token balance
///
/// `amount = round(balance * numerator / denominator, step)`, rounding half up
/// to a multiple of `step` units. The defaults take 0.9 / 50 of the balance
/// and round a 6-decimal amount to 3 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemRule {
    pub numerator: u64,
    pub denominator: u64,
    pub step: u64,
}

impl Default for RedeemRule {
    fn default() -> Self {
        Self {
            numerator: 9,
            denominator: 500,
            step: 1_000,
        }
    }
}

impl RedeemRule {
    pub fn amount(&self, balance: U256) -> U256 {
        let step = U256::from(self.step.max(1));
        let divisor = U256::from(self.denominator.max(1)) * step;
        let scaled = balance.saturating_mul(U256::from(self.numerator));
        (scaled.saturating_add(divisor / U256::from(2u8)) / divisor) * step
    }
}

/// Submits rows against one client
pub struct Submitter<'a, C: ChainClient> {
    client: &'a C,
    network: &'a NetworkConfig,
    config: &'a SubmitConfig,
    retry: &'a RetryPolicy,
    nonces: &'a NonceTracker,
    redeem: RedeemRule,
}

impl<'a, C: ChainClient> Submitter<'a, C> {
    pub fn new(
        client: &'a C,
        network: &'a NetworkConfig,
        config: &'a SubmitConfig,
        retry: &'a RetryPolicy,
        nonces: &'a NonceTracker,
    ) -> Self {
        Self {
            client,
            network,
            config,
            retry,
            nonces,
            redeem: RedeemRule::default(),
        }
    }

    /// Use a different redeem rule
    pub fn with_redeem_rule(mut self, redeem: RedeemRule) -> Self {
        self.redeem = redeem;
        self
    }

    /// Process one row to its terminal outcome
    pub async fn submit(&self, row: ParsedRow) -> TransactionOutcome {
        let row = match row {
            Ok(row) => row,
            Err(rejected) => return Self::reject(rejected),
        };

        let signer = match LocalSigner::from_private_key(row.signing_key.expose_secret()) {
            Ok(signer) => signer,
            Err(err) => {
                error!(line = row.line, "Invalid signing key: {}", err);
                return TransactionOutcome::failed(format!("invalid signing key: {}", err));
            }
        };
        let address = signer.address();

        info!(
            signer = %address,
            line = row.line,
            endpoint = self.client.endpoint(),
            "Processing wallet"
        );

        let outcome = match self.submit_signed(&signer, &row).await {
            Ok(outcome) => outcome,
            Err(err) => TransactionOutcome::failed(format!("{:#}", err)),
        };

        self.log_outcome(address, row.line, &outcome);
        outcome
    }

    fn reject(rejected: RejectedRow) -> TransactionOutcome {
        let signer = rejected
            .signing_key
            .as_ref()
            .and_then(|key| LocalSigner::from_private_key(key.expose_secret()).ok())
            .map(|signer| signer.address());

        match signer {
            Some(address) => warn!(
                signer = %address,
                line = rejected.line,
                "Row skipped: {}",
                rejected.reason
            ),
            None => warn!(line = rejected.line, "Row skipped: {}", rejected.reason),
        }
        TransactionOutcome::skipped(rejected.reason)
    }

    async fn submit_signed<S: TransactionSigner>(
        &self,
        signer: &S,
        row: &InputRow,
    ) -> Result<TransactionOutcome> {
        let address = signer.address();

        let balance = retry(self.retry, "get_balance", || self.client.get_balance(address)).await?;
        info!(
            signer = %address,
            "Balance: {} {}",
            format_ether(balance),
            self.network.symbol
        );

        if balance < self.config.min_balance {
            return Ok(TransactionOutcome::skipped(SkipReason::BelowMinimum {
                balance,
                minimum: self.config.min_balance,
            }));
        }

        let value = row.action.native_value();
        if balance < value {
            return Ok(TransactionOutcome::skipped(SkipReason::InsufficientFunds {
                balance,
                required: value,
            }));
        }

        let (to, data) = match self.resolve_call(address, &row.action).await? {
            Ok(call) => call,
            Err(reason) => return Ok(TransactionOutcome::skipped(reason)),
        };

        let fee = self.fee_params().await?;

        let hash = {
            let mut slot = self.nonces.acquire(address).await;
            let nonce = match slot.cached() {
                Some(nonce) => nonce,
                None => {
                    retry(self.retry, "get_transaction_count", || {
                        self.client.get_pending_nonce(address)
                    })
                    .await?
                }
            };

            let envelope = signer
                .sign(TxRequest {
                    to,
                    value,
                    data,
                    gas_limit: self.config.gas_limit,
                    fee,
                    nonce,
                    chain_id: self.network.chain_id,
                })
                .await?;

            match retry(self.retry, "send_transaction", || {
                self.client.send_transaction(envelope.clone())
            })
            .await
            {
                Ok(hash) => {
                    slot.commit(nonce);
                    hash
                }
                Err(err) => {
                    slot.invalidate();
                    return Err(err);
                }
            }
        };

        info!(signer = %address, hash = %hash, "Transaction sent");

        if !self.config.confirm {
            return Ok(TransactionOutcome::Submitted { hash });
        }

        match retry(self.retry, "wait_for_transaction", || {
            self.client.wait_for_confirmation(hash)
        })
        .await
        {
            Ok(confirmation) => Ok(confirmation.into()),
            Err(err) => Ok(TransactionOutcome::failed(format!(
                "confirmation of {} failed: {:#}",
                hash, err
            ))),
        }
    }

    /// Target and calldata for the row's action
    async fn resolve_call(
        &self,
        owner: Address,
        action: &Action,
    ) -> Result<std::result::Result<(Address, Bytes), SkipReason>> {
        match action {
            Action::ContractCall { to, data } => Ok(Ok((*to, data.clone()))),
            Action::NativeTransfer { to, .. } => Ok(Ok((*to, Bytes::new()))),
            Action::TokenTransfer { token, to, amount } => {
                let decimals =
                    retry(self.retry, "decimals", || token_decimals(self.client, *token)).await?;
                let amount = match scale_to_decimals(amount, decimals) {
                    Ok(amount) => amount,
                    Err(_) => {
                        return Ok(Err(SkipReason::InvalidField {
                            field: "amount",
                            value: amount.clone(),
                        }))
                    }
                };

                let call = IERC20::transferCall { to: *to, amount };
                Ok(Ok((*token, call.abi_encode().into())))
            }
            Action::Redeem { market } => {
                let balance = retry(self.retry, "balanceOf", || {
                    market_balance(self.client, *market, owner)
                })
                .await?;
                let amount = self.redeem.amount(balance);
                if amount.is_zero() {
                    return Ok(Err(SkipReason::NothingToRedeem));
                }

                info!(
                    signer = %owner,
                    balance = %unscale_from_decimals(balance, MARKET_TOKEN_DECIMALS),
                    amount = %unscale_from_decimals(amount, MARKET_TOKEN_DECIMALS),
                    "Redeeming"
                );

                let call = ICToken::redeemUnderlyingCall {
                    redeemAmount: amount,
                };
                Ok(Ok((*market, call.abi_encode().into())))
            }
        }
    }

    async fn fee_params(&self) -> Result<FeeParams> {
        Ok(match self.config.fee {
            FeeModel::Legacy {
                gas_price: Some(gas_price),
            } => FeeParams::Legacy { gas_price },
            FeeModel::Legacy { gas_price: None } => FeeParams::Legacy {
                gas_price: retry(self.retry, "get_gas_price", || self.client.get_gas_price())
                    .await?,
            },
            FeeModel::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            },
        })
    }

    fn log_outcome(&self, address: Address, line: usize, outcome: &TransactionOutcome) {
        match outcome {
            TransactionOutcome::Skipped { reason } => {
                warn!(signer = %address, line, "Skipped: {}", reason)
            }
            TransactionOutcome::Submitted { hash } => {
                info!(signer = %address, line, hash = %hash, "Submitted")
            }
            TransactionOutcome::Confirmed {
                hash,
                block_number,
                gas_used,
                success: true,
            } => info!(
                signer = %address,
                line,
                hash = %hash,
                block_number,
                gas_used,
                link = %self.network.tx_link(hash).unwrap_or_default(),
                "Transaction success"
            ),
            TransactionOutcome::Confirmed {
                hash, block_number, ..
            } => warn!(
                signer = %address,
                line,
                hash = %hash,
                block_number,
                "Transaction reverted"
            ),
            TransactionOutcome::Failed { reason } => {
                error!(signer = %address, line, "Failed: {}", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::parse_ether;
    use crate::testing::{address_of, ChainCall, FakeChain, LogCapture, KEY_A, KEY_B};
    use crate::types::{OutcomeKind, SecretKey};
    use alloy::sol_types::SolValue;
    use std::time::Duration;

    fn network() -> NetworkConfig {
        NetworkConfig::new("test", 31337, "http://localhost:8545")
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::fixed(3, Duration::from_millis(10))
    }

    fn call_row(key: &str, to: Address) -> ParsedRow {
        Ok(InputRow::new(
            2,
            SecretKey::new(key),
            Action::ContractCall {
                to,
                data: Bytes::from(vec![0x01, 0x02]),
            },
        ))
    }

    #[test]
    fn test_redeem_rule_rounding() {
        let rule = RedeemRule::default();
        // 1.0 token: 1 / 50 * 0.9 = 0.018
        assert_eq!(rule.amount(U256::from(1_000_000u64)), U256::from(18_000u64));
        // 50 tokens: 0.9
        assert_eq!(rule.amount(U256::from(50_000_000u64)), U256::from(900_000u64));
        // 3.0 tokens: 0.054
        assert_eq!(rule.amount(U256::from(3_000_000u64)), U256::from(54_000u64));
        // 0.1 token: 0.0018 rounds up to 0.002
        assert_eq!(rule.amount(U256::from(100_000u64)), U256::from(2_000u64));
        // dust rounds to zero
        assert_eq!(rule.amount(U256::from(2_000u64)), U256::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_below_minimum_never_submits() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        chain.set_balance(sender, U256::from(10u64));

        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1).with_min_balance(parse_ether("0.0001").unwrap());
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let outcome = submitter.submit(call_row(KEY_A, Address::repeat_byte(0x99))).await;

        assert_eq!(outcome.kind(), OutcomeKind::Skipped);
        assert!(matches!(
            outcome,
            TransactionOutcome::Skipped {
                reason: SkipReason::BelowMinimum { .. }
            }
        ));
        assert!(chain.sends().is_empty());
        assert_eq!(chain.count(|c| matches!(c, ChainCall::Nonce(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_transfer_needs_value() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        chain.set_balance(sender, parse_ether("1").unwrap());

        let network = network();
        let config = SubmitConfig::legacy(21_000).with_confirmation(true);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let row = Ok(InputRow::new(
            2,
            SecretKey::new(KEY_A),
            Action::NativeTransfer {
                to: Address::repeat_byte(0x77),
                amount: parse_ether("2").unwrap(),
            },
        ));
        let outcome = submitter.submit(row).await;

        assert!(matches!(
            outcome,
            TransactionOutcome::Skipped {
                reason: SkipReason::InsufficientFunds { .. }
            }
        ));
        assert!(chain.sends().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_legacy_transfer() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        let target = Address::repeat_byte(0x77);
        chain.set_balance(sender, parse_ether("1").unwrap());
        chain.set_nonce(sender, 12);

        let network = network();
        let config = SubmitConfig::legacy(21_000).with_confirmation(true);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let row = Ok(InputRow::new(
            2,
            SecretKey::new(KEY_A),
            Action::NativeTransfer {
                to: target,
                amount: parse_ether("0.5").unwrap(),
            },
        ));
        let outcome = submitter.submit(row).await;

        assert_eq!(outcome.kind(), OutcomeKind::Confirmed);
        assert!(outcome.is_success());
        assert_eq!(chain.sends(), vec![(target, 12)]);
        assert_eq!(chain.count(|c| *c == ChainCall::GasPrice), 1);
        assert_eq!(nonces.peek(sender), Some(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_send_failure_is_retried() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        chain.set_balance(sender, parse_ether("1").unwrap());
        chain.fail_next_sends(2);

        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let outcome = submitter.submit(call_row(KEY_A, Address::repeat_byte(0x99))).await;

        assert_eq!(outcome.kind(), OutcomeKind::Submitted);
        assert_eq!(chain.sends().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_send_fails_row_and_clears_nonce() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        let contract = Address::repeat_byte(0x99);
        chain.set_balance(sender, parse_ether("1").unwrap());
        chain.fail_sends_to(contract);

        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let outcome = submitter.submit(call_row(KEY_A, contract)).await;

        assert_eq!(outcome.kind(), OutcomeKind::Failed);
        assert_eq!(chain.sends().len(), 3);
        assert_eq!(nonces.peek(sender), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_failure_is_row_failure() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_B);
        chain.fail_balance(sender);

        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let outcome = submitter.submit(call_row(KEY_B, Address::repeat_byte(0x99))).await;

        assert_eq!(outcome.kind(), OutcomeKind::Failed);
        assert_eq!(chain.count(|c| *c == ChainCall::Balance(sender)), 3);
        assert!(chain.sends().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_is_row_failure() {
        let chain = FakeChain::new();
        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let outcome = submitter.submit(call_row("0x1234", Address::repeat_byte(0x99))).await;

        assert_eq!(outcome.kind(), OutcomeKind::Failed);
        assert!(chain.log().is_empty());
    }

    #[tokio::test]
    async fn test_token_transfer_uses_token_decimals() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        let token = Address::repeat_byte(0x70);
        chain.set_balance(sender, parse_ether("1").unwrap());
        chain.set_call_result(
            token,
            IERC20::decimalsCall::SELECTOR,
            U256::from(6u8).abi_encode().into(),
        );

        let network = network();
        let config = SubmitConfig::eip1559(130_000, 100_000_000, 20_000_000);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let row = Ok(InputRow::new(
            2,
            SecretKey::new(KEY_A),
            Action::TokenTransfer {
                token,
                to: Address::repeat_byte(0x22),
                amount: "1.5".into(),
            },
        ));
        let outcome = submitter.submit(row).await;

        assert_eq!(outcome.kind(), OutcomeKind::Submitted);
        assert_eq!(chain.sends(), vec![(token, 0)]);
    }

    #[tokio::test]
    async fn test_redeem_dust_is_skipped() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        let market = Address::repeat_byte(0x0d);
        chain.set_balance(sender, parse_ether("1").unwrap());
        chain.set_call_result(
            market,
            ICToken::balanceOfCall::SELECTOR,
            U256::from(100u64).abi_encode().into(),
        );

        let network = network();
        let config = SubmitConfig::eip1559(1_900_000, 700_000, 300_000);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let row = Ok(InputRow::new(2, SecretKey::new(KEY_A), Action::Redeem { market }));
        let outcome = submitter.submit(row).await;

        assert_eq!(
            outcome,
            TransactionOutcome::skipped(SkipReason::NothingToRedeem)
        );
        assert!(chain.sends().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_confirmation() {
        let chain = FakeChain::new();
        let sender = address_of(KEY_A);
        let contract = Address::repeat_byte(0x99);
        chain.set_balance(sender, parse_ether("1").unwrap());
        chain.revert_sends_to(contract);

        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1).with_confirmation(true);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let outcome = submitter.submit(call_row(KEY_A, contract)).await;

        assert!(matches!(
            outcome,
            TransactionOutcome::Confirmed { success: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_rejected_row_logs_line_and_signer() {
        let chain = FakeChain::new();
        let network = network();
        let config = SubmitConfig::eip1559(400_000, 100, 1);
        let retry = policy();
        let nonces = NonceTracker::new();
        let submitter = Submitter::new(&chain, &network, &config, &retry, &nonces);

        let capture = LogCapture::default();
        let _guard = capture.install();

        let reason = SkipReason::MissingField("calldata");
        let with_key = Err(RejectedRow {
            line: 7,
            signing_key: Some(SecretKey::new(KEY_A)),
            reason: reason.clone(),
        });
        let without_key = Err(RejectedRow {
            line: 8,
            signing_key: None,
            reason: SkipReason::MissingField("private key"),
        });

        assert_eq!(
            submitter.submit(with_key).await,
            TransactionOutcome::skipped(reason)
        );
        assert_eq!(submitter.submit(without_key).await.kind(), OutcomeKind::Skipped);
        assert!(chain.log().is_empty());

        let warnings: Vec<_> = capture
            .events()
            .into_iter()
            .filter(|e| e.level == tracing::Level::WARN)
            .collect();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].field("line"), Some("7"));
        assert_eq!(
            warnings[0].field("signer"),
            Some(address_of(KEY_A).to_string().as_str())
        );
        assert_eq!(warnings[1].field("line"), Some("8"));
        assert_eq!(warnings[1].field("signer"), None);
    }
}
